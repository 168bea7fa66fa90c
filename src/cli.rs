use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    commands::{AccountsCommand, CompletionsCommand, ConsoleCommand, LoginCommand},
    config::{self, Config, Overrides},
};

#[derive(Debug, Clone, Parser)]
#[command(name = "gasy", version, about = "Generate STS credentials and console URLs using YubiKey OTP", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Config file (default is $HOME/.gasy.toml)")]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'r',
        long,
        global = true,
        env = "GASY_REGION",
        help = "AWS region to use for STS"
    )]
    pub region: Option<String>,

    #[arg(
        short = 'p',
        long,
        global = true,
        env = "GASY_PROFILE",
        help = "AWS profile holding the credentials used to assume the role"
    )]
    pub profile: Option<String>,

    #[arg(
        short = 's',
        long = "serialnumber",
        global = true,
        env = "GASY_MFA_SERIAL",
        help = "Serial number of your AWS MFA device"
    )]
    pub serial_number: Option<String>,

    #[arg(
        short = 'S',
        long = "slotname",
        global = true,
        env = "GASY_SLOT_NAME",
        help = "Name of your YubiKey OATH slot"
    )]
    pub slot_name: Option<String>,

    #[arg(
        short = 'c',
        long,
        global = true,
        env = "GASY_CLIENT_LIST",
        help = "Path to the JSON account list"
    )]
    pub client_list_location: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Assume a role in an account and print a console sign-in URL")]
    Login(LoginCommand),
    #[command(about = "List all available accounts")]
    Accounts(AccountsCommand),
    #[command(about = "Print a console sign-in URL for an existing profile")]
    Console(ConsoleCommand),
    #[command(about = "Generate shell completion scripts for gasy")]
    Completions(CompletionsCommand),
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            region: self.region.clone(),
            profile: self.profile.clone(),
            mfa_serial: self.serial_number.clone(),
            slot_name: self.slot_name.clone(),
            client_list_location: self.client_list_location.clone(),
        }
    }

    fn resolve(&self) -> Result<Config> {
        let file = config::load(self.config.as_deref())?;
        Ok(Config::resolve(self.overrides(), file))
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Login(cmd) => cmd.execute(&self.global.resolve()?).await,
            Commands::Accounts(cmd) => cmd.execute(&self.global.resolve()?),
            Commands::Console(cmd) => cmd.execute().await,
            Commands::Completions(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};

    #[test]
    fn test_command_structure_validation() {
        let cmd = Cli::command();
        cmd.debug_assert();
    }

    #[test]
    fn test_login_with_account_and_role() {
        let cli = Cli::try_parse_from(["gasy", "login", "3", "--role", "Deployer"]).unwrap();
        match cli.command {
            Commands::Login(cmd) => {
                assert_eq!(cmd.account, "3");
                assert_eq!(cmd.role, Some("Deployer".to_string()));
                assert_eq!(cmd.code, None);
                assert!(!cmd.open);
            }
            _ => panic!("Expected Login command"),
        }
    }

    #[test]
    fn test_login_with_manual_code() {
        let cli = Cli::try_parse_from(["gasy", "login", "dev", "--code", "123456", "--open"])
            .unwrap();
        match cli.command {
            Commands::Login(cmd) => {
                assert_eq!(cmd.code, Some("123456".to_string()));
                assert!(cmd.open);
            }
            _ => panic!("Expected Login command"),
        }
    }

    #[test]
    fn test_login_requires_account() {
        let result = Cli::try_parse_from(["gasy", "login"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "gasy",
            "-r",
            "us-east-1",
            "-p",
            "skyscrapers",
            "-s",
            "arn:aws:iam::123456789012:mfa/jane",
            "-S",
            "aws:jane",
            "-c",
            "/etc/accounts.json",
            "accounts",
        ])
        .unwrap();

        let overrides = cli.global.overrides();
        assert_eq!(overrides.region.as_deref(), Some("us-east-1"));
        assert_eq!(overrides.profile.as_deref(), Some("skyscrapers"));
        assert_eq!(
            overrides.mfa_serial.as_deref(),
            Some("arn:aws:iam::123456789012:mfa/jane")
        );
        assert_eq!(overrides.slot_name.as_deref(), Some("aws:jane"));
        assert_eq!(
            overrides.client_list_location,
            Some(PathBuf::from("/etc/accounts.json"))
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gasy", "login", "dev", "--region", "eu-central-1"])
            .unwrap();
        assert_eq!(cli.global.region.as_deref(), Some("eu-central-1"));
    }

    #[test]
    fn test_console_command_parsing() {
        let cli = Cli::try_parse_from(["gasy", "console", "dev"]).unwrap();
        assert!(matches!(cli.command, Commands::Console(_)));
    }

    #[test]
    fn test_completions_command_parsing() {
        let cli = Cli::try_parse_from(["gasy", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Commands::Completions(_)));
    }

    #[test]
    fn test_subcommand_required() {
        let result = Cli::try_parse_from(["gasy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_command_fails() {
        let result = Cli::try_parse_from(["gasy", "invalid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_flag_works() {
        let result = Cli::try_parse_from(["gasy", "--version"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayVersion);
        }
    }

    #[test]
    fn test_verbose_flag_multiple() {
        let cli = Cli::try_parse_from(["gasy", "-vv", "accounts"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}

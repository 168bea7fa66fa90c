pub mod accounts;
pub mod completions;
pub mod console;
pub mod login;

pub use accounts::AccountsCommand;
pub use completions::CompletionsCommand;
pub use console::ConsoleCommand;
pub use login::LoginCommand;

pub mod account;
pub mod aws;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod login;
pub mod otp;

pub use error::{GasyError, Result};

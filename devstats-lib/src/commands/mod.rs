//! Command-line interface for devstats
//!
//! # Commands
//!
//! - **serve**: Load configuration, build the upstream clients and the OG
//!   renderer once, then serve HTTP until interrupted
//! - **init**: Write the default configuration file
//! - **validate**: Check a configuration file
//!
//! Credentials are taken from flags or, more commonly, from the
//! `GITHUB_TOKEN`, `GITHUB_USERNAME` and `WAKATIME_API_KEY` environment
//! variables. They are never logged.

mod common;
mod host;
mod init;
mod run;
mod serve;
mod validate;

pub use common::{LogLevel, init_logging};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use serve::{ServeArgs, serve};
pub use validate::{ValidateArgs, validate_config};

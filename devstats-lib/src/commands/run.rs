//! Command dispatch logic for devstats

use super::{Host, InitArgs, ServeArgs, ValidateArgs, init_config, serve, validate_config};
use crate::Result;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "devstats", version, author, long_about = None)]
#[command(about = "Serve daily GitHub commit counts and WakaTime coding time as JSON")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve(Box<ServeArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match Cli::parse_from(args).command {
        Command::Serve(serve_args) => serve(&serve_args).await,
        Command::Init(init_args) => init_config(host, &init_args),
        Command::Validate(validate_args) => validate_config(host, &validate_args),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "devstats",
            "serve",
            "--github-token",
            "t",
            "--github-username",
            "octocat",
            "--wakatime-api-key",
            "k",
            "--listen",
            "127.0.0.1:0",
        ])
        .unwrap();

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.github_username, "octocat");
        assert_eq!(args.listen, "127.0.0.1:0");
        assert_eq!(args.github_api_url, "https://api.github.com");
        assert_eq!(args.log_level, crate::commands::LogLevel::Info);
    }
}

use super::common::{LogLevel, init_logging};
use crate::Result;
use crate::config::Config;
use crate::server;
use crate::stats::{Aggregator, Credentials, Endpoints};
use crate::upstream::{github, wakatime};
use camino::Utf8PathBuf;
use clap::Args;
use core::fmt;
use ohno::IntoAppError;
use tokio::net::TcpListener;

const LOG_TARGET: &str = "     serve";

#[derive(Args)]
pub struct ServeArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// GitHub login whose commits are counted
    #[arg(long, value_name = "LOGIN", env = "GITHUB_USERNAME")]
    pub github_username: String,

    /// WakaTime secret API key
    #[arg(long, value_name = "KEY", env = "WAKATIME_API_KEY", hide_env_values = true)]
    pub wakatime_api_key: String,

    /// Address to listen on
    #[arg(long, value_name = "ADDR", env = "DEVSTATS_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: String,

    /// Path to configuration file (default is `devstats.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", default_value = github::DEFAULT_API_URL, hide = true)]
    pub github_api_url: String,

    /// Base URL of the WakaTime API
    #[arg(long, value_name = "URL", default_value = wakatime::DEFAULT_API_URL, hide = true)]
    pub wakatime_api_url: String,
}

impl fmt::Debug for ServeArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServeArgs")
            .field("github_token", &"<redacted>")
            .field("github_username", &self.github_username)
            .field("wakatime_api_key", &"<redacted>")
            .field("listen", &self.listen)
            .field("config", &self.config)
            .field("log_level", &self.log_level)
            .field("github_api_url", &self.github_api_url)
            .field("wakatime_api_url", &self.wakatime_api_url)
            .finish()
    }
}

impl ServeArgs {
    fn credentials(&self) -> Credentials {
        Credentials {
            github_token: self.github_token.clone(),
            github_username: self.github_username.clone(),
            wakatime_api_key: self.wakatime_api_key.clone(),
        }
    }

    fn endpoints(&self) -> Endpoints {
        Endpoints {
            github_api_url: self.github_api_url.clone(),
            wakatime_api_url: self.wakatime_api_url.clone(),
        }
    }
}

/// Run the HTTP service until interrupted.
pub async fn serve(args: &ServeArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(&Utf8PathBuf::from("."), args.config.as_ref())?;
    log::info!(
        target: LOG_TARGET,
        "serving stats for '{}' (date granularity {:?}, cors {:?}, wakatime zone {})",
        args.github_username,
        config.date_granularity,
        config.cors_policy,
        config.wakatime_time_zone
    );

    let aggregator = Aggregator::new(&args.credentials(), &args.endpoints(), &config)?;
    let app = server::app(aggregator, &config)?;

    let listener = TcpListener::bind(&args.listen)
        .await
        .into_app_err_with(|| format!("binding to '{}'", args.listen))?;

    server::serve(listener, app).await
}

use crate::Result;
use crate::server::CorsPolicy;
use crate::stats::{DateGranularity, resolve_time_zone};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

const LOG_TARGET: &str = "    config";

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "devstats.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How the GitHub search is bounded to the current UTC day
    #[serde(default)]
    pub date_granularity: DateGranularity,

    /// IANA time zone whose calendar day is reported to WakaTime
    #[serde(default = "default_time_zone")]
    pub wakatime_time_zone: String,

    /// Timeout applied to every individual upstream call
    #[serde(default = "default_upstream_timeout", with = "humantime_serde")]
    pub upstream_timeout: Duration,

    /// Which browser origins may call the service
    #[serde(default)]
    pub cors_policy: CorsPolicy,

    /// Origins accepted when `cors_policy` is `origin-allowlist`
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Decorative image drawn on OG previews
    #[serde(default)]
    pub logo_url: Option<String>,
}

fn default_time_zone() -> String {
    "Asia/Kolkata".to_string()
}

const fn default_upstream_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// An explicit path must exist. Without one, `devstats.toml` in `base_dir`
    /// is used if present.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading devstats configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!(target: LOG_TARGET, "no {DEFAULT_CONFIG_FILE} in '{base_dir}', using defaults");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading devstats configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let _ = resolve_time_zone(&self.wakatime_time_zone)?;

        if self.upstream_timeout.is_zero() {
            return Err(app_err!("upstream_timeout must be greater than zero"));
        }

        if self.cors_policy == CorsPolicy::OriginAllowlist && self.allowed_origins.is_empty() {
            return Err(app_err!("cors_policy is 'origin-allowlist' but allowed_origins is empty"));
        }

        for origin in &self.allowed_origins {
            validate_origin(origin)?;
        }

        if let Some(logo_url) = &self.logo_url {
            let url = Url::parse(logo_url).into_app_err_with(|| format!("invalid logo_url '{logo_url}'"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(app_err!("logo_url must use http or https, got '{logo_url}'"));
            }
        }

        Ok(())
    }
}

/// An origin is exactly `scheme://host[:port]`, as browsers send it.
fn validate_origin(origin: &str) -> Result<()> {
    let url = Url::parse(origin).into_app_err_with(|| format!("invalid origin '{origin}' in allowed_origins"))?;
    if url.origin().ascii_serialization() != origin {
        return Err(app_err!(
            "allowed origin '{origin}' must be of the form scheme://host[:port] with no path or trailing slash"
        ));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.date_granularity, DateGranularity::ExactDate);
        assert_eq!(config.cors_policy, CorsPolicy::Open);
        assert_eq!(config.wakatime_time_zone, "Asia/Kolkata");
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert!(config.logo_url.is_none());
    }

    #[test]
    fn test_empty_file_uses_field_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.wakatime_time_zone, "Asia/Kolkata");
    }

    #[test]
    fn test_validate_unknown_time_zone() {
        let config = Config { wakatime_time_zone: "Nowhere/Special".into(), ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = Config { upstream_timeout: Duration::ZERO, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_allowlist_requires_origins() {
        let config = Config { cors_policy: CorsPolicy::OriginAllowlist, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_allowlist_with_origins() {
        let config = Config {
            cors_policy: CorsPolicy::OriginAllowlist,
            allowed_origins: vec!["https://hosenur.dev".into(), "http://localhost:5173".into()],
            ..Config::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_origin_with_path() {
        assert!(validate_origin("https://hosenur.dev/").is_err());
        assert!(validate_origin("https://hosenur.dev/blog").is_err());
        assert!(validate_origin("hosenur.dev").is_err());
        validate_origin("https://hosenur.dev").unwrap();
    }

    #[test]
    fn test_validate_logo_url_scheme() {
        let config = Config { logo_url: Some("ftp://example.com/logo.png".into()), ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { logo_url: Some("https://example.com/logo.png".into()), ..Config::default() };
        config.validate().unwrap();
    }

    #[test]
    fn test_log_target_is_padded() {
        assert_eq!(LOG_TARGET.len(), 10);
        assert_eq!(LOG_TARGET.trim_start(), "config");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<Config>("cache_ttl = \"1d\"").is_err());
    }

    #[test]
    fn test_parse_full_file() {
        let text = r#"
            date_granularity = "utc-day-window"
            wakatime_time_zone = "Europe/Berlin"
            upstream_timeout = "2s 500ms"
            cors_policy = "origin-allowlist"
            allowed_origins = ["https://hosenur.dev"]
            logo_url = "https://hosenur.dev/logo.png"
        "#;

        let config: Config = toml::from_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.date_granularity, DateGranularity::UtcDayWindow);
        assert_eq!(config.upstream_timeout, Duration::from_millis(2500));
        assert_eq!(config.cors_policy, CorsPolicy::OriginAllowlist);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let output_path = base.join(DEFAULT_CONFIG_FILE);
        Config::save_default(&output_path).unwrap();
        let loaded = Config::load(&base, Some(&output_path)).unwrap();
        loaded.validate().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let config = Config::load(&base, None).unwrap();
        config.validate().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_explicit_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let missing = base.join("nope.toml");
        assert!(Config::load(&base, Some(&missing)).is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_invalid_values_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::write(base.join(DEFAULT_CONFIG_FILE), "cors_policy = \"origin-allowlist\"\n").unwrap();
        assert!(Config::load(&base, None).is_err());
    }
}

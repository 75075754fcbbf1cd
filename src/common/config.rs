//! Run configuration handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;

use super::paths::{local_config_path, user_config_path};
use super::{Error, Result};

/// Configuration of a single test run
///
/// Immutable once the scheduler is constructed.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Base URL of the service under test
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Ordered case identifiers
    #[serde(default)]
    pub cases: Vec<String>,

    /// Number of ticks a case may stay pending before the run fails
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Scheduler tick period in milliseconds
    #[serde(default = "default_tick_period")]
    pub tick_period_ms: u64,

    /// Path of the server-sent events stream, relative to the endpoint
    #[serde(default = "default_events_path")]
    pub events_path: String,

    /// Directory holding `case_<id>.yaml` scenario files
    #[serde(default = "default_cases_dir")]
    pub cases_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            cases: Vec::new(),
            timeout: default_timeout(),
            tick_period_ms: default_tick_period(),
            events_path: default_events_path(),
            cases_dir: default_cases_dir(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_timeout() -> u64 {
    300
}
fn default_tick_period() -> u64 {
    1000
}
fn default_events_path() -> String {
    "/events".to_string()
}
fn default_cases_dir() -> PathBuf {
    PathBuf::from("cases")
}

/// Values given on the command line, taking precedence over the file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub cases: Vec<String>,
    pub timeout: Option<u64>,
    pub tick_period_ms: Option<u64>,
    pub cases_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Load configuration
    ///
    /// Lookup order: the explicit path, `./functest.toml`, the user config
    /// directory. Returns defaults when none of them exists. An explicit
    /// path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = local_config_path();
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(path) = user_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a TOML file
    ///
    /// A relative `cases_dir` is resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let mut config = Self::parse(&content)?;
        if config.cases_dir.is_relative() {
            if let Some(dir) = path.parent() {
                config.cases_dir = dir.join(&config.cases_dir);
            }
        }

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply command line overrides
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = endpoint;
        }
        if !overrides.cases.is_empty() {
            self.cases = overrides.cases;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(period) = overrides.tick_period_ms {
            self.tick_period_ms = period;
        }
        if let Some(dir) = overrides.cases_dir {
            self.cases_dir = dir;
        }
    }

    /// Check the values that cannot be expressed in the type
    pub fn validate(&self) -> Result<()> {
        if self.tick_period_ms == 0 {
            return Err(Error::Config(
                "tick_period_ms must be greater than zero".to_string(),
            ));
        }
        self.endpoint_url()?;
        self.events_url()?;
        Ok(())
    }

    /// Tick period as a duration
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Parsed base URL of the service under test
    pub fn endpoint_url(&self) -> Result<Url> {
        parse_http_url(&self.endpoint)
    }

    /// URL of the event stream: the endpoint with `events_path` appended
    pub fn events_url(&self) -> Result<Url> {
        parse_http_url(&join_url(&self.endpoint, &self.events_path))
    }
}

/// Append a path to a base URL string, normalizing the slash between them
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::invalid_endpoint(raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::invalid_endpoint(
            raw,
            format!("unsupported scheme '{}', expected http or https", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = RunConfig::parse(
            r#"
endpoint = "http://pumphouse.local:5000"
cases = ["1", "2", "flavor"]
timeout = 30
tick_period_ms = 250
events_path = "/events"
cases_dir = "functional"
"#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "http://pumphouse.local:5000");
        assert_eq!(config.cases, vec!["1", "2", "flavor"]);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.tick_period(), Duration::from_millis(250));
        assert_eq!(config.cases_dir, PathBuf::from("functional"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RunConfig::parse("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = RunConfig::parse("timout = 3").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = RunConfig::parse(r#"cases = ["1"]"#).unwrap();
        config.apply(Overrides {
            endpoint: Some("https://example.org".to_string()),
            cases: vec!["3".to_string(), "4".to_string()],
            timeout: Some(5),
            ..Default::default()
        });

        assert_eq!(config.endpoint, "https://example.org");
        assert_eq!(config.cases, vec!["3", "4"]);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.tick_period_ms, 1000);
    }

    #[test]
    fn test_empty_case_override_keeps_file_cases() {
        let mut config = RunConfig::parse(r#"cases = ["1"]"#).unwrap();
        config.apply(Overrides::default());
        assert_eq!(config.cases, vec!["1"]);
    }

    #[test]
    fn test_events_url_joins_endpoint() {
        let mut config = RunConfig::default();
        config.endpoint = "http://host:5000/".to_string();
        assert_eq!(
            config.events_url().unwrap().as_str(),
            "http://host:5000/events"
        );

        config.endpoint = "http://host:5000/api".to_string();
        config.events_path = "stream".to_string();
        assert_eq!(
            config.events_url().unwrap().as_str(),
            "http://host:5000/api/stream"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RunConfig::default();
        config.tick_period_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = RunConfig::default();
        config.endpoint = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidEndpoint { .. })
        ));

        let mut config = RunConfig::default();
        config.endpoint = "ftp://host".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_from_file_resolves_cases_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("functest.toml");
        std::fs::write(&path, "cases_dir = \"scenarios\"\n").unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.cases_dir, dir.path().join("scenarios"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = RunConfig::load(Some(Path::new("/nonexistent/functest.toml"))).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}

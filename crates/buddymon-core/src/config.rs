//! Daemon settings.
//!
//! Settings come from an optional `buddymon.toml` and command-line overrides,
//! and are resolved once at startup into an immutable [`Settings`] value that
//! is handed to the dispatcher.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use serde::Deserialize;

use crate::collector::DEFAULT_BUDDYINFO_PATH;
use crate::point::{FieldEncoding, Tags};

pub const DEFAULT_URL: &str = "http://localhost:8086";
pub const DEFAULT_DATABASE: &str = "buddyinfo";
pub const DEFAULT_MEASUREMENT: &str = "buddyinfo";
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const CONFIG_FILE_NAME: &str = "buddymon.toml";

/// Tag added with the local hostname unless disabled.
pub const HOST_TAG: &str = "host";

/// Errors raised while loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid tag '{0}', use syntax key=value")]
    InvalidTag(String),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Contents of `buddymon.toml`. Every key is optional.
///
/// ```toml
/// url = "http://influx.example.com:8086"
/// database = "buddyinfo"
/// user = "buddy"
/// password = "secret"
/// interval_secs = 30
///
/// [tags]
/// dc = "ams"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub measurement: Option<String>,
    pub hostname: Option<String>,
    pub no_hostname: Option<bool>,
    pub tags: BTreeMap<String, String>,
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub source: Option<PathBuf>,
    pub field_encoding: Option<FieldEncoding>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub measurement: Option<String>,
    pub hostname: Option<String>,
    pub no_hostname: bool,
    pub tags: Vec<(String, String)>,
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub source: Option<PathBuf>,
    pub field_encoding: Option<FieldEncoding>,
}

/// Destination database connection.
#[derive(Clone, PartialEq, Eq)]
pub struct InfluxSettings {
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for InfluxSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxSettings")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Buddyinfo file to read each cycle.
    pub source: PathBuf,
    pub measurement: String,
    /// Global tags added to every point, `host` included when enabled.
    pub tags: Tags,
    pub interval: Duration,
    pub field_encoding: FieldEncoding,
    pub influx: InfluxSettings,
}

impl Settings {
    /// Merges defaults, file values and overrides, then validates the result.
    ///
    /// `local_hostname` is used for the `host` tag when no hostname is configured.
    pub fn resolve(
        file: FileConfig,
        cli: Overrides,
        local_hostname: &str,
    ) -> Result<Self, ConfigError> {
        let url = cli
            .url
            .or(file.url)
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let database = cli
            .database
            .or(file.database)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let measurement = cli
            .measurement
            .or(file.measurement)
            .unwrap_or_else(|| DEFAULT_MEASUREMENT.to_string());
        let user = cli.user.or(file.user).filter(|u| !u.is_empty());
        let password = cli.password.or(file.password).filter(|p| !p.is_empty());
        let interval_secs = cli
            .interval_secs
            .or(file.interval_secs)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        let timeout_secs = cli
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let source = cli
            .source
            .or(file.source)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUDDYINFO_PATH));
        let field_encoding = cli
            .field_encoding
            .or(file.field_encoding)
            .unwrap_or_default();
        let no_hostname = cli.no_hostname || file.no_hostname.unwrap_or(false);
        let hostname = cli
            .hostname
            .or(file.hostname)
            .unwrap_or_else(|| local_hostname.to_lowercase());

        let mut tags = file.tags;
        tags.extend(cli.tags);
        if let Some((key, value)) = tags
            .iter()
            .find(|(k, v)| k.trim().is_empty() || v.trim().is_empty())
        {
            return Err(ConfigError::InvalidTag(format!("{}={}", key, value)));
        }
        if !no_hostname && !hostname.is_empty() {
            tags.entry(HOST_TAG.to_string()).or_insert(hostname);
        }

        validate_url(&url)?;
        if database.is_empty() {
            return Err(invalid("database", "must not be empty"));
        }
        if measurement.is_empty() {
            return Err(invalid("measurement", "must not be empty"));
        }
        if interval_secs == 0 {
            return Err(invalid("interval", "must be at least 1 second"));
        }
        if timeout_secs == 0 {
            return Err(invalid("timeout", "must be at least 1 second"));
        }

        Ok(Settings {
            source,
            measurement,
            tags,
            interval: Duration::from_secs(interval_secs),
            field_encoding,
            influx: InfluxSettings {
                url,
                database,
                user,
                password,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| invalid("url", format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(
            "url",
            format!("unsupported scheme '{}', expected http or https", other),
        )),
    }
}

/// Parses a `key=value` tag. The value may contain further `=`; neither side may be empty.
pub fn parse_tag(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidTag(s.to_string())),
    }
}

/// Directories searched for `buddymon.toml`, in priority order.
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".buddymon"));
    }
    dirs.push(PathBuf::from("/etc/buddymon"));
    dirs
}

/// Returns the first `buddymon.toml` found in `dirs`.
pub fn find_config_file(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Machine hostname via the `hostname` command, lower-cased. Empty if unavailable.
pub fn local_hostname() -> String {
    process::Command::new("hostname")
        .output()
        .ok()
        .and_then(|out| {
            if out.status.success() {
                String::from_utf8(out.stdout)
                    .ok()
                    .map(|s| s.trim().to_lowercase())
            } else {
                None
            }
        })
        .unwrap_or_default()
}

//! Engine configuration.
//!
//! Values come from three layers, lowest precedence first:
//!   1. Built-in defaults matching the companion service's stock setup.
//!   2. `config.toml` inside the tagport home directory (`$TAGPORT_HOME`,
//!      falling back to `~/.tagport`).
//!   3. [`ConfigOverrides`], typically populated from CLI flags.
//!
//! The merged [`DiscoveryConfig`] is validated once and then shared
//! read-only for the lifetime of the engine.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_PORT: u16 = 8010;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 200;
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PORT_PARAM: &str = "tport";

/// Upper bound on the number of ports in the scan window.
pub const MAX_WINDOW_SIZE: u32 = 64;

pub const DEFAULT_ERROR_MESSAGE: &str = "Loading this release or recording into MusicBrainz Picard failed.\nPlease make sure Picard is running and the browser integration is activated.";

const CONFIG_FILE_NAME: &str = "config.toml";
const HOME_ENV_VAR: &str = "TAGPORT_HOME";

fn default_signatures() -> Vec<String> {
    vec![
        "MusicBrainz-Picard".to_string(),
        "Nothing to see here".to_string(),
    ]
}

/// Which request facility the engine should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportPreference {
    /// Use the privileged client whenever the host offers it.
    #[default]
    Auto,
    Privileged,
    SameOrigin,
}

impl std::str::FromStr for TransportPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(TransportPreference::Auto),
            "privileged" => Ok(TransportPreference::Privileged),
            "same-origin" => Ok(TransportPreference::SameOrigin),
            other => Err(format!(
                "unknown transport `{other}` (expected auto, privileged or same-origin)"
            )),
        }
    }
}

/// Immutable settings handed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Probe target address.
    pub host: String,
    /// First port of the scan window.
    pub default_port: u16,
    /// Last port of the scan window, inclusive.
    pub max_port: u16,
    pub probe_timeout_ms: u64,
    /// Bound for action clicks and the background cleanup request.
    pub action_timeout_ms: u64,
    /// A probe body containing any one of these marks the companion service.
    pub liveness_signatures: Vec<String>,
    /// Query parameter that persists the believed port across reloads.
    pub port_param: String,
    /// Tooltip shown on an action control whose request failed.
    pub error_message: String,
    pub transport: TransportPreference,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            default_port: DEFAULT_PORT,
            max_port: DEFAULT_MAX_PORT,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            liveness_signatures: default_signatures(),
            port_param: DEFAULT_PORT_PARAM.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            transport: TransportPreference::Auto,
        }
    }
}

/// Optional overrides for the on-disk configuration (e.g. from CLI flags).
#[derive(Default, Debug, Clone)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub default_port: Option<u16>,
    pub max_port: Option<u16>,
    pub probe_timeout_ms: Option<u64>,
    pub action_timeout_ms: Option<u64>,
    pub liveness_signatures: Option<Vec<String>>,
    pub transport: Option<TransportPreference>,
}

impl DiscoveryConfig {
    /// Load `config.toml` from `home` (if present), apply `overrides` and
    /// validate the result.
    pub fn load_with_overrides(
        home: &Path,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut cfg = Self::load_from_toml(&home.join(CONFIG_FILE_NAME))?;
        cfg.apply(overrides);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn load_from_toml(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}; using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            host,
            default_port,
            max_port,
            probe_timeout_ms,
            action_timeout_ms,
            liveness_signatures,
            transport,
        } = overrides;
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = default_port {
            self.default_port = port;
        }
        if let Some(port) = max_port {
            self.max_port = port;
        }
        if let Some(ms) = probe_timeout_ms {
            self.probe_timeout_ms = ms;
        }
        if let Some(ms) = action_timeout_ms {
            self.action_timeout_ms = ms;
        }
        if let Some(signatures) = liveness_signatures {
            self.liveness_signatures = signatures;
        }
        if let Some(transport) = transport {
            self.transport = transport;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.default_port == 0 {
            return Err(ConfigError::Invalid(
                "default_port must be greater than zero".to_string(),
            ));
        }
        if self.default_port > self.max_port {
            return Err(ConfigError::Invalid(format!(
                "default_port {} is above max_port {}",
                self.default_port, self.max_port
            )));
        }
        if self.window_size() > MAX_WINDOW_SIZE {
            return Err(ConfigError::Invalid(format!(
                "scan window {}..={} spans {} ports; at most {MAX_WINDOW_SIZE} are allowed",
                self.default_port,
                self.max_port,
                self.window_size()
            )));
        }
        if self.probe_timeout_ms == 0 || self.action_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if !self.liveness_signatures.iter().any(|s| !s.is_empty()) {
            return Err(ConfigError::Invalid(
                "at least one non-empty liveness signature is required".to_string(),
            ));
        }
        if self.port_param.is_empty() {
            return Err(ConfigError::Invalid(
                "port_param must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of ports in the inclusive scan window.
    pub fn window_size(&self) -> u32 {
        u32::from(self.max_port).saturating_sub(u32::from(self.default_port)) + 1
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

/// Returns the tagport home directory: `$TAGPORT_HOME` when set, otherwise
/// `~/.tagport`. Does not verify that the directory exists.
pub fn find_tagport_home() -> std::io::Result<PathBuf> {
    if let Ok(val) = std::env::var(HOME_ENV_VAR) {
        if !val.is_empty() {
            return Ok(PathBuf::from(val));
        }
    }

    let mut p = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    p.push(".tagport");
    Ok(p)
}

//! Configuration loading for the weft query client.
//!
//! All fields are required in the file. [`ClientConfig::default`] exists
//! for programmatic use and tests.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use weft_bridge::{Bridge, HandlerRegistry};

use crate::freshness::Staleness;
use crate::store::{CacheConfig, DEFAULT_MAX_ENTRIES};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "WEFT_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub cache: CacheLimits,
    pub staleness: StalenessConfig,
    pub demo: DemoConfig,
    pub bridge: BridgeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheLimits {
    pub max_entries: usize,
    pub refetch_active_on_invalidate: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StalenessConfig {
    pub live_secs: u64,
    pub analytical_secs: u64,
    pub reference_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    /// Simulated round-trip for fixture mode. Zero disables it.
    pub latency_ms: u64,
}

impl DemoConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives. `RUST_LOG` wins.
    pub filter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or WEFT_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let staleness = Staleness::default();
        Self {
            cache: CacheLimits {
                max_entries: DEFAULT_MAX_ENTRIES,
                refetch_active_on_invalidate: true,
            },
            staleness: StalenessConfig {
                live_secs: staleness.live.as_secs(),
                analytical_secs: staleness.analytical.as_secs(),
                reference_secs: staleness.reference.as_secs(),
            },
            demo: DemoConfig {
                latency_ms: weft_fixtures::DEFAULT_LATENCY.as_millis() as u64,
            },
            bridge: BridgeConfig {
                channel_capacity: weft_bridge::DEFAULT_CHANNEL_CAPACITY,
            },
            logging: LoggingConfig {
                filter: "weft_query=info,weft_bridge=info,warn".to_string(),
            },
        }
    }
}

impl ClientConfig {
    /// Load from `--config <path>` or `WEFT_CONFIG`, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(invalid("cache.max_entries", "must be greater than zero"));
        }
        let StalenessConfig {
            live_secs,
            analytical_secs,
            reference_secs,
        } = self.staleness;
        if live_secs == 0 {
            return Err(invalid("staleness.live_secs", "must be greater than zero"));
        }
        if analytical_secs < live_secs {
            return Err(invalid(
                "staleness.analytical_secs",
                "must not be shorter than live_secs",
            ));
        }
        if reference_secs < analytical_secs {
            return Err(invalid(
                "staleness.reference_secs",
                "must not be shorter than analytical_secs",
            ));
        }
        if self.demo.latency_ms > 60_000 {
            return Err(invalid("demo.latency_ms", "must be at most 60000"));
        }
        if self.bridge.channel_capacity == 0 {
            return Err(invalid("bridge.channel_capacity", "must be greater than zero"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(invalid("logging.filter", "must not be empty"));
        }
        Ok(())
    }

    pub fn staleness(&self) -> Staleness {
        Staleness {
            live: Duration::from_secs(self.staleness.live_secs),
            analytical: Duration::from_secs(self.staleness.analytical_secs),
            reference: Duration::from_secs(self.staleness.reference_secs),
        }
    }

    /// Capacity of the renderer-to-host request queue.
    pub fn bridge_capacity(&self) -> usize {
        self.bridge.channel_capacity
    }

    /// Wire a bridge to an in-process host serving `registry`, with the
    /// configured queue capacity.
    pub fn spawn_bridge(&self, registry: HandlerRegistry) -> (Bridge, JoinHandle<()>) {
        weft_bridge::spawn_in_process(registry, self.bridge_capacity())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_max_entries(self.cache.max_entries)
            .with_staleness(self.staleness())
            .with_refetch_active(self.cache.refetch_active_on_invalidate)
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

// src/utils/config.rs
use serde::Deserialize;
use std::time::Duration;
use config::{Config as ConfigLib, ConfigError, Environment, File};
use crate::utils::error::{Result, NodeError};

pub const DEFAULT_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_TOLERANCE: f32 = 0.6;
pub const DEFAULT_ANALYZE_EVERY: u64 = 5;
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_FRAME_TTL_SECS: u64 = 60;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_ENTRY_START_HOUR: u32 = 6;
pub const DEFAULT_ENTRY_END_HOUR: u32 = 12;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_BUS_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub node: NodeConfig,
    pub pipeline: PipelineConfig,
    pub reconnect: ReconnectConfig,
    pub storage: StorageConfig,
    pub recognizer: RecognizerConfig,
    pub notifier: NotifierConfig,
    pub bus: BusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub log_level: String,
    /// Daily rolling log files are written here when set.
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub cooldown_secs: u64,
    /// Maximum embedding distance accepted as a match.
    pub tolerance: f32,
    /// Matches must score strictly above this to reach the deduplicator.
    pub min_confidence: f32,
    /// Recognition runs on every Nth captured frame.
    pub analyze_every: u64,
    /// Zero disables pacing and reads frames as fast as the stream yields them.
    pub capture_interval_ms: u64,
    pub frame_ttl_secs: u64,
    /// Zero disables the periodic refresh of cameras and identities.
    pub refresh_interval_secs: u64,
    pub entry_start_hour: u32,
    pub entry_end_hour: u32,
    pub metrics_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierProvider {
    Disabled,
    Log,
    Twilio,
    Nexmo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    pub provider: NotifierProvider,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub sender_id: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    pub capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: "rollcall".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            tolerance: DEFAULT_TOLERANCE,
            min_confidence: DEFAULT_TOLERANCE,
            analyze_every: DEFAULT_ANALYZE_EVERY,
            capture_interval_ms: DEFAULT_CAPTURE_INTERVAL_MS,
            frame_ttl_secs: DEFAULT_FRAME_TTL_SECS,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            entry_start_hour: DEFAULT_ENTRY_START_HOUR,
            entry_end_hour: DEFAULT_ENTRY_END_HOUR,
            metrics_interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: "data".to_string() }
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5001/embed".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            provider: NotifierProvider::Disabled,
            api_key: None,
            api_secret: None,
            sender_id: None,
            timeout_secs: 15,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_BUS_CAPACITY }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        Self::from_files(&["config/default", "config/local"])
    }

    pub fn from_files(files: &[&str]) -> Result<Self> {
        let mut builder = ConfigLib::builder()
            // Start with default values
            .set_default("node.id", "rollcall")?
            .set_default("node.log_level", "info")?
            .set_default("pipeline.cooldown_secs", DEFAULT_COOLDOWN_SECS)?
            .set_default("pipeline.tolerance", DEFAULT_TOLERANCE as f64)?
            .set_default("pipeline.min_confidence", DEFAULT_TOLERANCE as f64)?
            .set_default("pipeline.analyze_every", DEFAULT_ANALYZE_EVERY)?
            .set_default("pipeline.capture_interval_ms", DEFAULT_CAPTURE_INTERVAL_MS)?
            .set_default("pipeline.frame_ttl_secs", DEFAULT_FRAME_TTL_SECS)?
            .set_default("pipeline.refresh_interval_secs", DEFAULT_REFRESH_INTERVAL_SECS)?
            .set_default("pipeline.entry_start_hour", DEFAULT_ENTRY_START_HOUR)?
            .set_default("pipeline.entry_end_hour", DEFAULT_ENTRY_END_HOUR)?
            .set_default("pipeline.metrics_interval_secs", DEFAULT_METRICS_INTERVAL_SECS)?
            .set_default("reconnect.initial_delay_ms", DEFAULT_INITIAL_DELAY_MS)?
            .set_default("reconnect.max_delay_ms", DEFAULT_MAX_DELAY_MS)?
            .set_default("reconnect.multiplier", DEFAULT_BACKOFF_MULTIPLIER)?
            .set_default("storage.data_dir", "data")?
            .set_default("recognizer.endpoint", "http://127.0.0.1:5001/embed")?
            .set_default("recognizer.timeout_secs", 10)?
            .set_default("notifier.provider", "disabled")?
            .set_default("notifier.timeout_secs", 15)?
            .set_default("bus.capacity", DEFAULT_BUS_CAPACITY as u64)?;

        for file in files {
            builder = builder.add_source(File::with_name(file).required(false));
        }

        // Override with environment variables (e.g., ROLLCALL_PIPELINE__COOLDOWN_SECS)
        let config = builder
            .add_source(
                Environment::with_prefix("ROLLCALL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;
        if pipeline.analyze_every == 0 {
            return Err(NodeError::Config("analyze_every must be greater than 0".into()));
        }
        if pipeline.cooldown_secs == 0 {
            return Err(NodeError::Config("cooldown_secs must be greater than 0".into()));
        }
        if !(pipeline.tolerance > 0.0 && pipeline.tolerance <= 1.0) {
            return Err(NodeError::Config("tolerance must be within (0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&pipeline.min_confidence) {
            return Err(NodeError::Config("min_confidence must be within [0, 1]".into()));
        }
        if pipeline.entry_start_hour > pipeline.entry_end_hour || pipeline.entry_end_hour > 23 {
            return Err(NodeError::Config(format!(
                "invalid entry window [{}, {}]",
                pipeline.entry_start_hour, pipeline.entry_end_hour
            )));
        }

        if self.reconnect.initial_delay_ms == 0 {
            return Err(NodeError::Config("initial_delay_ms must be greater than 0".into()));
        }
        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            return Err(NodeError::Config("max_delay_ms must not be below initial_delay_ms".into()));
        }
        if self.reconnect.multiplier < 1.0 {
            return Err(NodeError::Config("backoff multiplier must be at least 1.0".into()));
        }

        if self.bus.capacity == 0 {
            return Err(NodeError::Config("bus capacity must be greater than 0".into()));
        }

        match self.notifier.provider {
            NotifierProvider::Twilio | NotifierProvider::Nexmo => {
                if self.notifier.api_key.is_none()
                    || self.notifier.api_secret.is_none()
                    || self.notifier.sender_id.is_none()
                {
                    return Err(NodeError::Config(
                        "api_key, api_secret and sender_id must be set for SMS providers".into(),
                    ));
                }
            }
            NotifierProvider::Disabled | NotifierProvider::Log => {}
        }

        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.pipeline.cooldown_secs)
    }

    pub fn frame_ttl(&self) -> Duration {
        Duration::from_secs(self.pipeline.frame_ttl_secs)
    }

    pub fn capture_interval(&self) -> Option<Duration> {
        match self.pipeline.capture_interval_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.pipeline.refresh_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.pipeline.metrics_interval_secs.max(1))
    }
}

impl From<ConfigError> for NodeError {
    fn from(error: ConfigError) -> Self {
        NodeError::Config(error.to_string())
    }
}

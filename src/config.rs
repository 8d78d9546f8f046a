use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DetectionError, Result};

/// Main configuration for meme-glasses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Face detector settings
    pub detector: DetectorConfig,

    /// Background image download settings
    pub fetch: FetchConfig,

    /// Prop placement settings
    pub placement: PlacementConfig,

    /// Prop asset settings
    pub prop: PropConfig,

    /// Output settings
    pub output: OutputConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.fetch.validate()?;
        self.placement.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Face detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Vision `images:annotate` endpoint
    pub endpoint: String,

    /// API key given inline. Prefer `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Maximum number of faces requested from the detector
    pub max_results: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries for transient failures
    pub max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    pub retry_backoff_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: None,
            api_key_env: "GOOGLE_VISION_API_KEY".to_string(),
            max_results: 4,
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

impl DetectorConfig {
    /// Resolve the API key, inline value first, then the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DetectionError::MissingCredentials {
                env_var: self.api_key_env.clone(),
            }.into())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(ConfigError::InvalidValue {
                key: "detector.max_results".to_string(),
                value: self.max_results.to_string()
            }.into());
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "detector.timeout_secs".to_string(),
                value: self.timeout_secs.to_string()
            }.into());
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "detector.endpoint".to_string(),
                value: self.endpoint.clone()
            }.into());
        }

        Ok(())
    }
}

/// Background image download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Download timeout in seconds
    pub timeout_secs: u64,

    /// Largest accepted image body
    pub max_image_bytes: u64,

    /// Retries for transient failures
    pub max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_image_bytes: 20 * 1024 * 1024,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "fetch.timeout_secs".to_string(),
                value: self.timeout_secs.to_string()
            }.into());
        }

        if self.max_image_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "fetch.max_image_bytes".to_string(),
                value: self.max_image_bytes.to_string()
            }.into());
        }

        Ok(())
    }
}

/// What to do with a face whose prop cannot be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnplaceablePolicy {
    /// Log it, record it in the report and keep going
    #[default]
    Skip,
    /// Fail the whole request
    Abort,
}

/// Prop placement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Extra prop width beyond the outer eye corners, as a fraction of the eye span
    pub margin: f64,

    /// Handling of faces with missing landmarks or degenerate geometry
    pub on_unplaceable: UnplaceablePolicy,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            margin: 0.7,
            on_unplaceable: UnplaceablePolicy::Skip,
        }
    }
}

impl PlacementConfig {
    fn validate(&self) -> Result<()> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "placement.margin".to_string(),
                value: self.margin.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Prop asset configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropConfig {
    /// Prop image (PNG with alpha). The built-in pixel glasses are used when unset.
    pub path: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for generated files (HTTP mode)
    pub directory: PathBuf,

    /// Extension of generated files (HTTP mode)
    pub extension: String,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            extension: "jpg".to_string(),
            jpeg_quality: 90,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "output.jpeg_quality".to_string(),
                value: self.jpeg_quality.to_string()
            }.into());
        }

        if !matches!(self.extension.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png") {
            return Err(ConfigError::InvalidValue {
                key: "output.extension".to_string(),
                value: self.extension.clone()
            }.into());
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Buffer engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BufferConfig {
    /// Bytes per chunk (default: 512)
    #[serde(default = "default_chunk_capacity")]
    pub chunk_capacity: usize,

    /// Number of chunks preallocated in the pool (default: 32768, i.e. 16MB of text)
    #[serde(default = "default_chunk_count")]
    pub chunk_count: usize,

    /// Columns between tab stops (default: 8)
    #[serde(default = "default_tab_stop")]
    pub tab_stop: usize,

    /// Text rows on screen, used for page movement (default: 24)
    #[serde(default = "default_screen_rows")]
    pub screen_rows: usize,

    /// Text columns on screen, used for horizontal scrolling (default: 80)
    #[serde(default = "default_screen_cols")]
    pub screen_cols: usize,
}

fn default_chunk_capacity() -> usize {
    512
}

fn default_chunk_count() -> usize {
    32768
}

fn default_tab_stop() -> usize {
    8
}

fn default_screen_rows() -> usize {
    24
}

fn default_screen_cols() -> usize {
    80
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: default_chunk_capacity(),
            chunk_count: default_chunk_count(),
            tab_stop: default_tab_stop(),
            screen_rows: default_screen_rows(),
            screen_cols: default_screen_cols(),
        }
    }
}

impl BufferConfig {
    /// Small pool with the given chunk size, handy for exercising splits
    pub fn with_chunks(chunk_capacity: usize, chunk_count: usize) -> Self {
        Self {
            chunk_capacity,
            chunk_count,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    ///
    /// Missing fields take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: BufferConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_capacity must be greater than 0".to_string(),
            ));
        }

        if self.chunk_count == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_count must be greater than 0".to_string(),
            ));
        }

        if self.tab_stop == 0 {
            return Err(ConfigError::ValidationError(
                "tab_stop must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// JSON Schema describing the configuration file
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(BufferConfig);
        serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null)
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

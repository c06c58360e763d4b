//! Configuration for the layout engine.
//!
//! Provides centralized configuration for all components with sensible
//! defaults. Every section deserializes with defaults for missing keys, so
//! a partial JSON document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MzError, Result};

/// Master configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// File loading limits.
    pub io: IoConfig,
    /// String extraction configuration.
    pub strings: StringsConfig,
    /// Hex dump configuration.
    pub hex: HexConfig,
    /// Region presentation configuration.
    pub regions: RegionConfig,
}

impl LayoutConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|e| MzError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MzError::Config(e.to_string()))
    }

    /// Reject values the engine cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.hex.row_length == 0 {
            return Err(MzError::Config("hex.row_length must be > 0".to_string()));
        }
        if self.strings.min_length == 0 {
            return Err(MzError::Config("strings.min_length must be > 0".to_string()));
        }
        Ok(())
    }
}

/// I/O configuration for file loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// String extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringsConfig {
    /// Minimum length for a string candidate (in characters)
    pub min_length: usize,
    /// Extract printable ASCII runs
    pub ascii: bool,
    /// Extract naive UTF-16LE runs
    pub unicode: bool,
}

impl Default for StringsConfig {
    fn default() -> Self {
        Self {
            min_length: 4,
            ascii: true,
            unicode: true,
        }
    }
}

/// Hex dump configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexConfig {
    /// Bytes per row
    pub row_length: usize,
}

impl Default for HexConfig {
    fn default() -> Self {
        Self { row_length: 0x10 }
    }
}

/// Region presentation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Hide header/gap/overlay segments made up entirely of zero bytes
    pub hide_zero_segments: bool,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            hide_zero_segments: true,
        }
    }
}

/*!
Configuration management for the converter.
*/

use anyhow::{Context, Result};
use screen_codec::words::DEFAULT_TEMPLATE;
use screen_codec::Endianness;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "vmu-screen.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// Load the requested file, or the default file if it exists, or defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::new()),
        }
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

/// Image to command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Keep raw pixel polarity instead of complementing
    pub invert: bool,

    /// Emit the 48 screen words without the frame header
    pub screen_only: bool,

    /// Maple/player index the command is addressed to [0,3]
    pub maple_index: usize,

    /// Per-word output template with 4 byte placeholders
    pub format: String,

    /// Byte order of the emitted words
    pub output_endian: Endianness,

    /// Luma at or above this is a white pixel when converting non-bitmap images
    pub threshold: u8,

    /// Save the intermediate bitmap next to a non-bitmap source image
    pub keep_bitmap: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            invert: false,
            screen_only: false,
            maple_index: 0,
            format: DEFAULT_TEMPLATE.to_string(),
            output_endian: Endianness::Big,
            threshold: 128,
            keep_bitmap: false,
        }
    }
}

/// Command to image settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Keep raw pixel polarity instead of complementing
    pub invert: bool,

    /// Input holds the 48 screen words without the frame header
    pub screen_only: bool,

    /// Byte order of the input words
    pub input_endian: Endianness,

    /// Bitmap output path
    pub output: PathBuf,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            invert: false,
            screen_only: false,
            input_endian: Endianness::Big,
            output: PathBuf::from("screen.bmp"),
        }
    }
}

//! # Engine Configuration
//!
//! Everything here is optional; a missing file or field means the default.
//!
//! ```json
//! {
//!   "jpegQuality": 85,
//!   "foreground": { "r": 0, "g": 0, "b": 0 },
//!   "background": { "r": 255, "g": 255, "b": 255 },
//!   "reader": { "formats": ["QRCode"], "tryInvert": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::canvas::Color;
use crate::codec::ReaderOptions;
use crate::codec::imaging::DEFAULT_JPEG_QUALITY;
use crate::error::{BarstampError, Result};

/// Tunables for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Color of dark symbol modules
    pub foreground: Color,
    /// Color of light symbol modules and quiet zone
    pub background: Color,
    /// Reader options used when a read call passes none
    pub reader: ReaderOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            foreground: Color::BLACK,
            background: Color::WHITE,
            reader: ReaderOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BarstampError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
            .map_err(|e| BarstampError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)
            .map_err(|e| BarstampError::Config(format!("invalid config: {}", e)))?;
        if !(1..=100).contains(&config.jpeg_quality) {
            return Err(BarstampError::Config(format!(
                "jpegQuality must be 1-100, got {}",
                config.jpeg_quality
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::symbol::SymbolFormat;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(
            r#"{"jpegQuality": 70, "reader": {"formats": ["QRCode"], "maxSymbols": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.foreground, Color::BLACK);
        assert_eq!(config.reader.formats, vec![SymbolFormat::QrCode]);
        assert_eq!(config.reader.max_symbols, Some(3));
        assert!(!config.reader.try_invert);
    }

    #[test]
    fn test_invalid_quality() {
        let err = EngineConfig::from_json(r#"{"jpegQuality": 0}"#).unwrap_err();
        assert_eq!(err.stage(), Stage::Config);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_file("no/such/config.json").unwrap_err();
        assert_eq!(err.stage(), Stage::Config);
    }
}

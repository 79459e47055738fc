//! # Symbol Options
//!
//! A [`SymbolSpec`] is what a caller asks for: a payload plus whatever
//! options they care about. [`SymbolSpec::resolve`] overlays those options
//! on the fixed defaults and produces a [`ResolvedSymbol`], the only form
//! the rest of the pipeline reads.
//!
//! ## Defaults
//!
//! | Option | Default |
//! |--------|---------|
//! | format | `QRCode` |
//! | width × height | 200 × 200 |
//! | margin | 10 |
//! | character set | `UTF8` |
//! | ECC level | -1 (codec default) |
//! | position | `top-left` |
//!
//! ## Example
//!
//! ```
//! use barstamp::symbol::{Position, SymbolFormat, SymbolSpec};
//!
//! let symbol = SymbolSpec::new("https://example.com")
//!     .format(SymbolFormat::QrCode)
//!     .position(Position::BottomRight)
//!     .resolve();
//!
//! assert_eq!(symbol.width(), 200);
//! assert_eq!(symbol.position(), Position::BottomRight);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_WIDTH: u32 = 200;
pub const DEFAULT_HEIGHT: u32 = 200;
pub const DEFAULT_MARGIN: u32 = 10;
/// ECC level meaning "let the codec choose".
pub const CODEC_DEFAULT_ECC: i8 = -1;

// ============================================================================
// TAGS
// ============================================================================

/// Barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SymbolFormat {
    #[default]
    #[serde(rename = "QRCode")]
    QrCode,
    Code128,
    Code39,
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    Codabar,
    #[serde(rename = "PDF417")]
    Pdf417,
}

impl SymbolFormat {
    pub const ALL: [SymbolFormat; 7] = [
        SymbolFormat::QrCode,
        SymbolFormat::Code128,
        SymbolFormat::Code39,
        SymbolFormat::Ean13,
        SymbolFormat::Ean8,
        SymbolFormat::Codabar,
        SymbolFormat::Pdf417,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SymbolFormat::QrCode => "QRCode",
            SymbolFormat::Code128 => "Code128",
            SymbolFormat::Code39 => "Code39",
            SymbolFormat::Ean13 => "EAN13",
            SymbolFormat::Ean8 => "EAN8",
            SymbolFormat::Codabar => "Codabar",
            SymbolFormat::Pdf417 => "PDF417",
        }
    }
}

impl fmt::Display for SymbolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymbolFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace(['-', '_', ' '], "");
        let wanted = if wanted == "qr" { "qrcode".to_string() } else { wanted };
        SymbolFormat::ALL
            .into_iter()
            .find(|f| f.name().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown symbol format '{}'", s))
    }
}

/// How content text is turned into bytes before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CharacterSet {
    #[default]
    #[serde(rename = "UTF8")]
    Utf8,
    #[serde(rename = "ISO8859_1")]
    Iso8859_1,
    #[serde(rename = "ASCII")]
    Ascii,
}

impl CharacterSet {
    /// Encode `text` in this character set, or `None` if a character
    /// cannot be represented.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            CharacterSet::Utf8 => Some(text.as_bytes().to_vec()),
            CharacterSet::Iso8859_1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            CharacterSet::Ascii => text.is_ascii().then(|| text.as_bytes().to_vec()),
        }
    }
}

/// Relative placement of a symbol on a canvas.
///
/// Unrecognized tags read from JSON fall back to [`Position::TopLeft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum Position {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Middle,
}

impl Position {
    /// Parse a position tag, defaulting to top-left for anything unknown.
    pub fn parse_lenient(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "top-right" => Position::TopRight,
            "bottom-left" => Position::BottomLeft,
            "bottom-right" => Position::BottomRight,
            "middle" | "center" => Position::Middle,
            _ => Position::TopLeft,
        }
    }
}

impl From<String> for Position {
    fn from(tag: String) -> Self {
        Position::parse_lenient(&tag)
    }
}

/// Explicit pixel offset of a symbol's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub top: u32,
    pub left: u32,
}

// ============================================================================
// SPEC (CALLER INPUT)
// ============================================================================

/// One barcode request, with any option left out taking its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSpec {
    #[serde(default)]
    pub format: Option<SymbolFormat>,
    pub content: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub margin: Option<u32>,
    #[serde(default)]
    pub ecc_level: Option<i8>,
    #[serde(default)]
    pub character_set: Option<CharacterSet>,
    /// Wins over `position` when both are set.
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub position: Option<Position>,
}

impl SymbolSpec {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn format(mut self, format: SymbolFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn margin(mut self, margin: u32) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn ecc_level(mut self, level: i8) -> Self {
        self.ecc_level = Some(level);
        self
    }

    pub fn character_set(mut self, charset: CharacterSet) -> Self {
        self.character_set = Some(charset);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn location(mut self, top: u32, left: u32) -> Self {
        self.location = Some(Location { top, left });
        self
    }

    /// Overlay this spec on the defaults.
    pub fn resolve(&self) -> ResolvedSymbol {
        ResolvedSymbol {
            format: self.format.unwrap_or_default(),
            content: self.content.clone(),
            width: self.width.unwrap_or(DEFAULT_WIDTH),
            height: self.height.unwrap_or(DEFAULT_HEIGHT),
            margin: self.margin.unwrap_or(DEFAULT_MARGIN),
            ecc_level: self.ecc_level.unwrap_or(CODEC_DEFAULT_ECC),
            character_set: self.character_set.unwrap_or_default(),
            location: self.location,
            position: self.position.unwrap_or_default(),
        }
    }
}

// ============================================================================
// RESOLVED SYMBOL
// ============================================================================

/// A fully populated symbol request.
///
/// Read-only once built; only [`SymbolSpec::resolve`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    format: SymbolFormat,
    content: String,
    width: u32,
    height: u32,
    margin: u32,
    ecc_level: i8,
    character_set: CharacterSet,
    location: Option<Location>,
    position: Position,
}

impl ResolvedSymbol {
    pub fn format(&self) -> SymbolFormat {
        self.format
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn ecc_level(&self) -> i8 {
        self.ecc_level
    }

    pub fn character_set(&self) -> CharacterSet {
        self.character_set
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_defaults() {
        let symbol = SymbolSpec::new("hello").resolve();
        assert_eq!(symbol.format(), SymbolFormat::QrCode);
        assert_eq!(symbol.content(), "hello");
        assert_eq!((symbol.width(), symbol.height()), (200, 200));
        assert_eq!(symbol.margin(), 10);
        assert_eq!(symbol.ecc_level(), -1);
        assert_eq!(symbol.character_set(), CharacterSet::Utf8);
        assert_eq!(symbol.position(), Position::TopLeft);
        assert_eq!(symbol.location(), None);
    }

    #[test]
    fn test_resolve_overrides() {
        let symbol = SymbolSpec::new("ABC-123")
            .format(SymbolFormat::Code128)
            .size(300, 80)
            .margin(4)
            .ecc_level(3)
            .character_set(CharacterSet::Ascii)
            .position(Position::Middle)
            .location(5, 6)
            .resolve();
        assert_eq!(symbol.format(), SymbolFormat::Code128);
        assert_eq!((symbol.width(), symbol.height()), (300, 80));
        assert_eq!(symbol.margin(), 4);
        assert_eq!(symbol.ecc_level(), 3);
        assert_eq!(symbol.character_set(), CharacterSet::Ascii);
        assert_eq!(symbol.position(), Position::Middle);
        assert_eq!(symbol.location(), Some(Location { top: 5, left: 6 }));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let spec = SymbolSpec::new("same").size(120, 90);
        let first = spec.resolve();
        let second = spec.resolve();
        assert_eq!(first, second);
        // Resolving never writes back into the spec
        assert_eq!(spec.margin, None);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "format": "QRCode",
            "content": "This is the content of my QR code",
            "eccLevel": 5,
            "characterSet": "ISO8859_1",
            "position": "middle"
        }"#;
        let spec: SymbolSpec = serde_json::from_str(json).unwrap();
        let symbol = spec.resolve();
        assert_eq!(symbol.ecc_level(), 5);
        assert_eq!(symbol.character_set(), CharacterSet::Iso8859_1);
        assert_eq!(symbol.position(), Position::Middle);
    }

    #[test]
    fn test_unknown_position_defaults_to_top_left() {
        let spec: SymbolSpec =
            serde_json::from_str(r#"{"content": "x", "position": "somewhere"}"#).unwrap();
        assert_eq!(spec.resolve().position(), Position::TopLeft);
        assert_eq!(Position::parse_lenient("BOTTOM-RIGHT"), Position::BottomRight);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("qr".parse::<SymbolFormat>().unwrap(), SymbolFormat::QrCode);
        assert_eq!("QRCode".parse::<SymbolFormat>().unwrap(), SymbolFormat::QrCode);
        assert_eq!("code-128".parse::<SymbolFormat>().unwrap(), SymbolFormat::Code128);
        assert_eq!("ean13".parse::<SymbolFormat>().unwrap(), SymbolFormat::Ean13);
        assert!("aztec".parse::<SymbolFormat>().is_err());
    }

    #[test]
    fn test_character_set_encode() {
        assert_eq!(CharacterSet::Utf8.encode("é"), Some(vec![0xC3, 0xA9]));
        assert_eq!(CharacterSet::Iso8859_1.encode("é"), Some(vec![0xE9]));
        assert_eq!(CharacterSet::Iso8859_1.encode("€"), None);
        assert_eq!(CharacterSet::Ascii.encode("abc"), Some(b"abc".to_vec()));
        assert_eq!(CharacterSet::Ascii.encode("é"), None);
    }
}

//! # Canvas
//!
//! The base that symbols are composited onto: an existing image on disk or
//! a freshly created blank canvas.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CANVAS_WIDTH: u32 = 600;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 800;
pub const DEFAULT_CANVAS_CHANNELS: u8 = 3;

/// An RGBA color. Alpha defaults to opaque when omitted from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub alpha: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 255 }
    }

    /// Rec. 601 luma, used when the target has a single gray channel.
    pub fn luma(&self) -> u8 {
        let l = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        l.round().clamp(0.0, 255.0) as u8
    }
}

/// Where the composite image comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Base {
    /// An existing raster file
    Path(PathBuf),
    /// A new canvas created for this call
    Blank(BlankCanvas),
}

impl Base {
    /// A blank canvas with every option at its default.
    pub fn blank() -> Self {
        Base::Blank(BlankCanvas::default())
    }
}

impl From<PathBuf> for Base {
    fn from(path: PathBuf) -> Self {
        Base::Path(path)
    }
}

impl From<BlankCanvas> for Base {
    fn from(canvas: BlankCanvas) -> Self {
        Base::Blank(canvas)
    }
}

/// Blank canvas request; absent fields take the defaults (600×800, RGB, white).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlankCanvas {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub channels: Option<u8>,
    #[serde(default)]
    pub background: Option<Color>,
}

impl BlankCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn channels(mut self, channels: u8) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn resolve(&self) -> ResolvedCanvas {
        ResolvedCanvas {
            width: self.width.unwrap_or(DEFAULT_CANVAS_WIDTH),
            height: self.height.unwrap_or(DEFAULT_CANVAS_HEIGHT),
            channels: self.channels.unwrap_or(DEFAULT_CANVAS_CHANNELS),
            background: self.background.unwrap_or(Color::WHITE),
        }
    }
}

/// A fully populated blank canvas descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCanvas {
    width: u32,
    height: u32,
    channels: u8,
    background: Color,
}

impl ResolvedCanvas {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn background(&self) -> Color {
        self.background
    }
}

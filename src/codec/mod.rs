//! # Codec Boundary
//!
//! The engine never touches symbology or file formats directly. It talks to
//! two collaborators:
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`BarcodeCodec`] | text → symbol raster, raster → decoded symbols |
//! | [`ImageCodec`] | file ↔ raster, blank canvases, compositing, persisting |
//!
//! [`NativeBarcodeCodec`] and [`NativeImageCodec`] are the default
//! implementations. Tests and embedders can swap in their own.

pub mod barcode;
pub mod imaging;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::canvas::ResolvedCanvas;
use crate::error::Result;
use crate::layout::Placement;
use crate::raster::RasterBuffer;
use crate::symbol::{ResolvedSymbol, SymbolFormat};

pub use barcode::NativeBarcodeCodec;
pub use imaging::NativeImageCodec;

/// Options for scanning an image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderOptions {
    /// Formats to report. Empty means every supported format.
    pub formats: Vec<SymbolFormat>,
    /// Stop after this many symbols.
    pub max_symbols: Option<usize>,
    /// Also scan the luminance-inverted image (light symbols on dark).
    pub try_invert: bool,
}

impl ReaderOptions {
    pub fn formats(formats: impl IntoIterator<Item = SymbolFormat>) -> Self {
        Self {
            formats: formats.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn accepts(&self, format: SymbolFormat) -> bool {
        self.formats.is_empty() || self.formats.contains(&format)
    }
}

/// Corner of a decoded symbol in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// One symbol found in an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedSymbol {
    pub text: String,
    pub format: SymbolFormat,
    /// Corners, clockwise from the symbol's own top-left.
    pub corners: [Point; 4],
}

/// A raster and the offset at which it is drawn onto the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeInstruction {
    pub raster: RasterBuffer,
    pub placement: Placement,
}

/// Metadata of a file written by the image codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedFile {
    pub path: PathBuf,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub size: u64,
}

/// Symbol encoding and decoding.
#[async_trait]
pub trait BarcodeCodec: Send + Sync {
    /// Render `symbol` to a raster of exactly `symbol.width() × symbol.height()`.
    async fn encode(&self, symbol: &ResolvedSymbol) -> Result<RasterBuffer>;

    /// Find every symbol in `raster`. An image with no symbols yields an empty list.
    async fn decode(
        &self,
        raster: &RasterBuffer,
        options: &ReaderOptions,
    ) -> Result<Vec<DecodedSymbol>>;
}

/// Raster file I/O and compositing.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Fail early if `path` names a format this codec cannot write.
    fn check_output(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Load and decode an image file.
    async fn load_file(&self, path: &Path) -> Result<RasterBuffer>;

    /// Create a blank canvas.
    async fn create_blank(&self, canvas: &ResolvedCanvas) -> Result<RasterBuffer>;

    /// Draw every instruction onto `base` in order and write the result to `output`.
    async fn composite(
        &self,
        base: RasterBuffer,
        instructions: Vec<CompositeInstruction>,
        output: &Path,
    ) -> Result<PersistedFile>;

    /// Write each raster to the path at the same index.
    async fn persist_each(
        &self,
        rasters: Vec<RasterBuffer>,
        paths: &[PathBuf],
    ) -> Result<Vec<PersistedFile>>;
}

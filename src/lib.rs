//! # Barstamp - Barcodes onto Images
//!
//! Barstamp renders QR codes and barcodes onto raster images, either as one
//! composited picture or as a set of standalone files, and reads them back
//! out of existing images. It provides:
//!
//! - **Layout**: corner, middle and explicit pixel placement with geometry checks
//! - **Composition**: concurrent encoding with deterministic, ordered output
//! - **Codecs**: swappable barcode and image codecs, with native defaults
//! - **Errors**: one typed error per call, naming the stage and symbol that failed
//!
//! ## Quick Start
//!
//! ```no_run
//! use barstamp::{Base, Engine, Position, SymbolFormat, SymbolSpec};
//!
//! # async fn example() -> barstamp::Result<()> {
//! let engine = Engine::native();
//!
//! let specs = [
//!     SymbolSpec::new("This is the content of my QR code").position(Position::Middle),
//!     SymbolSpec::new("ABC-123")
//!         .format(SymbolFormat::Code128)
//!         .size(300, 80)
//!         .position(Position::BottomLeft),
//! ];
//!
//! // One image with both symbols on a blank 600x800 canvas
//! engine.write_symbols(&specs, "output/output.png", Some(&Base::blank())).await?;
//!
//! // output/codes-001.png and output/codes-002.png
//! engine.write_symbols(&specs, "output/codes.png", None).await?;
//!
//! for symbol in engine.read_symbols("output/output.png", None).await? {
//!     println!("{}: {}", symbol.format, symbol.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`symbol`] | Symbol options and their defaults |
//! | [`canvas`] | Base images and blank canvases |
//! | [`layout`] | Placement of symbols on a canvas |
//! | [`naming`] | Sequential output file names |
//! | [`raster`] | Pixel buffers passed between codecs |
//! | [`codec`] | Barcode and image codec traits and native implementations |
//! | [`runtime`] | Shared, lazily loaded barcode codec |
//! | [`compose`] | The write and read pipelines |
//! | [`config`] | Engine configuration |
//! | [`error`] | Error types |

pub mod canvas;
pub mod codec;
pub mod compose;
pub mod config;
pub mod error;
pub mod layout;
pub mod naming;
pub mod raster;
pub mod runtime;
pub mod symbol;

// Re-exports for convenience
pub use canvas::{Base, BlankCanvas, Color};
pub use codec::{DecodedSymbol, PersistedFile, ReaderOptions};
pub use compose::{Engine, WriteOutput};
pub use config::EngineConfig;
pub use error::{BarstampError, Result, Stage};
pub use symbol::{CharacterSet, Location, Position, SymbolFormat, SymbolSpec};

//! # Composition Engine
//!
//! [`Engine`] turns a list of [`SymbolSpec`]s into image files, and reads
//! symbols back out of images.
//!
//! ## Write Pipeline
//!
//! ```text
//! specs ─► resolve ─► encode (concurrent, ordered) ─► mkdir -p
//!                                                        │
//!                       ┌────────── no base ─────────────┤
//!                       ▼                                ▼
//!            name-001.ext … name-NNN.ext       base canvas + placements
//!              (one file per symbol)            (one composite file)
//! ```
//!
//! Encoding is a full barrier: nothing touches the filesystem until every
//! symbol has encoded, and the first encode failure aborts the call with
//! no files written.
//!
//! ## Example
//!
//! ```no_run
//! use barstamp::{Base, Engine, Position, SymbolSpec};
//!
//! # async fn example() -> barstamp::Result<()> {
//! let engine = Engine::native();
//! let output = engine
//!     .write_symbols(
//!         &[SymbolSpec::new("hello").position(Position::Middle)],
//!         "output/ticket.png",
//!         Some(&Base::blank()),
//!     )
//!     .await?;
//! assert_eq!(output.created.len(), 1);
//!
//! let found = engine.read_symbols("output/ticket.png", None).await?;
//! assert_eq!(found[0].text, "hello");
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::canvas::Base;
use crate::codec::{
    CompositeInstruction, DecodedSymbol, ImageCodec, NativeBarcodeCodec, NativeImageCodec,
    PersistedFile, ReaderOptions,
};
use crate::config::EngineConfig;
use crate::error::{BarstampError, Result};
use crate::layout;
use crate::naming;
use crate::raster::RasterBuffer;
use crate::runtime::{CodecRuntime, NativeLoader};
use crate::symbol::{ResolvedSymbol, SymbolSpec};

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutput {
    /// Always `true`; failures surface as errors instead.
    pub success: bool,
    /// One entry per file written, in input order.
    pub created: Vec<PersistedFile>,
}

/// Writes and reads symbols through a codec runtime and an image codec.
#[derive(Clone)]
pub struct Engine {
    runtime: Arc<CodecRuntime>,
    images: Arc<dyn ImageCodec>,
    reader: ReaderOptions,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("runtime", &self.runtime)
            .field("reader", &self.reader)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(runtime: Arc<CodecRuntime>, images: Arc<dyn ImageCodec>) -> Self {
        Self {
            runtime,
            images,
            reader: ReaderOptions::default(),
        }
    }

    /// Native codecs with default settings, sharing the process-wide runtime.
    pub fn native() -> Self {
        Self::new(CodecRuntime::shared(), Arc::new(NativeImageCodec::default()))
    }

    /// Native codecs tuned by `config`, with a runtime of their own.
    pub fn from_config(config: &EngineConfig) -> Self {
        let codec = NativeBarcodeCodec::with_colors(config.foreground, config.background);
        let runtime = Arc::new(CodecRuntime::new(NativeLoader::new(codec)));
        let images = Arc::new(NativeImageCodec::new(config.jpeg_quality));
        Self::new(runtime, images).with_reader_options(config.reader.clone())
    }

    /// Reader options used when `read_symbols` is given none.
    pub fn with_reader_options(mut self, options: ReaderOptions) -> Self {
        self.reader = options;
        self
    }

    /// Render `specs` to `output`.
    ///
    /// Without a `base`, each symbol is written to its own file named
    /// `<stem>-NNN.<ext>` next to `output`. With a `base`, every symbol is
    /// composited onto it and the result is written to `output` itself.
    pub async fn write_symbols(
        &self,
        specs: &[SymbolSpec],
        output: impl AsRef<Path>,
        base: Option<&Base>,
    ) -> Result<WriteOutput> {
        let output = output.as_ref();
        if specs.is_empty() {
            return Err(BarstampError::validation("no symbols to write"));
        }
        self.images.check_output(output)?;

        let symbols: Vec<ResolvedSymbol> = specs.iter().map(SymbolSpec::resolve).collect();
        for (index, symbol) in symbols.iter().enumerate() {
            if symbol.width() == 0 || symbol.height() == 0 {
                return Err(BarstampError::validation(format!(
                    "symbol size must be positive, got {}x{}",
                    symbol.width(),
                    symbol.height()
                ))
                .at_index(index));
            }
        }

        log::info!(
            "writing {} symbol(s) to {} ({})",
            symbols.len(),
            output.display(),
            match base {
                None => "separate files",
                Some(Base::Path(_)) => "existing image",
                Some(Base::Blank(_)) => "blank canvas",
            }
        );

        let rasters = self.encode_all(&symbols).await?;

        if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| BarstampError::persist(dir, e))?;
        }

        let created = match base {
            None => {
                let names = naming::sequential_names(output, rasters.len());
                self.images.persist_each(rasters, &names).await?
            }
            Some(base) => vec![self.composite(&symbols, rasters, base, output).await?],
        };

        log::info!("wrote {} file(s)", created.len());
        Ok(WriteOutput {
            success: true,
            created,
        })
    }

    /// Decode every symbol in the image at `path`.
    pub async fn read_symbols(
        &self,
        path: impl AsRef<Path>,
        options: Option<&ReaderOptions>,
    ) -> Result<Vec<DecodedSymbol>> {
        let path = path.as_ref();
        let options = options.unwrap_or(&self.reader);

        let raster = self.images.load_file(path).await.map_err(as_decode)?;
        let codec = self.runtime.codec().await?;
        let found = codec.decode(&raster, options).await?;

        log::info!("found {} symbol(s) in {}", found.len(), path.display());
        Ok(found)
    }

    /// Encode every symbol concurrently, returning rasters in input order.
    ///
    /// Returns at the first failure; the remaining tasks are aborted when the
    /// set is dropped. Every raster must match its symbol's requested size.
    async fn encode_all(&self, symbols: &[ResolvedSymbol]) -> Result<Vec<RasterBuffer>> {
        let codec = self.runtime.codec().await?;

        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::with_capacity(symbols.len());
        for (index, symbol) in symbols.iter().enumerate() {
            let codec = codec.clone();
            let symbol = symbol.clone();
            let handle = tasks.spawn(async move { codec.encode(&symbol).await });
            task_index.insert(handle.id(), index);
        }

        let mut rasters: Vec<Option<RasterBuffer>> = (0..symbols.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (index, encoded) = match joined {
                Ok((id, encoded)) => (task_index[&id], encoded),
                Err(e) => {
                    let failed = BarstampError::encode(format!("encode task failed: {}", e));
                    return Err(match task_index.get(&e.id()) {
                        Some(&index) => failed.at_index(index),
                        None => failed,
                    });
                }
            };
            let raster = encoded.map_err(|e| e.at_index(index))?;
            let symbol = &symbols[index];
            if (raster.width(), raster.height()) != (symbol.width(), symbol.height()) {
                return Err(BarstampError::encode(format!(
                    "codec returned {}x{} raster for a {}x{} symbol",
                    raster.width(),
                    raster.height(),
                    symbol.width(),
                    symbol.height()
                ))
                .at_index(index));
            }
            log::debug!(
                "encoded symbol #{} as {}x{}",
                index,
                raster.width(),
                raster.height()
            );
            rasters[index] = Some(raster);
        }

        rasters
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| BarstampError::encode("encode results incomplete"))
    }

    async fn composite(
        &self,
        symbols: &[ResolvedSymbol],
        rasters: Vec<RasterBuffer>,
        base: &Base,
        output: &Path,
    ) -> Result<PersistedFile> {
        let canvas = match base {
            Base::Path(path) => self.images.load_file(path).await.map_err(|e| {
                BarstampError::Metadata(format!(
                    "cannot read base image {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Base::Blank(blank) => self.images.create_blank(&blank.resolve()).await?,
        };
        let (container_w, container_h) = (canvas.width(), canvas.height());

        let mut instructions = Vec::with_capacity(rasters.len());
        for (index, (symbol, raster)) in symbols.iter().zip(rasters).enumerate() {
            let placement = layout::resolve_placement(symbol, container_w, container_h)
                .map_err(|e| e.at_index(index))?;
            log::debug!(
                "symbol #{} at top {} left {} on {}x{}",
                index,
                placement.top,
                placement.left,
                container_w,
                container_h
            );
            instructions.push(CompositeInstruction { raster, placement });
        }

        self.images.composite(canvas, instructions, output).await
    }
}

/// Failures loading an input image on the read path are decode errors.
fn as_decode(error: BarstampError) -> BarstampError {
    match error {
        BarstampError::Decode(_) => error,
        other => BarstampError::Decode(other.to_string()),
    }
}

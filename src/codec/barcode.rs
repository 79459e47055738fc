//! # Native Barcode Codec
//!
//! Encodes with `qrcode` (QR), `barcoders` (Code 128, Code 39, EAN-13,
//! EAN-8, Codabar) and `pdf417` (PDF417). Decodes QR codes with `rqrr`.
//!
//! ## Rendering
//!
//! Every symbol is drawn into a raster of exactly the requested size:
//!
//! ```text
//! ┌──────────── width ────────────┐
//! │ margin                        │
//! │   ┌──── modules × scale ───┐  │
//! │   │ ▓▓ ▓ ▓▓▓  ▓ ▓▓  ▓▓▓ ▓  │  │  scale = largest integer that fits
//! │   └────────────────────────┘  │  inside the margin; symbol centered
//! └───────────────────────────────┘
//! ```
//!
//! Linear symbols scale their bars horizontally and fill the inner height.
//! A symbol that does not fit at scale 1 is rejected.

use async_trait::async_trait;
use barcoders::sym::codabar::Codabar;
use barcoders::sym::code39::Code39;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use qrcode::{EcLevel, QrCode};

use super::{BarcodeCodec, DecodedSymbol, Point, ReaderOptions};
use crate::canvas::Color;
use crate::error::{BarstampError, Result};
use crate::raster::{ChannelLayout, ColorSpace, RasterBuffer};
use crate::symbol::{CODEC_DEFAULT_ECC, ResolvedSymbol, SymbolFormat};

/// PDF417 row/column layouts, tried smallest first.
const PDF417_LAYOUTS: [(u8, u8); 6] = [(10, 4), (16, 6), (24, 8), (32, 12), (48, 18), (90, 30)];

/// PDF417 rows are drawn this many times taller than a module is wide.
const PDF417_ROW_ASPECT: usize = 3;

/// Symbol codec backed by pure-Rust encoder and decoder crates.
#[derive(Debug, Clone)]
pub struct NativeBarcodeCodec {
    foreground: Color,
    background: Color,
}

impl Default for NativeBarcodeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBarcodeCodec {
    /// Black symbols on white.
    pub fn new() -> Self {
        Self::with_colors(Color::BLACK, Color::WHITE)
    }

    pub fn with_colors(foreground: Color, background: Color) -> Self {
        Self {
            foreground,
            background,
        }
    }

    fn render(&self, symbol: &ResolvedSymbol) -> Result<RasterBuffer> {
        if symbol.content().is_empty() {
            return Err(BarstampError::encode("content is empty"));
        }
        let modules = symbol_modules(symbol)?;
        let (width, height) = (symbol.width() as usize, symbol.height() as usize);
        let margin = symbol.margin() as usize;

        let inner_w = width.saturating_sub(2 * margin);
        let inner_h = height.saturating_sub(2 * margin);
        let mut dark = vec![false; width * height];

        match modules {
            Modules::Matrix {
                columns,
                rows,
                row_aspect,
                cells,
            } => {
                let scale = (inner_w / columns).min(inner_h / (rows * row_aspect));
                if scale == 0 {
                    return Err(too_small(symbol, columns, rows * row_aspect));
                }
                let (sx, sy) = (scale, scale * row_aspect);
                let x0 = (width - columns * sx) / 2;
                let y0 = (height - rows * sy) / 2;
                for row in 0..rows {
                    for col in 0..columns {
                        if !cells[row * columns + col] {
                            continue;
                        }
                        for y in y0 + row * sy..y0 + (row + 1) * sy {
                            let line = y * width;
                            dark[line + x0 + col * sx..line + x0 + (col + 1) * sx].fill(true);
                        }
                    }
                }
            }
            Modules::Linear(bars) => {
                let scale = inner_w / bars.len().max(1);
                if scale == 0 || inner_h == 0 {
                    return Err(too_small(symbol, bars.len(), 1));
                }
                let x0 = (width - bars.len() * scale) / 2;
                for y in margin..margin + inner_h {
                    let line = y * width;
                    for (i, &bar) in bars.iter().enumerate() {
                        if bar {
                            dark[line + x0 + i * scale..line + x0 + (i + 1) * scale].fill(true);
                        }
                    }
                }
            }
        }

        let fg = [self.foreground.r, self.foreground.g, self.foreground.b];
        let bg = [self.background.r, self.background.g, self.background.b];
        let data = dark
            .iter()
            .flat_map(|&is_dark| if is_dark { fg } else { bg })
            .collect();
        RasterBuffer::new(
            symbol.width(),
            symbol.height(),
            ChannelLayout::Rgb,
            ColorSpace::Srgb,
            data,
        )
    }
}

#[async_trait]
impl BarcodeCodec for NativeBarcodeCodec {
    async fn encode(&self, symbol: &ResolvedSymbol) -> Result<RasterBuffer> {
        self.render(symbol)
    }

    async fn decode(
        &self,
        raster: &RasterBuffer,
        options: &ReaderOptions,
    ) -> Result<Vec<DecodedSymbol>> {
        if !options.accepts(SymbolFormat::QrCode) {
            return Ok(Vec::new());
        }

        let (width, height) = (raster.width() as usize, raster.height() as usize);
        let luma = raster.to_luma();
        let try_invert = options.try_invert;

        let mut found = tokio::task::spawn_blocking(move || {
            let mut found = scan_qr(&luma, width, height);
            if try_invert {
                let inverted: Vec<u8> = luma.iter().map(|v| 255 - v).collect();
                for symbol in scan_qr(&inverted, width, height) {
                    if !found.contains(&symbol) {
                        found.push(symbol);
                    }
                }
            }
            found
        })
        .await
        .map_err(|e| BarstampError::Decode(format!("scan task failed: {}", e)))?;

        if let Some(max) = options.max_symbols {
            found.truncate(max);
        }
        Ok(found)
    }
}

// ============================================================================
// MODULE GRIDS
// ============================================================================

/// Abstract symbol before scaling: which modules are dark.
enum Modules {
    Matrix {
        columns: usize,
        rows: usize,
        row_aspect: usize,
        cells: Vec<bool>,
    },
    Linear(Vec<bool>),
}

fn symbol_modules(symbol: &ResolvedSymbol) -> Result<Modules> {
    let content = symbol.content();
    let bytes = symbol.character_set().encode(content).ok_or_else(|| {
        BarstampError::encode(format!(
            "content is not representable in {:?}",
            symbol.character_set()
        ))
    })?;

    match symbol.format() {
        SymbolFormat::QrCode => qr_modules(&bytes, symbol.ecc_level()),
        SymbolFormat::Pdf417 => pdf417_modules(content),
        SymbolFormat::Code128 => {
            // Character set B covers upper, lower, digits and punctuation
            let prefixed = format!("\u{0181}{}", content);
            linear(SymbolFormat::Code128, Code128::new(&prefixed).map(|b| b.encode()))
        }
        SymbolFormat::Code39 => linear(SymbolFormat::Code39, Code39::new(content).map(|b| b.encode())),
        SymbolFormat::Ean13 => linear(SymbolFormat::Ean13, EAN13::new(content).map(|b| b.encode())),
        SymbolFormat::Ean8 => linear(SymbolFormat::Ean8, EAN8::new(content).map(|b| b.encode())),
        SymbolFormat::Codabar => {
            linear(SymbolFormat::Codabar, Codabar::new(content).map(|b| b.encode()))
        }
    }
}

/// Map the numeric ECC level onto QR's four levels.
fn qr_ec_level(level: i8) -> Result<EcLevel> {
    match level {
        CODEC_DEFAULT_ECC => Ok(EcLevel::M),
        0..=1 => Ok(EcLevel::L),
        2..=4 => Ok(EcLevel::M),
        5..=6 => Ok(EcLevel::Q),
        7..=8 => Ok(EcLevel::H),
        other => Err(BarstampError::validation(format!(
            "ECC level {} is outside -1..=8",
            other
        ))),
    }
}

fn qr_modules(bytes: &[u8], ecc_level: i8) -> Result<Modules> {
    let code = QrCode::with_error_correction_level(bytes, qr_ec_level(ecc_level)?)
        .map_err(|e| BarstampError::encode(format!("QR code generation failed: {}", e)))?;
    let size = code.width();
    let cells = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();
    Ok(Modules::Matrix {
        columns: size,
        rows: size,
        row_aspect: 1,
        cells,
    })
}

fn pdf417_modules(content: &str) -> Result<Modules> {
    use pdf417::{END_PATTERN, PDF417, PDF417Encoder, START_PATTERN};

    if !content.is_ascii() {
        return Err(BarstampError::encode("PDF417 content must be ASCII"));
    }

    for (rows, cols) in PDF417_LAYOUTS {
        let mut codewords = vec![0u16; rows as usize * cols as usize];
        let Some((level, filled)) = PDF417Encoder::new(&mut codewords, false)
            .append_ascii(content)
            .fit_seal()
        else {
            continue;
        };

        // start + left row indicator + data columns + right row indicator + end
        let columns = START_PATTERN.size() as usize
            + 17
            + cols as usize * 17
            + 17
            + END_PATTERN.size() as usize;
        let barcode = PDF417::new(filled, rows, cols, level);
        let mut cells = vec![false; columns * rows as usize];
        for (i, bit) in barcode.bits().enumerate() {
            if i < cells.len() {
                cells[i] = bit;
            }
        }
        return Ok(Modules::Matrix {
            columns,
            rows: rows as usize,
            row_aspect: PDF417_ROW_ASPECT,
            cells,
        });
    }

    Err(BarstampError::encode(format!(
        "{} characters do not fit in a PDF417 symbol",
        content.len()
    )))
}

fn linear<E: std::fmt::Display>(
    format: SymbolFormat,
    encoded: std::result::Result<Vec<u8>, E>,
) -> Result<Modules> {
    let modules = encoded
        .map_err(|e| BarstampError::encode(format!("{} encoding failed: {}", format, e)))?;
    Ok(Modules::Linear(modules.into_iter().map(|m| m == 1).collect()))
}

fn too_small(symbol: &ResolvedSymbol, columns: usize, rows: usize) -> BarstampError {
    BarstampError::encode(format!(
        "{} needs {}x{} modules but {}x{} with margin {} leaves no room",
        symbol.format(),
        columns,
        rows,
        symbol.width(),
        symbol.height(),
        symbol.margin()
    ))
}

// ============================================================================
// DECODING
// ============================================================================

fn scan_qr(luma: &[u8], width: usize, height: usize) -> Vec<DecodedSymbol> {
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);

    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| {
            let corners = grid.bounds.map(|p| Point { x: p.x, y: p.y });
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(_meta) => Some(DecodedSymbol {
                    text: payload_text(payload),
                    format: SymbolFormat::QrCode,
                    corners,
                }),
                Err(e) => {
                    log::debug!("skipping unreadable QR grid: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Byte-mode payloads are UTF-8 when valid, otherwise ISO-8859-1.
fn payload_text(payload: Vec<u8>) -> String {
    String::from_utf8(payload)
        .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| b as char).collect())
}

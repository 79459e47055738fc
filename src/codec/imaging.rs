//! # Native Image Codec
//!
//! File I/O and compositing on top of the `image` crate. Decoding, encoding
//! and compositing run on the blocking pool so they never stall the async
//! workers.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, imageops};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{CompositeInstruction, ImageCodec, PersistedFile};
use crate::canvas::ResolvedCanvas;
use crate::error::{BarstampError, Result};
use crate::raster::{ChannelLayout, RasterBuffer};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Image codec backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct NativeImageCodec {
    jpeg_quality: u8,
}

impl Default for NativeImageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl NativeImageCodec {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }
}

#[async_trait]
impl ImageCodec for NativeImageCodec {
    fn check_output(&self, path: &Path) -> Result<()> {
        let format = ImageFormat::from_path(path).map_err(|e| {
            BarstampError::validation(format!(
                "cannot infer image format of {}: {}",
                path.display(),
                e
            ))
        })?;
        if !format.writing_enabled() {
            return Err(BarstampError::validation(format!(
                "writing {:?} images is not supported",
                format
            )));
        }
        Ok(())
    }

    async fn load_file(&self, path: &Path) -> Result<RasterBuffer> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BarstampError::Decode(format!("failed to read {}: {}", path.display(), e)))?;
        let display = path.display().to_string();

        tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes).map_err(|e| {
                BarstampError::Decode(format!("failed to decode {}: {}", display, e))
            })?;
            RasterBuffer::from_dynamic(image)
        })
        .await
        .map_err(|e| BarstampError::Decode(format!("decode task failed: {}", e)))?
    }

    async fn create_blank(&self, canvas: &ResolvedCanvas) -> Result<RasterBuffer> {
        let layout = ChannelLayout::from_channels(canvas.channels()).ok_or_else(|| {
            BarstampError::validation(format!(
                "canvas channels must be 1-4, got {}",
                canvas.channels()
            ))
        })?;
        let bg = canvas.background();
        let pixel = match layout {
            ChannelLayout::Gray => vec![bg.luma()],
            ChannelLayout::GrayAlpha => vec![bg.luma(), bg.alpha],
            ChannelLayout::Rgb => vec![bg.r, bg.g, bg.b],
            ChannelLayout::Rgba => vec![bg.r, bg.g, bg.b, bg.alpha],
        };
        RasterBuffer::filled(canvas.width(), canvas.height(), layout, &pixel)
    }

    async fn composite(
        &self,
        base: RasterBuffer,
        instructions: Vec<CompositeInstruction>,
        output: &Path,
    ) -> Result<PersistedFile> {
        if let Some(other) = instructions
            .iter()
            .find(|i| i.raster.color_space() != base.color_space())
        {
            return Err(BarstampError::validation(format!(
                "cannot composite {:?} raster onto {:?} base",
                other.raster.color_space(),
                base.color_space()
            )));
        }
        let output = output.to_path_buf();
        let quality = self.jpeg_quality;

        tokio::task::spawn_blocking(move || {
            let layout = base.layout();
            let mut canvas = base.into_dynamic().to_rgba8();
            for instruction in instructions {
                let overlay = instruction.raster.into_dynamic().to_rgba8();
                imageops::overlay(
                    &mut canvas,
                    &overlay,
                    i64::from(instruction.placement.left),
                    i64::from(instruction.placement.top),
                );
            }
            let merged = DynamicImage::ImageRgba8(canvas);
            let merged = match layout {
                ChannelLayout::Gray => DynamicImage::ImageLuma8(merged.to_luma8()),
                ChannelLayout::GrayAlpha => DynamicImage::ImageLumaA8(merged.to_luma_alpha8()),
                ChannelLayout::Rgb => DynamicImage::ImageRgb8(merged.to_rgb8()),
                ChannelLayout::Rgba => merged,
            };
            save(merged, &output, quality)
        })
        .await
        .map_err(|e| BarstampError::persist(PathBuf::new(), format!("composite task failed: {}", e)))?
    }

    async fn persist_each(
        &self,
        rasters: Vec<RasterBuffer>,
        paths: &[PathBuf],
    ) -> Result<Vec<PersistedFile>> {
        if rasters.len() != paths.len() {
            return Err(BarstampError::validation(format!(
                "{} rasters but {} output names",
                rasters.len(),
                paths.len()
            )));
        }
        let paths = paths.to_vec();
        let quality = self.jpeg_quality;

        tokio::task::spawn_blocking(move || {
            rasters
                .into_iter()
                .zip(paths.iter())
                .map(|(raster, path)| save(raster.into_dynamic(), path, quality))
                .collect()
        })
        .await
        .map_err(|e| BarstampError::persist(PathBuf::new(), format!("persist task failed: {}", e)))?
    }
}

/// Adapt the pixel layout to what the target format's encoder accepts.
fn prepare_for(format: ImageFormat, image: DynamicImage) -> DynamicImage {
    let color = image.color();
    match format {
        ImageFormat::Jpeg if color.has_alpha() => {
            if color.has_color() {
                DynamicImage::ImageRgb8(image.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(image.to_luma8())
            }
        }
        ImageFormat::WebP | ImageFormat::Qoi if !color.has_color() => {
            if color.has_alpha() {
                DynamicImage::ImageRgba8(image.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8())
            }
        }
        _ => image,
    }
}

/// Encode `image` to `path` in the format named by its extension.
fn save(image: DynamicImage, path: &Path, jpeg_quality: u8) -> Result<PersistedFile> {
    let format = ImageFormat::from_path(path).map_err(|e| BarstampError::persist(path, e))?;
    let image = prepare_for(format, image);

    let file = File::create(path).map_err(|e| BarstampError::persist(path, e))?;
    let mut writer = BufWriter::new(file);
    let written = match format {
        ImageFormat::Jpeg => {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, jpeg_quality))
        }
        other => image.write_to(&mut writer, other),
    };
    written.map_err(|e| BarstampError::persist(path, e))?;
    writer.flush().map_err(|e| BarstampError::persist(path, e))?;

    let size = std::fs::metadata(path)
        .map_err(|e| BarstampError::persist(path, e))?
        .len();

    Ok(PersistedFile {
        path: path.to_path_buf(),
        format: format!("{:?}", format).to_lowercase(),
        width: image.width(),
        height: image.height(),
        channels: image.color().channel_count(),
        size,
    })
}

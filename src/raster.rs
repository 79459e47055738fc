//! # Raster Buffers
//!
//! [`RasterBuffer`] is the pixel payload that crosses every codec boundary.
//! It carries its own geometry, channel layout and color space, and cannot
//! be built with a data length that disagrees with them.

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use serde::Serialize;

use crate::error::{BarstampError, Result};

/// Channel arrangement of each pixel (8 bits per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> u8 {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(ChannelLayout::Gray),
            2 => Some(ChannelLayout::GrayAlpha),
            3 => Some(ChannelLayout::Rgb),
            4 => Some(ChannelLayout::Rgba),
            _ => None,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, ChannelLayout::GrayAlpha | ChannelLayout::Rgba)
    }
}

/// Color space the pixel values are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ColorSpace {
    #[default]
    Srgb,
}

/// A grid of 8-bit pixels, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    color_space: ColorSpace,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Wrap pixel data, checking it matches the declared geometry.
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        color_space: ColorSpace,
        data: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BarstampError::validation(format!(
                "raster dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * layout.channels() as usize;
        if data.len() != expected {
            return Err(BarstampError::validation(format!(
                "raster {}x{} {:?} needs {} bytes, got {}",
                width,
                height,
                layout,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            color_space,
            data,
        })
    }

    /// A raster with every pixel set to `pixel`.
    ///
    /// `pixel` must have exactly `layout.channels()` entries.
    pub fn filled(width: u32, height: u32, layout: ChannelLayout, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != layout.channels() as usize {
            return Err(BarstampError::validation(format!(
                "fill pixel has {} channels, layout {:?} needs {}",
                pixel.len(),
                layout,
                layout.channels()
            )));
        }
        let data = pixel.repeat(width as usize * height as usize);
        Self::new(width, height, layout, ColorSpace::Srgb, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Channel values of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.layout.channels() as usize;
        let start = (y as usize * self.width as usize + x as usize) * channels;
        self.data.get(start..start + channels)
    }

    /// Luminance plane, one byte per pixel. Alpha is composited over white.
    pub fn to_luma(&self) -> Vec<u8> {
        let channels = self.layout.channels() as usize;
        self.data
            .chunks_exact(channels)
            .map(|px| {
                let luma = match self.layout {
                    ChannelLayout::Gray | ChannelLayout::GrayAlpha => px[0] as f32,
                    ChannelLayout::Rgb | ChannelLayout::Rgba => rec601(px[0], px[1], px[2]),
                };
                let alpha = if self.layout.has_alpha() { px[channels - 1] } else { 255 };
                let a = alpha as f32 / 255.0;
                (luma * a + 255.0 * (1.0 - a)).round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Convert into an `image` crate buffer of the same layout.
    pub fn into_dynamic(self) -> DynamicImage {
        let (w, h) = (self.width, self.height);
        // Lengths were checked in `new`, so the `from_raw` calls cannot fail
        let converted = match self.layout {
            ChannelLayout::Gray => GrayImage::from_raw(w, h, self.data).map(DynamicImage::ImageLuma8),
            ChannelLayout::GrayAlpha => {
                GrayAlphaImage::from_raw(w, h, self.data).map(DynamicImage::ImageLumaA8)
            }
            ChannelLayout::Rgb => RgbImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgb8),
            ChannelLayout::Rgba => {
                RgbaImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgba8)
            }
        };
        converted.unwrap_or_else(|| DynamicImage::new_rgba8(w, h))
    }

    /// Build from an `image` crate buffer, converting to 8-bit channels.
    ///
    /// 16-bit and float images are narrowed; layouts without a direct 8-bit
    /// equivalent become RGB or RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let (w, h) = (image.width(), image.height());
        let (layout, data) = match image {
            DynamicImage::ImageLuma8(img) => (ChannelLayout::Gray, img.into_raw()),
            DynamicImage::ImageLumaA8(img) => (ChannelLayout::GrayAlpha, img.into_raw()),
            DynamicImage::ImageRgb8(img) => (ChannelLayout::Rgb, img.into_raw()),
            DynamicImage::ImageRgba8(img) => (ChannelLayout::Rgba, img.into_raw()),
            other if other.color().has_alpha() => (ChannelLayout::Rgba, other.to_rgba8().into_raw()),
            other => (ChannelLayout::Rgb, other.to_rgb8().into_raw()),
        };
        Self::new(w, h, layout, ColorSpace::Srgb, data)
    }
}

fn rec601(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    #[test]
    fn test_new_checks_length() {
        let err = RasterBuffer::new(2, 2, ChannelLayout::Rgb, ColorSpace::Srgb, vec![0; 11])
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Validation);
        assert!(RasterBuffer::new(2, 2, ChannelLayout::Rgb, ColorSpace::Srgb, vec![0; 12]).is_ok());
    }

    #[test]
    fn test_new_rejects_zero_size() {
        assert!(RasterBuffer::new(0, 3, ChannelLayout::Gray, ColorSpace::Srgb, vec![]).is_err());
    }

    #[test]
    fn test_filled_and_pixel() {
        let raster = RasterBuffer::filled(3, 2, ChannelLayout::Rgba, &[1, 2, 3, 4]).unwrap();
        assert_eq!(raster.data().len(), 24);
        assert_eq!(raster.pixel(2, 1), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(raster.pixel(3, 0), None);
        assert!(RasterBuffer::filled(1, 1, ChannelLayout::Rgb, &[0, 0]).is_err());
    }

    #[test]
    fn test_to_luma() {
        let raster = RasterBuffer::new(
            3,
            1,
            ChannelLayout::Rgba,
            ColorSpace::Srgb,
            vec![0, 0, 0, 255, 255, 255, 255, 255, 0, 0, 0, 0],
        )
        .unwrap();
        // Fully transparent black reads as white background
        assert_eq!(raster.to_luma(), vec![0, 255, 255]);

        let gray = RasterBuffer::new(
            2,
            1,
            ChannelLayout::GrayAlpha,
            ColorSpace::Srgb,
            vec![0, 255, 0, 0],
        )
        .unwrap();
        assert!(gray.layout().has_alpha());
        assert_eq!(gray.to_luma(), vec![0, 255]);
        assert!(!ChannelLayout::Rgb.has_alpha());
    }

    #[test]
    fn test_dynamic_conversion_keeps_layout() {
        let raster = RasterBuffer::filled(4, 5, ChannelLayout::GrayAlpha, &[10, 200]).unwrap();
        let back = RasterBuffer::from_dynamic(raster.clone().into_dynamic()).unwrap();
        assert_eq!(back, raster);
    }

    #[test]
    fn test_from_dynamic_narrows_16_bit() {
        let wide = DynamicImage::new_rgb16(2, 2);
        let raster = RasterBuffer::from_dynamic(wide).unwrap();
        assert_eq!(raster.layout(), ChannelLayout::Rgb);
        assert_eq!(raster.color_space(), ColorSpace::Srgb);
        assert_eq!(raster.data().len(), 12);
    }
}

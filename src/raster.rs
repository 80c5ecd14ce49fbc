//! fixed-size RGBA pixel store shared by the target image and the evolving canvas.
//!
//! layout is row-major R,G,B,A with 8 bits per channel and no row padding, so
//! pixel (x, y) lives at byte offset `(y * width + x) * 4`.

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};

/// un-premultiplied 8-bit color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// zero-filled raster
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; byte_len(width, height)],
        }
    }

    /// wrap existing RGBA bytes; the length must be exactly `width * height * 4`
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> TraceResult<Self> {
        let expected = byte_len(width, height);
        if pixels.len() != expected {
            return Err(TraceError::DimensionMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// solid raster of one color
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let mut raster = Self::new(width, height);
        raster.fill(color);
        raster
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// raw RGBA bytes (read-only)
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    pub fn fill(&mut self, color: Rgba) {
        profiling::scope!("Raster::fill");
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = color.a;
        }
    }

    /// checked pixel read. the engine's inner loops index the byte buffer
    /// directly and rely on rasterization having clipped every span.
    pub fn pixel(&self, x: u32, y: u32) -> TraceResult<Rgba> {
        if x >= self.width || y >= self.height {
            return Err(TraceError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        Ok(Rgba::new(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ))
    }

    /// mean of each color channel over all pixels, rounded, with alpha forced to 255.
    /// an empty raster averages to opaque black.
    pub fn average_color(&self) -> Rgba {
        profiling::scope!("Raster::average_color");
        let count = self.pixel_count() as u64;
        if count == 0 {
            return Rgba::opaque(0, 0, 0);
        }

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for px in self.pixels.chunks_exact(4) {
            r += px[0] as u64;
            g += px[1] as u64;
            b += px[2] as u64;
        }

        Rgba::opaque(
            rounded_mean(r, count),
            rounded_mean(g, count),
            rounded_mean(b, count),
        )
    }
}

#[inline]
fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// round-half-up integer mean, matching `Math.round(sum / count)` for non-negative sums
#[inline]
pub(crate) fn rounded_mean(sum: u64, count: u64) -> u8 {
    ((2 * sum + count) / (2 * count)).min(255) as u8
}

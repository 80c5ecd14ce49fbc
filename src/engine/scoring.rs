//! per-shape color, energy delta and compositing over a span set.
//!
//! all loops index the flat RGBA buffers through a precomputed row stride and
//! trust the spans to be clipped already; bounds are only checked in debug builds.

use crate::raster::{Raster, Rgba, rounded_mean};
use crate::shapes::Scanline;

#[inline]
fn span_offset(line: &Scanline, width: u32, len: usize) -> usize {
    debug_assert!(line.x1 <= line.x2 && line.x2 < width, "span {line:?} exceeds width {width}");
    let idx = (line.y as usize * width as usize + line.x1 as usize) * 4;
    debug_assert!(idx + line.count() as usize * 4 <= len, "span {line:?} exceeds buffer");
    idx
}

/// mean target color under the spans, painted at `alpha`. `None` if nothing is covered.
pub fn region_color(target: &Raster, lines: &[Scanline], alpha: u8) -> Option<Rgba> {
    profiling::scope!("region_color");
    let data = target.as_bytes();
    let width = target.width();
    let (mut r, mut g, mut b, mut count) = (0u64, 0u64, 0u64, 0u64);

    for line in lines {
        let start = span_offset(line, width, data.len());
        let end = start + line.count() as usize * 4;
        for px in data[start..end].chunks_exact(4) {
            r += px[0] as u64;
            g += px[1] as u64;
            b += px[2] as u64;
        }
        count += line.count() as u64;
    }

    if count == 0 {
        return None;
    }
    Some(Rgba::new(
        rounded_mean(r, count),
        rounded_mean(g, count),
        rounded_mean(b, count),
        alpha,
    ))
}

/// signed change in RGB squared error if `color` were composited over the spans.
/// negative means the canvas would move closer to the target.
pub fn energy_delta(target: &Raster, current: &Raster, lines: &[Scanline], color: Rgba) -> f64 {
    profiling::scope!("energy_delta");
    debug_assert_eq!(target.width(), current.width());
    debug_assert_eq!(target.height(), current.height());

    let t = target.as_bytes();
    let c = current.as_bytes();
    let width = target.width();
    let a = color.a as f64 / 255.0;
    let inv = 1.0 - a;
    let paint = [color.r as f64 * a, color.g as f64 * a, color.b as f64 * a];

    // new values are quantized exactly as `composite` stores them
    let mut delta = 0i64;
    for line in lines {
        let start = span_offset(line, width, t.len());
        let end = start + line.count() as usize * 4;
        for (tp, cp) in t[start..end].chunks_exact(4).zip(c[start..end].chunks_exact(4)) {
            for ch in 0..3 {
                let tv = tp[ch] as i64;
                let cv = cp[ch] as i64;
                let nv = blend_channel(paint[ch], cp[ch], inv) as i64;
                delta += (tv - nv) * (tv - nv) - (tv - cv) * (tv - cv);
            }
        }
    }
    delta as f64
}

/// alpha-blend `color` over the spans in place; written pixels become opaque
pub fn composite(raster: &mut Raster, lines: &[Scanline], color: Rgba) {
    profiling::scope!("composite");
    let width = raster.width();
    let data = raster.as_bytes_mut();
    let a = color.a as f64 / 255.0;
    let inv = 1.0 - a;
    let paint = [color.r as f64 * a, color.g as f64 * a, color.b as f64 * a];

    for line in lines {
        let start = span_offset(line, width, data.len());
        let end = start + line.count() as usize * 4;
        for px in data[start..end].chunks_exact_mut(4) {
            for ch in 0..3 {
                px[ch] = blend_channel(paint[ch], px[ch], inv);
            }
            px[3] = 255;
        }
    }
}

/// `paint + old * (1 - a)` stored like a clamped byte array: ties to even, clamped to [0, 255]
#[inline]
fn blend_channel(paint: f64, old: u8, inv: f64) -> u8 {
    (paint + old as f64 * inv).round_ties_even().clamp(0.0, 255.0) as u8
}

/// RGB squared error between two rasters restricted to the spans
pub fn region_squared_error(target: &Raster, current: &Raster, lines: &[Scanline]) -> u64 {
    let t = target.as_bytes();
    let c = current.as_bytes();
    let width = target.width();
    let mut total = 0u64;
    for line in lines {
        let start = span_offset(line, width, t.len());
        let end = start + line.count() as usize * 4;
        total += super::metrics::squared_error_rgb(&t[start..end], &c[start..end]);
    }
    total
}

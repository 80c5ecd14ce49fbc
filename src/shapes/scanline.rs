//! scanline rasterizer shared by the primitive variants.
//!
//! all functions return inclusive spans clipped to `[0, width-1] x [0, height-1]`
//! and expect a non-empty canvas (checked by `Shape::rasterize`).

use super::{Ellipse, Rectangle, RotatedEllipse};

/// inclusive horizontal run of pixels `x1..=x2` on row `y`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scanline {
    pub y: u32,
    pub x1: u32,
    pub x2: u32,
}

impl Scanline {
    #[inline]
    pub fn count(&self) -> u32 {
        self.x2 - self.x1 + 1
    }
}

/// round to nearest with halves going up (towards +inf)
#[inline]
pub(crate) fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// clip an unclipped `[x1, x2]` run on row `y`; `None` when it misses the canvas
#[inline]
fn clip_span(y: i32, x1: i32, x2: i32, width: u32) -> Option<Scanline> {
    let max_x = width as i32 - 1;
    if x1 > x2 || x2 < 0 || x1 > max_x {
        return None;
    }
    Some(Scanline {
        y: y as u32,
        x1: x1.max(0) as u32,
        x2: x2.min(max_x) as u32,
    })
}

pub fn rect(r: &Rectangle, width: u32, height: u32) -> Vec<Scanline> {
    let (sx, ex) = (r.x1.min(r.x2), r.x1.max(r.x2));
    let (sy, ey) = (r.y1.min(r.y2), r.y1.max(r.y2));
    let max_y = height as i32 - 1;
    if ey < 0 || sy > max_y {
        return Vec::new();
    }

    (sy.max(0)..=ey.min(max_y))
        .filter_map(|y| clip_span(y, sx, ex, width))
        .collect()
}

/// even-odd scanline fill of an integer polygon.
///
/// a row `y` crosses edge (i, j) when `(vi.y < y <= vj.y) xor (vj.y < y <= vi.y)`;
/// sorted crossings are paired 0-1, 2-3, ... and an odd leftover is dropped.
/// pairs that overlap after clipping are merged into one span.
pub fn polygon(vertices: &[(i32, i32)], width: u32, height: u32) -> Vec<Scanline> {
    let mut lines = Vec::new();
    if vertices.len() < 3 {
        return lines;
    }

    let min_y = vertices.iter().map(|v| v.1).min().unwrap_or(0);
    let max_y = vertices.iter().map(|v| v.1).max().unwrap_or(0);
    let last_row = height as i32 - 1;
    if max_y < 0 || min_y > last_row {
        return lines;
    }

    let mut nodes: Vec<i32> = Vec::with_capacity(vertices.len());
    for y in min_y.max(0)..=max_y.min(last_row) {
        nodes.clear();
        let mut j = vertices.len() - 1;
        for i in 0..vertices.len() {
            let (xi, yi) = vertices[i];
            let (xj, yj) = vertices[j];
            if (yi < y && yj >= y) || (yj < y && yi >= y) {
                let t = (y as i64 - yi as i64) as f64 / (yj as i64 - yi as i64) as f64;
                nodes.push(round_half_up(xi as f64 + t * (xj as i64 - xi as i64) as f64));
            }
            j = i;
        }

        nodes.sort_unstable();
        for pair in nodes.chunks_exact(2) {
            let Some(line) = clip_span(y, pair[0], pair[1], width) else {
                continue;
            };
            // rounding can make a tiny quad touch itself; keep spans disjoint
            match lines.last_mut() {
                Some(prev) if prev.y == line.y && line.x1 <= prev.x2 => prev.x2 = prev.x2.max(line.x2),
                _ => lines.push(line),
            }
        }
    }
    lines
}

/// exact per-row half width from the ellipse equation
pub fn ellipse(e: &Ellipse, width: u32, height: u32) -> Vec<Scanline> {
    let last_row = height as i32 - 1;
    let y_start = e.y.saturating_sub(e.ry).clamp(0, last_row);
    let y_end = e.y.saturating_add(e.ry).clamp(0, last_row);
    let rx2 = (e.rx as f64).powi(2);
    let ry2 = (e.ry as f64).powi(2);
    let cx = e.x as f64;

    let mut lines = Vec::new();
    for y in y_start..=y_end {
        let dy2 = (y as f64 - e.y as f64).powi(2);
        if dy2 >= ry2 {
            continue;
        }
        let half = ((1.0 - dy2 / ry2) * rx2).sqrt();
        let x1 = (cx - half).floor() as i32;
        let x2 = (cx + half).floor() as i32;
        if let Some(line) = clip_span(y, x1, x2, width) {
            lines.push(line);
        }
    }
    lines
}

/// rotated ellipse by brute-force membership over its bounding box.
///
/// costs O(bbox area) rather than O(rows); shapes are kept small relative to the
/// canvas so this stays cheap enough for the hill-climb.
pub fn rotated_ellipse(e: &RotatedEllipse, width: u32, height: u32) -> Vec<Scanline> {
    let (sin, cos) = (e.angle as f64).to_radians().sin_cos();
    let rx = e.rx as f64;
    let ry = e.ry as f64;
    let cx = e.x as f64;
    let cy = e.y as f64;

    // half extents of the rotated semi-axes
    let (ux, uy) = (rx * cos, rx * sin);
    let (vx, vy) = (-ry * sin, ry * cos);
    let hw = (ux * ux + vx * vx).sqrt();
    let hh = (uy * uy + vy * vy).sqrt();

    let last_col = width as i32 - 1;
    let last_row = height as i32 - 1;
    let x_min = ((cx - hw).floor() as i32).clamp(0, last_col);
    let x_max = ((cx + hw).ceil() as i32).clamp(0, last_col);
    let y_min = ((cy - hh).floor() as i32).clamp(0, last_row);
    let y_max = ((cy + hh).ceil() as i32).clamp(0, last_row);

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let inside = |x: i32, y: i32| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let tdx = dx * cos + dy * sin;
        let tdy = -dx * sin + dy * cos;
        tdx * tdx / rx2 + tdy * tdy / ry2 <= 1.0
    };

    let mut lines = Vec::new();
    for y in y_min..=y_max {
        let Some(first) = (x_min..=x_max).find(|&x| inside(x, y)) else {
            continue;
        };
        let last = (first..=x_max).rev().find(|&x| inside(x, y)).unwrap_or(first);
        lines.push(Scanline {
            y: y as u32,
            x1: first as u32,
            x2: last as u32,
        });
    }
    lines
}

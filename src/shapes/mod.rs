//! closed set of paintable primitives.
//!
//! every variant carries plain integer pixel parameters and can rasterize itself
//! into clipped horizontal spans, perturb itself in place, and report its tag and
//! raw parameter vector for the host. dispatch is a `match` over [`Shape`].

pub mod mutate;
pub mod scanline;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};

pub use scanline::Scanline;

/// largest coordinate, size or angle magnitude accepted from a raw parameter vector
pub const MAX_COORD: i32 = 1 << 20;

/// shape type tag, spelled exactly as the host expects it on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    RotatedRectangle,
    Ellipse,
    RotatedEllipse,
    Triangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Rectangle,
        ShapeKind::RotatedRectangle,
        ShapeKind::Ellipse,
        ShapeKind::RotatedEllipse,
        ShapeKind::Triangle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::RotatedRectangle => "RotatedRectangle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::RotatedEllipse => "RotatedEllipse",
            ShapeKind::Triangle => "Triangle",
        }
    }

    /// length of the raw parameter vector for this kind
    pub fn param_count(self) -> usize {
        match self {
            ShapeKind::Rectangle | ShapeKind::Ellipse => 4,
            ShapeKind::RotatedRectangle | ShapeKind::RotatedEllipse => 5,
            ShapeKind::Triangle => 6,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| TraceError::UnknownShapeType(s.to_owned()))
    }
}

/// axis-aligned box between two unordered corners
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rectangle {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// box of size `w` x `h` rotated by `angle` degrees about its center `(x, y)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotatedRectangle {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub angle: i32,
}

/// axis-aligned ellipse centered at `(x, y)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ellipse {
    pub x: i32,
    pub y: i32,
    pub rx: i32,
    pub ry: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotatedEllipse {
    pub x: i32,
    pub y: i32,
    pub rx: i32,
    pub ry: i32,
    pub angle: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub x3: i32,
    pub y3: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Rectangle(Rectangle),
    RotatedRectangle(RotatedRectangle),
    Ellipse(Ellipse),
    RotatedEllipse(RotatedEllipse),
    Triangle(Triangle),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::RotatedRectangle(_) => ShapeKind::RotatedRectangle,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
            Shape::RotatedEllipse(_) => ShapeKind::RotatedEllipse,
            Shape::Triangle(_) => ShapeKind::Triangle,
        }
    }

    /// ordered parameter vector, matching the field order of each variant
    pub fn raw_data(&self) -> Vec<i32> {
        match *self {
            Shape::Rectangle(r) => vec![r.x1, r.y1, r.x2, r.y2],
            Shape::RotatedRectangle(r) => vec![r.x, r.y, r.w, r.h, r.angle],
            Shape::Ellipse(e) => vec![e.x, e.y, e.rx, e.ry],
            Shape::RotatedEllipse(e) => vec![e.x, e.y, e.rx, e.ry, e.angle],
            Shape::Triangle(t) => vec![t.x1, t.y1, t.x2, t.y2, t.x3, t.y3],
        }
    }

    /// rebuild a shape from its tag and raw parameters (inverse of [`Shape::raw_data`])
    pub fn from_raw(kind: ShapeKind, data: &[i32]) -> TraceResult<Self> {
        if data.len() != kind.param_count() {
            return Err(TraceError::invalid_shape(
                kind.as_str(),
                format!("expected {} values, got {}", kind.param_count(), data.len()),
            ));
        }
        if let Some(v) = data.iter().find(|v| v.unsigned_abs() > MAX_COORD as u32) {
            return Err(TraceError::invalid_shape(
                kind.as_str(),
                format!("value {v} outside +/-{MAX_COORD}"),
            ));
        }
        let sizes_ok = |a: i32, b: i32| -> TraceResult<()> {
            if a < 1 || b < 1 {
                return Err(TraceError::invalid_shape(kind.as_str(), "sizes must be >= 1"));
            }
            Ok(())
        };

        let shape = match kind {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle {
                x1: data[0],
                y1: data[1],
                x2: data[2],
                y2: data[3],
            }),
            ShapeKind::RotatedRectangle => {
                sizes_ok(data[2], data[3])?;
                Shape::RotatedRectangle(RotatedRectangle {
                    x: data[0],
                    y: data[1],
                    w: data[2],
                    h: data[3],
                    angle: mutate::wrap_angle(data[4]),
                })
            }
            ShapeKind::Ellipse => {
                sizes_ok(data[2], data[3])?;
                Shape::Ellipse(Ellipse {
                    x: data[0],
                    y: data[1],
                    rx: data[2],
                    ry: data[3],
                })
            }
            ShapeKind::RotatedEllipse => {
                sizes_ok(data[2], data[3])?;
                Shape::RotatedEllipse(RotatedEllipse {
                    x: data[0],
                    y: data[1],
                    rx: data[2],
                    ry: data[3],
                    angle: mutate::wrap_angle(data[4]),
                })
            }
            ShapeKind::Triangle => Shape::Triangle(Triangle {
                x1: data[0],
                y1: data[1],
                x2: data[2],
                y2: data[3],
                x3: data[4],
                y3: data[5],
            }),
        };
        Ok(shape)
    }

    /// y-ascending, non-overlapping spans covered by this shape, clipped to the canvas.
    /// regenerated on every call since the parameters change between calls.
    pub fn rasterize(&self, width: u32, height: u32) -> Vec<Scanline> {
        profiling::scope!("Shape::rasterize");
        if width == 0 || height == 0 {
            return Vec::new();
        }
        match self {
            Shape::Rectangle(r) => scanline::rect(r, width, height),
            Shape::RotatedRectangle(r) => scanline::polygon(&r.corners(), width, height),
            Shape::Ellipse(e) => scanline::ellipse(e, width, height),
            Shape::RotatedEllipse(e) => scanline::rotated_ellipse(e, width, height),
            Shape::Triangle(t) => {
                scanline::polygon(&[(t.x1, t.y1), (t.x2, t.y2), (t.x3, t.y3)], width, height)
            }
        }
    }
}

impl RotatedRectangle {
    /// the four corners rotated about the center, rounded to whole pixels
    pub fn corners(&self) -> [(i32, i32); 4] {
        let (sin, cos) = (self.angle as f64).to_radians().sin_cos();
        let w2 = self.w as f64 / 2.0;
        let h2 = self.h as f64 / 2.0;
        let cx = self.x as f64;
        let cy = self.y as f64;

        [(-w2, -h2), (w2, -h2), (w2, h2), (-w2, h2)].map(|(px, py)| {
            (
                scanline::round_half_up(cx + px * cos - py * sin),
                scanline::round_half_up(cy + px * sin + py * cos),
            )
        })
    }
}

impl From<Rectangle> for Shape {
    fn from(v: Rectangle) -> Self {
        Shape::Rectangle(v)
    }
}

impl From<RotatedRectangle> for Shape {
    fn from(v: RotatedRectangle) -> Self {
        Shape::RotatedRectangle(v)
    }
}

impl From<Ellipse> for Shape {
    fn from(v: Ellipse) -> Self {
        Shape::Ellipse(v)
    }
}

impl From<RotatedEllipse> for Shape {
    fn from(v: RotatedEllipse) -> Self {
        Shape::RotatedEllipse(v)
    }
}

impl From<Triangle> for Shape {
    fn from(v: Triangle) -> Self {
        Shape::Triangle(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_round_trip_through_from_str() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.as_str().parse::<ShapeKind>().unwrap(), kind);
        }
        assert!(matches!(
            "Hexagon".parse::<ShapeKind>(),
            Err(TraceError::UnknownShapeType(_))
        ));
    }

    #[test]
    fn raw_data_follows_field_order() {
        let s: Shape = RotatedEllipse { x: 1, y: 2, rx: 3, ry: 4, angle: 5 }.into();
        assert_eq!(s.kind(), ShapeKind::RotatedEllipse);
        assert_eq!(s.raw_data(), vec![1, 2, 3, 4, 5]);

        let t: Shape = Triangle { x1: 1, y1: 2, x2: 3, y2: 4, x3: 5, y3: 6 }.into();
        assert_eq!(t.raw_data(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn from_raw_rebuilds_the_same_shape() {
        let s: Shape = RotatedRectangle { x: 10, y: 11, w: 4, h: 9, angle: 300 }.into();
        let back = Shape::from_raw(s.kind(), &s.raw_data()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn from_raw_rejects_bad_vectors() {
        assert!(Shape::from_raw(ShapeKind::Triangle, &[1, 2, 3]).is_err());
        assert!(Shape::from_raw(ShapeKind::Ellipse, &[5, 5, 0, 3]).is_err());
    }

    #[test]
    fn from_raw_rejects_out_of_range_values() {
        for (kind, data) in [
            (ShapeKind::Ellipse, vec![5, 5, 3, i32::MAX]),
            (ShapeKind::Triangle, vec![0, i32::MIN, 5, 5, 0, 7]),
            (ShapeKind::Rectangle, vec![0, 0, MAX_COORD + 1, 4]),
        ] {
            let err = Shape::from_raw(kind, &data).unwrap_err();
            assert!(matches!(err, TraceError::InvalidShapeData { .. }), "{kind}: {err}");
        }
        assert!(Shape::from_raw(ShapeKind::Rectangle, &[-MAX_COORD, 0, MAX_COORD, 4]).is_ok());
    }

    #[test]
    fn extreme_shapes_rasterize_without_overflow() {
        let wide: Shape = Ellipse { x: 5, y: 5, rx: 3, ry: i32::MAX }.into();
        let lines = wide.rasterize(16, 16);
        assert_eq!(lines.len(), 16);

        let tall: Shape = Triangle { x1: 0, y1: i32::MIN, x2: 5, y2: 5, x3: 0, y3: 7 }.into();
        for l in tall.rasterize(16, 16) {
            assert!(l.y < 16 && l.x2 < 16);
        }
    }

    #[test]
    fn rotated_rectangle_at_ninety_degrees_swaps_extents() {
        let r = RotatedRectangle { x: 10, y: 10, w: 4, h: 2, angle: 90 };
        assert_eq!(r.corners(), [(11, 8), (11, 12), (9, 12), (9, 8)]);

        let lines = Shape::from(r).rasterize(32, 32);
        let rows: Vec<_> = lines.iter().map(|l| (l.y, l.x1, l.x2)).collect();
        assert_eq!(rows, vec![(9, 9, 11), (10, 9, 11), (11, 9, 11), (12, 9, 11)]);

        let flat = Shape::from(RotatedRectangle { angle: 0, ..r }).rasterize(32, 32);
        let rows: Vec<_> = flat.iter().map(|l| (l.y, l.x1, l.x2)).collect();
        assert_eq!(rows, vec![(10, 8, 12), (11, 8, 12)]);
    }

    #[test]
    fn from_raw_wraps_negative_angles() {
        let s = Shape::from_raw(ShapeKind::RotatedEllipse, &[5, 5, 2, 3, -10]).unwrap();
        assert_eq!(s.raw_data()[4], 350);
    }

    #[test]
    fn rotated_rectangle_at_zero_degrees_is_axis_aligned() {
        let r = RotatedRectangle { x: 10, y: 10, w: 4, h: 2, angle: 0 };
        assert_eq!(r.corners(), [(8, 9), (12, 9), (12, 11), (8, 11)]);
    }

    #[test]
    fn zero_sized_canvas_rasterizes_nothing() {
        let s: Shape = Rectangle { x1: 0, y1: 0, x2: 3, y2: 3 }.into();
        assert!(s.rasterize(0, 10).is_empty());
        assert!(s.rasterize(10, 0).is_empty());
    }
}

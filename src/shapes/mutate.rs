//! random construction and bounded perturbation of shapes.
//!
//! a mutation picks one parameter group uniformly and nudges it by a uniform
//! integer offset in [-16, 16] px (or [-4, 4] degrees for angles), then clamps the
//! result back into the canvas.

use rand::Rng;

use super::{Ellipse, Rectangle, RotatedEllipse, RotatedRectangle, Shape, ShapeKind, Triangle};

/// max positional / size jitter per mutation, in pixels
pub const POSITION_STEP: i32 = 16;
/// max angular jitter per mutation, in degrees
pub const ANGLE_STEP: i32 = 4;
/// upper bound for sizes and radii of freshly created shapes
pub const MAX_INITIAL_SIZE: i32 = 32;

/// normalize degrees into [0, 360)
#[inline]
pub fn wrap_angle(angle: i32) -> i32 {
    angle.rem_euclid(360)
}

#[inline]
fn coord<R: Rng>(rng: &mut R, extent: u32) -> i32 {
    rng.random_range(0..extent.max(1) as i32)
}

#[inline]
fn size<R: Rng>(rng: &mut R) -> i32 {
    rng.random_range(1..=MAX_INITIAL_SIZE)
}

#[inline]
fn angle<R: Rng>(rng: &mut R) -> i32 {
    rng.random_range(0..360)
}

/// uniformly random shape of the given kind with its anchor points on the canvas
pub fn random_shape<R: Rng>(kind: ShapeKind, width: u32, height: u32, rng: &mut R) -> Shape {
    match kind {
        ShapeKind::Rectangle => Rectangle {
            x1: coord(rng, width),
            y1: coord(rng, height),
            x2: coord(rng, width),
            y2: coord(rng, height),
        }
        .into(),
        ShapeKind::RotatedRectangle => RotatedRectangle {
            x: coord(rng, width),
            y: coord(rng, height),
            w: size(rng),
            h: size(rng),
            angle: angle(rng),
        }
        .into(),
        ShapeKind::Ellipse => Ellipse {
            x: coord(rng, width),
            y: coord(rng, height),
            rx: size(rng),
            ry: size(rng),
        }
        .into(),
        ShapeKind::RotatedEllipse => RotatedEllipse {
            x: coord(rng, width),
            y: coord(rng, height),
            rx: size(rng),
            ry: size(rng),
            angle: angle(rng),
        }
        .into(),
        ShapeKind::Triangle => Triangle {
            x1: coord(rng, width),
            y1: coord(rng, height),
            x2: coord(rng, width),
            y2: coord(rng, height),
            x3: coord(rng, width),
            y3: coord(rng, height),
        }
        .into(),
    }
}

/// clamp bounds for one mutation, derived from the canvas size
struct Bounds {
    width: u32,
    height: u32,
}

impl Bounds {
    #[inline]
    fn jitter<R: Rng>(rng: &mut R) -> i32 {
        rng.random_range(-POSITION_STEP..=POSITION_STEP)
    }

    #[inline]
    fn x<R: Rng>(&self, v: i32, rng: &mut R) -> i32 {
        (v + Self::jitter(rng)).clamp(0, (self.width as i32 - 1).max(0))
    }

    #[inline]
    fn y<R: Rng>(&self, v: i32, rng: &mut R) -> i32 {
        (v + Self::jitter(rng)).clamp(0, (self.height as i32 - 1).max(0))
    }

    /// sizes stay within [1, limit]
    #[inline]
    fn size<R: Rng>(v: i32, limit: i32, rng: &mut R) -> i32 {
        (v + Self::jitter(rng)).clamp(1, limit.max(1))
    }

    #[inline]
    fn angle<R: Rng>(v: i32, rng: &mut R) -> i32 {
        wrap_angle(v + rng.random_range(-ANGLE_STEP..=ANGLE_STEP))
    }
}

impl Shape {
    /// perturb one randomly chosen parameter group in place
    pub fn mutate<R: Rng>(&mut self, width: u32, height: u32, rng: &mut R) {
        profiling::scope!("Shape::mutate");
        let b = Bounds { width, height };
        let w = width as i32;
        let h = height as i32;

        match self {
            Shape::Rectangle(r) => {
                if rng.random_range(0..2) == 0 {
                    r.x1 = b.x(r.x1, rng);
                    r.y1 = b.y(r.y1, rng);
                } else {
                    r.x2 = b.x(r.x2, rng);
                    r.y2 = b.y(r.y2, rng);
                }
            }
            Shape::RotatedRectangle(r) => match rng.random_range(0..3) {
                0 => {
                    r.x = b.x(r.x, rng);
                    r.y = b.y(r.y, rng);
                }
                1 => {
                    r.w = Bounds::size(r.w, w, rng);
                    r.h = Bounds::size(r.h, h, rng);
                }
                _ => r.angle = Bounds::angle(r.angle, rng),
            },
            Shape::Ellipse(e) => match rng.random_range(0..3) {
                0 => {
                    e.x = b.x(e.x, rng);
                    e.y = b.y(e.y, rng);
                }
                1 => e.rx = Bounds::size(e.rx, w - 1, rng),
                _ => e.ry = Bounds::size(e.ry, h - 1, rng),
            },
            Shape::RotatedEllipse(e) => match rng.random_range(0..4) {
                0 => {
                    e.x = b.x(e.x, rng);
                    e.y = b.y(e.y, rng);
                }
                1 => e.rx = Bounds::size(e.rx, w - 1, rng),
                2 => e.ry = Bounds::size(e.ry, h - 1, rng),
                _ => e.angle = Bounds::angle(e.angle, rng),
            },
            Shape::Triangle(t) => match rng.random_range(0..3) {
                0 => {
                    t.x1 = b.x(t.x1, rng);
                    t.y1 = b.y(t.y1, rng);
                }
                1 => {
                    t.x2 = b.x(t.x2, rng);
                    t.y2 = b.y(t.y2, rng);
                }
                _ => {
                    t.x3 = b.x(t.x3, rng);
                    t.y3 = b.y(t.y3, rng);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn wrap_angle_normalizes_into_range() {
        assert_eq!(wrap_angle(0), 0);
        assert_eq!(wrap_angle(359), 359);
        assert_eq!(wrap_angle(360), 0);
        assert_eq!(wrap_angle(-3), 357);
        assert_eq!(wrap_angle(362), 2);
    }

    #[test]
    fn random_shapes_respect_creation_ranges() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            for kind in ShapeKind::ALL {
                let s = random_shape(kind, 50, 20, &mut rng);
                assert_eq!(s.kind(), kind);
                let d = s.raw_data();
                assert!((0..50).contains(&d[0]));
                assert!((0..20).contains(&d[1]));
                match kind {
                    ShapeKind::RotatedRectangle | ShapeKind::RotatedEllipse => {
                        assert!((1..=32).contains(&d[2]) && (1..=32).contains(&d[3]));
                        assert!((0..360).contains(&d[4]));
                    }
                    ShapeKind::Ellipse => {
                        assert!((1..=32).contains(&d[2]) && (1..=32).contains(&d[3]));
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn mutation_keeps_parameters_valid() {
        let mut rng = Pcg32::seed_from_u64(0xDEADBEEF);
        let (w, h) = (30u32, 12u32);
        for kind in ShapeKind::ALL {
            let mut s = random_shape(kind, w, h, &mut rng);
            for _ in 0..2000 {
                s.mutate(w, h, &mut rng);
                assert_eq!(s.kind(), kind);
                match s {
                    Shape::Rectangle(r) => {
                        assert!((0..30).contains(&r.x1) && (0..30).contains(&r.x2));
                        assert!((0..12).contains(&r.y1) && (0..12).contains(&r.y2));
                    }
                    Shape::RotatedRectangle(r) => {
                        assert!(r.w >= 1 && r.h >= 1);
                        assert!((0..360).contains(&r.angle));
                    }
                    Shape::Ellipse(e) => assert!(e.rx >= 1 && e.ry >= 1),
                    Shape::RotatedEllipse(e) => {
                        assert!(e.rx >= 1 && e.ry >= 1);
                        assert!((0..360).contains(&e.angle));
                    }
                    Shape::Triangle(t) => {
                        for x in [t.x1, t.x2, t.x3] {
                            assert!((0..30).contains(&x));
                        }
                        for y in [t.y1, t.y2, t.y3] {
                            assert!((0..12).contains(&y));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn clone_then_mutate_leaves_original_untouched() {
        let mut rng = Pcg32::seed_from_u64(3);
        let original = random_shape(ShapeKind::Triangle, 64, 64, &mut rng);
        let mut copy = original;
        for _ in 0..20 {
            copy.mutate(64, 64, &mut rng);
        }
        assert_ne!(copy, original);
        assert_eq!(original.kind(), ShapeKind::Triangle);
    }

    #[test]
    fn one_pixel_canvas_does_not_panic() {
        let mut rng = Pcg32::seed_from_u64(11);
        for kind in ShapeKind::ALL {
            let mut s = random_shape(kind, 1, 1, &mut rng);
            for _ in 0..100 {
                s.mutate(1, 1, &mut rng);
            }
        }
    }
}

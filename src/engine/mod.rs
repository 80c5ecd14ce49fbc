// Engine module organization
// scoring: per-shape color / energy delta / compositing over spans
// metrics: whole-canvas SSE and PSNR for progress reporting

pub mod metrics;
pub mod scoring;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::raster::{Raster, Rgba};
use crate::shapes::mutate::random_shape;
use crate::shapes::{Shape, ShapeKind};

pub use metrics::MetricsSnapshot;

/// a shape together with its derived paint color and energy delta
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeResult {
    /// signed change in total squared error; negative for accepted shapes
    pub score: f64,
    pub color: Rgba,
    pub shape: Shape,
}

/// greedy hill-climbing optimizer.
///
/// owns the immutable target and the evolving canvas. each [`Runner::step`] seeds
/// one random shape, hill-climbs its parameters and paints it only if that strictly
/// lowers the error. steps must run sequentially on one instance.
pub struct Runner<R: Rng = Pcg32> {
    rng: R,
    target: Raster,
    current: Raster,
    width: u32,
    height: u32,
    average: Rgba,
}

impl Runner<Pcg32> {
    /// seeded from OS entropy
    pub fn new(target: Raster) -> Self {
        Self::with_seed(target, rand::random())
    }

    /// deterministic runs for tests and reproducible sessions
    pub fn with_seed(target: Raster, seed: u64) -> Self {
        Self::with_rng(target, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> Runner<R> {
    /// the canvas starts as a flat fill of the target's average color
    pub fn with_rng(target: Raster, rng: R) -> Self {
        profiling::scope!("Runner::with_rng");
        let width = target.width();
        let height = target.height();
        let average = target.average_color();
        let current = Raster::filled(width, height, average);
        tracing::debug!(width, height, ?average, "runner initialized");
        Self {
            rng,
            target,
            current,
            width,
            height,
            average,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// mean target color (alpha 255) the canvas was seeded with
    #[inline]
    pub fn average_color(&self) -> Rgba {
        self.average
    }

    /// copy of the evolving canvas
    pub fn snapshot(&self) -> Raster {
        self.current.clone()
    }

    /// error of the evolving canvas against the target
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot::between(self.target.as_bytes(), self.current.as_bytes())
    }

    /// one optimization step: zero or one accepted shape
    pub fn step(&mut self, kinds: &[ShapeKind], alpha: u8, mutations: u32) -> Option<ShapeResult> {
        self.step_with(kinds, alpha, mutations, |_| {})
    }

    /// like [`Runner::step`], reporting the best score after every hill-climb iteration
    pub fn step_with<F>(
        &mut self,
        kinds: &[ShapeKind],
        alpha: u8,
        mutations: u32,
        on_iteration: F,
    ) -> Option<ShapeResult>
    where
        F: FnMut(f64),
    {
        profiling::scope!("Runner::step");
        if kinds.is_empty() || self.width == 0 || self.height == 0 {
            return None;
        }

        let kind = kinds[self.rng.random_range(0..kinds.len())];
        let seed = random_shape(kind, self.width, self.height, &mut self.rng);
        let best = self.hill_climb(seed, alpha, mutations, on_iteration);

        if best.score < 0.0 {
            let lines = best.shape.rasterize(self.width, self.height);
            scoring::composite(&mut self.current, &lines, best.color);
            tracing::debug!(kind = %kind, score = best.score, "shape accepted");
            Some(best)
        } else {
            tracing::trace!(kind = %kind, score = best.score, "shape rejected");
            None
        }
    }

    /// greedy local search from `seed`: a mutated clone replaces the best only when
    /// its score is strictly lower. never touches the canvas.
    pub fn hill_climb<F>(&mut self, seed: Shape, alpha: u8, mutations: u32, mut on_iteration: F) -> ShapeResult
    where
        F: FnMut(f64),
    {
        profiling::scope!("Runner::hill_climb");
        let mut best = self.compute_state(&seed, alpha);

        for _ in 0..mutations {
            let mut candidate = best.shape;
            candidate.mutate(self.width, self.height, &mut self.rng);
            let state = self.compute_state(&candidate, alpha);
            if state.score < best.score {
                best = state;
            }
            on_iteration(best.score);
        }
        best
    }

    /// score a candidate: paint color is the mean target color under the shape,
    /// score is the error delta of blending it over the canvas. shapes covering no
    /// pixels score +inf and are never accepted.
    pub fn compute_state(&self, shape: &Shape, alpha: u8) -> ShapeResult {
        profiling::scope!("Runner::compute_state");
        let lines = shape.rasterize(self.width, self.height);
        match scoring::region_color(&self.target, &lines, alpha) {
            Some(color) => ShapeResult {
                score: scoring::energy_delta(&self.target, &self.current, &lines, color),
                color,
                shape: *shape,
            },
            None => ShapeResult {
                score: f64::INFINITY,
                color: Rgba::default(),
                shape: *shape,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rectangle;

    fn split_red_blue(w: u32, h: u32) -> Raster {
        let mut px = Vec::new();
        for _ in 0..h {
            for x in 0..w {
                let c: [u8; 4] = if x < w / 2 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
                px.extend_from_slice(&c);
            }
        }
        Raster::from_rgba(w, h, px).unwrap()
    }

    #[test]
    fn canvas_starts_as_average_color() {
        let runner = Runner::with_seed(split_red_blue(2, 2), 1);
        assert_eq!(runner.average_color(), Rgba::opaque(128, 0, 128));
        let snap = runner.snapshot();
        assert_eq!(snap.pixel(1, 1).unwrap(), Rgba::opaque(128, 0, 128));
    }

    #[test]
    fn flat_target_never_accepts() {
        let target = Raster::filled(4, 4, Rgba::opaque(255, 0, 0));
        let mut runner = Runner::with_seed(target, 42);
        for _ in 0..50 {
            assert!(runner.step(&ShapeKind::ALL, 128, 20).is_none());
        }
        assert_eq!(runner.metrics().sse, 0);
    }

    #[test]
    fn off_canvas_shape_scores_infinity() {
        let runner = Runner::with_seed(split_red_blue(4, 4), 1);
        let shape: Shape = Rectangle { x1: 10, y1: 10, x2: 12, y2: 12 }.into();
        let state = runner.compute_state(&shape, 255);
        assert_eq!(state.score, f64::INFINITY);
    }

    #[test]
    fn hill_climb_best_score_never_increases() {
        let mut runner = Runner::with_seed(split_red_blue(32, 16), 9);
        for kind in ShapeKind::ALL {
            let seed = random_shape(kind, 32, 16, &mut Pcg32::seed_from_u64(5));
            let mut history = Vec::new();
            let best = runner.hill_climb(seed, 96, 300, |s| history.push(s));
            assert_eq!(history.len(), 300);
            for pair in history.windows(2) {
                assert!(pair[1] <= pair[0]);
            }
            assert_eq!(history.last().copied(), Some(best.score));
        }
    }

    #[test]
    fn accepted_steps_lower_total_error() {
        let mut runner = Runner::with_seed(split_red_blue(16, 16), 0xDEADBEEF);
        let initial = runner.metrics().sse;
        let mut accepted = 0;
        for _ in 0..40 {
            if let Some(result) = runner.step(&[ShapeKind::Rectangle, ShapeKind::Ellipse], 128, 50) {
                assert!(result.score < 0.0);
                accepted += 1;
            }
        }
        assert!(accepted > 0);
        assert!(runner.metrics().sse < initial);
    }

    #[test]
    fn same_seed_same_results() {
        let run = |seed| {
            let mut r = Runner::with_seed(split_red_blue(20, 10), seed);
            (0..10)
                .filter_map(|_| r.step(&ShapeKind::ALL, 96, 30))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn accepted_scores_match_the_canvas_error_change() {
        let px = (0..24u32).flat_map(|i| [(120 + i % 5) as u8, (131 - i % 7) as u8, 128, 255]).collect();
        let target = Raster::from_rgba(6, 4, px).unwrap();
        let mut runner = Runner::with_seed(target, 4);
        for alpha in [1u8, 2, 255] {
            for _ in 0..40 {
                let before = runner.metrics().sse as i64;
                let Some(r) = runner.step(&[ShapeKind::Rectangle], alpha, 10) else {
                    assert_eq!(runner.metrics().sse as i64, before);
                    continue;
                };
                let after = runner.metrics().sse as i64;
                assert!(r.score < 0.0);
                assert_eq!((after - before) as f64, r.score, "alpha {alpha}");
            }
        }
    }

    #[test]
    fn empty_kind_list_is_a_no_op() {
        let mut runner = Runner::with_seed(split_red_blue(4, 4), 1);
        assert!(runner.step(&[], 255, 10).is_none());
    }
}

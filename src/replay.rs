//! rebuild a canvas from an accepted-shape log.
//!
//! the host only ever receives records; compositing them in order over the
//! average-color background with the optimizer's own blend reproduces its canvas
//! exactly.

use crate::engine::{MetricsSnapshot, scoring};
use crate::error::TraceResult;
use crate::raster::{Raster, Rgba};
use crate::worker::ShapeRecord;

/// composite `records` in order over a flat `background`
pub fn render(width: u32, height: u32, background: Rgba, records: &[ShapeRecord]) -> TraceResult<Raster> {
    profiling::scope!("replay::render");
    let mut canvas = Raster::filled(width, height, background);
    apply(&mut canvas, records)?;
    Ok(canvas)
}

/// replay `records` over the target's average color and score the result against
/// `target`. returns the rebuilt canvas alongside its metrics.
pub fn evaluate(target: &Raster, records: &[ShapeRecord]) -> TraceResult<(Raster, MetricsSnapshot)> {
    let canvas = render(target.width(), target.height(), target.average_color(), records)?;
    let metrics = MetricsSnapshot::between(target.as_bytes(), canvas.as_bytes());
    Ok((canvas, metrics))
}

/// composite `records` in order onto an existing canvas. nothing is painted if any
/// record fails to parse.
pub fn apply(canvas: &mut Raster, records: &[ShapeRecord]) -> TraceResult<()> {
    let shapes = records
        .iter()
        .map(|r| r.shape().map(|s| (s, r.color)))
        .collect::<TraceResult<Vec<_>>>()?;

    for (shape, color) in shapes {
        let lines = shape.rasterize(canvas.width(), canvas.height());
        scoring::composite(canvas, &lines, color);
    }
    Ok(())
}

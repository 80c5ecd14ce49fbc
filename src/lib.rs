//! shapetrace approximates a raster image with simple geometric primitives.
//!
//! each optimizer step drops one random shape on the canvas, hill-climbs its
//! parameters against the target and keeps it only when the squared RGB error
//! strictly drops. the caller drives the loop and collects accepted shapes.
//!
//! ```no_run
//! use shapetrace::{Raster, Runner, ShapeKind};
//!
//! let target = Raster::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255])?;
//! let mut runner = Runner::with_seed(target, 7);
//! if let Some(shape) = runner.step(&[ShapeKind::Rectangle], 128, 100) {
//!     println!("{:?} improved the error by {}", shape.shape.kind(), -shape.score);
//! }
//! # Ok::<(), shapetrace::TraceError>(())
//! ```

pub mod engine;
pub mod error;
pub mod raster;
pub mod replay;
pub mod settings;
pub mod shapes;
pub mod worker;

pub use engine::{MetricsSnapshot, Runner, ShapeResult};
pub use error::{TraceError, TraceResult};
pub use raster::{Raster, Rgba};
pub use settings::RunSettings;
pub use shapes::{Scanline, Shape, ShapeKind};
pub use worker::{HostRequest, HostResponse, Session, ShapeRecord, StepRequest, spawn_worker};

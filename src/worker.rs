//! host boundary: the init/step message pair and a background worker thread.
//!
//! the core itself is synchronous; [`Session`] is the plain function-call form of
//! the boundary and [`spawn_worker`] runs one on its own thread behind channels for
//! hosts that want the work off their main loop.

use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::engine::{Runner, ShapeResult};
use crate::error::{TraceError, TraceResult};
use crate::raster::{Raster, Rgba};
use crate::shapes::{Shape, ShapeKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HostRequest {
    Init(InitRequest),
    Step(StepRequest),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitRequest {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// raw step request as the host sends it; numbers are signed so that bad values
/// can be reported instead of wrapping
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub shape_types: Vec<String>,
    pub alpha: i64,
    pub mutations: i64,
    pub count: i64,
}

/// validated step parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepParams {
    pub kinds: Vec<ShapeKind>,
    pub alpha: u8,
    pub mutations: u32,
    pub count: u32,
}

impl StepRequest {
    pub fn validate(&self) -> TraceResult<StepParams> {
        if self.shape_types.is_empty() {
            return Err(TraceError::invalid_step("shapeTypes must not be empty"));
        }
        let kinds = self
            .shape_types
            .iter()
            .map(|s| s.parse::<ShapeKind>())
            .collect::<TraceResult<Vec<_>>>()?;

        let alpha = u8::try_from(self.alpha)
            .map_err(|_| TraceError::invalid_step(format!("alpha {} outside 0..=255", self.alpha)))?;
        let mutations = u32::try_from(self.mutations)
            .map_err(|_| TraceError::invalid_step(format!("mutations {} must be >= 0", self.mutations)))?;
        let count = u32::try_from(self.count)
            .ok()
            .filter(|&c| c >= 1)
            .ok_or_else(|| TraceError::invalid_step(format!("count {} must be >= 1", self.count)))?;

        Ok(StepParams {
            kinds,
            alpha,
            mutations,
            count,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HostResponse {
    InitResult(InitResult),
    StepResult(Vec<ShapeRecord>),
    Error(ErrorReport),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
    pub avg_color: Rgba,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
}

/// one accepted shape in its externalized form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub score: f64,
    pub color: Rgba,
    pub shape_type: ShapeKind,
    pub shape_data: Vec<i32>,
}

impl From<ShapeResult> for ShapeRecord {
    fn from(r: ShapeResult) -> Self {
        Self {
            score: r.score,
            color: r.color,
            shape_type: r.shape.kind(),
            shape_data: r.shape.raw_data(),
        }
    }
}

impl ShapeRecord {
    pub fn shape(&self) -> TraceResult<Shape> {
        Shape::from_raw(self.shape_type, &self.shape_data)
    }
}

/// one approximation run as seen by the host
#[derive(Default)]
pub struct Session {
    runner: Option<Runner>,
    seed: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// every runner created by this session uses `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self {
            runner: None,
            seed: Some(seed),
        }
    }

    pub fn runner(&self) -> Option<&Runner> {
        self.runner.as_ref()
    }

    /// build the optimizer from raw RGBA bytes; returns the seeded average color.
    /// a second init replaces the previous run.
    pub fn init(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> TraceResult<Rgba> {
        profiling::scope!("Session::init");
        let target = Raster::from_rgba(width, height, pixels)?;
        let runner = match self.seed {
            Some(seed) => Runner::with_seed(target, seed),
            None => Runner::new(target),
        };
        let avg = runner.average_color();
        tracing::info!(width, height, ?avg, "session initialized");
        self.runner = Some(runner);
        Ok(avg)
    }

    /// `count` optimizer steps; rejected steps are left out of the batch
    pub fn step(&mut self, request: &StepRequest) -> TraceResult<Vec<ShapeRecord>> {
        let params = request.validate()?;
        self.step_params(&params)
    }

    pub fn step_params(&mut self, params: &StepParams) -> TraceResult<Vec<ShapeRecord>> {
        profiling::scope!("Session::step");
        let runner = self.runner.as_mut().ok_or(TraceError::NotInitialized)?;
        let batch: Vec<ShapeRecord> = (0..params.count)
            .filter_map(|_| runner.step(&params.kinds, params.alpha, params.mutations))
            .map(ShapeRecord::from)
            .collect();
        tracing::debug!(requested = params.count, accepted = batch.len(), "batch done");
        Ok(batch)
    }

    /// message form of [`Session::init`] / [`Session::step`]; failures become
    /// [`HostResponse::Error`]
    pub fn handle(&mut self, request: HostRequest) -> HostResponse {
        let result = match request {
            HostRequest::Init(init) => self
                .init(init.width, init.height, init.pixels)
                .map(|avg_color| HostResponse::InitResult(InitResult { avg_color })),
            HostRequest::Step(step) => self.step(&step).map(HostResponse::StepResult),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "request failed");
            HostResponse::Error(ErrorReport {
                message: e.to_string(),
            })
        })
    }
}

/// channels to a session running on a background thread
pub struct WorkerHandle {
    requests: mpsc::Sender<HostRequest>,
    responses: mpsc::Receiver<HostResponse>,
    thread: thread::JoinHandle<Session>,
}

/// run `session` on a named thread; it answers each request in order and exits
/// once the handle is shut down
pub fn spawn_worker(mut session: Session) -> TraceResult<WorkerHandle> {
    let (req_tx, req_rx) = mpsc::channel::<HostRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<HostResponse>();

    let thread = thread::Builder::new()
        .name("shapetrace-worker".to_owned())
        .spawn(move || {
            while let Ok(request) = req_rx.recv() {
                profiling::scope!("worker_request");
                if resp_tx.send(session.handle(request)).is_err() {
                    break;
                }
            }
            tracing::debug!("worker exiting");
            session
        })?;

    Ok(WorkerHandle {
        requests: req_tx,
        responses: resp_rx,
        thread,
    })
}

impl WorkerHandle {
    pub fn send(&self, request: HostRequest) -> TraceResult<()> {
        self.requests
            .send(request)
            .map_err(|_| TraceError::Worker("worker stopped accepting requests".into()))
    }

    pub fn recv(&self) -> TraceResult<HostResponse> {
        self.responses
            .recv()
            .map_err(|_| TraceError::Worker("worker hung up".into()))
    }

    /// send one request and wait for its response
    pub fn request(&self, request: HostRequest) -> TraceResult<HostResponse> {
        self.send(request)?;
        self.recv()
    }

    /// close the request channel and take the session back
    pub fn shutdown(self) -> TraceResult<Session> {
        drop(self.requests);
        self.thread
            .join()
            .map_err(|_| TraceError::Worker("worker thread panicked".into()))
    }
}

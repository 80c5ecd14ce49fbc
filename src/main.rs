use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use image::imageops::FilterType;

use shapetrace::worker::InitRequest;
use shapetrace::{HostRequest, HostResponse, Raster, RunSettings, Session, ShapeKind, ShapeRecord, replay, spawn_worker};

#[derive(Parser, Debug)]
#[command(name = "shapetrace", version, about = "Approximate an image with geometric primitives")]
struct Cli {
    /// Target image (png, jpeg, ...).
    input: PathBuf,

    /// Settings JSON; missing fields use defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Shape kinds to sample, comma separated (e.g. Triangle,RotatedEllipse).
    #[arg(long, value_delimiter = ',')]
    shapes: Option<Vec<String>>,

    /// Paint opacity 0-255.
    #[arg(long)]
    alpha: Option<u8>,

    /// Hill-climb iterations per step.
    #[arg(long)]
    mutations: Option<u32>,

    /// Steps per batch.
    #[arg(long)]
    batch: Option<u32>,

    /// Stop after this many accepted shapes.
    #[arg(long)]
    target_shapes: Option<usize>,

    /// Downscale targets wider than this.
    #[arg(long)]
    max_resolution: Option<u32>,

    /// Fixed RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the accepted shapes as JSON.
    #[arg(long)]
    out_json: Option<PathBuf>,

    /// Write the reconstructed canvas as PNG.
    #[arg(long)]
    out_png: Option<PathBuf>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<RunSettings> {
        let mut s = match &self.settings {
            Some(path) => RunSettings::load_strict(path)
                .with_context(|| format!("load settings {}", path.display()))?,
            None => RunSettings::default(),
        };
        if let Some(shapes) = &self.shapes {
            s.shape_types = shapes
                .iter()
                .map(|name| name.trim().parse::<ShapeKind>())
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = self.alpha {
            s.alpha = v;
        }
        if let Some(v) = self.mutations {
            s.mutations = v;
        }
        if let Some(v) = self.batch {
            s.batch_size = v;
        }
        if let Some(v) = self.target_shapes {
            s.target_shapes = v;
        }
        if let Some(v) = self.max_resolution {
            s.max_resolution = v;
        }
        if self.seed.is_some() {
            s.seed = self.seed;
        }
        s.validate()?;
        Ok(s)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    // name rayon's pool threads once so metrics work shows up as "rayon-N"
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let settings = cli.settings()?;
    let img = image::open(&cli.input)
        .with_context(|| format!("open image {}", cli.input.display()))?
        .to_rgba8();
    let (w, h) = settings.working_size(img.width(), img.height());
    let img = if (w, h) != img.dimensions() {
        tracing::info!(from = ?img.dimensions(), to = ?(w, h), "downscaling target");
        image::imageops::resize(&img, w, h, FilterType::Triangle)
    } else {
        img
    };

    let session = match settings.seed {
        Some(seed) => Session::with_seed(seed),
        None => Session::new(),
    };
    let worker = spawn_worker(session)?;

    let target = Raster::from_rgba(w, h, img.into_raw())?;
    let init = worker.request(HostRequest::Init(InitRequest {
        width: w,
        height: h,
        pixels: target.as_bytes().to_vec(),
    }))?;
    let background = match init {
        HostResponse::InitResult(r) => r.avg_color,
        HostResponse::Error(e) => bail!("init failed: {}", e.message),
        other => bail!("unexpected init response: {other:?}"),
    };

    let request = settings.step_request();
    let mut records: Vec<ShapeRecord> = Vec::new();
    let mut idle = 0u32;
    let mut batches = 0u64;
    while records.len() < settings.target_shapes {
        let batch = match worker.request(HostRequest::Step(request.clone()))? {
            HostResponse::StepResult(batch) => batch,
            HostResponse::Error(e) => bail!("step failed: {}", e.message),
            other => bail!("unexpected step response: {other:?}"),
        };
        batches += 1;

        if batch.is_empty() {
            idle += 1;
        } else {
            idle = 0;
            records.extend(batch);
        }
        if batches % 50 == 0 {
            tracing::info!(shapes = records.len(), target = settings.target_shapes, batches, idle, "progress");
        }
        if idle >= settings.max_idle_batches {
            tracing::info!(idle, "no improvement for a while, stopping");
            break;
        }
    }
    records.truncate(settings.target_shapes);
    worker.shutdown()?;

    // the last batch can overshoot the target; score only what gets written out
    tracing::debug!(?background, "replaying shape log");
    let (canvas, metrics) = replay::evaluate(&target, &records)?;
    tracing::info!(shapes = records.len(), psnr = metrics.psnr, mse = metrics.mse, "done");

    if let Some(path) = &cli.out_json {
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote shape log");
    }

    if let Some(path) = &cli.out_png {
        let out = image::RgbaImage::from_raw(w, h, canvas.into_bytes())
            .context("canvas buffer does not match its dimensions")?;
        out.save(path).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote canvas");
    }

    Ok(())
}

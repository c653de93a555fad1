use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use puzzlecut::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod output;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Generate, cut and rescale puzzle shapes")]
struct Cmd {
    /// JSON file with engine settings; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Print a generated shape on the logical canvas
    Shape {
        #[arg(long, default_value = "polygon")]
        kind: ShapeType,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Cut a generated shape and print the pieces with the retry report
    Cut {
        #[arg(long, default_value = "polygon")]
        kind: ShapeType,
        #[arg(long, default_value = "straight")]
        cut_type: CutType,
        #[arg(long, default_value_t = 4)]
        cuts: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Write the JSON here (plus a `.run.json` sidecar) instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Scatter a round on the first size, then replay the remaining resizes
    Resize {
        /// Comma-separated canvas sizes, e.g. 800x600,1024x768
        #[arg(long, value_delimiter = ',', value_parser = parse_canvas, required = true)]
        sizes: Vec<CanvasSize>,
        #[arg(long, default_value = "cloud")]
        kind: ShapeType,
        #[arg(long, default_value = "straight")]
        cut_type: CutType,
        #[arg(long, default_value_t = 4)]
        cuts: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    let cmd = Cmd::parse();
    let cfg = load_config(cmd.config.as_deref())?;
    match cmd.action {
        Action::Shape { kind, seed } => shape(&cfg, kind, seed),
        Action::Cut {
            kind,
            cut_type,
            cuts,
            seed,
            out,
        } => cut(&cfg, kind, cut_type, cuts, seed, out.as_deref()),
        Action::Resize {
            sizes,
            kind,
            cut_type,
            cuts,
            seed,
        } => resize(cfg, &sizes, kind, cut_type, cuts, seed),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let cfg = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn parse_canvas(s: &str) -> Result<CanvasSize, String> {
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: f64 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height: f64 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    let size = CanvasSize::new(width, height);
    if !size.is_valid() {
        return Err(format!("canvas {s:?} must be finite and positive"));
    }
    Ok(size)
}

fn shape(cfg: &EngineConfig, kind: ShapeType, seed: u64) -> Result<()> {
    let shape = ShapeGenerator::new(cfg.shape).generate(kind, &mut StdRng::seed_from_u64(seed));
    tracing::info!(%kind, seed, vertices = shape.len(), area = shape.area(), "shape");
    println!("{}", serde_json::to_string_pretty(&shape)?);
    Ok(())
}

fn cut(
    cfg: &EngineConfig,
    kind: ShapeType,
    cut_type: CutType,
    cuts: usize,
    seed: u64,
    out: Option<&Path>,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let shape = ShapeGenerator::new(cfg.shape).generate(kind, &mut rng);
    let report = CuttingEngine::new(cfg.cut).cut(&shape, cut_type, cuts, &mut rng);
    if !report.reached_target() {
        tracing::warn!(
            pieces = report.pieces.len(),
            target = report.target,
            "cut fell short of the requested piece count"
        );
    }
    let doc = json!({ "shape": shape, "report": report });
    match out {
        Some(path) => {
            let params = json!({
                "kind": kind, "cut_type": cut_type, "cuts": cuts, "seed": seed, "config": cfg
            });
            let sidecar = output::write_with_sidecar(path, &doc, params)?;
            tracing::info!(out = %path.display(), sidecar = %sidecar.display(), "wrote pieces");
        }
        None => println!("{}", serde_json::to_string_pretty(&doc)?),
    }
    Ok(())
}

fn resize(
    cfg: EngineConfig,
    sizes: &[CanvasSize],
    kind: ShapeType,
    cut_type: CutType,
    cuts: usize,
    seed: u64,
) -> Result<()> {
    let Some((&first, rest)) = sizes.split_first() else {
        bail!("at least one canvas size is required");
    };
    let mut session = PuzzleSession::new(cfg, first, seed)?;
    session.start_round(kind, cut_type, cuts)?;
    session.scatter()?;
    for &size in rest {
        session.resize(size)?;
    }
    let pieces: Vec<_> = session
        .pieces()
        .iter()
        .enumerate()
        .map(|(index, p)| json!({ "index": index, "x": p.x, "y": p.y, "rotation": p.rotation }))
        .collect();
    let doc = json!({ "canvas": session.canvas(), "pieces": pieces });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clashgeo::memory::{ElementId, MemoryModel, Scene};
use clashgeo::{run_clash_check, ClashConfig, ClashSession};

#[derive(Parser, Debug)]
#[command(name = "clashgeo")]
#[command(about = "Find clashes between MEP runs and structure in a building model")]
#[command(version)]
struct Args {
    /// Path to the JSON scene describing the model
    #[arg(long, value_name = "FILE")]
    scene: PathBuf,

    /// Path to a TOML run configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Draw clash outlines in the active view
    #[arg(long)]
    draw: bool,

    /// Only check elements visible in the active view
    #[arg(long)]
    active_view_only: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "clashgeo=info",
        1 => "clashgeo=debug",
        _ => "clashgeo=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn name_of(model: &MemoryModel, id: ElementId) -> &str {
    model.element(id).map_or("<unknown>", |e| e.name.as_str())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => ClashConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ClashConfig::default(),
    };
    config.draw_annotations |= args.draw;
    config.active_view_only |= args.active_view_only;

    let scene = Scene::load(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    let mut model = scene.build().context("building model from scene")?;

    let outcome = run_clash_check(ClashSession::new(&mut model), &config)
        .context("clash check aborted")?;

    println!("{}", outcome.report.summary());
    for group in outcome.report.groups() {
        let opponents: Vec<_> = group.opponents.iter().map(|&b| name_of(&model, b)).collect();
        println!("  {} -> {}", name_of(&model, group.element), opponents.join(", "));
    }
    if let Some(drawn) = outcome.annotations {
        println!(
            "Annotation Curves: {} ({} degenerate edges skipped)",
            drawn.created, drawn.degenerate_skipped
        );
    }
    Ok(())
}

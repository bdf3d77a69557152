mod renderer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use flamechart_core::parsers::parse_auto;
use flamechart_core::svg::chart_to_svg;
use flamechart_core::{ChartConfig, Flamechart, FlamechartView};
use tracing_subscriber::EnvFilter;

/// View a sampled profile as a flamechart in the terminal, or export it as
/// SVG.
#[derive(Debug, Parser)]
#[command(name = "flamechart", version)]
struct Args {
    /// Profile to open: collapsed stacks (`a;b;c 42`) or speedscope JSON.
    profile: PathBuf,
    /// Chart config as JSON; unspecified fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fixed seed for frame colors, overriding the config.
    #[arg(long)]
    seed: Option<u64>,
    /// Write an SVG of the whole chart here instead of opening the viewer.
    #[arg(long)]
    svg: Option<PathBuf>,
    /// SVG width in pixels.
    #[arg(long, default_value_t = 1200.0)]
    width: f64,
}

fn load_config(path: Option<&Path>) -> Result<ChartConfig> {
    let Some(path) = path else {
        return Ok(ChartConfig::default());
    };
    let data =
        std::fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    ChartConfig::from_json(&data).with_context(|| format!("parsing config {}", path.display()))
}

/// The terminal lays out one cell per unit: one row per layer, one column
/// per character.
fn terminal_config(config: ChartConfig) -> ChartConfig {
    ChartConfig {
        frame_height: 1.0,
        label_font_size: 1.0,
        label_padding: 0.0,
        ..config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config = config.with_color_seed(seed);
    }

    let data = std::fs::read(&args.profile)
        .with_context(|| format!("reading profile {}", args.profile.display()))?;
    let profile = parse_auto(&data)
        .with_context(|| format!("parsing profile {}", args.profile.display()))?;
    let chart = Arc::new(Flamechart::from_profile(&profile, config.color_seed));
    tracing::debug!(
        layers = chart.layer_count(),
        intervals = chart.interval_count(),
        "built flamechart"
    );

    if let Some(out) = &args.svg {
        anyhow::ensure!(
            args.width.is_finite() && args.width > 0.0,
            "--width must be positive, got {}",
            args.width
        );
        let svg = chart_to_svg(chart, config, args.width, true);
        std::fs::write(out, svg).with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), "wrote svg");
        return Ok(());
    }

    let title = profile.name.clone().unwrap_or_else(|| {
        args.profile
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let mut viewer = renderer::Viewer::new(FlamechartView::new(chart, terminal_config(config)), title);
    renderer::render_tui(&mut viewer)
}

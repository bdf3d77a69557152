#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::Parser;
    use flamechart_core::ChartConfig;
    use flamechart_ui::FlameApp;
    use tracing_subscriber::EnvFilter;

    /// Interactive flamechart viewer.
    #[derive(Debug, Parser)]
    #[command(name = "flamechart-ui", version)]
    struct Args {
        /// Profile to open (collapsed stacks or speedscope JSON).
        profile: Option<PathBuf>,
        /// Chart config as JSON.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fixed seed for frame colors.
        #[arg(long)]
        seed: Option<u64>,
    }

    pub fn run() -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();

        let args = Args::parse();
        let mut config = match &args.config {
            Some(path) => {
                let data = std::fs::read(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                ChartConfig::from_json(&data)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => ChartConfig::default(),
        };
        if let Some(seed) = args.seed {
            config = config.with_color_seed(seed);
        }

        let initial = match &args.profile {
            Some(path) => {
                let data = std::fs::read(path)
                    .with_context(|| format!("reading profile {}", path.display()))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                Some((data, name))
            }
            None => None,
        };

        let options = eframe::NativeOptions {
            renderer: eframe::Renderer::Glow,
            viewport: egui::ViewportBuilder::default()
                .with_title("flamechart")
                .with_inner_size([1200.0, 800.0])
                .with_drag_and_drop(true),
            ..Default::default()
        };
        eframe::run_native(
            "flamechart",
            options,
            Box::new(move |cc| {
                let app = FlameApp::new(cc, config);
                Ok(Box::new(match initial {
                    Some((data, name)) => app.with_profile(&data, name),
                    None => app,
                }))
            }),
        )
        .map_err(|e| anyhow::anyhow!("eframe: {e}"))
    }
}

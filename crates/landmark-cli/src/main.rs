//! athens-map: Render the Athens landmark overlay to SVG or JSON
//!
//! Loads the configured feature layers, draws one frame onto an
//! offscreen surface and writes it out. `--resize` simulates a host
//! resizing the surface after the first frame.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use landmark_net::{HttpClientConfig, SourceFetcher};
use landmark_overlay::{create_landmark_overlay, RenderOptions};
use landmark_render::{Context2d, OffscreenSurface, RecordingContext, Size, SvgContext};
use std::path::{Path, PathBuf};
use tokio::task::LocalSet;
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// SVG document
    Svg,
    /// Draw commands of the last frame as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "athens-map")]
#[command(about = "Render labeled Athens landmarks", long_about = None)]
struct Args {
    /// Options file (.toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Primary GeoJSON location (path, file:// or http(s):// URL)
    #[arg(long)]
    primary: Option<String>,

    /// Secondary (Agora) GeoJSON location; enables the layer
    #[arg(long)]
    secondary: Option<String>,

    /// Enable the secondary layer
    #[arg(long)]
    agora: bool,

    /// Surface width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Surface height in pixels
    #[arg(long, default_value = "480")]
    height: u32,

    /// Resize the surface after the first frame, e.g. 1024x768
    #[arg(long, value_parser = parse_size)]
    resize: Option<Size>,

    /// Output format
    #[arg(long, value_enum, default_value = "svg")]
    format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: u32 = width.trim().parse().map_err(|e| format!("invalid width: {}", e))?;
    let height: u32 = height.trim().parse().map_err(|e| format!("invalid height: {}", e))?;
    Ok(Size::new(width, height))
}

/// File options with command-line overrides applied
fn build_options(args: &Args) -> Result<RenderOptions> {
    let mut options = match &args.config {
        Some(path) => RenderOptions::from_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => RenderOptions::default(),
    };

    if let Some(primary) = &args.primary {
        options = options.with_primary_source(primary.as_str());
    }
    if let Some(secondary) = &args.secondary {
        options = options.with_secondary_source(secondary.as_str());
    }
    if args.agora {
        options = options.with_secondary_layer(true);
    }
    Ok(options)
}

/// Relative sources resolve against the options file's directory
fn base_dir(config: Option<&Path>) -> PathBuf {
    config
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// A drawing backend that can serialize what it drew
trait Export: Context2d {
    fn export(&self) -> Result<String>;
}

impl Export for SvgContext {
    fn export(&self) -> Result<String> {
        Ok(self.to_svg())
    }
}

impl Export for RecordingContext {
    fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.last_frame())?)
    }
}

async fn render<C: Export + 'static>(
    context: C,
    size: Size,
    options: RenderOptions,
    fetcher: SourceFetcher,
    resize: Option<Size>,
) -> Result<String> {
    let surface = OffscreenSurface::new(size, context);
    let resizer = surface.resizer();
    let (overlay, _subscription) = create_landmark_overlay(Some(surface), options, fetcher, None);

    let drawn = overlay.initialize().await?;
    info!("Drew {} features at {}", drawn, size);

    if let Some(new_size) = resize {
        if resizer.resize(new_size) {
            let drawn = overlay.render();
            info!("Redrew {} features at {}", drawn, new_size);
        }
    }
    overlay.teardown();

    overlay
        .with_surface(|surface| surface.context().map(Export::export))
        .flatten()
        .context("Surface has no drawing context")?
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let options = build_options(&args)?;
    let fetcher = SourceFetcher::new(
        HttpClientConfig::default(),
        base_dir(args.config.as_deref()),
    );
    let size = Size::new(args.width, args.height);
    debug!("Options: {:?}", options);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();
    let document = local.block_on(&runtime, async {
        match args.format {
            OutputFormat::Svg => render(SvgContext::new(size), size, options, fetcher, args.resize).await,
            OutputFormat::Json => render(RecordingContext::new(), size, options, fetcher, args.resize).await,
        }
    })?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", document),
    }
    Ok(())
}

mod analyzer;
mod error;
mod server;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use teaser_core::TeaserConfig;
use teaser_render::{encode_png, RenderPipeline};
use teaser_timeline::{Choreography, InputProps};

use crate::analyzer::{ContentAnalyzer, FirecrawlAnalyzer};

#[derive(Parser)]
#[command(
    name = "teaser",
    version,
    about = "Teaser: turn a product page into a short promo video",
    long_about = "Teaser scrapes a landing page for its title, description and hero image,\nthen renders a short animated H.264 teaser from them."
)]
struct Cli {
    /// Path to the config file (missing file means defaults)
    #[arg(short, long, global = true, default_value = "teaser.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Render a teaser video
    Render {
        #[arg(long, default_value = "Product")]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Hero image URL or path
        #[arg(long)]
        image: Option<String>,

        /// Directory the video is written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Choreography preset: classic, streamed, two-scene
        #[arg(long)]
        preset: Option<String>,
    },

    /// Scrape a page and print what a teaser would be built from
    Analyze {
        #[arg()]
        url: String,
    },

    /// Render a single frame to PNG
    Frame {
        /// Frame index
        #[arg()]
        frame: u64,

        #[arg(long, default_value = "Product")]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        image: Option<String>,

        #[arg(short, long, default_value = "frame.png")]
        out: PathBuf,
    },

    /// Display version, encoder and composition info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = TeaserConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config).await
        }
        Commands::Render {
            title,
            description,
            image,
            output_dir,
            preset,
        } => {
            if let Some(dir) = output_dir {
                config.render.output_dir = dir;
            }
            if let Some(preset) = preset {
                config.render.preset = preset;
            }
            config.render.allow_local_images = true;
            cmd_render(&config, InputProps::new(title, description, image)).await
        }
        Commands::Analyze { url } => cmd_analyze(&config, &url).await,
        Commands::Frame {
            frame,
            title,
            description,
            image,
            out,
        } => {
            config.render.allow_local_images = true;
            cmd_frame(&config, frame, InputProps::new(title, description, image), &out).await
        }
        Commands::Info => cmd_info(&config),
    }
}

async fn cmd_render(config: &TeaserConfig, props: InputProps) -> Result<()> {
    let start = Instant::now();
    let pipeline = RenderPipeline::from_config(config)?;
    if !pipeline.encoder().is_available() {
        anyhow::bail!(
            "FFmpeg not found at '{}'. Install it or set encoder.ffmpeg_path.",
            config.encoder.ffmpeg_path
        );
    }

    let output = pipeline.render(props).await?;
    println!("✓ Rendered {} frames in {:.2?}", output.frame_count, start.elapsed());
    println!("  File:  {}", output.path.display());
    println!("  URL:   {}", output.video_url);
    println!("  Hash:  {}", output.content_hash.to_hex());
    Ok(())
}

async fn cmd_analyze(config: &TeaserConfig, url: &str) -> Result<()> {
    let analyzer = FirecrawlAnalyzer::new(&config.analyzer);
    let summary = analyzer.analyze(url).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_frame(config: &TeaserConfig, frame: u64, props: InputProps, out: &Path) -> Result<()> {
    let pipeline = RenderPipeline::from_config(config)?;
    let buffer = pipeline.render_frame(props, frame).await?;
    let png = encode_png(&buffer)?;
    std::fs::write(out, png).with_context(|| format!("failed to write {}", out.display()))?;
    println!("✓ Frame {} written to {}", frame, out.display());
    Ok(())
}

fn cmd_info(config: &TeaserConfig) -> Result<()> {
    let pipeline = RenderPipeline::from_config(config)?;
    let spec = pipeline.composition()?;
    println!("Teaser Video Engine");
    println!("   Version:      {}", env!("CARGO_PKG_VERSION"));
    println!("   Renderer:     CPU ({} threads)", cpu_threads());
    println!(
        "   FFmpeg:       {}",
        if pipeline.encoder().is_available() {
            "available"
        } else {
            "NOT FOUND"
        }
    );
    println!(
        "   Composition:  {} {}x{} @ {} fps, {} frames",
        spec.id, spec.width, spec.height, spec.fps, spec.duration_in_frames
    );
    println!(
        "   Preset:       {} (available: {})",
        pipeline.choreography().name,
        Choreography::PRESETS.join(", ")
    );
    println!("   Output dir:   {}", config.render.output_dir.display());
    Ok(())
}

fn cpu_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

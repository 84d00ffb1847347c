//! Command-line interface for calibcat.
//!
//! Provides commands for generating calibration boards, previewing a board
//! before committing it, capturing calibration frames and inspecting the
//! catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::adapters::ImageViewer;
use crate::capture::{next_free_seq, CaptureSession, KeyReader, CAPTURE_KEY};
use crate::config::{self, ResolvedConfig};
use crate::core::{render_board, BoardGenerator, BoardSource};
use crate::domain::{BoardSpec, ImageSize, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH};

pub mod catalog;

/// calibcat - ChArUco board generation and calibration image capture
#[derive(Parser, Debug)]
#[command(name = "calibcat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog file (overrides config)
    #[arg(long, global = true, env = "CALIBCAT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Directory for generated and captured images (overrides config)
    #[arg(long, global = true, env = "CALIBCAT_IMAGES")]
    pub images_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a board, store it by content hash and record its parameters
    Generate {
        #[command(flatten)]
        board: BoardArgs,

        /// Side of one square (e.g. 0.04)
        #[arg(short = 's', long = "square-length")]
        square_length: f64,

        /// Side of one marker (e.g. 0.02)
        #[arg(short = 'm', long = "marker-length")]
        marker_length: f64,

        /// Use an already rendered image instead of running the renderer
        #[arg(long)]
        image: Option<PathBuf>,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Render a board to a scratch file and show it without recording it
    Preview {
        #[command(flatten)]
        board: BoardArgs,

        /// Side of one square
        #[arg(short = 's', long = "square-length", default_value = "0.04")]
        square_length: f64,

        /// Side of one marker
        #[arg(short = 'm', long = "marker-length", default_value = "0.02")]
        marker_length: f64,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Capture frames: space saves a frame, escape quits
    Capture {
        /// Video device (overrides config)
        #[arg(long, env = "CALIBCAT_DEVICE")]
        device: Option<String>,

        /// Sequence number of the first saved frame
        #[arg(long, default_value = "0", conflicts_with = "resume")]
        start_index: u32,

        /// Continue numbering after the highest existing capture
        #[arg(long)]
        resume: bool,
    },

    /// Inspect the catalog
    Catalog {
        #[command(subcommand)]
        command: catalog::CatalogCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Board grid and dictionary
#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    /// Squares along x
    #[arg(short = 'w', long)]
    pub width: u32,

    /// Squares along y
    #[arg(short = 'l', long)]
    pub length: u32,

    /// Dictionary selector (0-20, see `calibcat generate --help`)
    #[arg(
        short = 'd',
        long,
        long_help = "Dictionary selector: 0-3 4X4_{50,100,250,1000}, 4-7 5X5_*, 8-11 6X6_*, \
                     12-15 7X7_*, 16 ARUCO_ORIGINAL, 17 APRILTAG_16h5, 18 APRILTAG_25h9, \
                     19 APRILTAG_36h10, 20 APRILTAG_36h11"
    )]
    pub dictionary: u32,
}

/// Output image size in pixels
#[derive(Args, Debug, Clone, Copy)]
pub struct SizeArgs {
    #[arg(long, default_value_t = DEFAULT_IMAGE_WIDTH)]
    pub image_width: u32,

    #[arg(long, default_value_t = DEFAULT_IMAGE_HEIGHT)]
    pub image_height: u32,
}

impl From<SizeArgs> for ImageSize {
    fn from(args: SizeArgs) -> Self {
        ImageSize {
            width: args.image_width,
            height: args.image_height,
        }
    }
}

impl BoardArgs {
    fn spec(&self, square_length: f64, marker_length: f64) -> Result<BoardSpec> {
        BoardSpec::new(
            self.width,
            self.length,
            square_length,
            marker_length,
            self.dictionary,
        )
        .context("Invalid board")
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate {
                board,
                square_length,
                marker_length,
                image,
                size,
            } => {
                let cfg = resolved(self.catalog, self.images_dir, None)?;
                let spec = board.spec(square_length, marker_length)?;
                generate(&cfg, &spec, size.into(), image).await
            }
            Commands::Preview {
                board,
                square_length,
                marker_length,
                size,
            } => {
                let cfg = resolved(self.catalog, self.images_dir, None)?;
                let spec = board.spec(square_length, marker_length)?;
                preview(&cfg, &spec, size.into()).await
            }
            Commands::Capture {
                device,
                start_index,
                resume,
            } => {
                let cfg = resolved(self.catalog, self.images_dir, device)?;
                capture(&cfg, start_index, resume).await
            }
            Commands::Catalog { command } => {
                let cfg = resolved(self.catalog, self.images_dir, None)?;
                catalog::execute(&cfg, command).await
            }
            Commands::Config => {
                let cfg = resolved(self.catalog, self.images_dir, None)?;
                show_config(&cfg);
                Ok(())
            }
        }
    }
}

/// Global configuration with command-line overrides applied
fn resolved(
    catalog: Option<PathBuf>,
    images_dir: Option<PathBuf>,
    device: Option<String>,
) -> Result<ResolvedConfig> {
    Ok(config::config()?
        .clone()
        .with_overrides(catalog, images_dir, device))
}

/// Render, store and record a board
async fn generate(
    cfg: &ResolvedConfig,
    spec: &BoardSpec,
    size: ImageSize,
    image: Option<PathBuf>,
) -> Result<()> {
    let generator = BoardGenerator::new(cfg.catalog_store(), cfg.content_store());

    let outcome = match image {
        Some(path) => generator.generate(spec, size, BoardSource::File(path)).await?,
        None => {
            let renderer = cfg.renderer()?;
            generator
                .generate(spec, size, BoardSource::Render(&renderer))
                .await?
        }
    };

    println!("Hash:    {}", outcome.digest);
    println!("Image:   {}", outcome.artifact_path.display());
    println!(
        "Catalog: {} ({} record {})",
        cfg.catalog.display(),
        if outcome.upsert.is_insert() { "added" } else { "updated" },
        outcome.upsert.index()
    );
    if !outcome.artifact_created {
        println!("(identical image was already stored)");
    }

    Ok(())
}

/// Show a board without touching the catalog
async fn preview(cfg: &ResolvedConfig, spec: &BoardSpec, size: ImageSize) -> Result<()> {
    let layout = spec.layout(size)?;
    let (board_w, board_h) = spec.physical_size();

    println!("Board:       {}x{} squares, {}", spec.width, spec.length, spec.dictionary);
    println!("Physical:    {:.4} x {:.4}", board_w, board_h);
    println!("Markers:     {} (inner corners: {})", layout.markers, spec.corner_count());
    println!("Image:       {}", layout.image);
    println!("Square:      {} px", layout.square_px);
    println!("Marker:      {} px", layout.marker_px);
    println!(
        "Board area:  {}x{} px at ({}, {})",
        layout.board_width_px, layout.board_height_px, layout.margin_x, layout.margin_y
    );

    let renderer = cfg.renderer()?;
    let scratch_root = std::env::temp_dir();
    let rendered = render_board(&renderer, spec, size, &scratch_root).await?;

    cfg.viewer()
        .show(rendered.path())
        .await
        .context("Failed to show preview")?;

    println!("\nPress Enter to close the preview");
    let mut keys = KeyReader::stdin();
    keys.next_key().await.context("Failed to read key input")?;

    // `rendered` drops here and removes the scratch file
    Ok(())
}

/// Interactive frame capture into the images directory
async fn capture(cfg: &ResolvedConfig, start_index: u32, resume: bool) -> Result<()> {
    let start = if resume {
        next_free_seq(&cfg.images)
            .await
            .with_context(|| format!("Failed to scan {}", cfg.images.display()))?
    } else {
        start_index
    };

    println!("Device:  {}", cfg.capture_device);
    println!("Output:  {}", cfg.images.display());
    println!(
        "Press {:?} then Enter to save a frame, Esc then Enter to quit\n",
        char::from(CAPTURE_KEY)
    );

    let session = CaptureSession::new(cfg.frame_source(), &cfg.images, start);
    let mut keys = KeyReader::stdin();
    let summary = session.run(&mut keys).await?;

    for path in &summary.written {
        println!("  {}", path.display());
    }
    println!("\nCaptured {} image(s)", summary.written.len());

    Ok(())
}

/// Print resolved configuration
fn show_config(cfg: &ResolvedConfig) {
    println!("calibcat configuration");
    println!("{}", "-".repeat(60));
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Catalog:  {}", cfg.catalog.display());
    println!("  Images:   {}", cfg.images.display());
    println!();
    println!("Programs:");
    match &cfg.renderer {
        Some(spec) => println!("  Renderer: {} {}", spec.program, spec.args.join(" ")),
        None => println!("  Renderer: (not configured)"),
    }
    println!(
        "  Capture:  {} {}",
        cfg.capture_command.program,
        cfg.capture_command.args.join(" ")
    );
    println!("  Device:   {}", cfg.capture_device);
    println!("  Viewer:   {} {}", cfg.viewer.program, cfg.viewer.args.join(" "));
    println!();
    println!("Timeouts:");
    println!("  Render:   {}s", cfg.timeouts.render.as_secs());
    println!("  Capture:  {}s", cfg.timeouts.capture.as_secs());
    println!("  View:     {}s", cfg.timeouts.view.as_secs());
}

//! keystone-warp - inspect, edit and render perspective warps
//!
//! Warps are stored in a TOML configuration file. This tool prints the
//! resulting matrices, applies edit commands to the corner points, and
//! renders an image through a warp for a quick visual check.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nalgebra::Matrix4;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use keystone_warp::config::{Config, DEFAULT_WARP};
use keystone_warp::editing::{control_point_views, ControlPointView};
use keystone_warp::render::{draw_edit_grid, warp_image};
use keystone_warp::{EditCommand, WarpPerspective};

/// keystone-warp - perspective warps for projector edge blending
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "warps.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the transform and its inverse
    Matrix {
        /// Warp name (defaults to the first warp)
        #[arg(short, long)]
        warp: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply edit commands (rotate-cw, rotate-ccw, flip-horizontal,
    /// flip-vertical, select=N, nudge=DX,DY, reset) and save
    Edit {
        #[arg(short, long, default_value = DEFAULT_WARP)]
        warp: String,

        #[arg(required = true)]
        commands: Vec<EditCommand>,
    },

    /// Reset the corner points and save
    Reset {
        #[arg(short, long, default_value = DEFAULT_WARP)]
        warp: String,
    },

    /// Render an image through a warp
    Render {
        #[arg(short, long)]
        warp: Option<String>,

        /// Source image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image
        #[arg(short, long)]
        output: PathBuf,

        /// Draw the edit overlay on top
        #[arg(long)]
        grid: bool,
    },
}

/// JSON output of the `matrix` command
#[derive(Serialize)]
struct MatrixReport {
    warp: String,
    content_size: (u32, u32),
    window_size: (f32, f32),
    points: Vec<ControlPointView>,
    /// Row-major 4x4
    transform: [[f32; 4]; 4],
    inverse: [[f32; 4]; 4],
}

fn rows(m: &Matrix4<f32>) -> [[f32; 4]; 4] {
    std::array::from_fn(|r| std::array::from_fn(|c| m[(r, c)]))
}

fn print_matrix(label: &str, m: &Matrix4<f32>) {
    println!("{}:", label);
    for row in rows(m) {
        println!(
            "  [{:>12.6} {:>12.6} {:>12.6} {:>12.6}]",
            row[0], row[1], row[2], row[3]
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("keystone-warp v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_or_create(&args.config)?;

    match args.command {
        Command::Matrix { warp, json } => {
            let name = config.warp(warp.as_deref())?.name.clone();
            let mut warp = config.build_warp(Some(&name))?;
            let keystone = warp.keystone();

            if json {
                let window = warp.window_size();
                let report = MatrixReport {
                    warp: name,
                    content_size: warp.size(),
                    window_size: (window.x, window.y),
                    points: control_point_views(&warp),
                    transform: rows(&keystone.transform),
                    inverse: rows(&keystone.inverse),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Warp '{}'", name);
                print_matrix("Transform", &keystone.transform);
                print_matrix("Inverse", &keystone.inverse);
            }
        }

        Command::Edit { warp: name, commands } => {
            let mut warp = match config.build_warp(Some(&name)) {
                Ok(warp) => warp,
                Err(_) => {
                    info!("Creating warp '{}'", name);
                    WarpPerspective::new(config.display.width, config.display.height)
                }
            };

            for command in commands {
                info!("Applying {}", command);
                warp.apply(command);
            }

            config.store_warp(&name, &warp);
            config.save(&args.config)?;
        }

        Command::Reset { warp: name } => {
            let mut warp = config.build_warp(Some(&name))?;
            warp.reset();
            config.store_warp(&name, &warp);
            config.save(&args.config)?;
        }

        Command::Render {
            warp,
            input,
            output,
            grid,
        } => {
            let mut warp = config.build_warp(warp.as_deref())?;
            let src = image::open(&input)
                .with_context(|| format!("Failed to open image {:?}", input))?
                .to_rgb8();

            let mut out = warp_image(&src, &mut warp);
            if grid {
                warp.set_edit_mode(true);
                draw_edit_grid(&mut out, &mut warp);
            }

            out.save(&output)
                .with_context(|| format!("Failed to write image {:?}", output))?;
            info!("Wrote {:?} ({}x{})", output, out.width(), out.height());
        }
    }

    Ok(())
}

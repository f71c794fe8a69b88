//! Command-line interface for footscan.
//!
//! Provides commands for inspecting the generated target ring, scanning
//! pre-captured datasets, driving the reconstruction engine over a
//! dataset, and showing the resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nalgebra::Point3;

use crate::capture::PoseRing;
use crate::config;
use crate::dataset::DatasetLoader;
use crate::reconstruction::{
    CommandEngine, InputPartitioner, OrchestratorPolicy, ReconstructionOrchestrator,
    ReconstructionOutcome,
};

/// footscan - Guided multi-view capture orchestrator for 3D foot scanning
#[derive(Parser, Debug)]
#[command(name = "footscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the generated target ring
    Ring {
        /// Number of targets on the ring
        #[arg(short, long)]
        count: Option<usize>,

        /// Ring rotation offset, radians
        #[arg(short, long, default_value = "0.0")]
        offset: f32,

        /// Pivot point as "x,y,z" (defaults to the origin)
        #[arg(short, long)]
        pivot: Option<String>,
    },

    /// Scan a pre-captured dataset directory and show its partitioning
    Dataset {
        /// Directory holding the captured artifacts
        #[arg(short, long)]
        dir: PathBuf,

        /// Emit the partitioned groups as JSON
        #[arg(long)]
        json: bool,
    },

    /// Partition a dataset and run the reconstruction engine over it
    Reconstruct {
        /// Directory holding the captured artifacts
        #[arg(short, long)]
        dir: PathBuf,

        /// Reconstruction binary (defaults to the configured engine)
        #[arg(short, long)]
        engine: Option<String>,

        /// Destination for the produced model
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Delete the capture files once the run has consumed them
        #[arg(long)]
        cleanup: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Ring {
                count,
                offset,
                pivot,
            } => show_ring(count, offset, pivot),
            Commands::Dataset { dir, json } => show_dataset(&dir, json),
            Commands::Reconstruct {
                dir,
                engine,
                output,
                cleanup,
            } => run_reconstruction(&dir, engine, output, cleanup).await,
            Commands::Config => show_config(),
        }
    }
}

fn parse_pivot(pivot: Option<String>) -> Result<Point3<f32>> {
    let Some(text) = pivot else {
        return Ok(Point3::origin());
    };

    let parts: Vec<f32> = text
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid pivot '{}', expected \"x,y,z\"", text))?;

    if parts.len() != 3 {
        anyhow::bail!("Invalid pivot '{}', expected three components", text);
    }
    Ok(Point3::new(parts[0], parts[1], parts[2]))
}

fn show_ring(count: Option<usize>, offset: f32, pivot: Option<String>) -> Result<()> {
    let cfg = config::config()?;
    let count = count.unwrap_or(cfg.capture.ring_count);
    let pivot = parse_pivot(pivot)?;

    let targets = PoseRing::new(&cfg.capture).generate(pivot, offset, count);

    println!(
        "Target ring: {} poses around ({:.3}, {:.3}, {:.3}), offset {:.3} rad",
        targets.len(),
        pivot.x,
        pivot.y,
        pivot.z,
        offset
    );
    println!();
    for target in &targets {
        println!(
            "  [{}] pos ({:+.3}, {:+.3}, {:+.3})  tilt {:+.3}  yaw {:+.3}",
            target.index,
            target.position.x,
            target.position.y,
            target.position.z,
            target.orientation.x,
            target.orientation.y,
        );
    }

    Ok(())
}

fn show_dataset(dir: &PathBuf, json: bool) -> Result<()> {
    let cfg = config::config()?;

    let outputs = DatasetLoader::with_settings(dir, cfg.output.clone())
        .load(cfg.capture.ring_count)
        .with_context(|| format!("Failed to load dataset from {}", dir.display()))?;

    let input = InputPartitioner::new(cfg.partition.clone()).partition(&outputs);

    if json {
        println!("{}", serde_json::to_string_pretty(&input)?);
    } else {
        println!("Dataset: {} ({} frames)", dir.display(), outputs.len());
        println!();
        println!("{}", input.summary());
    }

    Ok(())
}

async fn run_reconstruction(
    dir: &PathBuf,
    engine: Option<String>,
    output: Option<PathBuf>,
    cleanup: bool,
) -> Result<()> {
    let cfg = config::config()?;

    let outputs = DatasetLoader::with_settings(dir, cfg.output.clone())
        .load(cfg.capture.ring_count)
        .with_context(|| format!("Failed to load dataset from {}", dir.display()))?;

    if outputs.is_empty() {
        anyhow::bail!("No capture frames found in {}", dir.display());
    }

    let input = InputPartitioner::new(cfg.partition.clone()).partition(&outputs);

    let binary = engine.unwrap_or_else(|| cfg.engine.binary.clone());
    let output_path = match output {
        Some(path) => path,
        None => {
            let models_dir = cfg.models_dir();
            std::fs::create_dir_all(&models_dir)
                .with_context(|| format!("Failed to create {}", models_dir.display()))?;
            models_dir.join("foot.obj")
        }
    };

    let engine = Arc::new(CommandEngine::new(
        binary,
        Duration::from_secs(cfg.engine.timeout_seconds),
    ));
    let policy = OrchestratorPolicy {
        fallback_model: cfg.engine.fallback_model.clone(),
        cleanup_inputs: cleanup,
    };

    let (orchestrator, mut outcomes) = ReconstructionOrchestrator::spawn(engine, policy);
    orchestrator.run(input, output_path);

    let outcome = outcomes
        .recv()
        .await
        .context("Reconstruction worker exited without an outcome")?;
    orchestrator.shutdown().await;

    match outcome {
        ReconstructionOutcome::Success { model_path } => {
            println!("Reconstruction succeeded: {}", model_path.display());
            Ok(())
        }
        ReconstructionOutcome::Failed { fallback: Some(path) } => {
            println!("Reconstruction failed; using fallback model {}", path.display());
            Ok(())
        }
        ReconstructionOutcome::Failed { fallback: None } => {
            anyhow::bail!("Reconstruction failed")
        }
    }
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("footscan configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Captures: {}", cfg.captures_dir().display());
    println!("  Models:   {}", cfg.models_dir().display());
    println!();
    println!("Capture:");
    println!("  Ring count:         {}", cfg.capture.ring_count);
    println!("  Ring radius:        {} m", cfg.capture.ring_radius);
    println!("  Capture height:     {} m", cfg.capture.capture_height);
    println!("  Position tolerance: {} m", cfg.capture.position_tolerance);
    println!("  Sole captures:      {}", cfg.capture.required_sole_captures);
    println!();
    println!("Partition tables:");
    println!("  Lateral A: {:?}", cfg.partition.lateral_a);
    println!("  Lateral B: {:?}", cfg.partition.lateral_b);
    println!("  Shared:    {:?}", cfg.partition.shared);
    println!();
    println!("Engine:");
    println!("  Binary:  {}", cfg.engine.binary);
    println!("  Timeout: {}s", cfg.engine.timeout_seconds);
    println!(
        "  Fallback model: {}",
        cfg.engine
            .fallback_model
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );

    Ok(())
}

//! Loss Probe
//!
//! Runs a few SGD steps of a small two-headed model on solved search trajectories,
//! scoring every trajectory with the selected imitation loss and logging how the
//! loss decomposes.
//!
//! ## Usage
//!
//! ```bash
//! # Cross-entropy on the built-in grid-world sample
//! cargo run --bin loss_probe
//!
//! # Improved Levin loss on recorded trajectories
//! cargo run --bin loss_probe -- --kind ImprovedLevinLoss \
//!     --trajectories demos/data/trajectories.json
//!
//! # Loss selected by configuration file
//! cargo run --bin loss_probe -- --config demos/data/levin_mse.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use burn::{
    backend::{Autodiff, NdArray},
    optim::{GradientsParams, Optimizer, SgdConfig},
};
use clap::Parser;
use levin_loss::{ImageState, LossConfig, LossKind, Trajectory, TrajectoryRecord};
use levin_loss_demos::{sample_trajectories, ProbeNetConfig, GRID_ACTIONS};
use tracing_subscriber::EnvFilter;

type ProbeBackend = Autodiff<NdArray>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Loss configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the loss, e.g. `LevinLoss` or `improved_levin`
    #[arg(short, long)]
    kind: Option<String>,

    /// Trajectory file: a JSON array of trajectory records
    #[arg(short, long)]
    trajectories: Option<PathBuf>,

    /// Size of the action space
    #[arg(long, default_value_t = GRID_ACTIONS)]
    actions: usize,

    /// Passes over the trajectories
    #[arg(long, default_value_t = 5)]
    steps: usize,

    #[arg(long, default_value_t = 0.05)]
    learning_rate: f64,
}

fn load_trajectories(path: &Path) -> Result<Vec<Trajectory<ImageState>>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trajectory file: {}", path.display()))?;
    let records: Vec<TrajectoryRecord<ImageState>> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse trajectory file: {}", path.display()))?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_trajectory()
                .with_context(|| format!("Trajectory {index} in {} is invalid", path.display()))
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = if let Some(config_path) = &args.config {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        serde_json::from_str::<LossConfig>(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?
    } else {
        LossConfig::new()
    };
    if let Some(kind) = &args.kind {
        config.kind = kind.parse::<LossKind>()?;
    }

    let trajectories = match &args.trajectories {
        Some(path) => load_trajectories(path)?,
        None => sample_trajectories()?,
    };

    ensure!(!trajectories.is_empty(), "No trajectories to score");
    ensure!(args.steps > 0, "Number of steps must be greater than 0");
    ensure!(args.learning_rate > 0.0, "Learning rate must be positive");

    let [channels, height, width] = trajectories[0].states()[0].shape();
    let widest_action = trajectories
        .iter()
        .flat_map(|trajectory| trajectory.actions().iter().copied())
        .max()
        .unwrap_or(0);
    ensure!(
        widest_action < args.actions,
        "Action {widest_action} does not fit an action space of size {}",
        args.actions
    );

    let device = Default::default();
    let mut model = ProbeNetConfig::new(channels * height * width, args.actions)
        .init::<ProbeBackend>(&device);
    let mut optimizer = SgdConfig::new().init();
    let strategy = config.init();

    tracing::info!(
        loss = strategy.kind().name(),
        trajectories = trajectories.len(),
        steps = args.steps,
        "starting loss probe"
    );

    for step in 0..args.steps {
        let mut epoch_total = 0.0;
        for (index, trajectory) in trajectories.iter().enumerate() {
            let terms = strategy
                .compute_terms(trajectory, &model)
                .with_context(|| format!("Scoring trajectory {index} failed"))?;
            let summary = terms.summary();
            tracing::debug!(
                step,
                trajectory = index,
                classification = ?summary.classification,
                multiplier = summary.multiplier,
                regression = ?summary.regression,
                total = summary.total,
                "scored trajectory"
            );
            epoch_total += summary.total;

            let grads = GradientsParams::from_grads(terms.total.backward(), &model);
            model = optimizer.step(args.learning_rate, model, grads);
        }

        tracing::info!(
            step,
            mean_loss = epoch_total / trajectories.len() as f64,
            "completed pass"
        );
    }

    tracing::info!("loss probe completed");
    Ok(())
}

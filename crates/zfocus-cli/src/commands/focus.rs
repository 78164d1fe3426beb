use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use zfocus_core::autofocus::{
    Autofocus, AutofocusConfig, Evaluation, FocusStage, ProgressReporter, SearchStrategy,
};
use zfocus_core::io::load_stack;
use zfocus_core::search::{BrentParams, GridSearchParams};
use zfocus_core::sim::SimulatedMicroscope;

use super::{check_crop, MetricArg};
use crate::summary::{print_evaluations, print_focus_summary, print_outcome, StackInfo};

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Grid,
    Brent,
}

#[derive(Args)]
pub struct FocusArgs {
    /// z-stack slices, in ascending z order
    #[arg(long, num_args = 1.., required = true)]
    pub stack: Vec<PathBuf>,

    /// Autofocus config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// z distance between slices (um)
    #[arg(long, default_value = "1.0", allow_negative_numbers = true)]
    pub z_step: f64,

    /// z of the first slice (um)
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    pub z_first: f64,

    /// Stage position the search starts from (um) [default: stack center]
    #[arg(long, allow_negative_numbers = true)]
    pub start_z: Option<f64>,

    /// Search strategy, overrides the config
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Focus metric, overrides the config
    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,

    /// Centered crop factor (0.01-1.0), overrides the config
    #[arg(long)]
    pub crop: Option<f64>,

    /// Print every evaluation after the run
    #[arg(long)]
    pub table: bool,
}

/// Drives an indicatif bar from controller progress events.
struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: FocusStage, total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        if let Some(total) = total_items {
            self.bar.set_length(total as u64);
            self.bar.set_position(0);
        }
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn evaluated(&self, evaluation: &Evaluation) {
        self.bar
            .set_message(format!("z = {:.3} um, score {:.4}", evaluation.z, evaluation.score));
    }
}

pub fn run(args: &FocusArgs) -> Result<()> {
    let config = build_config(args)?;

    let frames = load_stack(&args.stack).context("Failed to load z-stack")?;
    let first = frames.first().context("Empty z-stack")?;
    let info = StackInfo {
        slices: frames.len(),
        width: first.width(),
        height: first.height(),
        z_first: args.z_first,
        z_step: args.z_step,
    };
    let start_z = args.start_z.unwrap_or(info.center_z());

    let sim = SimulatedMicroscope::from_stack(frames, args.z_first, args.z_step)
        .context("Invalid z-stack")?
        .at_z(start_z);

    print_focus_summary(&config, &info, start_z);

    let pb = ProgressBar::new(config.strategy.max_evaluations() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:32} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: pb.clone() });

    let mut af = Autofocus::new(sim.clone(), sim.clone(), sim, config)
        .context("Invalid autofocus config")?
        .with_reporter(reporter);

    let outcome = af.run();
    pb.finish_and_clear();
    let outcome = outcome.context("Autofocus failed")?;

    print_outcome(&outcome);
    if args.table {
        print_evaluations(&outcome.evaluations);
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &FocusArgs) -> Result<AutofocusConfig> {
    let mut config: AutofocusConfig = if let Some(ref path) = args.config {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).context("Invalid autofocus config")?
    } else {
        AutofocusConfig::default()
    };

    if let Some(metric) = args.metric {
        config.metric = metric.into();
    }
    if let Some(crop) = args.crop {
        config.crop_factor = check_crop(crop)?;
    }
    // Keep configured parameters when the strategy kind already matches.
    config.strategy = match (args.strategy, config.strategy) {
        (Some(StrategyArg::Grid), SearchStrategy::Brent(_)) => {
            SearchStrategy::Grid(GridSearchParams::default())
        }
        (Some(StrategyArg::Brent), SearchStrategy::Grid(_)) => {
            SearchStrategy::Brent(BrentParams::default())
        }
        (_, current) => current,
    };
    debug!(metric = %config.metric, strategy = %config.strategy, crop = config.crop_factor, "Effective autofocus config");
    Ok(config)
}

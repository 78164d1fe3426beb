use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use zfocus_core::io::load_image;
use zfocus_core::quality::{BandpassCutoffs, FocusMetric, FocusScorer};

use super::{check_crop, MetricArg};

#[derive(Args)]
pub struct ScoreArgs {
    /// Image files to score
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Focus metric to use
    #[arg(long, value_enum, default_value = "edges")]
    pub metric: MetricArg,

    /// Score with every metric
    #[arg(long, conflicts_with = "metric")]
    pub all: bool,

    /// Centered crop factor applied before scoring (0.01-1.0)
    #[arg(long, default_value = "1.0")]
    pub crop: f64,

    /// Lower FFT band-pass cutoff, percent of the spectrum radius
    #[arg(long, default_value = "2.5")]
    pub lower: f64,

    /// Upper FFT band-pass cutoff, percent of the spectrum radius
    #[arg(long, default_value = "14")]
    pub upper: f64,
}

pub fn run(args: &ScoreArgs) -> Result<()> {
    let crop = check_crop(args.crop)?;
    let metrics: Vec<FocusMetric> = if args.all {
        FocusMetric::ALL.to_vec()
    } else {
        vec![args.metric.into()]
    };
    let cutoffs = BandpassCutoffs::new(args.lower, args.upper);
    let mut scorers: Vec<FocusScorer> = metrics
        .iter()
        .map(|&m| FocusScorer::with_bandpass(m, cutoffs))
        .collect();

    let pb = ProgressBar::new(args.files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Scoring images");

    let mut rows: Vec<(String, Vec<f64>)> = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let frame = load_image(path).with_context(|| format!("Failed to load {}", path.display()))?;
        let region = frame.bounds().centered(crop);
        let scores = scorers
            .iter_mut()
            .map(|s| s.score_region(&frame, &region))
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to score {}", path.display()))?;
        rows.push((display_name(path), scores));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let name_width = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(4).max(4);
    print!("{:<name_width$}", "File");
    for m in &metrics {
        print!("  {:>18}", m.name());
    }
    println!();
    println!("{}", "-".repeat(name_width + 20 * metrics.len()));
    for (name, scores) in &rows {
        print!("{name:<name_width$}");
        for s in scores {
            print!("  {s:>18.6}");
        }
        println!();
    }

    if rows.len() > 1 {
        println!();
        for (i, m) in metrics.iter().enumerate() {
            let best = rows
                .iter()
                .max_by(|a, b| a.1[i].total_cmp(&b.1[i]))
                .map(|(name, _)| name.as_str())
                .unwrap_or("-");
            println!("Sharpest by {:<20}{best}", format!("{m}:"));
        }
    }

    Ok(())
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

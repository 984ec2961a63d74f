// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap`, hands off to Layer 2, and prints the results.
// All business logic lives in the application layer.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, ShowArgs, StatsArgs};

use crate::application::{
    inspect_use_case::{show_stats, InspectUseCase},
    stats_use_case::StatsUseCase,
};
use crate::domain::{modality::Modality, stats::DatasetStats};

#[derive(Parser, Debug)]
#[command(
    name = "sketch-stats",
    version,
    about = "Normalization statistics for a paired photo/sketch image dataset."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Stats(args)   => run_stats(args),
            Commands::Inspect(args) => run_inspect(args),
            Commands::Show(args)    => run_show(args),
        }
    }
}

fn run_stats(args: StatsArgs) -> Result<()> {
    tracing::info!("Computing statistics for dataset in: {}", args.dataset.data_root);

    let output = args.output.clone();
    let stats  = StatsUseCase::new(args.into()).execute()?;

    print_stats(&stats);
    println!("\nSaved to {output}");
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let report = InspectUseCase::new(args.into()).execute()?;

    println!("Classes:  {}", report.classes.len());
    println!("Photos:   {}", report.photos);
    println!("Sketches: {}", report.sketches());

    let f = &report.filter;
    println!(
        "Quality flags: error={} context={} ambiguous={} wrong_pose={}",
        f.error, f.context, f.ambiguous, f.wrong_pose
    );
    println!("Unflagged sketches: {}", f.clean);
    println!("Sketches kept by filter: {} (dropped {})", f.kept, f.dropped);

    println!("\n{:<24} {:>6} {:>8} {:>6} {:>8}", "class", "photos", "sketches", "kept", "dropped");
    for c in &report.classes {
        println!(
            "{:<24} {:>6} {:>8} {:>6} {:>7.1}%",
            c.class,
            c.photos,
            c.sketches,
            c.sketches_kept,
            c.dropped_fraction() * 100.0,
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let report = show_stats(&args.stats)?;
    print_stats(&report.stats);

    println!("\nPixel range [0, 1] after normalization:");
    for (modality, range) in &report.ranges {
        let cells: Vec<String> = range
            .iter()
            .map(|(lo, hi)| format!("[{lo:+.3}, {hi:+.3}]"))
            .collect();
        println!("{:<6} {}", modality, cells.join(" "));
    }

    if let Some(labels) = &report.labels {
        println!("\nClasses: {}", labels.len());
        for label in 0..labels.len() {
            if let Some(name) = labels.name_of(label) {
                println!("{label:>4}  {name}");
            }
        }
    }
    Ok(())
}

fn print_stats(stats: &DatasetStats) {
    for modality in Modality::ALL {
        let s = stats.get(modality);
        println!(
            "{:<6} mean=[{:.4}, {:.4}, {:.4}] std=[{:.4}, {:.4}, {:.4}] scale={:.4}",
            modality,
            s.mean[0], s.mean[1], s.mean[2],
            s.std[0],  s.std[1],  s.std[2],
            s.scale,
        );
    }
}

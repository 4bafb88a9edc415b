//! Batch FRAP analysis over a directory of TIFF stacks.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use bleachtrace::batch::{AlwaysProceed, BatchConfig, BatchOutcome, BatchRunner, OverwritePolicy, StdinPrompt};
use bleachtrace::diagnostics::PanelRenderer;
use bleachtrace::segmentation::HistogramBackend;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract normalized FRAP recovery curves from TIFF stacks")]
struct Args {
    /// Directory containing the input TIFF stacks
    #[arg(long)]
    read_dir: PathBuf,

    /// Directory to write curves and diagnostics into
    #[arg(long)]
    save_dir: PathBuf,

    /// Index of the first post-bleach frame
    #[arg(long)]
    bleach_frame: usize,

    /// Measurement radius in pixels
    #[arg(long)]
    radius: f64,

    /// Comma-separated timepoints; their count sets the analysis window
    #[arg(long, value_delimiter = ',', required = true)]
    times: Vec<f64>,

    /// Write a burn spot diagnostic image per stack
    #[arg(long)]
    save_diagnostics: bool,

    /// Reuse an existing save directory without prompting
    #[arg(long, short = 'y')]
    yes: bool,
}

#[derive(Serialize)]
struct CurveReport {
    times: Vec<f64>,
    curves: Vec<Vec<f64>>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = BatchConfig {
        read_dir: args.read_dir,
        save_dir: args.save_dir,
        time_array: args.times,
        bleach_frame: args.bleach_frame,
        radius: args.radius,
        save_diagnostics: args.save_diagnostics,
    };

    let policy: Box<dyn OverwritePolicy> = if args.yes {
        Box::new(AlwaysProceed)
    } else {
        Box::new(StdinPrompt)
    };
    let runner = BatchRunner::new(HistogramBackend, PanelRenderer, policy);

    match runner.run(&config).context("batch analysis failed")? {
        BatchOutcome::Completed(matrix) => {
            let report = CurveReport {
                times: config.time_array.clone(),
                curves: matrix.rows().into_iter().map(|row| row.to_vec()).collect(),
            };
            let out_path = config.save_dir.join("recovery_curves.json");
            let file = std::fs::File::create(&out_path)
                .with_context(|| format!("creating {}", out_path.display()))?;
            serde_json::to_writer_pretty(file, &report)
                .with_context(|| format!("writing {}", out_path.display()))?;
            tracing::info!("wrote {} curves to {}", report.curves.len(), out_path.display());
        }
        BatchOutcome::Aborted => {
            tracing::info!("aborted, nothing written");
        }
    }

    Ok(())
}

//! Resale price forecasting - command-line entry point

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use polars::prelude::*;
use tracing::info;

use resale_forecast::{ForecastPipeline, PipelineConfig};
use resale_forecast::preprocessing::ScalerType;
use resale_forecast::training::ParamGrid;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScalerArg {
    Standard,
    Robust,
}

impl From<ScalerArg> for ScalerType {
    fn from(arg: ScalerArg) -> Self {
        match arg {
            ScalerArg::Standard => ScalerType::Standard,
            ScalerArg::Robust => ScalerType::Robust,
        }
    }
}

/// Train a resale price model and project prices over a future horizon
#[derive(Parser, Debug)]
#[command(name = "resale-forecast", version, about)]
struct Cli {
    /// CSV file of resale transactions
    #[arg(short, long)]
    data: PathBuf,

    /// Rows before this year train the model; the rest evaluate it
    #[arg(long, default_value_t = 2024)]
    cutoff_year: i32,

    /// First year of the projection horizon
    #[arg(long, default_value_t = 2025)]
    horizon_start: i32,

    /// Last year of the projection horizon
    #[arg(long, default_value_t = 2045)]
    horizon_end: i32,

    /// Expected fraction of anomalous rows to drop before training
    #[arg(long, default_value_t = 0.01)]
    contamination: f64,

    /// Feature scaling strategy
    #[arg(long, value_enum, default_value_t = ScalerArg::Robust)]
    scaler: ScalerArg,

    /// Compute grouped statistics from pre-cutoff rows only
    #[arg(long)]
    train_only_aggregates: bool,

    /// Number of time-ordered cross-validation folds
    #[arg(long, default_value_t = 5)]
    cv_splits: usize,

    /// Use a single small configuration instead of the full grid
    #[arg(long)]
    quick: bool,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory for the model artifact and projection CSV
    #[arg(short, long, default_value = "output")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resale_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(cli.data.clone()))?
        .finish()
        .with_context(|| format!("failed to read {}", cli.data.display()))?;
    info!(rows = raw.height(), path = %cli.data.display(), "loaded transactions");

    let grid = if cli.quick {
        ParamGrid::minimal()
    } else {
        ParamGrid::default()
    };
    let config = PipelineConfig::new()
        .with_cutoff_year(cli.cutoff_year)
        .with_horizon(cli.horizon_start, cli.horizon_end)
        .with_contamination(cli.contamination)
        .with_scaler(cli.scaler.into())
        .with_train_only_aggregates(cli.train_only_aggregates)
        .with_cv_splits(cli.cv_splits)
        .with_grid(grid)
        .with_seed(cli.seed);

    let outcome = ForecastPipeline::new(config).run(&raw)?;

    println!("Training rows:   {}", outcome.train_rows);
    println!("Evaluation rows: {}", outcome.eval_rows);
    println!("Outliers dropped: {}", outcome.rows_flagged);
    println!("Selected params: {:?}", outcome.artifact.params);
    println!("CV mean MSE:     {:.2}", outcome.cv_score);
    match &outcome.evaluation {
        Some(report) => {
            println!("Held-out RMSE:   {:.2}", report.rmse);
            println!("Held-out MAE:    {:.2}", report.mae);
            println!("Held-out R2:     {:.4}", report.r2);
        }
        None => println!("Held-out metrics: no rows at or after the cutoff year"),
    }

    println!("\nTop features:");
    for (name, importance) in outcome.ranked_features.iter().take(10) {
        println!("  {name:<28} {importance:.4}");
    }

    std::fs::create_dir_all(&cli.output)?;

    let artifact_path = cli.output.join("model.json");
    outcome.artifact.save(&artifact_path)?;

    let projection_path = cli.output.join("projections.csv");
    let mut projections = outcome.projections;
    CsvWriter::new(File::create(&projection_path)?).finish(&mut projections)?;
    info!(path = %projection_path.display(), "wrote projections");

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use food_train::{run_training, Args, LogTracker, MlflowClient, YoloCli};

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.train_config();

    let metrics = if args.no_track {
        run_training(&config, &YoloCli, &mut LogTracker)?
    } else {
        info!("Tracking to {} (experiment {})", args.tracking_uri, args.experiment);
        let client = MlflowClient::new(&args.tracking_uri);
        let experiment_id = client
            .get_or_create_experiment(&args.experiment)
            .with_context(|| format!("MLflow unreachable at {}", args.tracking_uri))?;
        let mut run = client.start_run(&experiment_id, &config.name)?;
        let metrics = run_training(&config, &YoloCli, &mut run)?;
        info!("MLflow run id: {}", run.run_id());
        metrics
    };

    info!("✓ Training finished");
    info!("  mAP50:     {:.4}", metrics.map50);
    info!("  precision: {:.4}", metrics.precision);
    info!("  recall:    {:.4}", metrics.recall);
    info!("  weights:   {}", config.best_weights().display());
    Ok(())
}

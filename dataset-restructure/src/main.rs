use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dataset_restructure::{restructure, Args, SplitConfig};

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = SplitConfig {
        train: args.train,
        val: args.val,
        extensions: args.extensions.clone(),
        seed: args.seed,
    };
    let partition = restructure(&args.root, &config, args.dry_run)?;

    if args.dry_run {
        println!("\nDry run, nothing copied.");
    } else {
        println!("\nDataset restructured successfully!");
    }
    println!(
        "Total images: {} | train: {}, val: {}, test: {}",
        partition.total(),
        partition.train.len(),
        partition.valid.len(),
        partition.test.len()
    );
    let root = args.root.display();
    println!("Check folders: {root}/train, {root}/valid, {root}/test");

    Ok(())
}

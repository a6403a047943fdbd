use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// dataset root holding one folder per class
    #[arg(long, required = true)]
    pub root: PathBuf,

    /// fraction of images for train
    #[arg(long, default_value_t = 0.8)]
    pub train: f64,

    /// fraction of images for valid; test takes the rest
    #[arg(long, default_value_t = 0.1)]
    pub val: f64,

    /// accepted image extensions
    #[arg(long, value_delimiter = ',', default_values_t = ["jpg".to_string(), "jpeg".to_string(), "png".to_string()])]
    pub extensions: Vec<String>,

    /// shuffle seed, random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// report the split without copying anything
    #[arg(long)]
    pub dry_run: bool,
}

pub mod cli;
pub mod split;
pub mod utils;

pub use crate::cli::Args;
pub use crate::split::{restructure, split_counts, CopyStats, Partition, SplitConfig, SplitError};

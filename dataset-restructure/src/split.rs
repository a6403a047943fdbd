use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::utils::{get_all_dirs, get_all_files, is_valid_image, label_path_for};

pub const SPLIT_NAMES: [&str; 3] = ["train", "valid", "test"];

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("invalid split ratios train={train} val={val}: each must be in [0, 1] and their sum at most 1")]
    InvalidRatios { train: f64, val: f64 },

    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> SplitError + '_ {
    move |source| SplitError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub train: f64,
    pub val: f64,
    pub extensions: Vec<String>,
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train: 0.8,
            val: 0.1,
            extensions: crate::utils::DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            seed: None,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), SplitError> {
        let in_unit = |r: f64| (0.0..=1.0).contains(&r);
        if in_unit(self.train) && in_unit(self.val) && self.train + self.val <= 1.0 + 1e-9 {
            Ok(())
        } else {
            Err(SplitError::InvalidRatios {
                train: self.train,
                val: self.val,
            })
        }
    }

    fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// Images assigned to each split.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub train: Vec<PathBuf>,
    pub valid: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

impl Partition {
    pub fn total(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    pub fn splits(&self) -> [(&'static str, &[PathBuf]); 3] {
        [
            (SPLIT_NAMES[0], self.train.as_slice()),
            (SPLIT_NAMES[1], self.valid.as_slice()),
            (SPLIT_NAMES[2], self.test.as_slice()),
        ]
    }
}

/// `(n_train, n_val, n_test)` for `total` images; test takes the remainder.
pub fn split_counts(total: usize, train: f64, val: f64) -> (usize, usize, usize) {
    let n_train = ((train * total as f64).floor() as usize).min(total);
    let n_val = ((val * total as f64).floor() as usize).min(total - n_train);
    (n_train, n_val, total - n_train - n_val)
}

/// Every image with an accepted extension in the class folders under `root`.
/// Existing split folders are skipped.
pub fn collect_images(root: &Path, config: &SplitConfig) -> Result<Vec<PathBuf>, SplitError> {
    if !root.is_dir() {
        return Err(SplitError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    let extensions = config.normalized_extensions();
    let mut images = Vec::new();
    for class_dir in get_all_dirs(root).map_err(io_err(root))? {
        let is_split = class_dir
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| SPLIT_NAMES.contains(&name));
        if is_split {
            continue;
        }
        for file in get_all_files(&class_dir).map_err(io_err(&class_dir))? {
            if is_valid_image(&file, &extensions) {
                images.push(file);
            }
        }
    }
    Ok(images)
}

/// Shuffle and cut `images` into train/valid/test.
pub fn partition(mut images: Vec<PathBuf>, config: &SplitConfig) -> Result<Partition, SplitError> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    images.shuffle(&mut rng);

    let (n_train, n_val, _) = split_counts(images.len(), config.train, config.val);
    let test = images.split_off(n_train + n_val);
    let valid = images.split_off(n_train);
    Ok(Partition {
        train: images,
        valid,
        test,
    })
}

/// Create `<root>/<split>/{images,labels}` for every split.
pub fn create_split_dirs(root: &Path) -> Result<(), SplitError> {
    for split in SPLIT_NAMES {
        for kind in ["images", "labels"] {
            let dir = root.join(split).join(kind);
            fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        }
    }
    Ok(())
}

/// What one `copy_files` call wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub images: usize,
    pub labels: usize,
    /// Images whose destination already existed, e.g. the same file name
    /// in two class folders.
    pub overwritten: usize,
}

/// Copy each image, and its label when one exists, into `<root>/<split>`.
pub fn copy_files(root: &Path, images: &[PathBuf], split: &str) -> Result<CopyStats, SplitError> {
    let mut stats = CopyStats::default();
    for img_path in images {
        let Some(img_name) = img_path.file_name() else {
            continue;
        };
        let dst_img = root.join(split).join("images").join(img_name);
        if dst_img.exists() {
            warn!(
                "{} already exists, overwriting with {}",
                dst_img.display(),
                img_path.display()
            );
            stats.overwritten += 1;
        }
        fs::copy(img_path, &dst_img).map_err(io_err(img_path))?;
        stats.images += 1;

        let label_path = label_path_for(img_path);
        if label_path.is_file() {
            if let Some(label_name) = label_path.file_name() {
                let dst_lbl = root.join(split).join("labels").join(label_name);
                fs::copy(&label_path, &dst_lbl).map_err(io_err(&label_path))?;
                stats.labels += 1;
            }
        }
        info!("Copied: {} → {}", img_name.to_string_lossy(), split);
    }
    Ok(stats)
}

/// Collect, partition and (unless `dry_run`) copy the dataset under `root`.
pub fn restructure(root: &Path, config: &SplitConfig, dry_run: bool) -> Result<Partition, SplitError> {
    config.validate()?;
    let images = collect_images(root, config)?;
    let partition = partition(images, config)?;
    if !dry_run {
        create_split_dirs(root)?;
        let mut overwritten = 0;
        for (split, images) in partition.splits() {
            overwritten += copy_files(root, images, split)?.overwritten;
        }
        if overwritten > 0 {
            warn!(
                "{} images share a file name with another image and were overwritten",
                overwritten
            );
        }
    }
    Ok(partition)
}

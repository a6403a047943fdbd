use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info, warn};

use crate::error::TrainError;
use crate::results::{read_final_metrics, TrainMetrics};
use crate::tracking::{RunStatus, Tracker};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub yolo_bin: String,
    pub model: String,
    pub data: String,
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    pub project: PathBuf,
    pub name: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            yolo_bin: "yolo".to_string(),
            model: "yolov8n.pt".to_string(),
            data: "data/IndianFoodDatasetFinalFiltered/data.yaml".to_string(),
            epochs: 30,
            imgsz: 640,
            batch: 16,
            project: PathBuf::from("runs/train"),
            name: "foodalyze_yolov8".to_string(),
        }
    }
}

impl TrainConfig {
    /// Arguments for `yolo detect train`.
    pub fn args(&self) -> Vec<String> {
        vec![
            "detect".to_string(),
            "train".to_string(),
            format!("data={}", self.data),
            format!("model={}", self.model),
            format!("epochs={}", self.epochs),
            format!("imgsz={}", self.imgsz),
            format!("batch={}", self.batch),
            format!("project={}", self.project.display()),
            format!("name={}", self.name),
            "exist_ok=True".to_string(),
        ]
    }

    pub fn params(&self) -> [(&'static str, String); 4] {
        [
            ("model", self.model.clone()),
            ("epochs", self.epochs.to_string()),
            ("img_size", self.imgsz.to_string()),
            ("batch", self.batch.to_string()),
        ]
    }

    pub fn run_dir(&self) -> PathBuf {
        self.project.join(&self.name)
    }

    pub fn results_csv(&self) -> PathBuf {
        self.run_dir().join("results.csv")
    }

    pub fn best_weights(&self) -> PathBuf {
        self.run_dir().join("weights").join("best.pt")
    }
}

/// Runs the actual training.
pub trait Trainer {
    fn train(&self, config: &TrainConfig) -> Result<(), TrainError>;
}

/// The Ultralytics `yolo` command line.
#[derive(Debug, Default)]
pub struct YoloCli;

impl Trainer for YoloCli {
    fn train(&self, config: &TrainConfig) -> Result<(), TrainError> {
        let args = config.args();
        info!("Running {} {}", config.yolo_bin, args.join(" "));
        let status = Command::new(&config.yolo_bin)
            .args(&args)
            .status()
            .map_err(|source| TrainError::Spawn {
                bin: config.yolo_bin.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(TrainError::TrainerFailed(status.code()))
        }
    }
}

/// Train, then record params, final metrics and best weights on `tracker`.
/// Any failure marks the run FAILED before the error is returned.
pub fn run_training(
    config: &TrainConfig,
    trainer: &dyn Trainer,
    tracker: &mut dyn Tracker,
) -> Result<TrainMetrics, TrainError> {
    match train_and_record(config, trainer, tracker) {
        Ok(metrics) => Ok(metrics),
        Err(e) => {
            error!("Training failed: {}", e);
            if let Err(finish_err) = tracker.finish(RunStatus::Failed) {
                warn!("Could not mark run as failed: {}", finish_err);
            }
            Err(e)
        }
    }
}

fn train_and_record(
    config: &TrainConfig,
    trainer: &dyn Trainer,
    tracker: &mut dyn Tracker,
) -> Result<TrainMetrics, TrainError> {
    for (key, value) in config.params() {
        tracker.log_param(key, &value)?;
    }

    trainer.train(config)?;
    let metrics = read_final_metrics(&config.results_csv())?;

    for (key, value) in metrics.as_pairs() {
        tracker.log_metric(key, value)?;
    }
    log_weights(&config.best_weights(), tracker)?;
    tracker.finish(RunStatus::Finished)?;
    Ok(metrics)
}

fn log_weights(path: &Path, tracker: &mut dyn Tracker) -> Result<(), TrainError> {
    if path.is_file() {
        tracker.log_artifact(path)?;
    } else {
        warn!("No weights at {}, skipping artifact upload", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackingError;
    use std::fs;

    #[derive(Default)]
    struct Recorder {
        params: Vec<(String, String)>,
        metrics: Vec<(String, f64)>,
        artifacts: Vec<PathBuf>,
        status: Option<RunStatus>,
        fail_metrics: bool,
        fail_finish: bool,
    }

    impl Tracker for Recorder {
        fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError> {
            self.params.push((key.into(), value.into()));
            Ok(())
        }

        fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError> {
            if self.fail_metrics {
                return Err(TrackingError::Io(std::io::Error::other("connection reset")));
            }
            self.metrics.push((key.into(), value));
            Ok(())
        }

        fn log_artifact(&mut self, path: &Path) -> Result<(), TrackingError> {
            self.artifacts.push(path.to_path_buf());
            Ok(())
        }

        fn finish(&mut self, status: RunStatus) -> Result<(), TrackingError> {
            if self.fail_finish {
                return Err(TrackingError::UnsupportedArtifactStore("offline".into()));
            }
            self.status = Some(status);
            Ok(())
        }
    }

    /// Writes the files a real training run leaves behind.
    struct FakeTrainer {
        exit_code: i32,
        weights: bool,
    }

    impl Trainer for FakeTrainer {
        fn train(&self, config: &TrainConfig) -> Result<(), TrainError> {
            if self.exit_code != 0 {
                return Err(TrainError::TrainerFailed(Some(self.exit_code)));
            }
            fs::create_dir_all(config.run_dir().join("weights")).unwrap();
            fs::write(
                config.results_csv(),
                "epoch,metrics/precision(B),metrics/recall(B),metrics/mAP50(B)\n1,0.5,0.4,0.3\n2,0.7,0.6,0.65\n",
            )
            .unwrap();
            if self.weights {
                fs::write(config.best_weights(), b"weights").unwrap();
            }
            Ok(())
        }
    }

    fn config_in(dir: &Path) -> TrainConfig {
        TrainConfig {
            project: dir.join("runs").join("train"),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn builds_yolo_arguments() {
        let args = TrainConfig::default().args();
        assert_eq!(
            args,
            vec![
                "detect",
                "train",
                "data=data/IndianFoodDatasetFinalFiltered/data.yaml",
                "model=yolov8n.pt",
                "epochs=30",
                "imgsz=640",
                "batch=16",
                "project=runs/train",
                "name=foodalyze_yolov8",
                "exist_ok=True",
            ]
        );
    }

    #[test]
    fn output_paths_live_under_run_dir() {
        let config = TrainConfig::default();
        assert_eq!(config.results_csv(), Path::new("runs/train/foodalyze_yolov8/results.csv"));
        assert_eq!(config.best_weights(), Path::new("runs/train/foodalyze_yolov8/weights/best.pt"));
    }

    #[test]
    fn successful_run_logs_everything() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut tracker = Recorder::default();

        let metrics = run_training(&config, &FakeTrainer { exit_code: 0, weights: true }, &mut tracker).unwrap();

        assert_eq!(metrics.map50, 0.65);
        let keys: Vec<&str> = tracker.params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["model", "epochs", "img_size", "batch"]);
        assert_eq!(tracker.params[2].1, "640");
        assert_eq!(
            tracker.metrics,
            vec![
                (String::from("mAP50"), 0.65),
                (String::from("precision"), 0.7),
                (String::from("recall"), 0.6),
            ]
        );
        assert_eq!(tracker.artifacts, vec![config.best_weights()]);
        assert_eq!(tracker.status, Some(RunStatus::Finished));
    }

    #[test]
    fn missing_weights_do_not_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = Recorder::default();
        run_training(&config_in(dir.path()), &FakeTrainer { exit_code: 0, weights: false }, &mut tracker).unwrap();
        assert!(tracker.artifacts.is_empty());
        assert_eq!(tracker.status, Some(RunStatus::Finished));
    }

    #[test]
    fn trainer_failure_marks_run_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = Recorder::default();
        let err = run_training(&config_in(dir.path()), &FakeTrainer { exit_code: 2, weights: false }, &mut tracker)
            .unwrap_err();
        assert!(matches!(err, TrainError::TrainerFailed(Some(2))));
        assert!(tracker.metrics.is_empty());
        assert_eq!(tracker.status, Some(RunStatus::Failed));
    }

    #[test]
    fn tracking_failure_after_training_marks_run_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = Recorder { fail_metrics: true, ..Recorder::default() };
        let err = run_training(&config_in(dir.path()), &FakeTrainer { exit_code: 0, weights: true }, &mut tracker)
            .unwrap_err();
        assert!(matches!(err, TrainError::Tracking(TrackingError::Io(_))));
        assert!(tracker.artifacts.is_empty());
        assert_eq!(tracker.status, Some(RunStatus::Failed));
    }

    #[test]
    fn failed_finish_keeps_the_original_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = Recorder { fail_finish: true, ..Recorder::default() };
        let err = run_training(&config_in(dir.path()), &FakeTrainer { exit_code: 3, weights: false }, &mut tracker)
            .unwrap_err();
        assert!(matches!(err, TrainError::TrainerFailed(Some(3))));
        assert_eq!(tracker.status, None);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let config = TrainConfig {
            yolo_bin: "definitely-not-a-real-yolo-binary".into(),
            ..TrainConfig::default()
        };
        assert!(matches!(YoloCli.train(&config), Err(TrainError::Spawn { .. })));
    }
}

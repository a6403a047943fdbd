use std::path::PathBuf;

use clap::Parser;

use crate::trainer::TrainConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the food detector and record the run in MLflow")]
pub struct Args {
    /// Base checkpoint to fine-tune
    #[arg(long, default_value_t = String::from("yolov8n.pt"))]
    pub model: String,

    /// Dataset description (data.yaml)
    #[arg(long, default_value_t = String::from("data/IndianFoodDatasetFinalFiltered/data.yaml"))]
    pub data: String,

    #[arg(long, default_value_t = 30)]
    pub epochs: u32,

    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,

    #[arg(long, default_value_t = 16)]
    pub batch: u32,

    /// Output root of training runs
    #[arg(long, default_value = "runs/train")]
    pub project: PathBuf,

    /// Run folder name under `project`
    #[arg(long, default_value_t = String::from("foodalyze_yolov8"))]
    pub name: String,

    /// Trainer executable
    #[arg(long, env = "YOLO_BIN", default_value_t = String::from("yolo"))]
    pub yolo_bin: String,

    #[arg(long, default_value_t = String::from("Foodalyze-YOLOv8"))]
    pub experiment: String,

    #[arg(long, env = "MLFLOW_TRACKING_URI", default_value_t = String::from("http://localhost:5000"))]
    pub tracking_uri: String,

    /// Train without recording to MLflow
    #[arg(long)]
    pub no_track: bool,
}

impl Args {
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            yolo_bin: self.yolo_bin.clone(),
            model: self.model.clone(),
            data: self.data.clone(),
            epochs: self.epochs,
            imgsz: self.imgsz,
            batch: self.batch,
            project: self.project.clone(),
            name: self.name.clone(),
        }
    }
}

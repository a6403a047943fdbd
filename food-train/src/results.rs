use std::path::Path;

use tracing::warn;

use crate::error::TrainError;

/// Final validation metrics of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrainMetrics {
    pub map50: f64,
    pub precision: f64,
    pub recall: f64,
}

impl TrainMetrics {
    pub fn as_pairs(&self) -> [(&'static str, f64); 3] {
        [
            ("mAP50", self.map50),
            ("precision", self.precision),
            ("recall", self.recall),
        ]
    }
}

// Column names with and without the box-task suffix
const MAP50_COLUMNS: [&str; 2] = ["metrics/mAP50(B)", "metrics/mAP50"];
const PRECISION_COLUMNS: [&str; 2] = ["metrics/precision(B)", "metrics/precision"];
const RECALL_COLUMNS: [&str; 2] = ["metrics/recall(B)", "metrics/recall"];

/// Read the last epoch row of a `results.csv`. Missing columns count as 0.
pub fn read_final_metrics(path: &Path) -> Result<TrainMetrics, TrainError> {
    if !path.is_file() {
        return Err(TrainError::MissingResults(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut last = None;
    for record in reader.records() {
        last = Some(record?);
    }
    let Some(last) = last else {
        return Err(TrainError::MissingResults(path.to_path_buf()));
    };

    let column = |names: &[&str]| -> f64 {
        let value = names
            .iter()
            .find_map(|name| headers.iter().position(|h| h == *name))
            .and_then(|i| last.get(i))
            .and_then(|v| v.parse::<f64>().ok());
        match value {
            Some(v) => v,
            None => {
                warn!("Column {} missing from results, logging 0", names[0]);
                0.0
            }
        }
    };

    Ok(TrainMetrics {
        map50: column(&MAP50_COLUMNS),
        precision: column(&PRECISION_COLUMNS),
        recall: column(&RECALL_COLUMNS),
    })
}

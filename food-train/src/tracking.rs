//! Minimal MLflow REST client: experiments, runs, params, metrics and
//! artifacts served through the tracking server's artifact proxy.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::TrackingError;

const API: &str = "api/2.0/mlflow";
const ARTIFACT_API: &str = "api/2.0/mlflow-artifacts/artifacts";
const PROXY_SCHEME: &str = "mlflow-artifacts:/";

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Finished,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Finished => "FINISHED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Where a training run reports to.
pub trait Tracker {
    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError>;
    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError>;
    fn log_artifact(&mut self, path: &Path) -> Result<(), TrackingError>;
    fn finish(&mut self, status: RunStatus) -> Result<(), TrackingError>;
}

/// Tracker used with `--no-track`; values only go to the log.
#[derive(Debug, Default)]
pub struct LogTracker;

impl Tracker for LogTracker {
    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError> {
        info!("param {} = {}", key, value);
        Ok(())
    }

    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError> {
        info!("metric {} = {}", key, value);
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> Result<(), TrackingError> {
        info!("artifact {}", path.display());
        Ok(())
    }

    fn finish(&mut self, status: RunStatus) -> Result<(), TrackingError> {
        info!("run {}", status.as_str());
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    run: Run,
}

#[derive(Debug, Deserialize)]
struct Run {
    info: RunInfo,
}

#[derive(Debug, Deserialize)]
struct RunInfo {
    run_id: String,
    artifact_uri: String,
}

pub struct MlflowClient {
    agent: ureq::Agent,
    base_url: String,
}

impl MlflowClient {
    pub fn new(tracking_uri: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .build();
        Self {
            agent,
            base_url: tracking_uri.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API, path)
    }

    /// Experiment id for `name`, creating the experiment if needed.
    pub fn get_or_create_experiment(&self, name: &str) -> Result<String, TrackingError> {
        let lookup = self
            .agent
            .get(&self.endpoint("experiments/get-by-name"))
            .query("experiment_name", name)
            .call();
        match lookup {
            Ok(resp) => {
                let found: ExperimentResponse = resp.into_json()?;
                debug!("Using experiment {} ({})", name, found.experiment.experiment_id);
                Ok(found.experiment.experiment_id)
            }
            // The server answers 404 RESOURCE_DOES_NOT_EXIST
            Err(ureq::Error::Status(404, _)) => {
                let created: CreateExperimentResponse = self
                    .agent
                    .post(&self.endpoint("experiments/create"))
                    .send_json(json!({ "name": name }))?
                    .into_json()?;
                info!("Created experiment {} ({})", name, created.experiment_id);
                Ok(created.experiment_id)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Start a run in `experiment_id`.
    pub fn start_run(&self, experiment_id: &str, run_name: &str) -> Result<MlflowRun<'_>, TrackingError> {
        let created: RunResponse = self
            .agent
            .post(&self.endpoint("runs/create"))
            .send_json(json!({
                "experiment_id": experiment_id,
                "run_name": run_name,
                "start_time": now_millis(),
            }))?
            .into_json()?;
        info!("Started MLflow run {}", created.run.info.run_id);
        Ok(MlflowRun {
            client: self,
            run_id: created.run.info.run_id,
            artifact_uri: created.run.info.artifact_uri,
        })
    }
}

/// An open run on the tracking server.
pub struct MlflowRun<'a> {
    client: &'a MlflowClient,
    run_id: String,
    artifact_uri: String,
}

impl MlflowRun<'_> {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn post(&self, path: &str, body: serde_json::Value) -> Result<(), TrackingError> {
        self.client
            .agent
            .post(&self.client.endpoint(path))
            .send_json(body)?;
        Ok(())
    }
}

impl Tracker for MlflowRun<'_> {
    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError> {
        self.post(
            "runs/log-parameter",
            json!({ "run_id": self.run_id, "key": key, "value": value }),
        )
    }

    fn log_metric(&mut self, key: &str, value: f64) -> Result<(), TrackingError> {
        self.post(
            "runs/log-metric",
            json!({
                "run_id": self.run_id,
                "key": key,
                "value": value,
                "timestamp": now_millis(),
                "step": 0,
            }),
        )
    }

    fn log_artifact(&mut self, path: &Path) -> Result<(), TrackingError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = artifact_url(&self.client.base_url, &self.artifact_uri, &file_name)?;
        let bytes = fs::read(path)?;
        self.client
            .agent
            .put(&url)
            .set("Content-Type", "application/octet-stream")
            .send_bytes(&bytes)?;
        info!("Uploaded artifact {} ({} bytes)", file_name, bytes.len());
        Ok(())
    }

    fn finish(&mut self, status: RunStatus) -> Result<(), TrackingError> {
        self.post(
            "runs/update",
            json!({
                "run_id": self.run_id,
                "status": status.as_str(),
                "end_time": now_millis(),
            }),
        )
    }
}

/// Upload URL for `file_name` under a run's `mlflow-artifacts:/` root.
pub fn artifact_url(base_url: &str, artifact_uri: &str, file_name: &str) -> Result<String, TrackingError> {
    let rest = artifact_uri
        .strip_prefix(PROXY_SCHEME)
        .ok_or_else(|| TrackingError::UnsupportedArtifactStore(artifact_uri.to_string()))?;
    Ok(format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        ARTIFACT_API,
        rest.trim_matches('/'),
        file_name
    ))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn builds_endpoint_urls() {
        let client = MlflowClient::new("http://localhost:5000/");
        assert_eq!(
            client.endpoint("runs/create"),
            "http://localhost:5000/api/2.0/mlflow/runs/create"
        );
    }

    #[test]
    fn artifact_url_goes_through_proxy() {
        let url = artifact_url(
            "http://localhost:5000",
            "mlflow-artifacts:/3/9f1c/artifacts",
            "best.pt",
        )
        .unwrap();
        assert_eq!(
            url,
            "http://localhost:5000/api/2.0/mlflow-artifacts/artifacts/3/9f1c/artifacts/best.pt"
        );
    }

    #[test]
    fn local_artifact_store_is_unsupported() {
        let err = artifact_url("http://localhost:5000", "file:///tmp/mlruns/1/abc/artifacts", "best.pt")
            .unwrap_err();
        assert!(matches!(err, TrackingError::UnsupportedArtifactStore(_)));
    }

    const RUN_JSON: &str = r#"{"run": {"info": {
        "run_id": "abc123",
        "experiment_id": "7",
        "status": "RUNNING",
        "artifact_uri": "mlflow-artifacts:/7/abc123/artifacts"
    }}}"#;

    #[test]
    fn existing_experiment_is_reused() {
        let mut server = mockito::Server::new();
        let lookup = server
            .mock("GET", "/api/2.0/mlflow/experiments/get-by-name")
            .match_query(Matcher::UrlEncoded("experiment_name".into(), "Foodalyze-YOLOv8".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"experiment": {"experiment_id": "7", "name": "Foodalyze-YOLOv8"}}"#)
            .create();
        let create = server.mock("POST", "/api/2.0/mlflow/experiments/create").expect(0).create();

        let client = MlflowClient::new(&server.url());
        assert_eq!(client.get_or_create_experiment("Foodalyze-YOLOv8").unwrap(), "7");
        lookup.assert();
        create.assert();
    }

    #[test]
    fn missing_experiment_is_created() {
        let mut server = mockito::Server::new();
        let lookup = server
            .mock("GET", "/api/2.0/mlflow/experiments/get-by-name")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error_code": "RESOURCE_DOES_NOT_EXIST"}"#)
            .create();
        let create = server
            .mock("POST", "/api/2.0/mlflow/experiments/create")
            .match_body(Matcher::Json(json!({ "name": "Foodalyze-YOLOv8" })))
            .with_body(r#"{"experiment_id": "12"}"#)
            .create();

        let client = MlflowClient::new(&server.url());
        assert_eq!(client.get_or_create_experiment("Foodalyze-YOLOv8").unwrap(), "12");
        lookup.assert();
        create.assert();
    }

    #[test]
    fn server_errors_are_not_treated_as_missing() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/2.0/mlflow/experiments/get-by-name")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();
        let create = server.mock("POST", "/api/2.0/mlflow/experiments/create").expect(0).create();

        let client = MlflowClient::new(&server.url());
        let err = client.get_or_create_experiment("Foodalyze-YOLOv8").unwrap_err();
        assert!(matches!(err, TrackingError::Http(_)));
        create.assert();
    }

    #[test]
    fn run_records_params_metrics_artifact_and_status() {
        let mut server = mockito::Server::new();
        let create = server
            .mock("POST", "/api/2.0/mlflow/runs/create")
            .match_body(Matcher::PartialJson(json!({
                "experiment_id": "7",
                "run_name": "foodalyze_yolov8",
            })))
            .with_body(RUN_JSON)
            .create();
        let param = server
            .mock("POST", "/api/2.0/mlflow/runs/log-parameter")
            .match_body(Matcher::Json(json!({ "run_id": "abc123", "key": "epochs", "value": "30" })))
            .create();
        let metric = server
            .mock("POST", "/api/2.0/mlflow/runs/log-metric")
            .match_body(Matcher::PartialJson(json!({
                "run_id": "abc123",
                "key": "mAP50",
                "value": 0.65,
                "step": 0,
            })))
            .create();
        let upload = server
            .mock("PUT", "/api/2.0/mlflow-artifacts/artifacts/7/abc123/artifacts/best.pt")
            .match_body("weights")
            .create();
        let update = server
            .mock("POST", "/api/2.0/mlflow/runs/update")
            .match_body(Matcher::PartialJson(json!({ "run_id": "abc123", "status": "FINISHED" })))
            .create();

        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("best.pt");
        fs::write(&weights, b"weights").unwrap();

        let client = MlflowClient::new(&server.url());
        let mut run = client.start_run("7", "foodalyze_yolov8").unwrap();
        assert_eq!(run.run_id(), "abc123");
        run.log_param("epochs", "30").unwrap();
        run.log_metric("mAP50", 0.65).unwrap();
        run.log_artifact(&weights).unwrap();
        run.finish(RunStatus::Finished).unwrap();

        for mock in [create, param, metric, upload, update] {
            mock.assert();
        }
    }

    #[test]
    fn run_status_names() {
        assert_eq!(RunStatus::Finished.as_str(), "FINISHED");
        assert_eq!(RunStatus::Failed.as_str(), "FAILED");
    }
}

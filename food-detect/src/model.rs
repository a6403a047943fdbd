use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch};
use ort::value::ValueType;

use crate::error::ModelError;

pub struct OnnxModel {
    provider: [ExecutionProviderDispatch; 1],
}

impl OnnxModel {
    pub fn new(cuda: bool) -> Self {
        let provider = if cuda {
            [CUDAExecutionProvider::default().build().error_on_failure()]
        } else {
            [CPUExecutionProvider::default().build()]
        };
        Self { provider }
    }

    pub fn load_model(&self, model_path: &str) -> Result<Session, ModelError> {
        let session = SessionBuilder::new()?
            .with_execution_providers(self.provider.clone())?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(session)
    }
}

/// Static shape of the first output, `None` for symbolic dimensions.
pub fn output_shape(session: &Session) -> Option<Vec<usize>> {
    let output = session.outputs.first()?;
    match &output.output_type {
        ValueType::Tensor { dimensions, .. } => dimensions
            .iter()
            .map(|&d| usize::try_from(d).ok())
            .collect(),
        _ => None,
    }
}

use anyhow::{Context, Result};
use log::info;
use ort::session::Session;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use std::path::Path;

pub struct OnnxSession {
    pub(crate) session: Session,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionProvider {
    CPU,
    CUDA(i32),
    TensorRT(i32),
}

impl ExecutionProvider {
    /// Builds a provider from its configuration name, e.g. `"cuda"` with device `0`.
    pub fn from_name(name: &str, device_id: i32) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::CPU),
            "cuda" => Ok(ExecutionProvider::CUDA(device_id)),
            "tensorrt" | "trt" => Ok(ExecutionProvider::TensorRT(device_id)),
            other => anyhow::bail!("Unknown execution provider: {}", other),
        }
    }
}

impl Display for ExecutionProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionProvider::CPU => write!(f, "cpu"),
            ExecutionProvider::CUDA(id) => write!(f, "cuda:{}", id),
            ExecutionProvider::TensorRT(id) => write!(f, "tensorrt:{}", id),
        }
    }
}

impl Deref for OnnxSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for OnnxSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl OnnxSession {
    pub fn new(
        url: impl AsRef<Path>,
        executor: ExecutionProvider,
        intra_threads: usize,
    ) -> Result<Self> {
        let url = url.as_ref();
        info!("Loading ONNX model {} on {}", url.display(), executor);

        let session = Session::builder()?
            .with_intra_threads(intra_threads.max(1))?
            .with_execution_providers([match executor {
                ExecutionProvider::CUDA(id) => {
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()
                }
                ExecutionProvider::TensorRT(id) => {
                    ort::execution_providers::TensorRTExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()
                }
                ExecutionProvider::CPU => ort::execution_providers::CPUExecutionProvider::default()
                    .build()
                    .error_on_failure(),
            }])?
            .commit_from_file(url)
            .with_context(|| format!("Failed to load model {}", url.display()))?;

        Ok(OnnxSession { session })
    }
}

use std::time::Duration;
use thiserror::Error;

/// Why a single route point could not be classified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("failed to fetch image: {0}")]
    Transport(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("classification did not finish within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("none of the {total} route points could be classified")]
    AllPointsFailed { total: usize },
}

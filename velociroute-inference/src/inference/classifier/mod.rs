use crate::inference::distribution::LabelDistribution;
use anyhow::Result;

pub mod classifier_session;

pub use classifier_session::{ClassifierConfig, ClassifierSession};

/// A single-label image classifier split into its two stages, so callers can run
/// preprocessing concurrently and gate only the model call.
pub trait ImageClassifier: Send + Sync {
    /// Model-ready input produced from encoded image bytes.
    type Input: Send + 'static;

    /// Decodes and normalizes raw image bytes. Fails on undecodable input.
    fn preprocess(&self, buffer: &[u8]) -> Result<Self::Input>;

    /// Runs the model and returns its distribution over [`ImageClassifier::vocabulary`].
    fn infer(&self, input: Self::Input) -> Result<LabelDistribution>;

    fn vocabulary(&self) -> &[String];
}

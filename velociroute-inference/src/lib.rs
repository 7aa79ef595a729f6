pub mod engine;
pub mod inference;
pub mod utils;

pub use inference::classifier::{ClassifierConfig, ClassifierSession, ImageClassifier};
pub use inference::distribution::LabelDistribution;

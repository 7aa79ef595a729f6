use crate::engine::inference_engine::{ExecutionProvider, OnnxSession};
use crate::inference::classifier::ImageClassifier;
use crate::inference::distribution::LabelDistribution;
use crate::inference::{looks_normalized, softmax};
use crate::utils::extractor::{ExtraToTensor, Normalization};
use crate::utils::vocabulary::load_vocabulary;
use anyhow::{bail, Result};
use log::{debug, info};
use ndarray::{Array4, ArrayView1};
use ort::inputs;
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use velociroute_media::image::decoder::size::ResizeImage;
use velociroute_media::Image;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Model input as `(width, height)`.
    pub input_size: (u32, u32),
    pub normalization: Normalization,
    pub apply_softmax: bool,
    pub executor: ExecutionProvider,
    pub intra_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            input_size: (224, 224),
            normalization: Normalization::default(),
            apply_softmax: true,
            executor: ExecutionProvider::CPU,
            intra_threads: 4,
        }
    }
}

/// ONNX image classifier loaded once per process.
///
/// `ort` sessions need exclusive access per run, so the session sits behind a
/// mutex. Preprocessing stays free to run on any number of threads.
pub struct ClassifierSession {
    session: Mutex<OnnxSession>,
    vocabulary: Arc<[String]>,
    config: ClassifierConfig,
}

impl ClassifierSession {
    pub fn new(
        model_path: impl AsRef<Path>,
        vocabulary_path: impl AsRef<Path>,
        config: ClassifierConfig,
    ) -> Result<Self> {
        let vocabulary: Arc<[String]> = load_vocabulary(vocabulary_path)?.into();
        let session = OnnxSession::new(model_path, config.executor, config.intra_threads)?;
        info!(
            "Classifier session created: {} labels, input {}x{}",
            vocabulary.len(),
            config.input_size.0,
            config.input_size.1
        );

        Ok(Self {
            session: Mutex::new(session),
            vocabulary,
            config,
        })
    }
}

impl ImageClassifier for ClassifierSession {
    type Input = Array4<f32>;

    fn preprocess(&self, buffer: &[u8]) -> Result<Array4<f32>> {
        let mut image = Image::from_bytes(buffer)?;
        image.resize_to(self.config.input_size)?;
        image.extra_standard_image_to_tensor(&self.config.normalization)
    }

    fn infer(&self, input: Array4<f32>) -> Result<LabelDistribution> {
        let scores = {
            let mut session = self.session.lock();
            debug!("Running classifier on {:?}", input.shape());
            let outputs = session.run(inputs![Tensor::from_array(input)?])?;
            let output = outputs[0].try_extract_array::<f32>()?;
            output.iter().copied().collect::<Vec<_>>()
        };

        if scores.len() != self.vocabulary.len() {
            bail!(
                "Model output has {} classes but the vocabulary has {}",
                scores.len(),
                self.vocabulary.len()
            );
        }

        let scores = ArrayView1::from(scores.as_slice());
        let probabilities = if self.config.apply_softmax && !looks_normalized(scores) {
            softmax(scores).to_vec()
        } else {
            scores.to_vec()
        };

        LabelDistribution::new(self.vocabulary.clone(), probabilities)
    }

    fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}

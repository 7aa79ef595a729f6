use crate::condition::mapper::LabelMapper;
use crate::condition::ClassificationResult;
use crate::error::ClassifyError;
use crate::fetch::ImageFetcher;
use crate::route::{PointOutcome, RoutePoint};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::spawn_blocking;
use velociroute_inference::{ImageClassifier, LabelDistribution};

/// Fetch, preprocess, infer and map for one image.
///
/// Preprocessing and inference are blocking work and run on the blocking pool.
/// Inference is admitted one call at a time through an async gate, so a point
/// dropped while waiting for the model never reaches it.
/// Every failure is reported as a [`ClassifyError`]; nothing escapes as a panic or
/// a request-level error.
pub struct PointClassifier<F, C> {
    fetcher: F,
    classifier: Arc<C>,
    mapper: LabelMapper,
    inference_gate: Arc<Semaphore>,
}

impl<F, C> PointClassifier<F, C>
where
    F: ImageFetcher,
    C: ImageClassifier + 'static,
{
    pub fn new(fetcher: F, classifier: Arc<C>, mapper: LabelMapper) -> Self {
        Self {
            fetcher,
            classifier,
            mapper,
            inference_gate: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn mapper(&self) -> &LabelMapper {
        &self.mapper
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub async fn classify_image(&self, location: &str) -> Result<ClassificationResult, ClassifyError> {
        let buffer = self.fetcher.fetch(location).await?;

        let classifier = self.classifier.clone();
        let input = spawn_blocking(move || classifier.preprocess(&buffer))
            .await
            .map_err(|e| ClassifyError::Decode(format!("preprocessing task aborted: {}", e)))?
            .map_err(|e| ClassifyError::Decode(format!("{:#}", e)))?;

        let permit = self
            .inference_gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ClassifyError::Inference(format!("inference gate closed: {}", e)))?;

        let classifier = self.classifier.clone();
        let distribution = spawn_blocking(move || -> Result<LabelDistribution, ClassifyError> {
            let _permit = permit;
            classifier
                .infer(input)
                .map_err(|e| ClassifyError::Inference(format!("{:#}", e)))
        })
        .await
        .map_err(|e| ClassifyError::Inference(format!("classifier task aborted: {}", e)))??;

        let result = self.mapper.classify(&distribution);
        debug!(
            "{} -> {} ({:.3})",
            location, result.dominant, result.confidence
        );

        Ok(result)
    }

    pub async fn classify(&self, point: &RoutePoint) -> PointOutcome {
        match self.classify_image(&point.location).await {
            Ok(result) => PointOutcome::success(point.distance_marker, result),
            Err(e) => {
                warn!("Point at {} failed: {}", point.distance_marker, e);
                PointOutcome::failure(point.distance_marker, e)
            }
        }
    }
}

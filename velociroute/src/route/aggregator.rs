use crate::error::{ClassifyError, RouteError};
use crate::fetch::ImageFetcher;
use crate::route::classifier::PointClassifier;
use crate::route::{PointOutcome, RouteReport, RoutePoint, DEFAULT_NARRATIVE_MIN_SHARE};
use futures::future::join_all;
use log::info;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use velociroute_inference::ImageClassifier;

/// Classifies every point of a route concurrently and summarizes the results.
pub struct RouteAggregator<F, C> {
    classifier: PointClassifier<F, C>,
    timeout: Option<Duration>,
    narrative_min_share: f64,
}

impl<F, C> RouteAggregator<F, C>
where
    F: ImageFetcher,
    C: ImageClassifier + 'static,
{
    pub fn new(classifier: PointClassifier<F, C>) -> Self {
        Self {
            classifier,
            timeout: None,
            narrative_min_share: DEFAULT_NARRATIVE_MIN_SHARE,
        }
    }

    /// Deadline for a whole route. Points still running when it passes become failures.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_narrative_min_share(mut self, min_share: f64) -> Self {
        self.narrative_min_share = min_share;
        self
    }

    pub fn point_classifier(&self) -> &PointClassifier<F, C> {
        &self.classifier
    }

    /// All points run together and the call waits for every one of them; a failing
    /// point never cancels the others. Outcomes come back in input order.
    pub async fn aggregate(&self, points: &[RoutePoint]) -> Result<RouteReport, RouteError> {
        let outcomes = self.classify_all(points).await;
        let report = RouteReport::from_outcomes(outcomes, self.narrative_min_share)?;

        info!(
            "Route classified: {}/{} points, summary {:?}",
            report.processed_points, report.total_points, report.condition_summary
        );
        Ok(report)
    }

    pub async fn classify_all(&self, points: &[RoutePoint]) -> Vec<PointOutcome> {
        let deadline = self.timeout.map(|timeout| (Instant::now() + timeout, timeout));

        let tasks = points.iter().map(|point| async move {
            match deadline {
                Some((deadline, timeout)) => {
                    match timeout_at(deadline, self.classifier.classify(point)).await {
                        Ok(outcome) => outcome,
                        Err(_) => PointOutcome::failure(
                            point.distance_marker,
                            ClassifyError::TimedOut(timeout),
                        ),
                    }
                }
                None => self.classifier.classify(point).await,
            }
        });

        join_all(tasks).await
    }
}

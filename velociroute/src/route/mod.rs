use crate::condition::{ClassificationResult, ConditionLabel};
use crate::error::{ClassifyError, RouteError};
use crate::route::analysis::{describe_route, RouteAnalysisData};
use std::collections::BTreeMap;

pub mod aggregator;
pub mod analysis;
pub mod classifier;

/// Share a condition needs before the narrative mentions it.
pub const DEFAULT_NARRATIVE_MIN_SHARE: f64 = 0.05;

/// One sampled image along a route.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint {
    pub location: String,
    /// Caller supplied; neither ordering nor uniqueness is checked.
    pub distance_marker: f64,
}

impl RoutePoint {
    pub fn new(location: impl Into<String>, distance_marker: f64) -> Self {
        Self {
            location: location.into(),
            distance_marker,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointOutcome {
    pub distance_marker: f64,
    pub result: Result<ClassificationResult, ClassifyError>,
}

impl PointOutcome {
    pub fn success(distance_marker: f64, result: ClassificationResult) -> Self {
        Self {
            distance_marker,
            result: Ok(result),
        }
    }

    pub fn failure(distance_marker: f64, error: ClassifyError) -> Self {
        Self {
            distance_marker,
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ClassifyError> {
        self.result.as_ref().err()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub total_points: usize,
    pub processed_points: usize,
    /// Fraction of classified points per dominant condition. Conditions never
    /// dominant are absent.
    pub condition_summary: BTreeMap<ConditionLabel, f64>,
    pub narrative: String,
    /// One entry per input point, in input order.
    pub outcomes: Vec<PointOutcome>,
}

impl RouteReport {
    pub fn from_outcomes(
        outcomes: Vec<PointOutcome>,
        narrative_min_share: f64,
    ) -> Result<Self, RouteError> {
        let total_points = outcomes.len();

        let mut counts = BTreeMap::<ConditionLabel, usize>::new();
        for classification in outcomes.iter().filter_map(PointOutcome::classification) {
            *counts.entry(classification.dominant).or_default() += 1;
        }
        let processed_points = counts.values().sum::<usize>();

        if processed_points == 0 {
            return Err(RouteError::AllPointsFailed {
                total: total_points,
            });
        }

        let condition_summary = counts
            .into_iter()
            .map(|(label, count)| (label, count as f64 / processed_points as f64))
            .collect::<BTreeMap<_, _>>();

        let narrative = describe_route(&RouteAnalysisData {
            total_points,
            processed_points,
            condition_summary: &condition_summary,
            outcomes: &outcomes,
            min_share: narrative_min_share,
        });

        Ok(Self {
            total_points,
            processed_points,
            condition_summary,
            narrative,
            outcomes,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &PointOutcome> + '_ {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }
}

#[macro_use]
mod dispatch_macro;
mod condition_share_describer;
mod failure_describer;
mod progress_describer;

use crate::condition::ConditionLabel;
use crate::route::analysis::condition_share_describer::ConditionShareDescriber;
use crate::route::analysis::failure_describer::FailureDescriber;
use crate::route::analysis::progress_describer::ProgressDescriber;
use crate::route::PointOutcome;
use std::collections::BTreeMap;

/// Aggregated route figures handed to each [`Describer`].
#[derive(Debug, Clone, Copy)]
pub struct RouteAnalysisData<'a> {
    pub total_points: usize,
    pub processed_points: usize,
    pub condition_summary: &'a BTreeMap<ConditionLabel, f64>,
    pub outcomes: &'a [PointOutcome],
    pub min_share: f64,
}

/// Produces one sentence of the route narrative, or `None` when it has nothing to add.
pub trait Describer {
    fn describe(&self, data: &RouteAnalysisData<'_>) -> Option<String>;
}

define_describer![
    Progress => ProgressDescriber,
    ConditionShare => ConditionShareDescriber,
    Failure => FailureDescriber,
];

pub fn describe_route(data: &RouteAnalysisData<'_>) -> String {
    DescriberDispatcher::all()
        .describe(data)
        .unwrap_or_else(|| "Route analysis completed.".to_string())
}

/// `0.6666` -> `67%`.
pub(crate) fn format_percentage(share: f64) -> String {
    format!("{:.0}%", share * 100.0)
}

use crate::route::analysis::{Describer, RouteAnalysisData};

#[derive(Debug, Copy, Clone)]
pub struct ProgressDescriber;

impl Describer for ProgressDescriber {
    fn describe(&self, data: &RouteAnalysisData<'_>) -> Option<String> {
        Some(format!(
            "Route analysis completed: {} of {} {} processed.",
            data.processed_points,
            data.total_points,
            if data.total_points == 1 { "point" } else { "points" }
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn single_point() {
        let summary = BTreeMap::new();
        let data = RouteAnalysisData {
            total_points: 1,
            processed_points: 1,
            condition_summary: &summary,
            outcomes: &[],
            min_share: 0.05,
        };

        assert_eq!(
            ProgressDescriber.describe(&data).unwrap(),
            "Route analysis completed: 1 of 1 point processed."
        );
    }
}

use crate::route::analysis::{format_percentage, Describer, RouteAnalysisData};

/// Lists every condition at or above the minimum share, largest first.
#[derive(Debug, Copy, Clone)]
pub struct ConditionShareDescriber;

impl Describer for ConditionShareDescriber {
    fn describe(&self, data: &RouteAnalysisData<'_>) -> Option<String> {
        let mut shares = data
            .condition_summary
            .iter()
            .filter(|(_, share)| **share >= data.min_share)
            .collect::<Vec<_>>();
        if shares.is_empty() {
            return None;
        }

        // Stable sort, the summary map is already in taxonomy order.
        shares.sort_by(|a, b| b.1.total_cmp(a.1));

        let parts = shares
            .into_iter()
            .map(|(label, &share)| format!("{} {}", format_percentage(share), label.display_name()))
            .collect::<Vec<_>>();

        Some(format!("Conditions: {}.", parts.join(", ")))
    }
}

use crate::route::analysis::{Describer, RouteAnalysisData};

#[derive(Debug, Copy, Clone)]
pub struct FailureDescriber;

impl Describer for FailureDescriber {
    fn describe(&self, data: &RouteAnalysisData<'_>) -> Option<String> {
        let markers = data
            .outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .map(|outcome| outcome.distance_marker.to_string())
            .collect::<Vec<_>>();

        match markers.len() {
            0 => None,
            1 => Some(format!("1 point could not be classified (at {}).", markers[0])),
            n => Some(format!(
                "{} points could not be classified (at {}).",
                n,
                markers.join(", ")
            )),
        }
    }
}

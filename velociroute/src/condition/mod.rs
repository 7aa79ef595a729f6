use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Index;
use std::str::FromStr;

pub mod mapper;

/// Native labels considered per image.
pub const DEFAULT_TOP_K: usize = 10;

/// Split applied to native labels that match no keyword rule, in taxonomy order.
/// Unrelated labels co-occur with paved street scenes more often than with any other
/// surface, hence the bias towards smooth asphalt.
pub const DEFAULT_FALLBACK_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Road surface taxonomy. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionLabel {
    SmoothAsphalt,
    Gravel,
    Broken,
    Wet,
}

impl ConditionLabel {
    pub const ALL: [ConditionLabel; 4] = [
        ConditionLabel::SmoothAsphalt,
        ConditionLabel::Gravel,
        ConditionLabel::Broken,
        ConditionLabel::Wet,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionLabel::SmoothAsphalt => "smooth_asphalt",
            ConditionLabel::Gravel => "gravel",
            ConditionLabel::Broken => "broken",
            ConditionLabel::Wet => "wet",
        }
    }

    /// Human readable name, e.g. `smooth asphalt`.
    pub fn display_name(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl Display for ConditionLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown road condition: {}", s))
    }
}

/// Non-negative mass per [`ConditionLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConditionDistribution([f64; 4]);

impl ConditionDistribution {
    pub fn zeros() -> Self {
        Self::default()
    }

    pub fn from_weights(weights: [f64; 4]) -> Self {
        Self(weights)
    }

    pub fn get(&self, label: ConditionLabel) -> f64 {
        self.0[label.index()]
    }

    pub(crate) fn add(&mut self, label: ConditionLabel, mass: f64) {
        self.0[label.index()] += mass;
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Scales the values to sum to one. An all-zero distribution is left untouched
    /// and `false` is returned.
    pub fn normalize(&mut self) -> bool {
        let total = self.total();
        if total <= 0.0 {
            return false;
        }
        self.0.iter_mut().for_each(|value| *value /= total);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConditionLabel, f64)> + '_ {
        ConditionLabel::ALL.into_iter().zip(self.0.iter().copied())
    }

    /// Argmax; the earliest label in taxonomy order wins ties.
    pub fn dominant(&self) -> (ConditionLabel, f64) {
        self.iter()
            .fold((ConditionLabel::SmoothAsphalt, f64::NEG_INFINITY), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
    }
}

impl Index<ConditionLabel> for ConditionDistribution {
    type Output = f64;

    fn index(&self, label: ConditionLabel) -> &Self::Output {
        &self.0[label.index()]
    }
}

impl Serialize for ConditionDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        for (label, value) in self.iter() {
            map.serialize_entry(label.as_str(), &value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    #[serde(rename = "condition")]
    pub dominant: ConditionLabel,
    pub confidence: f64,
    #[serde(rename = "all_conditions")]
    pub distribution: ConditionDistribution,
}

impl From<ConditionDistribution> for ClassificationResult {
    fn from(distribution: ConditionDistribution) -> Self {
        let (dominant, confidence) = distribution.dominant();
        Self {
            dominant,
            confidence,
            distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_order() {
        assert!(ConditionLabel::SmoothAsphalt < ConditionLabel::Gravel);
        assert!(ConditionLabel::Broken < ConditionLabel::Wet);
        assert_eq!(ConditionLabel::Wet.index(), 3);
    }

    #[test]
    fn names() {
        assert_eq!(ConditionLabel::SmoothAsphalt.display_name(), "smooth asphalt");
        assert_eq!("Gravel".parse::<ConditionLabel>().unwrap(), ConditionLabel::Gravel);
        assert!("mud".parse::<ConditionLabel>().is_err());
        assert_eq!(
            serde_json::to_string(&ConditionLabel::SmoothAsphalt).unwrap(),
            "\"smooth_asphalt\""
        );
    }

    #[test]
    fn dominant_ties_break_in_taxonomy_order() {
        let distribution = ConditionDistribution::from_weights([0.1, 0.4, 0.4, 0.1]);
        assert_eq!(distribution.dominant(), (ConditionLabel::Gravel, 0.4));

        let zeros = ConditionDistribution::zeros();
        assert_eq!(zeros.dominant(), (ConditionLabel::SmoothAsphalt, 0.0));
    }

    #[test]
    fn normalize_skips_empty_mass() {
        let mut zeros = ConditionDistribution::zeros();
        assert!(!zeros.normalize());
        assert_eq!(zeros, ConditionDistribution::zeros());

        let mut distribution = ConditionDistribution::from_weights([2.0, 1.0, 1.0, 0.0]);
        assert!(distribution.normalize());
        assert_eq!(distribution[ConditionLabel::SmoothAsphalt], 0.5);
        assert_eq!(distribution[ConditionLabel::Wet], 0.0);
    }

    #[test]
    fn serialize_classification() {
        let result = ClassificationResult::from(ConditionDistribution::from_weights([
            0.5, 0.25, 0.25, 0.0,
        ]));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["condition"], "smooth_asphalt");
        assert_eq!(json["confidence"], 0.5);
        assert_eq!(json["all_conditions"]["gravel"], 0.25);
        assert_eq!(json["all_conditions"]["wet"], 0.0);
    }
}

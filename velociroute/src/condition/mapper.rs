use crate::condition::{
    ClassificationResult, ConditionDistribution, ConditionLabel, DEFAULT_FALLBACK_WEIGHTS,
    DEFAULT_TOP_K,
};
use serde::{Deserialize, Serialize};
use velociroute_inference::LabelDistribution;

/// Native labels containing any of `keywords` (case-insensitive) count towards `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: ConditionLabel,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(label: ConditionLabel, keywords: &[&str]) -> Self {
        Self {
            label,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn lowercase(mut self) -> Self {
        self.keywords
            .iter_mut()
            .for_each(|keyword| *keyword = keyword.to_lowercase());
        self
    }

    /// `native` must already be lowercase.
    fn matches(&self, native: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && native.contains(keyword.as_str()))
    }
}

pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(ConditionLabel::SmoothAsphalt, &["road", "highway", "freeway"]),
        KeywordRule::new(ConditionLabel::Gravel, &["dirt_track", "gravel_road", "unpaved"]),
        KeywordRule::new(ConditionLabel::Broken, &["broken_road", "construction_site"]),
        KeywordRule::new(ConditionLabel::Wet, &["wet_road", "puddle", "flooded_road"]),
    ]
}

/// Maps a general classifier's output onto the road condition taxonomy.
///
/// The `top_k` most probable native labels are matched against the keyword rules in
/// taxonomy order and the first matching rule takes the label's whole mass. Labels no
/// rule claims are spread over every condition with the fallback weights. The sum is
/// then normalized, unless it is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMapper {
    rules: Vec<KeywordRule>,
    top_k: usize,
    fallback: ConditionDistribution,
}

impl Default for LabelMapper {
    fn default() -> Self {
        Self::new(default_rules(), DEFAULT_TOP_K, DEFAULT_FALLBACK_WEIGHTS)
    }
}

impl LabelMapper {
    /// Rules are re-ordered into taxonomy order. Fallback weights are scaled to sum to one;
    /// weights without positive mass fall back to the defaults.
    pub fn new(rules: Vec<KeywordRule>, top_k: usize, fallback: [f64; 4]) -> Self {
        let mut rules = rules
            .into_iter()
            .map(KeywordRule::lowercase)
            .collect::<Vec<_>>();
        rules.sort_by_key(|rule| rule.label);

        let valid = fallback.iter().all(|w| w.is_finite() && *w >= 0.0);
        let mut fallback = ConditionDistribution::from_weights(if valid {
            fallback
        } else {
            DEFAULT_FALLBACK_WEIGHTS
        });
        if !fallback.normalize() {
            fallback = ConditionDistribution::from_weights(DEFAULT_FALLBACK_WEIGHTS);
        }

        Self {
            rules,
            top_k,
            fallback,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &ConditionDistribution {
        &self.fallback
    }

    /// First rule, in taxonomy order, whose keywords occur in `native`.
    pub fn match_label(&self, native: &str) -> Option<ConditionLabel> {
        let native = native.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&native))
            .map(|rule| rule.label)
    }

    pub fn map(&self, distribution: &LabelDistribution) -> ConditionDistribution {
        self.map_top_k(distribution, self.top_k)
    }

    pub fn map_top_k(&self, distribution: &LabelDistribution, k: usize) -> ConditionDistribution {
        let mut conditions = ConditionDistribution::zeros();

        for (native, probability) in distribution.top_k(k) {
            let probability = probability as f64;
            match self.match_label(native) {
                Some(label) => conditions.add(label, probability),
                None => {
                    for (label, weight) in self.fallback.iter() {
                        conditions.add(label, probability * weight);
                    }
                }
            }
        }

        conditions.normalize();
        conditions
    }

    pub fn classify(&self, distribution: &LabelDistribution) -> ClassificationResult {
        ClassificationResult::from(self.map(distribution))
    }
}

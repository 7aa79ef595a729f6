use anyhow::{bail, Result};
use log::warn;
use std::cmp::Ordering;
use std::sync::Arc;

/// Probability distribution over the classifier's native label vocabulary.
#[derive(Debug, Clone)]
pub struct LabelDistribution {
    vocabulary: Arc<[String]>,
    probabilities: Vec<f32>,
}

impl LabelDistribution {
    /// Pairs a shared vocabulary with one score per label.
    ///
    /// Negative and non-finite scores carry no mass and are stored as `0.0`.
    pub fn new(vocabulary: Arc<[String]>, mut probabilities: Vec<f32>) -> Result<Self> {
        if vocabulary.len() != probabilities.len() {
            bail!(
                "Classifier produced {} scores for a vocabulary of {} labels",
                probabilities.len(),
                vocabulary.len()
            );
        }
        sanitize(&mut probabilities);

        Ok(Self {
            vocabulary,
            probabilities,
        })
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f32)>) -> Self {
        let (labels, mut probabilities): (Vec<String>, Vec<f32>) = pairs
            .into_iter()
            .map(|(label, probability)| (label.into(), probability))
            .unzip();
        sanitize(&mut probabilities);

        Self {
            vocabulary: labels.into(),
            probabilities,
        }
    }

    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    /// The `k` most probable labels in descending order; equal scores keep vocabulary order.
    /// `k` is clamped to the vocabulary size.
    pub fn top_k(&self, k: usize) -> Vec<(&str, f32)> {
        let mut order = (0..self.probabilities.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            self.probabilities[b]
                .partial_cmp(&self.probabilities[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        order.truncate(k.min(self.probabilities.len()));

        order
            .into_iter()
            .map(|index| (self.vocabulary[index].as_str(), self.probabilities[index]))
            .collect()
    }
}

fn sanitize(probabilities: &mut [f32]) {
    let mut sanitized = 0usize;
    for probability in probabilities.iter_mut() {
        if !probability.is_finite() || *probability < 0.0 {
            *probability = 0.0;
            sanitized += 1;
        }
    }
    if sanitized > 0 {
        warn!("Zeroed {} invalid classifier scores", sanitized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_descending() {
        let distribution =
            LabelDistribution::from_pairs([("sky", 0.3), ("highway", 0.6), ("puddle", 0.1)]);

        assert_eq!(
            distribution.top_k(2),
            vec![("highway", 0.6), ("sky", 0.3)]
        );
    }

    #[test]
    fn top_k_ties_follow_vocabulary_order() {
        let distribution =
            LabelDistribution::from_pairs([("a", 0.25), ("b", 0.5), ("c", 0.25), ("d", 0.0)]);

        let labels = distribution
            .top_k(4)
            .into_iter()
            .map(|(label, _)| label)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn top_k_clamps_to_vocabulary() {
        let distribution = LabelDistribution::from_pairs([("a", 0.5), ("b", 0.5)]);
        assert_eq!(distribution.top_k(10).len(), 2);
        assert!(distribution.top_k(0).is_empty());
    }

    #[test]
    fn invalid_scores_are_zeroed() {
        let distribution =
            LabelDistribution::from_pairs([("a", f32::NAN), ("b", -0.5), ("c", 0.5)]);
        assert_eq!(distribution.probabilities(), &[0.0, 0.0, 0.5]);
        assert_eq!(distribution.top_k(1), vec![("c", 0.5)]);
    }

    #[test]
    fn reject_length_mismatch() {
        let vocabulary: Arc<[String]> = vec!["a".to_string()].into();
        assert!(LabelDistribution::new(vocabulary, vec![0.5, 0.5]).is_err());
    }
}

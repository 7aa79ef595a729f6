use ndarray::{Array1, ArrayView1};

pub mod classifier;
pub mod distribution;

/// Numerically stable softmax over raw classifier logits.
pub fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    if logits.is_empty() {
        return Array1::zeros(0);
    }

    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();

    if sum > 0.0 && sum.is_finite() {
        exp / sum
    } else {
        Array1::zeros(logits.len())
    }
}

/// Heuristic check for outputs that are already a probability distribution.
pub(crate) fn looks_normalized(scores: ArrayView1<f32>) -> bool {
    scores.iter().all(|&x| (0.0..=1.0).contains(&x)) && (scores.sum() - 1.0).abs() < 1e-3
}

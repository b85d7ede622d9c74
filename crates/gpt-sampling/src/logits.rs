//! Logit transform stage.
//!
//! Each transform edits a logit row in place and is applied in a fixed order
//! by [`apply_transforms`]: frequency penalty, top-k, top-p. Filtered entries
//! are set to [`MASKED_LOGIT`] rather than `-inf`, so later arithmetic stays
//! finite. No transform ever masks every entry.

use gpt_engine::TokenId;

use crate::SamplingParams;

/// Sentinel for filtered-out tokens. Its softmax weight underflows to zero.
pub const MASKED_LOGIT: f32 = -1e10;

/// Pull every distinct token of `history` toward the row minimum:
/// `x' = (x - min) * penalty + min`.
///
/// A penalty of 1.0 is the identity. Ids outside the row are ignored.
pub fn penalize_used(logits: &mut [f32], history: &[TokenId], penalty: f32) {
    if penalty == 1.0 || history.is_empty() || logits.is_empty() {
        return;
    }
    let min = logits.iter().copied().fold(f32::INFINITY, f32::min);
    let mut seen = vec![false; logits.len()];
    for &token in history {
        let idx = token as usize;
        if idx < logits.len() && !seen[idx] {
            seen[idx] = true;
            logits[idx] = (logits[idx] - min) * penalty + min;
        }
    }
}

/// Keep exactly the `k` highest logits; ties go to the lower index.
///
/// `k == 0` disables the filter, as does `k >= logits.len()`.
pub fn top_k_logits(logits: &mut [f32], k: usize) {
    if k == 0 || k >= logits.len() {
        return;
    }
    for idx in descending_order(logits).into_iter().skip(k) {
        logits[idx] = MASKED_LOGIT;
    }
}

/// Keep the smallest prefix of tokens, by descending logit, whose softmax
/// mass reaches `p`. At least one token is always kept.
///
/// `p >= 1.0` disables the filter.
pub fn top_p_logits(logits: &mut [f32], p: f32) {
    if p >= 1.0 || logits.is_empty() {
        return;
    }
    let order = descending_order(logits);
    let sorted: Vec<f32> = order.iter().map(|&i| logits[i]).collect();
    let probs = softmax(&sorted);

    let mut cumulative = 0.0;
    let mut keep = order.len();
    for (rank, prob) in probs.iter().enumerate() {
        cumulative += prob;
        if cumulative >= p {
            keep = rank + 1;
            break;
        }
    }
    for &idx in &order[keep..] {
        logits[idx] = MASKED_LOGIT;
    }
}

/// Numerically stable softmax. If every weight over- or underflows, the mass
/// is split evenly among the entries holding the maximum, so masked entries
/// never receive any.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();

    if sum > 0.0 && sum.is_finite() {
        return exps.iter().map(|&e| e / sum).collect();
    }
    let top = logits.iter().filter(|&&l| l == max_logit).count();
    logits
        .iter()
        .map(|&l| if l == max_logit { 1.0 / top as f32 } else { 0.0 })
        .collect()
}

/// Penalty, then top-k, then top-p, each on the previous one's output.
pub fn apply_transforms(logits: &mut [f32], history: &[TokenId], params: &SamplingParams) {
    penalize_used(logits, history, params.frequency_penalty);
    top_k_logits(logits, params.top_k);
    top_p_logits(logits, params.top_p);
}

fn descending_order(logits: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..logits.len()).collect();
    // Stable sort keeps lower indices first among equal logits.
    order.sort_by(|&a, &b| logits[b].total_cmp(&logits[a]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmasked(logits: &[f32]) -> usize {
        logits.iter().filter(|&&l| l > MASKED_LOGIT).count()
    }

    #[test]
    fn penalty_lerps_toward_minimum() {
        let mut logits = vec![-2.0, 0.0, 4.0, 6.0];
        penalize_used(&mut logits, &[2, 3], 0.5);
        assert_eq!(logits, vec![-2.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn penalty_counts_each_token_once() {
        let mut once = vec![0.0, 8.0];
        let mut repeated = once.clone();
        penalize_used(&mut once, &[1], 0.5);
        penalize_used(&mut repeated, &[1, 1, 1], 0.5);
        assert_eq!(once, repeated);
    }

    #[test]
    fn penalty_of_one_is_identity() {
        let original = vec![0.3, -1.2, 5.5, 2.0];
        let mut logits = original.clone();
        penalize_used(&mut logits, &[0, 2, 2, 3], 1.0);
        penalize_used(&mut logits, &[0, 2, 2, 3], 1.0);
        assert_eq!(logits, original);
    }

    #[test]
    fn penalty_ignores_out_of_range_ids() {
        let mut logits = vec![1.0, 2.0];
        penalize_used(&mut logits, &[7], 0.1);
        assert_eq!(logits, vec![1.0, 2.0]);
    }

    #[test]
    fn top_k_keeps_exactly_k() {
        let mut logits = vec![1.0, 10.0, 2.0, 0.5, 3.0];
        top_k_logits(&mut logits, 2);
        assert_eq!(unmasked(&logits), 2);
        assert_eq!(logits[1], 10.0);
        assert_eq!(logits[4], 3.0);
        assert_eq!(logits[0], MASKED_LOGIT);
    }

    #[test]
    fn top_k_breaks_ties_by_index() {
        let mut logits = vec![5.0, 5.0, 5.0, 1.0];
        top_k_logits(&mut logits, 2);
        assert_eq!(logits, vec![5.0, 5.0, MASKED_LOGIT, MASKED_LOGIT]);
    }

    #[test]
    fn top_k_zero_and_oversized_are_noops() {
        let original = vec![1.0, 2.0, 3.0];
        for k in [0, 3, 10] {
            let mut logits = original.clone();
            top_k_logits(&mut logits, k);
            assert_eq!(logits, original);
        }
    }

    #[test]
    fn top_p_keeps_minimal_prefix() {
        // softmax of ln(prob) recovers prob.
        let mut logits: Vec<f32> = [0.5f32, 0.3, 0.15, 0.05].iter().map(|p| p.ln()).collect();
        top_p_logits(&mut logits, 0.75);
        assert_eq!(unmasked(&logits), 2);
        assert_eq!(logits[2], MASKED_LOGIT);
        assert_eq!(logits[3], MASKED_LOGIT);
    }

    #[test]
    fn top_p_always_keeps_one() {
        let mut logits = vec![0.0, 0.0, 100.0, 0.0];
        top_p_logits(&mut logits, 1e-6);
        assert_eq!(unmasked(&logits), 1);
        assert_eq!(logits[2], 100.0);
    }

    #[test]
    fn top_p_one_is_noop() {
        let original = vec![1.0, 2.0, 3.0];
        let mut logits = original.clone();
        top_p_logits(&mut logits, 1.0);
        assert_eq!(logits, original);
    }

    #[test]
    fn softmax_ignores_masked_entries() {
        let probs = softmax(&[0.0, MASKED_LOGIT, 0.0]);
        assert_eq!(probs[1], 0.0);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn softmax_overflow_favors_maxima_only() {
        let probs = softmax(&[f32::INFINITY, MASKED_LOGIT, f32::INFINITY, 1.0]);
        assert_eq!(probs, vec![0.5, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn transforms_compose_in_order() {
        let params = SamplingParams {
            temperature: 1.0,
            top_k: 2,
            top_p: 1.0,
            frequency_penalty: 0.1,
        };
        // Token 0 leads until penalized, then drops out of the top 2.
        let mut logits = vec![10.0, 9.0, 8.0, 0.0];
        apply_transforms(&mut logits, &[0], &params);
        assert_eq!(logits, vec![MASKED_LOGIT, 9.0, 8.0, MASKED_LOGIT]);
    }
}

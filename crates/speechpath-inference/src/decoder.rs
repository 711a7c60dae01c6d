//! CTC greedy decoding, Viterbi forced alignment, and segment grouping.
//!
//! All three operate purely on a logits matrix plus (for alignment) a
//! target id sequence; none of this module touches I/O.

use ndarray::{Array1, Array2, ArrayView1};
use speechpath_types::{Segment, BLANK_ID};

use crate::backend::FRAME_HOP_SECONDS;

/// Per-frame vocabulary id, or `None` for blank/no-phoneme.
pub type FrameAssignment = Vec<Option<usize>>;

/// Numerically stable row-wise softmax.
pub fn softmax_rows(logits: &Array2<f32>) -> Array2<f32> {
    let mut probs = logits.clone();
    for mut row in probs.rows_mut() {
        let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|x| (x - max).exp());
        let sum: f32 = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|x| x / sum);
        }
    }
    probs
}

fn argmax(row: ArrayView1<f32>) -> usize {
    row.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Result of greedy CTC decoding.
pub struct GreedyDecodeResult {
    pub decoded: String,
    pub frame_ids: Vec<usize>,
    pub probs: Array2<f32>,
}

/// Collapse the per-frame argmax into a phoneme string, dropping blanks and
/// repeats.
pub fn greedy_decode(logits: &Array2<f32>, vocab: &speechpath_types::PhonemeVocabulary) -> GreedyDecodeResult {
    let probs = softmax_rows(logits);
    let mut frame_ids = Vec::with_capacity(probs.nrows());
    let mut tokens = Vec::new();
    let mut prev: Option<usize> = None;

    for row in probs.rows() {
        let id = argmax(row);
        if Some(id) != prev {
            if id != BLANK_ID {
                tokens.push(vocab.symbol(id).unwrap_or("?").to_string());
            }
            prev = Some(id);
        }
        frame_ids.push(id);
    }

    GreedyDecodeResult {
        decoded: tokens.join(" "),
        frame_ids,
        probs,
    }
}

/// Viterbi forced alignment of logits against a target id sequence.
///
/// Returns a length-T `FrameAssignment` where each entry is `Some(target
/// index)` on an advance frame, `None` everywhere else. There is no self-loop
/// on an emitted label: once a frame advances onto a target, later frames
/// either advance further or fall back to blank (see DESIGN.md).
pub fn viterbi_align(logits: &Array2<f32>, target_ids: &[usize]) -> FrameAssignment {
    let t = logits.nrows();
    let n = target_ids.len();
    if t == 0 || n == 0 {
        return vec![None; t];
    }

    let probs = softmax_rows(logits);
    const NEG_INF: f32 = f32::MIN / 2.0;

    // dp[t][n], bp[t][n]: bp = true means "arrived via advance".
    let mut dp = vec![vec![NEG_INF; n + 1]; t + 1];
    let mut bp = vec![vec![false; n + 1]; t + 1];
    dp[0][0] = 0.0;

    for step in 1..=t {
        let frame_probs = probs.row(step - 1);
        let blank_logp = (frame_probs[BLANK_ID].max(1e-8) as f32).ln();

        for n_idx in 0..=n {
            // Stay on blank.
            let stay = dp[step - 1][n_idx] + blank_logp;
            let mut best = stay;
            let mut via_advance = false;

            // Advance, if there's a target position to advance from.
            if n_idx >= 1 {
                let target_id = target_ids[n_idx - 1];
                let p = frame_probs[target_id].max(1e-8);
                let adv = dp[step - 1][n_idx - 1] + p.ln();
                // Tie-break: prefer stay on equality.
                if adv > best {
                    best = adv;
                    via_advance = true;
                }
            }

            dp[step][n_idx] = best;
            bp[step][n_idx] = via_advance;
        }
    }

    let mut best_n = 0;
    let mut best_val = dp[t][0];
    for (n_idx, &val) in dp[t].iter().enumerate() {
        if val > best_val {
            best_val = val;
            best_n = n_idx;
        }
    }

    let mut assignment = vec![None; t];
    let mut n_idx = best_n;
    let mut step = t;
    while step > 0 {
        if bp[step][n_idx] {
            assignment[step - 1] = Some(n_idx - 1);
            n_idx -= 1;
        }
        step -= 1;
    }

    assignment
}

/// Group a `FrameAssignment` into contiguous-run segments, dropping blank
/// runs, using the symbol table from `symbol_of` to resolve each id.
///
/// Generic over the caller's id->symbol mapping so it serves both the
/// vocabulary-indexed greedy path and the target-indexed Viterbi path.
pub fn group_segments<F>(
    assignment: &FrameAssignment,
    probs: &Array2<f32>,
    prob_col: impl Fn(usize) -> usize,
    symbol_of: F,
) -> Vec<Segment>
where
    F: Fn(usize) -> Option<String>,
{
    let mut segments = Vec::new();
    let mut i = 0;
    let t = assignment.len();

    while i < t {
        let current = assignment[i];
        let mut j = i + 1;
        while j < t && assignment[j] == current {
            j += 1;
        }

        if let Some(id) = current {
            if let Some(symbol) = symbol_of(id) {
                let col = prob_col(id);
                let confidence = mean_prob(probs, i, j, col);
                let start = i as f64 * FRAME_HOP_SECONDS;
                let end = j as f64 * FRAME_HOP_SECONDS;
                segments.push(Segment::new(symbol, start, end, confidence));
            }
        }
        i = j;
    }

    segments
}

fn mean_prob(probs: &Array2<f32>, start: usize, end: usize, col: usize) -> f32 {
    if end <= start || col >= probs.ncols() {
        return 0.0;
    }
    let slice: Array1<f32> = probs.slice(ndarray::s![start..end, col]).to_owned();
    slice.mean().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speechpath_types::PhonemeVocabulary;

    fn vocab() -> PhonemeVocabulary {
        PhonemeVocabulary::default_vocabulary()
    }

    fn logits_favoring(vocab_size: usize, frames: usize, id: usize) -> Array2<f32> {
        let mut m = Array2::<f32>::from_elem((frames, vocab_size), -1.0);
        for mut row in m.rows_mut() {
            row[id] = 5.0;
        }
        m
    }

    #[test]
    fn greedy_decode_collapses_repeats_and_drops_blank() {
        let v = vocab();
        let k_id = v.id_of("K");
        let logits = logits_favoring(v.len(), 4, k_id);
        let result = greedy_decode(&logits, &v);
        assert_eq!(result.decoded, "K");
        assert_eq!(result.frame_ids, vec![k_id; 4]);
    }

    #[test]
    fn greedy_decode_on_empty_logits_is_empty() {
        let v = vocab();
        let logits = Array2::<f32>::zeros((0, v.len()));
        let result = greedy_decode(&logits, &v);
        assert!(result.decoded.is_empty());
        assert!(result.frame_ids.is_empty());
    }

    #[test]
    fn viterbi_align_respects_target_length_bound() {
        let v = vocab();
        let target: Vec<usize> = vec![v.id_of("K"), v.id_of("AE"), v.id_of("T")];
        let logits = logits_favoring(v.len(), 10, target[0]);
        let assignment = viterbi_align(&logits, &target);
        let distinct: std::collections::HashSet<_> =
            assignment.iter().filter_map(|x| *x).collect();
        assert!(distinct.len() <= target.len());
    }

    #[test]
    fn viterbi_align_on_empty_target_is_all_blank() {
        let v = vocab();
        let logits = Array2::<f32>::zeros((5, v.len()));
        let assignment = viterbi_align(&logits, &[]);
        assert!(assignment.iter().all(|x| x.is_none()));
    }

    #[test]
    fn segments_have_valid_bounds() {
        let v = vocab();
        let k_id = v.id_of("K");
        let logits = logits_favoring(v.len(), 6, k_id);
        let decoded = greedy_decode(&logits, &v);
        let assignment: FrameAssignment = decoded
            .frame_ids
            .iter()
            .map(|&id| if id == BLANK_ID { None } else { Some(id) })
            .collect();
        let segments = group_segments(
            &assignment,
            &decoded.probs,
            |id| id,
            |id| v.symbol(id).map(|s| s.to_string()),
        );
        assert_eq!(segments.len(), 1);
        for s in &segments {
            assert!(s.start_seconds < s.end_seconds);
            assert!(s.end_seconds <= 6.0 * FRAME_HOP_SECONDS + 1e-9);
            assert!((0.0..=1.0).contains(&s.confidence));
        }
    }
}

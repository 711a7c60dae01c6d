//! Phoneme-distribution drift detection against a rolling baseline.
//!
//! The baseline itself lives behind a trait so this module stays pure
//! math; `persistence` supplies the `sqlx`-backed `DriftStore`.

use async_trait::async_trait;

const EPSILON: f64 = 1e-8;
const EMA_ALPHA: f64 = 0.01;

#[async_trait]
pub trait DriftStore: Send + Sync {
    async fn load(&self) -> Option<Vec<f64>>;
    async fn save(&self, hist: &[f64]);
}

/// Bincount of non-blank frame ids into a length-`vocab_len` histogram.
pub fn phoneme_histogram(frame_ids: &[usize], vocab_len: usize) -> Vec<f64> {
    let mut hist = vec![0.0; vocab_len];
    for &id in frame_ids {
        if id != speechpath_types::BLANK_ID {
            if let Some(slot) = hist.get_mut(id) {
                *slot += 1.0;
            }
        }
    }
    hist
}

/// `KL(p ∥ q) = Σ p·(log p − log q)` after adding `ε` to both and
/// renormalizing each into a probability distribution.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    let len = p.len().max(q.len());
    let pad = |v: &[f64]| -> Vec<f64> {
        let mut out = vec![EPSILON; len];
        for (i, x) in v.iter().enumerate() {
            out[i] += x;
        }
        out
    };
    let mut pp = pad(p);
    let mut qq = pad(q);
    let p_sum: f64 = pp.iter().sum();
    let q_sum: f64 = qq.iter().sum();
    for x in pp.iter_mut() {
        *x /= p_sum;
    }
    for x in qq.iter_mut() {
        *x /= q_sum;
    }
    pp.iter().zip(qq.iter()).map(|(p, q)| p * (p.ln() - q.ln())).sum()
}

/// `new[i] = (1-α)·base[i] + α·hist[i]`, zero-padding the shorter vector.
pub fn ema_update(baseline: &[f64], hist: &[f64]) -> Vec<f64> {
    let len = baseline.len().max(hist.len());
    (0..len)
        .map(|i| {
            let b = baseline.get(i).copied().unwrap_or(0.0);
            let h = hist.get(i).copied().unwrap_or(0.0);
            (1.0 - EMA_ALPHA) * b + EMA_ALPHA * h
        })
        .collect()
}

/// Run one submission's worth of drift bookkeeping. Returns the KL
/// divergence against the prior baseline, or `None` on the very first
/// observation (no divergence to report, baseline just gets seeded).
///
/// Store errors are swallowed by the `DriftStore` implementation itself —
/// this function never fails the submission.
pub async fn observe(store: &dyn DriftStore, hist: &[f64]) -> Option<f64> {
    match store.load().await {
        None => {
            store.save(hist).await;
            None
        }
        Some(baseline) => {
            let kl = kl_divergence(hist, &baseline);
            let updated = ema_update(&baseline, hist);
            store.save(&updated).await;
            Some(kl)
        }
    }
}

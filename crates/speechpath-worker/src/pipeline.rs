//! Per-message pipeline: parse → fetch → decode → infer → decode/align →
//! score → persist. Wraps the whole thing so the latency histogram is
//! always observed, matching the source's try/finally discipline.

use std::time::Instant;

use speechpath_inference::{greedy_decode, group_segments, viterbi_align};
use speechpath_types::{QueueMessage, Segment, BLANK_ID};

use crate::context::WorkerContext;
use crate::curriculum::weakest_phonemes;
use crate::drift::{observe, phoneme_histogram};
use crate::error::WorkerError;
use crate::lexicon::resolve_target_lexicon;
use crate::scorer::{composite_score, weakness_tag};

/// Process one validated message end to end. Any `Err` means the message
/// must be abandoned; `Ok` means it completed and the report (if storage is
/// configured) was persisted.
pub async fn process_message(ctx: &WorkerContext, raw_payload: &str) -> Result<(), WorkerError> {
    ctx.metrics.requests_total.inc();
    let start = Instant::now();
    let result = run(ctx, raw_payload).await;
    ctx.metrics.processing_seconds.observe(start.elapsed().as_secs_f64());
    if result.is_err() {
        ctx.metrics.errors_total.inc();
    }
    result
}

async fn run(ctx: &WorkerContext, raw_payload: &str) -> Result<(), WorkerError> {
    let message = QueueMessage::parse(raw_payload)?;

    let bytes = ctx
        .http_client
        .get(&message.blob_url)
        .send()
        .await?
        .bytes()
        .await?;
    let waveform = speechpath_audio::decode(&bytes)?;

    let logits = {
        let samples = waveform.samples.clone();
        let sample_rate = waveform.sample_rate;
        let backend = ctx.backend.clone();
        tokio::task::spawn_blocking(move || backend.asr_logits(&samples, sample_rate))
            .await
            .map_err(|e| WorkerError::Inference(anyhow::anyhow!(e)))?
            .map_err(WorkerError::Inference)?
    };

    let lexicon_store = ctx.lexicon_store_ref();
    let target = resolve_target_lexicon(
        lexicon_store.as_ref(),
        ctx.g2p_cache.as_ref(),
        ctx.g2p_backend.as_ref(),
        &message.child_id,
        &ctx.config.g2p_lang,
        &ctx.default_lexicon,
    )
    .await;

    let (segments, frame_ids): (Vec<Segment>, Vec<usize>) = if target.is_empty() {
        let decoded = greedy_decode(&logits, &ctx.vocabulary);
        let assignment: Vec<Option<usize>> = decoded
            .frame_ids
            .iter()
            .map(|&id| if id == BLANK_ID { None } else { Some(id) })
            .collect();
        let segments = group_segments(&assignment, &decoded.probs, |id| id, |id| ctx.vocabulary.symbol(id).map(str::to_string));
        (segments, decoded.frame_ids)
    } else {
        let target_ids: Vec<usize> = target.iter().map(|p| ctx.vocabulary.id_of(p)).collect();
        let assignment = viterbi_align(&logits, &target_ids);
        let probs = speechpath_inference::decoder::softmax_rows(&logits);
        let target_for_symbols = target.clone();
        let segments = group_segments(
            &assignment,
            &probs,
            |target_idx| target_ids[target_idx],
            move |target_idx| target_for_symbols.get(target_idx).cloned(),
        );
        let frame_ids = assignment.iter().map(|a| a.map(|i| target_ids[i]).unwrap_or(BLANK_ID)).collect();
        (segments, frame_ids)
    };

    let emotion = {
        let samples = waveform.samples.clone();
        let sample_rate = waveform.sample_rate;
        let backend = ctx.backend.clone();
        tokio::task::spawn_blocking(move || backend.emotion(&samples, sample_rate))
            .await
            .map_err(|e| WorkerError::Inference(anyhow::anyhow!(e)))?
            .map_err(WorkerError::Inference)?
    };

    let score = composite_score(&segments, emotion);
    let weakness = weakness_tag(score);

    let drift_store = ctx.drift_store_ref();
    let hist = phoneme_histogram(&frame_ids, ctx.vocabulary.len());
    if let Some(kl) = observe(drift_store.as_ref(), &hist).await {
        ctx.metrics.phoneme_kl.set(kl);
    }

    if let Some(report_store) = &ctx.report_store {
        let weak = weakest_phonemes(&segments, &ctx.vocabulary);
        let csv = weak.join(",");
        report_store
            .persist(&message.submission_id, &message.child_id, score, weakness, weakness.recommendation(), &csv)
            .await?;
    }

    Ok(())
}

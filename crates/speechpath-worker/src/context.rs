//! Process-wide worker context: everything a handler needs, built once at
//! startup and passed by reference into every message. No mutable
//! process-global state after construction.

use std::sync::Arc;

use sqlx::PgPool;

use speechpath_g2p::{resolve_backend, G2PBackend, G2PCache, NoopCache};
use speechpath_inference::{InferenceBackend, OnnxInferenceBackend};
use speechpath_types::PhonemeVocabulary;

use crate::config::WorkerConfig;
use crate::drift::DriftStore;
use crate::lexicon::LexiconStore;
use crate::metrics::Metrics;
use crate::persistence::{run_ddl, PgDriftStore, PgG2PCache, PgLexiconStore, ReportStore};

pub struct WorkerContext {
    pub config: WorkerConfig,
    pub backend: Arc<dyn InferenceBackend>,
    pub vocabulary: Arc<PhonemeVocabulary>,
    pub g2p_backend: Arc<dyn G2PBackend>,
    pub g2p_cache: Arc<dyn G2PCache>,
    pub lexicon_store: Option<Arc<dyn LexiconStore>>,
    pub drift_store: Option<Arc<dyn DriftStore>>,
    pub report_store: Option<Arc<ReportStore>>,
    pub metrics: Arc<Metrics>,
    pub http_client: reqwest::Client,
    pub default_lexicon: Vec<String>,
}

/// A lexicon store that always reports no row; used when no SQL pool is
/// configured so the rest of the pipeline stays exercisable.
struct NoLexiconStore;

#[async_trait::async_trait]
impl LexiconStore for NoLexiconStore {
    async fn fetch(&self, _child_id: &str) -> Option<crate::lexicon::ChildLexiconRow> {
        None
    }
}

/// A drift store that never has a baseline; drift monitoring becomes a
/// no-op but never errors.
struct NoDriftStore;

#[async_trait::async_trait]
impl DriftStore for NoDriftStore {
    async fn load(&self) -> Option<Vec<f64>> {
        None
    }

    async fn save(&self, _hist: &[f64]) {}
}

impl WorkerContext {
    pub async fn build(config: WorkerConfig) -> anyhow::Result<Self> {
        let vocabulary = Arc::new(config.load_phoneme_vocabulary());
        let default_lexicon = config.load_default_lexicon();

        let backend: Arc<dyn InferenceBackend> = Arc::new(OnnxInferenceBackend::load(
            config.asr_model_path.as_deref(),
            config.ser_model_path.as_deref(),
            vocabulary.len(),
        )?);

        let g2p_backend: Arc<dyn G2PBackend> = Arc::from(resolve_backend(config.g2p_backend.clone()));

        let (g2p_cache, lexicon_store, drift_store, report_store): (
            Arc<dyn G2PCache>,
            Option<Arc<dyn LexiconStore>>,
            Option<Arc<dyn DriftStore>>,
            Option<Arc<ReportStore>>,
        ) = match &config.storage_url {
            Some(url) => {
                let pool = PgPool::connect(url).await?;
                run_ddl(&pool).await?;
                (
                    Arc::new(PgG2PCache::new(pool.clone())),
                    Some(Arc::new(PgLexiconStore::new(pool.clone()))),
                    Some(Arc::new(PgDriftStore::new(pool.clone()))),
                    Some(Arc::new(ReportStore::new(pool))),
                )
            }
            None => {
                tracing::warn!("no storage connection configured; persistence and lexicon lookups are no-ops");
                (Arc::new(NoopCache), None, None, None)
            }
        };

        let metrics = Arc::new(Metrics::new()?);

        Ok(Self {
            config,
            backend,
            vocabulary,
            g2p_backend,
            g2p_cache,
            lexicon_store,
            drift_store,
            report_store,
            metrics,
            http_client: reqwest::Client::new(),
            default_lexicon,
        })
    }

    pub fn lexicon_store_ref(&self) -> Arc<dyn LexiconStore> {
        self.lexicon_store.clone().unwrap_or_else(|| Arc::new(NoLexiconStore))
    }

    pub fn drift_store_ref(&self) -> Arc<dyn DriftStore> {
        self.drift_store.clone().unwrap_or_else(|| Arc::new(NoDriftStore))
    }
}

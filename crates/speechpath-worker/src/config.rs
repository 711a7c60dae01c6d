//! Typed configuration, read from the environment exactly once at startup.
//!
//! Nothing past [`WorkerConfig::from_env`] touches `std::env` directly.

use std::path::PathBuf;

use speechpath_g2p::G2PBackendKind;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub queue_name: String,
    pub broker_url: Option<String>,
    pub storage_url: Option<String>,
    pub asr_model_path: Option<PathBuf>,
    pub ser_model_path: Option<PathBuf>,
    pub phoneme_list_path: Option<PathBuf>,
    pub default_lexicon: Option<String>,
    pub g2p_backend: G2PBackendKind,
    pub g2p_lang: String,
    pub max_in_flight: usize,
    pub http_bind: String,
    pub log_level: String,
}

fn env_nonblank(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let g2p_backend = match env_nonblank("G2P_BACKEND").unwrap_or_default().to_lowercase().as_str() {
            "phonetisaurus" => G2PBackendKind::Phonetisaurus {
                bin_path: env_nonblank("G2P_BIN").unwrap_or_else(|| "phonetisaurus-g2p".to_string()),
                model_path: env_nonblank("G2P_MODEL"),
            },
            "sequitur" => G2PBackendKind::Sequitur {
                bin_path: env_nonblank("G2P_BIN").unwrap_or_else(|| "sequitur-g2p".to_string()),
                model_path: env_nonblank("G2P_MODEL"),
            },
            _ => G2PBackendKind::English,
        };

        Self {
            queue_name: env_nonblank("QUEUE_NAME").unwrap_or_else(|| "audio-submitted".to_string()),
            broker_url: env_nonblank("BROKER_CONNECTION"),
            storage_url: env_nonblank("STORAGE_CONNECTION"),
            asr_model_path: env_nonblank("ASR_MODEL_PATH").map(PathBuf::from),
            ser_model_path: env_nonblank("SER_MODEL_PATH").map(PathBuf::from),
            phoneme_list_path: env_nonblank("PHONEME_LIST_PATH").map(PathBuf::from),
            default_lexicon: env_nonblank("DEFAULT_LEXICON"),
            g2p_backend,
            g2p_lang: env_nonblank("G2P_LANG").unwrap_or_else(|| "auto".to_string()),
            max_in_flight: env_nonblank("MAX_IN_FLIGHT")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)),
            http_bind: env_nonblank("HTTP_BIND").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            log_level: env_nonblank("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Parse the default (process-wide) lexicon: a JSON array file or a
    /// comma-separated phoneme list.
    pub fn load_default_lexicon(&self) -> Vec<String> {
        let Some(raw) = &self.default_lexicon else {
            return Vec::new();
        };
        let path = PathBuf::from(raw);
        if path.is_file() {
            if let Ok(text) = std::fs::read_to_string(&path) {
                if let Ok(list) = serde_json::from_str::<Vec<String>>(&text) {
                    return list;
                }
            }
            return Vec::new();
        }
        raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    }

    pub fn load_phoneme_vocabulary(&self) -> speechpath_types::PhonemeVocabulary {
        if let Some(path) = &self.phoneme_list_path {
            if let Ok(text) = std::fs::read_to_string(path) {
                if let Ok(symbols) = serde_json::from_str::<Vec<String>>(&text) {
                    return speechpath_types::PhonemeVocabulary::new(symbols);
                }
            }
            tracing::warn!(path = %path.display(), "phoneme list path configured but unreadable; using default vocabulary");
        }
        speechpath_types::PhonemeVocabulary::default_vocabulary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lexicon_parses_csv_when_not_a_file() {
        let cfg = WorkerConfig {
            queue_name: "q".into(),
            broker_url: None,
            storage_url: None,
            asr_model_path: None,
            ser_model_path: None,
            phoneme_list_path: None,
            default_lexicon: Some("K, AE ,T".to_string()),
            g2p_backend: G2PBackendKind::English,
            g2p_lang: "auto".into(),
            max_in_flight: 1,
            http_bind: "0.0.0.0:8000".into(),
            log_level: "info".into(),
        };
        assert_eq!(cfg.load_default_lexicon(), vec!["K", "AE", "T"]);
    }
}

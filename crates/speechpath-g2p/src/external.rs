//! G2P backends that shell out to an external trained model binary
//! (Phonetisaurus- or Sequitur-style), falling back to the built-in
//! heuristic over the whole word list on any failure: a missing model
//! path, a binary that isn't on `PATH`, a nonzero exit, or empty output.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::{heuristic, G2PBackend};

/// Which external tool's argument and output conventions to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalVariant {
    Phonetisaurus,
    Sequitur,
}

pub struct ExternalBinaryBackend {
    variant: ExternalVariant,
    bin_path: String,
    model_path: Option<String>,
}

impl ExternalBinaryBackend {
    pub fn new(variant: ExternalVariant, bin_path: impl Into<String>, model_path: Option<String>) -> Self {
        Self {
            variant,
            bin_path: bin_path.into(),
            model_path,
        }
    }

    fn args(&self, model: &str) -> Vec<String> {
        match self.variant {
            ExternalVariant::Phonetisaurus => vec![format!("--model={model}")],
            ExternalVariant::Sequitur => vec!["-m".into(), model.into(), "-x".into(), " ".into(), "-e".into(), "".into()],
        }
    }

    fn run(&self, words: &[String]) -> Option<Vec<String>> {
        let model = self.model_path.as_ref()?;
        let mut child = Command::new(&self.bin_path)
            .args(self.args(model))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;

        child
            .stdin
            .take()?
            .write_all(words.join("\n").as_bytes())
            .ok()?;

        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8(output.stdout).ok()?;
        let phonemes = self.parse(&text);
        if phonemes.is_empty() {
            None
        } else {
            Some(phonemes)
        }
    }

    fn parse(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for line in text.trim().lines() {
            match self.variant {
                ExternalVariant::Phonetisaurus => {
                    if let Some((_, rest)) = line.split_once('\t') {
                        out.extend(rest.split_whitespace().map(|p| p.to_uppercase()));
                    }
                }
                ExternalVariant::Sequitur => {
                    out.extend(line.split_whitespace().map(|p| p.to_uppercase()));
                }
            }
        }
        out
    }
}

impl G2PBackend for ExternalBinaryBackend {
    fn phonemes(&self, words: &[String]) -> Vec<String> {
        match self.run(words) {
            Some(phonemes) => phonemes,
            None => {
                tracing::warn!(binary = %self.bin_path, "external g2p backend unavailable; using heuristic fallback");
                heuristic::phonemes(words)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_model_path_falls_back_to_heuristic() {
        let backend = ExternalBinaryBackend::new(ExternalVariant::Phonetisaurus, "phonetisaurus-g2p", None);
        let result = backend.phonemes(&["cat".to_string()]);
        assert_eq!(result, vec!["K", "AE", "T"]);
    }

    #[test]
    fn missing_binary_falls_back_to_heuristic() {
        let backend = ExternalBinaryBackend::new(
            ExternalVariant::Sequitur,
            "/nonexistent/sequitur-g2p",
            Some("/nonexistent/model".to_string()),
        );
        let result = backend.phonemes(&["dog".to_string()]);
        assert_eq!(result, vec!["D", "AO", "G"]);
    }

    #[test]
    fn phonetisaurus_output_is_tab_separated() {
        let backend = ExternalBinaryBackend::new(ExternalVariant::Phonetisaurus, "phonetisaurus-g2p", None);
        let parsed = backend.parse("cat\tK AE T\ndog\tD AO G\n");
        assert_eq!(parsed, vec!["K", "AE", "T", "D", "AO", "G"]);
    }

    #[test]
    fn sequitur_output_is_space_separated() {
        let backend = ExternalBinaryBackend::new(ExternalVariant::Sequitur, "sequitur-g2p", None);
        let parsed = backend.parse("k ae t\n");
        assert_eq!(parsed, vec!["K", "AE", "T"]);
    }
}

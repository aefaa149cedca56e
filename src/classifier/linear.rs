// Linear text classifier over character n-gram TF-IDF features.
//
// This is the inference half of a "TF-IDF (char_wb, 1-4 grams) + linear SVM"
// pipeline. Training happens elsewhere; the trained vocabulary, IDF weights
// and decision coefficients are exported to JSON and loaded here. A linear
// SVM has no calibrated probabilities, so this model is always used
// uncalibrated.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::traits::{Classifier, Label};

/// On-disk model format.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearTextModel {
    #[serde(default = "default_ngram_min")]
    pub ngram_min: usize,
    #[serde(default = "default_ngram_max")]
    pub ngram_max: usize,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    /// n-gram -> column index
    pub vocabulary: HashMap<String, usize>,
    /// Per-column inverse document frequency
    pub idf: Vec<f64>,
    /// Per-column decision coefficient
    pub coef: Vec<f64>,
    pub intercept: f64,
}

fn default_ngram_min() -> usize {
    1
}

fn default_ngram_max() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl LinearTextModel {
    /// Check that the exported arrays line up with the vocabulary.
    pub fn validate(&self) -> Result<()> {
        if self.ngram_min == 0 || self.ngram_min > self.ngram_max {
            anyhow::bail!(
                "Invalid n-gram range {}..={}",
                self.ngram_min,
                self.ngram_max
            );
        }
        if self.idf.len() != self.coef.len() {
            anyhow::bail!(
                "idf has {} columns but coef has {}",
                self.idf.len(),
                self.coef.len()
            );
        }
        if let Some((gram, &idx)) = self.vocabulary.iter().find(|(_, &i)| i >= self.idf.len()) {
            anyhow::bail!(
                "Vocabulary entry {:?} points at column {} of {}",
                gram,
                idx,
                self.idf.len()
            );
        }
        Ok(())
    }

    /// Signed distance from the decision boundary. Positive means spam.
    pub fn decision_function(&self, text: &str) -> f64 {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in char_wb_ngrams(&text, self.ngram_min, self.ngram_max) {
            if let Some(&idx) = self.vocabulary.get(&gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        if counts.is_empty() {
            return self.intercept;
        }

        let weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * self.idf[idx])
            })
            .collect();

        // L2-normalize the TF-IDF row before the dot product
        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return self.intercept;
        }

        weighted
            .iter()
            .map(|(idx, w)| (w / norm) * self.coef[*idx])
            .sum::<f64>()
            + self.intercept
    }
}

/// Character n-grams taken inside word boundaries, each word padded with one
/// space on either side. Whitespace runs are collapsed first.
pub fn char_wb_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for word in text.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        let len = padded.len();

        for n in min_n..=max_n {
            if n >= len {
                // Word no longer than n: emit it whole, once
                grams.push(padded.iter().collect());
                break;
            }
            for start in 0..=(len - n) {
                grams.push(padded[start..start + n].iter().collect());
            }
        }
    }
    grams
}

/// Text classifier backed by a [`LinearTextModel`].
pub struct LinearTextClassifier {
    model: Arc<LinearTextModel>,
}

impl LinearTextClassifier {
    pub fn new(model: LinearTextModel) -> Result<Self> {
        model.validate()?;
        Ok(Self {
            model: Arc::new(model),
        })
    }

    /// Load and validate a JSON model file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read text model {}", path.display()))?;
        let model: LinearTextModel = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse text model {}", path.display()))?;
        debug!(
            vocabulary = model.vocabulary.len(),
            "Loaded linear text model from {}",
            path.display()
        );
        Self::new(model)
    }
}

#[async_trait]
impl Classifier<str> for LinearTextClassifier {
    async fn predict(&self, input: &str) -> Result<Label> {
        let model = Arc::clone(&self.model);
        let text = input.to_string();
        let score = tokio::task::spawn_blocking(move || model.decision_function(&text))
            .await
            .context("spawn_blocking panicked")?;
        Ok(if score > 0.0 {
            Label::Malicious
        } else {
            Label::Benign
        })
    }
}

// Local ONNX URL classifier.
//
// Runs a tree-ensemble (or any other) model exported to ONNX over the
// 12-field URL feature vector. Exports from skl2onnx with `zipmap=False`
// produce two outputs, in this order:
//   0. label          int64 [batch]
//   1. probabilities  float [batch, 2]   (benign, malicious)
// The input is a single float tensor of shape [batch, 12].

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use super::traits::{CalibratedClassifier, ClassProbabilities, Classifier, Label};
use crate::features::{FeatureVector, FEATURE_COUNT};

/// ONNX-backed URL classifier. The session sits behind Arc<Mutex> so
/// inference can run on the blocking pool without stalling the runtime.
pub struct OnnxUrlClassifier {
    // ort::Session::run takes &mut self
    session: Arc<Mutex<Session>>,
}

/// Raw model outputs for one feature vector.
struct RawOutput {
    label: Label,
    probabilities: Option<ClassProbabilities>,
}

impl OnnxUrlClassifier {
    /// Load the model from an `.onnx` file.
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("URL model file not found: {}", model_path.display());
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        debug!("Loaded ONNX URL model from {}", model_path.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
        })
    }

    /// One forward pass. Probabilities are only read when asked for, so an
    /// export without a probability output works when configured as
    /// uncalibrated and errors cleanly when configured as calibrated.
    async fn run(&self, features: &FeatureVector, with_proba: bool) -> Result<RawOutput> {
        let session = Arc::clone(&self.session);
        let input = features.to_f32().to_vec();

        tokio::task::spawn_blocking(move || {
            let shape = [1_i64, FEATURE_COUNT as i64];
            let input_tensor = Tensor::from_array((shape, input))
                .context("Failed to create feature tensor")?;

            let mut session = session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs![input_tensor])
                .context("ONNX inference failed")?;

            let (_shape, labels) = outputs[0]
                .try_extract_tensor::<i64>()
                .context("Failed to extract label tensor")?;
            let label = labels
                .first()
                .copied()
                .map(Label::from_class)
                .context("Model returned an empty label tensor")?;

            let probabilities = if with_proba {
                require_probability_output(outputs.len())?;
                let (_shape, probs) = outputs[1]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract probability tensor")?;
                Some(probabilities_from_row(probs)?)
            } else {
                None
            };

            debug!(?label, ?probabilities, "ONNX scored URL");

            Ok(RawOutput {
                label,
                probabilities,
            })
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

#[async_trait]
impl Classifier<FeatureVector> for OnnxUrlClassifier {
    async fn predict(&self, input: &FeatureVector) -> Result<Label> {
        Ok(self.run(input, false).await?.label)
    }
}

#[async_trait]
impl CalibratedClassifier<FeatureVector> for OnnxUrlClassifier {
    async fn predict_proba(&self, input: &FeatureVector) -> Result<ClassProbabilities> {
        self.run(input, true)
            .await?
            .probabilities
            .context("Model produced no probabilities")
    }

    async fn predict_with_proba(
        &self,
        input: &FeatureVector,
    ) -> Result<(Label, ClassProbabilities)> {
        let output = self.run(input, true).await?;
        let probabilities = output
            .probabilities
            .context("Model produced no probabilities")?;
        Ok((output.label, probabilities))
    }
}

/// A calibrated model needs the second (probability) output.
fn require_probability_output(output_count: usize) -> Result<()> {
    if output_count < 2 {
        anyhow::bail!(
            "URL model has {output_count} output(s) and no probability tensor; \
             set CYBERSHIELD_URL_CALIBRATION=uncalibrated for label-only models"
        );
    }
    Ok(())
}

/// Read the first row of a [batch, 2] probability tensor.
fn probabilities_from_row(row: &[f32]) -> Result<ClassProbabilities> {
    if row.len() < 2 {
        anyhow::bail!(
            "Expected 2 class probabilities, model returned {}",
            row.len()
        );
    }
    let benign = f64::from(row[0]);
    let malicious = f64::from(row[1]);
    if !benign.is_finite() || !malicious.is_finite() {
        anyhow::bail!("Model returned non-finite probabilities");
    }
    Ok(ClassProbabilities { benign, malicious })
}

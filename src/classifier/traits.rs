// Statistical classifier traits: the swap-ready abstraction over trained
// models.
//
// Models come in two flavours and the difference matters to the pipelines:
// a calibrated model reports a probability the pipeline can surface as
// confidence, an uncalibrated one only reports a label and the pipeline
// falls back to fixed per-class constants. Which flavour a model is gets
// decided when it is configured, never sniffed at request time.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::features::FeatureVector;

/// Binary class predicted by a model. Class 1 in the training data is malicious.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Benign,
    Malicious,
}

impl Label {
    /// Map a raw class index from a model output.
    pub fn from_class(class: i64) -> Self {
        if class == 1 {
            Label::Malicious
        } else {
            Label::Benign
        }
    }

    pub fn is_malicious(&self) -> bool {
        matches!(self, Label::Malicious)
    }
}

/// Probability distribution over the two classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub benign: f64,
    pub malicious: f64,
}

impl ClassProbabilities {
    /// Probability assigned to `label`.
    pub fn of(&self, label: Label) -> f64 {
        match label {
            Label::Benign => self.benign,
            Label::Malicious => self.malicious,
        }
    }

    /// The more probable class. Ties go to benign.
    pub fn argmax(&self) -> Label {
        if self.malicious > self.benign {
            Label::Malicious
        } else {
            Label::Benign
        }
    }
}

/// A model that predicts a label. Implementations must be async because
/// inference is pushed onto the blocking pool and bounded by a timeout.
#[async_trait]
pub trait Classifier<I: ?Sized + Sync>: Send + Sync {
    async fn predict(&self, input: &I) -> Result<Label>;
}

/// A model that can also report class probabilities.
#[async_trait]
pub trait CalibratedClassifier<I: ?Sized + Sync>: Classifier<I> {
    async fn predict_proba(&self, input: &I) -> Result<ClassProbabilities>;

    /// Label and probabilities together. The default runs the model twice;
    /// providers that get both from one pass should override it.
    async fn predict_with_proba(&self, input: &I) -> Result<(Label, ClassProbabilities)> {
        let label = self.predict(input).await?;
        let probabilities = self.predict_proba(input).await?;
        Ok((label, probabilities))
    }
}

/// What a configured model said about one input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,
    /// Probability of `label`, only for calibrated models
    pub probability: Option<f64>,
}

/// A configured model, tagged with its calibration.
pub enum Model<I: ?Sized + Sync> {
    Calibrated(Arc<dyn CalibratedClassifier<I>>),
    Uncalibrated(Arc<dyn Classifier<I>>),
}

/// URL model over the 12-field feature vector.
pub type UrlModel = Model<FeatureVector>;

/// Text model over raw message text.
pub type TextModel = Model<str>;

impl<I: ?Sized + Sync> Model<I> {
    pub fn is_calibrated(&self) -> bool {
        matches!(self, Model::Calibrated(_))
    }

    /// Run the model on one input.
    pub async fn predict(&self, input: &I) -> Result<Prediction> {
        match self {
            Model::Calibrated(model) => {
                let (label, probabilities) = model.predict_with_proba(input).await?;
                Ok(Prediction {
                    label,
                    probability: Some(probabilities.of(label)),
                })
            }
            Model::Uncalibrated(model) => Ok(Prediction {
                label: model.predict(input).await?,
                probability: None,
            }),
        }
    }
}

impl<I: ?Sized + Sync> Clone for Model<I> {
    fn clone(&self) -> Self {
        match self {
            Model::Calibrated(model) => Model::Calibrated(Arc::clone(model)),
            Model::Uncalibrated(model) => Model::Uncalibrated(Arc::clone(model)),
        }
    }
}

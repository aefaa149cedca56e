// Text decision pipeline: for typed messages and for text read out of
// screenshots.
//
//   0. empty input       nothing to judge                    -> UNKNOWN 0
//   1. scam triggers     any trigger phrase                  -> SPAM 99.9
//   2. classifier        model verdict                       -> SPAM / HAM
//   3. no signal         no model, or the model failed       -> HAM 60

use std::time::Duration;

use tracing::{debug, warn};

use crate::classifier::TextModel;
use crate::rules::KeywordList;
use crate::verdict::{DecisionStage, Verdict, VerdictKind};

pub const TRIGGER_CONFIDENCE: f64 = 99.9;
/// Confidence reported for an uncalibrated text model, either class.
pub const UNCALIBRATED_CONFIDENCE: f64 = 95.0;
/// Deliberately low: "we found nothing" is not the same as "this is safe".
pub const NO_SIGNAL_CONFIDENCE: f64 = 60.0;

pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(2);

/// The text pipeline.
pub struct TextPipeline {
    triggers: KeywordList,
    model: Option<TextModel>,
    classifier_timeout: Duration,
}

impl TextPipeline {
    pub fn new(triggers: KeywordList) -> Self {
        Self {
            triggers,
            model: None,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: TextModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_timeout(mut self, classifier: Duration) -> Self {
        self.classifier_timeout = classifier;
        self
    }

    pub fn model(&self) -> Option<&TextModel> {
        self.model.as_ref()
    }

    /// Classify a message. Blank text yields UNKNOWN rather than a guess.
    pub async fn classify(&self, text: &str) -> Verdict {
        if text.trim().is_empty() {
            return Verdict::new(VerdictKind::Unknown, 0.0, DecisionStage::EmptyInput)
                .with_note("no text to analyze");
        }

        let hits = self.triggers.matches(text);
        if !hits.is_empty() {
            debug!(triggers = ?hits, "Scam triggers in text");
            return Verdict::new(VerdictKind::Spam, TRIGGER_CONFIDENCE, DecisionStage::ScamTriggers)
                .with_note(format!("scam triggers detected: {}", hits.join(", ")));
        }

        let Some(model) = &self.model else {
            return no_signal();
        };

        let prediction = match tokio::time::timeout(self.classifier_timeout, model.predict(text))
            .await
        {
            Ok(Ok(prediction)) => prediction,
            Ok(Err(e)) => {
                warn!(error = %e, "Text classifier failed, degrading");
                return no_signal();
            }
            Err(_) => {
                warn!(timeout = ?self.classifier_timeout, "Text classifier timed out, degrading");
                return no_signal();
            }
        };

        let kind = if prediction.label.is_malicious() {
            VerdictKind::Spam
        } else {
            VerdictKind::Ham
        };
        let confidence = prediction
            .probability
            .map_or(UNCALIBRATED_CONFIDENCE, |p| p * 100.0);

        debug!(kind = %kind, confidence, "Text classifier verdict");
        Verdict::new(kind, confidence, DecisionStage::Classifier)
    }
}

fn no_signal() -> Verdict {
    Verdict::new(VerdictKind::Ham, NO_SIGNAL_CONFIDENCE, DecisionStage::NoSignal)
        .with_note("no scam signals found")
}

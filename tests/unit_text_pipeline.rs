// Unit tests for the text decision pipeline.
//
// Covers the trigger trap, the model stage with both calibration flavours,
// and the degraded paths when the model is missing or broken.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use cybershield::classifier::linear::{LinearTextClassifier, LinearTextModel};
use cybershield::classifier::{
    CalibratedClassifier, ClassProbabilities, Classifier, Label, Model, TextModel,
};
use cybershield::pipeline::TextPipeline;
use cybershield::rules::{KeywordList, MatchMode};
use cybershield::verdict::{DecisionStage, VerdictKind};

struct StubText {
    label: Label,
    malicious: f64,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubText {
    fn says(label: Label, malicious: f64) -> Arc<Self> {
        Arc::new(Self {
            label,
            malicious,
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            label: Label::Malicious,
            malicious: 1.0,
            fail: true,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            label: Label::Malicious,
            malicious: 1.0,
            fail: false,
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Classifier<str> for StubText {
    async fn predict(&self, _input: &str) -> Result<Label> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("vocabulary missing");
        }
        Ok(self.label)
    }
}

#[async_trait]
impl CalibratedClassifier<str> for StubText {
    async fn predict_proba(&self, _input: &str) -> Result<ClassProbabilities> {
        Ok(ClassProbabilities {
            benign: 1.0 - self.malicious,
            malicious: self.malicious,
        })
    }
}

fn triggers_only() -> TextPipeline {
    TextPipeline::new(KeywordList::scam_text_triggers())
}

fn with_uncalibrated(stub: &Arc<StubText>) -> TextPipeline {
    let model: TextModel = Model::Uncalibrated(stub.clone());
    triggers_only().with_model(model)
}

// ============================================================
// Empty input
// ============================================================

#[tokio::test]
async fn blank_text_is_unknown_zero() {
    let stub = StubText::says(Label::Malicious, 0.9);
    let pipeline = with_uncalibrated(&stub);

    for text in ["", "   ", "\n\t"] {
        let v = pipeline.classify(text).await;
        assert_eq!(v.kind, VerdictKind::Unknown);
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.stage, DecisionStage::EmptyInput);
    }
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

// ============================================================
// Trigger trap
// ============================================================

#[tokio::test]
async fn single_trigger_is_spam() {
    let stub = StubText::says(Label::Benign, 0.0);
    let v = with_uncalibrated(&stub)
        .classify("You have WON a lottery!")
        .await;
    assert_eq!(v.kind, VerdictKind::Spam);
    assert_eq!(v.confidence, 99.9);
    assert_eq!(v.stage, DecisionStage::ScamTriggers);
    assert_eq!(v.note.as_deref(), Some("scam triggers detected: won, lottery"));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn trigger_buried_in_long_message() {
    let text = "Dear customer, thank you for banking with us. Your account has been \
                blocked pending verification. Regards.";
    let v = triggers_only().classify(text).await;
    assert_eq!(v.kind, VerdictKind::Spam);
}

#[tokio::test]
async fn multi_word_trigger() {
    let v = triggers_only()
        .classify("Please CLICK HERE to continue")
        .await;
    assert_eq!(v.kind, VerdictKind::Spam);
}

#[tokio::test]
async fn inflected_triggers_are_spam() {
    for text in [
        "You are selected for 5 lakhs cash prizes",
        "Rs.50000 claimable, tap the link",
    ] {
        let v = triggers_only().classify(text).await;
        assert_eq!(v.kind, VerdictKind::Spam, "{text}");
        assert_eq!(v.confidence, 99.9);
        assert_eq!(v.stage, DecisionStage::ScamTriggers);
    }
}

#[tokio::test]
async fn custom_trigger_list() {
    let pipeline = TextPipeline::new(KeywordList::new(&["otp"], MatchMode::WholeWord));
    let v = pipeline.classify("Share your OTP with our agent").await;
    assert_eq!(v.kind, VerdictKind::Spam);

    let v = pipeline.classify("You have WON a lottery!").await;
    assert_eq!(v.kind, VerdictKind::Ham);
}

// ============================================================
// Model stage
// ============================================================

#[tokio::test]
async fn no_model_is_ham_sixty() {
    let v = triggers_only().classify("See you at lunch tomorrow").await;
    assert_eq!(v.kind, VerdictKind::Ham);
    assert_eq!(v.confidence, 60.0);
    assert_eq!(v.note.as_deref(), Some("no scam signals found"));
}

#[tokio::test]
async fn uncalibrated_model_uses_fixed_confidence() {
    let v = with_uncalibrated(&StubText::says(Label::Malicious, 0.6))
        .classify("Your parcel is waiting, pay the fee")
        .await;
    assert_eq!(v.kind, VerdictKind::Spam);
    assert_eq!(v.confidence, 95.0);
    assert_eq!(v.stage, DecisionStage::Classifier);

    let v = with_uncalibrated(&StubText::says(Label::Benign, 0.1))
        .classify("See you at lunch tomorrow")
        .await;
    assert_eq!(v.kind, VerdictKind::Ham);
    assert_eq!(v.confidence, 95.0);
}

#[tokio::test]
async fn calibrated_model_reports_probability() {
    let stub = StubText::says(Label::Benign, 0.25);
    let model: TextModel = Model::Calibrated(stub);
    let v = triggers_only()
        .with_model(model)
        .classify("See you at lunch tomorrow")
        .await;
    assert_eq!(v.kind, VerdictKind::Ham);
    assert!((v.confidence - 75.0).abs() < 1e-9);
}

#[tokio::test]
async fn failing_model_degrades_to_no_signal() {
    let v = with_uncalibrated(&StubText::failing())
        .classify("See you at lunch tomorrow")
        .await;
    assert_eq!(v.kind, VerdictKind::Ham);
    assert_eq!(v.confidence, 60.0);
    assert_eq!(v.stage, DecisionStage::NoSignal);
}

#[tokio::test]
async fn slow_model_degrades_to_no_signal() {
    let stub = StubText::slow(Duration::from_secs(10));
    let v = with_uncalibrated(&stub)
        .with_timeout(Duration::from_millis(100))
        .classify("See you at lunch tomorrow")
        .await;
    assert_eq!(v.kind, VerdictKind::Ham);
    assert_eq!(v.confidence, 60.0);
    assert_eq!(v.stage, DecisionStage::NoSignal);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

// ============================================================
// Linear model end to end
// ============================================================

#[tokio::test]
async fn linear_model_drives_text_verdict() {
    // One feature: the bigram "pa" pushes towards spam
    let json = r#"{
        "ngram_min": 2,
        "ngram_max": 2,
        "vocabulary": {"pa": 0},
        "idf": [1.0],
        "coef": [3.0],
        "intercept": -1.0
    }"#;
    let model: LinearTextModel = serde_json::from_str(json).unwrap();
    let classifier = LinearTextClassifier::new(model).unwrap();
    let pipeline = triggers_only().with_model(Model::Uncalibrated(Arc::new(classifier)));

    let v = pipeline.classify("pay").await;
    assert_eq!(v.kind, VerdictKind::Spam);

    let v = pipeline.classify("hello").await;
    assert_eq!(v.kind, VerdictKind::Ham);
    assert_eq!(v.stage, DecisionStage::Classifier);
}

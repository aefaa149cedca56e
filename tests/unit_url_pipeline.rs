// Unit tests for the URL decision pipeline.
//
// Every collaborator is a hand-written stub behind the public traits, so
// these run without models, network access, or a tesseract install. The
// stubs count their calls, which is how the short-circuit order is checked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use cybershield::classifier::{
    CalibratedClassifier, ClassProbabilities, Classifier, Label, Model, UrlModel,
};
use cybershield::domain_age::{DomainAge, DomainAgeOracle};
use cybershield::error::LookupError;
use cybershield::features::FeatureVector;
use cybershield::pipeline::UrlPipeline;
use cybershield::rules::{KeywordList, TrustEntry, TrustList};
use cybershield::verdict::{DecisionStage, VerdictKind};

// ============================================================
// Stubs
// ============================================================

#[derive(Default)]
struct Calls(AtomicUsize);

impl Calls {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Classifier that always answers with the same label and probabilities.
struct StubClassifier {
    label: Label,
    malicious: f64,
    delay: Option<Duration>,
    fail: bool,
    calls: Calls,
}

impl StubClassifier {
    fn says(label: Label, malicious: f64) -> Self {
        Self {
            label,
            malicious,
            delay: None,
            fail: false,
            calls: Calls::default(),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::says(Label::Malicious, 1.0)
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::says(Label::Malicious, 1.0)
        }
    }

    async fn answer(&self) -> Result<()> {
        self.calls.hit();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("model session poisoned");
        }
        Ok(())
    }
}

#[async_trait]
impl Classifier<FeatureVector> for StubClassifier {
    async fn predict(&self, _input: &FeatureVector) -> Result<Label> {
        self.answer().await?;
        Ok(self.label)
    }
}

#[async_trait]
impl CalibratedClassifier<FeatureVector> for StubClassifier {
    async fn predict_proba(&self, _input: &FeatureVector) -> Result<ClassProbabilities> {
        self.answer().await?;
        Ok(ClassProbabilities {
            benign: 1.0 - self.malicious,
            malicious: self.malicious,
        })
    }
}

enum OracleAnswer {
    Days(i64),
    Unknown,
    Error,
    Hang,
}

struct StubOracle {
    answer: OracleAnswer,
    calls: Calls,
}

impl StubOracle {
    fn new(answer: OracleAnswer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: Calls::default(),
        })
    }
}

#[async_trait]
impl DomainAgeOracle for StubOracle {
    async fn lookup(&self, _domain: &str) -> Result<DomainAge, LookupError> {
        self.calls.hit();
        match self.answer {
            OracleAnswer::Days(days) => Ok(DomainAge::Known { days }),
            OracleAnswer::Unknown => Ok(DomainAge::Unknown),
            OracleAnswer::Error => Err(LookupError::Parse("no events array".into())),
            OracleAnswer::Hang => {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(DomainAge::Known { days: 9999 })
            }
        }
    }
}

fn rules_only() -> UrlPipeline {
    UrlPipeline::new(TrustList::builtin(), KeywordList::scam_url_keywords())
}

fn uncalibrated(classifier: &Arc<StubClassifier>) -> UrlModel {
    Model::Uncalibrated(classifier.clone())
}

fn calibrated(classifier: &Arc<StubClassifier>) -> UrlModel {
    Model::Calibrated(classifier.clone())
}

// A host with no trust entry and none of the scam keywords in it
const UNKNOWN_URL: &str = "http://paypa1-verify.example/account";

// ============================================================
// Stage 1: local addresses
// ============================================================

#[tokio::test]
async fn localhost_with_port_is_safe() {
    let v = rules_only().classify("localhost:8080/anything").await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 100.0);
    assert_eq!(v.stage, DecisionStage::LocalAddress);
}

#[tokio::test]
async fn loopback_skips_every_later_stage() {
    let classifier = Arc::new(StubClassifier::says(Label::Malicious, 0.99));
    let oracle = StubOracle::new(OracleAnswer::Days(1));
    let pipeline = rules_only()
        .with_model(uncalibrated(&classifier))
        .with_oracle(oracle.clone());

    // "win" would trip the keyword trap if local addresses didn't run first
    let v = pipeline.classify("http://127.0.0.1/x/win").await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 100.0);
    assert_eq!(v.stage, DecisionStage::LocalAddress);
    assert_eq!(classifier.calls.count(), 0);
    assert_eq!(oracle.calls.count(), 0);
}

#[tokio::test]
async fn numeric_loopback_spelling_is_not_a_local_address() {
    let pipeline = rules_only();
    for url in ["http://2130706433/", "http://0x7f.1/", "http://127.1/"] {
        let v = pipeline.classify(url).await;
        assert_ne!(v.stage, DecisionStage::LocalAddress, "{url}");
        assert_eq!(v.stage, DecisionStage::NoModel, "{url}");
    }
}

// ============================================================
// Stage 2: trust list
// ============================================================

#[tokio::test]
async fn trusted_subdomain_is_safe_regardless_of_path() {
    let v = rules_only()
        .classify("https://accounts.google.com/login?next=claim-your-prize")
        .await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 100.0);
    assert_eq!(v.stage, DecisionStage::TrustList);
    assert_eq!(v.note.as_deref(), Some("Verified trusted brand: Google"));
}

#[tokio::test]
async fn lookalike_host_is_not_trusted() {
    let v = rules_only().classify("http://evilgoogle.com/").await;
    assert_ne!(v.stage, DecisionStage::TrustList);
}

#[tokio::test]
async fn trust_list_is_injected_not_global() {
    let trust = TrustList::new(vec![TrustEntry::new("intranet.example", "Intranet")]);
    let pipeline = UrlPipeline::new(trust, KeywordList::scam_url_keywords());

    let v = pipeline.classify("https://wiki.intranet.example/").await;
    assert_eq!(v.stage, DecisionStage::TrustList);

    let v = pipeline.classify("https://accounts.google.com/").await;
    assert_ne!(v.stage, DecisionStage::TrustList);
}

// ============================================================
// Stage 3: scam keywords
// ============================================================

#[tokio::test]
async fn scam_keyword_is_phishing() {
    let classifier = Arc::new(StubClassifier::says(Label::Benign, 0.01));
    let pipeline = rules_only().with_model(uncalibrated(&classifier));

    let v = pipeline.classify("http://get-free-prize-now.com").await;
    assert_eq!(v.kind, VerdictKind::Phishing);
    assert_eq!(v.confidence, 95.0);
    assert_eq!(v.stage, DecisionStage::ScamKeywords);
    assert_eq!(classifier.calls.count(), 0);
}

#[tokio::test]
async fn scam_keyword_matches_inside_words() {
    let v = rules_only().classify("http://freebies.example/").await;
    assert_eq!(v.kind, VerdictKind::Phishing);
}

// ============================================================
// Stages 4-5: domain age and classifier
// ============================================================

#[tokio::test]
async fn no_model_is_safe_fifty() {
    let oracle = StubOracle::new(OracleAnswer::Days(1));
    let pipeline = rules_only().with_oracle(oracle.clone());

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 50.0);
    assert_eq!(v.stage, DecisionStage::NoModel);
    assert_eq!(oracle.calls.count(), 0);
}

#[tokio::test]
async fn established_domain_overrides_malicious_prediction() {
    let classifier = Arc::new(StubClassifier::says(Label::Malicious, 0.97));
    let pipeline = rules_only()
        .with_model(calibrated(&classifier))
        .with_oracle(StubOracle::new(OracleAnswer::Days(400)));

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 80.0);
    assert_eq!(v.stage, DecisionStage::DomainAgeOverride);
    assert_eq!(
        v.note.as_deref(),
        Some("classifier flagged, but domain age verifies safe")
    );
}

#[tokio::test]
async fn young_domain_keeps_malicious_prediction() {
    let classifier = Arc::new(StubClassifier::says(Label::Malicious, 0.9));
    let pipeline = rules_only()
        .with_model(uncalibrated(&classifier))
        .with_oracle(StubOracle::new(OracleAnswer::Days(180)));

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Phishing);
    assert_eq!(v.confidence, 95.0);
    assert_eq!(v.stage, DecisionStage::Classifier);
}

#[tokio::test]
async fn benign_prediction_is_not_raised_by_age() {
    let classifier = Arc::new(StubClassifier::says(Label::Benign, 0.1));
    let pipeline = rules_only()
        .with_model(uncalibrated(&classifier))
        .with_oracle(StubOracle::new(OracleAnswer::Days(5000)));

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 85.0);
}

#[tokio::test]
async fn calibrated_model_reports_probability() {
    let classifier = Arc::new(StubClassifier::says(Label::Malicious, 0.875));
    let pipeline = rules_only().with_model(calibrated(&classifier));

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Phishing);
    assert!((v.confidence - 87.5).abs() < 1e-9);
}

#[tokio::test]
async fn unknown_age_leaves_prediction_alone() {
    for answer in [OracleAnswer::Unknown, OracleAnswer::Error] {
        let classifier = Arc::new(StubClassifier::says(Label::Malicious, 0.9));
        let pipeline = rules_only()
            .with_model(uncalibrated(&classifier))
            .with_oracle(StubOracle::new(answer));

        let v = pipeline.classify(UNKNOWN_URL).await;
        assert_eq!(v.kind, VerdictKind::Phishing);
        assert_eq!(v.stage, DecisionStage::Classifier);
    }
}

#[tokio::test]
async fn hung_lookup_times_out_as_unknown() {
    let classifier = Arc::new(StubClassifier::says(Label::Malicious, 0.9));
    let pipeline = rules_only()
        .with_model(uncalibrated(&classifier))
        .with_oracle(StubOracle::new(OracleAnswer::Hang))
        .with_timeouts(Duration::from_millis(100), Duration::from_secs(2));

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Phishing);
    assert_eq!(v.stage, DecisionStage::Classifier);
}

#[tokio::test]
async fn failing_classifier_degrades_to_safe_fifty() {
    let classifier = Arc::new(StubClassifier::failing());
    let pipeline = rules_only().with_model(uncalibrated(&classifier));

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 50.0);
    assert_eq!(v.note.as_deref(), Some("classifier unavailable"));
}

#[tokio::test]
async fn slow_classifier_degrades_to_safe_fifty() {
    let classifier = Arc::new(StubClassifier::slow(Duration::from_secs(10)));
    let pipeline = rules_only()
        .with_model(uncalibrated(&classifier))
        .with_timeouts(Duration::from_secs(5), Duration::from_millis(200));

    let v = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(v.kind, VerdictKind::Safe);
    assert_eq!(v.confidence, 50.0);
    assert_eq!(classifier.calls.count(), 1);
}

#[tokio::test]
async fn classify_is_deterministic() {
    let classifier = Arc::new(StubClassifier::says(Label::Malicious, 0.66));
    let pipeline = rules_only()
        .with_model(calibrated(&classifier))
        .with_oracle(StubOracle::new(OracleAnswer::Days(12)));

    let a = pipeline.classify(UNKNOWN_URL).await;
    let b = pipeline.classify(UNKNOWN_URL).await;
    assert_eq!(a, b);
}

// URL decision pipeline.
//
// Stages run in a fixed order and the first one with an answer wins:
//
//   1. local address      localhost / 127.0.0.1 / 0.0.0.0    -> SAFE 100
//   2. trust list         known brand domain or subdomain    -> SAFE 100
//   3. scam keywords      lure words anywhere in the URL     -> PHISHING 95
//   4. domain age         RDAP lookup, unknown on failure
//   5. classifier         model verdict, reconciled with age
//
// The cheap deterministic checks run first so that an obvious answer never
// waits on a network lookup or a model. The only place a later signal can
// overturn an earlier one is the age/classifier reconciliation in stage 5.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::classifier::{Prediction, UrlModel};
use crate::domain_age::{DomainAge, DomainAgeOracle};
use crate::error::LookupError;
use crate::features::{self, UrlParts};
use crate::rules::{KeywordList, TrustList};
use crate::verdict::{DecisionStage, Verdict, VerdictKind};

/// Hosts that are always a developer's own machine.
pub const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "0.0.0.0"];

pub const LOCAL_CONFIDENCE: f64 = 100.0;
pub const TRUSTED_CONFIDENCE: f64 = 100.0;
pub const SCAM_KEYWORD_CONFIDENCE: f64 = 95.0;
pub const NO_MODEL_CONFIDENCE: f64 = 50.0;
pub const AGE_OVERRIDE_CONFIDENCE: f64 = 80.0;
/// Confidence reported for uncalibrated models, per predicted class.
pub const UNCALIBRATED_PHISHING_CONFIDENCE: f64 = 95.0;
pub const UNCALIBRATED_SAFE_CONFIDENCE: f64 = 85.0;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(2);

/// The URL pipeline. Holds only immutable rule data and shared handles to
/// collaborators, so one instance can serve any number of concurrent scans.
pub struct UrlPipeline {
    trust_list: TrustList,
    scam_keywords: KeywordList,
    model: Option<UrlModel>,
    oracle: Option<Arc<dyn DomainAgeOracle>>,
    lookup_timeout: Duration,
    classifier_timeout: Duration,
}

impl UrlPipeline {
    /// A pipeline with rules only: no model, no domain-age oracle.
    pub fn new(trust_list: TrustList, scam_keywords: KeywordList) -> Self {
        Self {
            trust_list,
            scam_keywords,
            model: None,
            oracle: None,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: UrlModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn DomainAgeOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_timeouts(mut self, lookup: Duration, classifier: Duration) -> Self {
        self.lookup_timeout = lookup;
        self.classifier_timeout = classifier;
        self
    }

    pub fn model(&self) -> Option<&UrlModel> {
        self.model.as_ref()
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn trust_list(&self) -> &TrustList {
        &self.trust_list
    }

    /// Run every stage in order and return the first terminal verdict.
    ///
    /// Never fails: collaborator errors and timeouts degrade to their
    /// documented fallbacks.
    pub async fn classify(&self, url: &str) -> Verdict {
        let parts = UrlParts::parse(url);

        let verdict = match self.decide_by_rules(url, &parts) {
            Some(verdict) => verdict,
            None => self.decide_by_model(url, &parts).await,
        };

        debug!(
            url,
            host = %parts.host,
            stage = ?verdict.stage,
            kind = %verdict.kind,
            confidence = verdict.confidence,
            "URL verdict"
        );
        verdict
    }

    /// Stages 1-3: the deterministic checks.
    fn decide_by_rules(&self, url: &str, parts: &UrlParts) -> Option<Verdict> {
        if is_local_host(parts) {
            return Some(
                Verdict::new(VerdictKind::Safe, LOCAL_CONFIDENCE, DecisionStage::LocalAddress)
                    .with_note("local development server"),
            );
        }

        if let Some(entry) = self.trust_list.lookup(parts.bare_host()) {
            return Some(
                Verdict::new(VerdictKind::Safe, TRUSTED_CONFIDENCE, DecisionStage::TrustList)
                    .with_note(format!("Verified trusted brand: {}", entry.name)),
            );
        }

        let hits = self.scam_keywords.matches(url);
        if !hits.is_empty() {
            debug!(keywords = ?hits, "Scam keywords in URL");
            return Some(
                Verdict::new(
                    VerdictKind::Phishing,
                    SCAM_KEYWORD_CONFIDENCE,
                    DecisionStage::ScamKeywords,
                )
                .with_note("scam keywords detected"),
            );
        }

        None
    }

    /// Stages 4-5: domain age, then the classifier.
    async fn decide_by_model(&self, url: &str, parts: &UrlParts) -> Verdict {
        // No model means the age signal has nothing to reconcile against
        let Some(model) = &self.model else {
            return Verdict::new(VerdictKind::Safe, NO_MODEL_CONFIDENCE, DecisionStage::NoModel)
                .with_note("no model available");
        };

        let age = self.domain_age(parts.bare_host()).await;

        let features = features::extract(url);
        let prediction =
            match tokio::time::timeout(self.classifier_timeout, model.predict(&features)).await {
                Ok(Ok(prediction)) => prediction,
                Ok(Err(e)) => {
                    warn!(error = %e, "URL classifier failed, degrading");
                    return classifier_unavailable();
                }
                Err(_) => {
                    warn!(
                        timeout = ?self.classifier_timeout,
                        "URL classifier timed out, degrading"
                    );
                    return classifier_unavailable();
                }
            };

        reconcile(prediction, age)
    }

    /// Domain age for `host`, or Unknown on any failure.
    async fn domain_age(&self, host: &str) -> DomainAge {
        let Some(oracle) = &self.oracle else {
            return DomainAge::Unknown;
        };
        if host.is_empty() {
            return DomainAge::Unknown;
        }

        let result = tokio::time::timeout(self.lookup_timeout, oracle.lookup(host))
            .await
            .unwrap_or(Err(LookupError::Timeout(self.lookup_timeout)));

        match result {
            Ok(age) => age,
            Err(e) => {
                warn!(host, error = %e, "Domain-age lookup failed, treating age as unknown");
                DomainAge::Unknown
            }
        }
    }
}

/// Stage 5 reconciliation between the classifier and the domain age.
///
/// An established domain overrides a malicious prediction. A benign
/// prediction is reported as-is whatever the age.
pub fn reconcile(prediction: Prediction, age: DomainAge) -> Verdict {
    if prediction.label.is_malicious() && age.is_established() {
        return Verdict::new(
            VerdictKind::Safe,
            AGE_OVERRIDE_CONFIDENCE,
            DecisionStage::DomainAgeOverride,
        )
        .with_note("classifier flagged, but domain age verifies safe");
    }

    let (kind, fallback) = if prediction.label.is_malicious() {
        (VerdictKind::Phishing, UNCALIBRATED_PHISHING_CONFIDENCE)
    } else {
        (VerdictKind::Safe, UNCALIBRATED_SAFE_CONFIDENCE)
    };
    let confidence = prediction.probability.map_or(fallback, |p| p * 100.0);

    Verdict::new(kind, confidence, DecisionStage::Classifier)
}

fn classifier_unavailable() -> Verdict {
    Verdict::new(VerdictKind::Safe, NO_MODEL_CONFIDENCE, DecisionStage::NoModel)
        .with_note("classifier unavailable")
}

/// Only the literal spellings count; numeric forms the parser would
/// canonicalize to a loopback address (`127.1`, `0x7f.1`) do not.
fn is_local_host(parts: &UrlParts) -> bool {
    !parts.host.is_empty() && LOCAL_HOSTS.contains(&parts.literal_host.trim_end_matches('.'))
}

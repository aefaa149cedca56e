// Verdicts and scan reports: the types that flow out of the decision
// pipelines and into the terminal or JSON output.

use serde::{Deserialize, Serialize};

/// How many characters of submitted text a report echoes back.
pub const SNIPPET_CHARS: usize = 50;

/// The label a pipeline settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictKind {
    Safe,
    Phishing,
    Spam,
    Ham,
    Unknown,
}

impl VerdictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictKind::Safe => "SAFE",
            VerdictKind::Phishing => "PHISHING",
            VerdictKind::Spam => "SPAM",
            VerdictKind::Ham => "HAM",
            VerdictKind::Unknown => "UNKNOWN",
        }
    }

    /// True for the labels that should put the user on guard.
    pub fn is_threat(&self) -> bool {
        matches!(self, VerdictKind::Phishing | VerdictKind::Spam)
    }
}

impl std::fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which stage of a pipeline produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionStage {
    LocalAddress,
    TrustList,
    ScamKeywords,
    Classifier,
    DomainAgeOverride,
    NoModel,
    ScamTriggers,
    NoSignal,
    EmptyInput,
    OcrUnavailable,
}

/// A pipeline's answer: label, confidence (0-100), and an optional
/// human-readable explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub kind: VerdictKind,
    pub confidence: f64,
    pub note: Option<String>,
    pub stage: DecisionStage,
}

impl Verdict {
    /// Build a verdict, clamping confidence into 0-100.
    pub fn new(kind: VerdictKind, confidence: f64, stage: DecisionStage) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            kind,
            confidence,
            note: None,
            stage,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Which entry point produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanType {
    UrlScan,
    TextScan,
    ImageScan,
}

/// The externally visible result of one scan.
///
/// Serializes to the report shape consumed by the dashboard:
/// `{"type": "URL_SCAN", "result": "SAFE", "confidence": 100.0, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub result: VerdictKind,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// The submitted URL (URL scans only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Leading characters of the submitted text (text scans only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Everything OCR read from the image (image scans only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl ScanReport {
    pub fn url(url: &str, verdict: Verdict) -> Self {
        Self {
            input: Some(url.to_string()),
            ..Self::from_verdict(ScanType::UrlScan, verdict)
        }
    }

    pub fn text(text: &str, verdict: Verdict) -> Self {
        Self {
            snippet: Some(text.chars().take(SNIPPET_CHARS).collect()),
            ..Self::from_verdict(ScanType::TextScan, verdict)
        }
    }

    pub fn image(extracted_text: String, verdict: Verdict) -> Self {
        Self {
            extracted_text: Some(extracted_text),
            ..Self::from_verdict(ScanType::ImageScan, verdict)
        }
    }

    fn from_verdict(scan_type: ScanType, verdict: Verdict) -> Self {
        Self {
            scan_type,
            result: verdict.kind,
            confidence: verdict.confidence,
            note: verdict.note,
            input: None,
            snippet: None,
            extracted_text: None,
        }
    }
}

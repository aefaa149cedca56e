// Scanner: the public entry point tying input validation, the two
// decision pipelines, and OCR together.
//
// Everything that reaches a pipeline has already passed validation, and
// everything a pipeline returns is a verdict, so the only error a caller
// ever sees is an InputError.

use std::sync::Arc;

use tracing::{debug, warn};

use super::text::TextPipeline;
use super::url::UrlPipeline;
use crate::error::{InputError, OcrError};
use crate::ocr::OcrEngine;
use crate::verdict::{DecisionStage, ScanReport, Verdict, VerdictKind};

/// One scan request, as submitted by a user.
#[derive(Debug, Clone)]
pub enum ScanRequest {
    Url(String),
    Text(String),
    Image(Vec<u8>),
}

/// Which collaborators a scanner is running with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerStatus {
    /// None when absent, Some(calibrated) when loaded
    pub url_model: Option<bool>,
    pub text_model: Option<bool>,
    pub domain_age: bool,
    pub ocr: bool,
    pub trusted_domains: usize,
}

pub struct Scanner {
    url: UrlPipeline,
    text: TextPipeline,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl Scanner {
    pub fn new(url: UrlPipeline, text: TextPipeline) -> Self {
        Self {
            url,
            text,
            ocr: None,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn status(&self) -> ScannerStatus {
        ScannerStatus {
            url_model: self.url.model().map(|m| m.is_calibrated()),
            text_model: self.text.model().map(|m| m.is_calibrated()),
            domain_age: self.url.has_oracle(),
            ocr: self.ocr.is_some(),
            trusted_domains: self.url.trust_list().len(),
        }
    }

    pub async fn scan(&self, request: ScanRequest) -> Result<ScanReport, InputError> {
        match request {
            ScanRequest::Url(url) => self.scan_url(&url).await,
            ScanRequest::Text(text) => self.scan_text(&text).await,
            ScanRequest::Image(image) => self.scan_image(&image).await,
        }
    }

    pub async fn scan_url(&self, url: &str) -> Result<ScanReport, InputError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(InputError::EmptyUrl);
        }
        let verdict = self.url.classify(url).await;
        Ok(ScanReport::url(url, verdict))
    }

    pub async fn scan_text(&self, text: &str) -> Result<ScanReport, InputError> {
        if text.trim().is_empty() {
            return Err(InputError::EmptyText);
        }
        let verdict = self.text.classify(text).await;
        Ok(ScanReport::text(text, verdict))
    }

    /// OCR the image, then judge whatever text came out. OCR trouble of any
    /// kind ends up as an UNKNOWN verdict, never as an error.
    pub async fn scan_image(&self, image: &[u8]) -> Result<ScanReport, InputError> {
        if image.is_empty() {
            return Err(InputError::EmptyImage);
        }

        let Some(ocr) = &self.ocr else {
            let verdict = Verdict::new(VerdictKind::Unknown, 0.0, DecisionStage::OcrUnavailable)
                .with_note("ocr engine unavailable");
            return Ok(ScanReport::image(String::new(), verdict));
        };

        let extracted = match ocr.extract_text(image).await {
            Ok(text) => text,
            Err(OcrError::Unavailable(reason)) => {
                warn!(%reason, "OCR engine unavailable");
                let verdict =
                    Verdict::new(VerdictKind::Unknown, 0.0, DecisionStage::OcrUnavailable)
                        .with_note("ocr engine unavailable");
                return Ok(ScanReport::image(String::new(), verdict));
            }
            Err(e) => {
                warn!(error = %e, "OCR failed, treating image as empty");
                String::new()
            }
        };

        debug!(chars = extracted.chars().count(), "Extracted text from image");
        let verdict = self.text.classify(&extracted).await;
        Ok(ScanReport::image(extracted, verdict))
    }
}

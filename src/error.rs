// Typed errors at the library boundary.
//
// Collaborator implementations use anyhow internally. These enums are what
// callers of the scanner and the collaborator traits match on.

use std::time::Duration;

use thiserror::Error;

/// Rejected input. Returned before any decision stage runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("no URL provided")]
    EmptyUrl,
    #[error("no text provided")]
    EmptyText,
    #[error("no image provided")]
    EmptyImage,
}

/// Why a domain-age lookup produced no answer.
///
/// The pipeline treats every variant as "age unknown" and moves on.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("domain-age lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("registry request failed: {0}")]
    Http(#[source] anyhow::Error),
    #[error("could not parse registry response: {0}")]
    Parse(String),
}

/// Why OCR produced no text.
///
/// The image pipeline never surfaces these: every variant ends in an
/// UNKNOWN verdict.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine is not available: {0}")]
    Unavailable(String),
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
    #[error("OCR failed: {0}")]
    Failed(#[source] anyhow::Error),
}

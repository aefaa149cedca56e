use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::classifier::linear::LinearTextClassifier;
use crate::classifier::onnx::OnnxUrlClassifier;
use crate::classifier::{Model, TextModel, UrlModel};
use crate::domain_age::rdap::{RdapOracle, DEFAULT_RDAP_URL};
use crate::domain_age::DomainAgeOracle;
use crate::ocr::tesseract::{TesseractOcr, DEFAULT_COMMAND, DEFAULT_LANGS};
use crate::pipeline::{Scanner, TextPipeline, UrlPipeline};
use crate::rules::{KeywordList, TrustList};

pub const URL_MODEL_FILE: &str = "url_model.onnx";
pub const TEXT_MODEL_FILE: &str = "text_model.json";

/// Whether the URL model's probabilities can be reported as confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calibration {
    /// Report the model's probability for the predicted class (default)
    Calibrated,
    /// Report fixed per-class confidences
    Uncalibrated,
}

/// Which domain-age source to use.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainAgeBackend {
    /// RDAP lookups against `rdap_url` (default)
    Rdap,
    /// Skip the domain-age stage; every domain's age is unknown
    Off,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// value has a default, and a missing model file just means that model
/// runs in degraded mode.
pub struct Config {
    pub model_dir: PathBuf,
    pub url_model_path: PathBuf,
    pub url_calibration: Calibration,
    pub text_model_path: PathBuf,
    /// JSON trust list replacing the built-in one
    pub trust_list_path: Option<PathBuf>,
    pub domain_age: DomainAgeBackend,
    pub rdap_url: String,
    pub lookup_timeout: Duration,
    pub classifier_timeout: Duration,
    pub ocr_command: String,
    pub ocr_langs: String,
    pub ocr_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("CYBERSHIELD_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        let url_calibration =
            parse_calibration(env::var("CYBERSHIELD_URL_CALIBRATION").ok().as_deref())?;
        let domain_age = parse_domain_age(env::var("CYBERSHIELD_DOMAIN_AGE").ok().as_deref())?;

        Ok(Self {
            url_model_path: env::var("CYBERSHIELD_URL_MODEL")
                .map(PathBuf::from)
                .unwrap_or_else(|_| model_dir.join(URL_MODEL_FILE)),
            text_model_path: env::var("CYBERSHIELD_TEXT_MODEL")
                .map(PathBuf::from)
                .unwrap_or_else(|_| model_dir.join(TEXT_MODEL_FILE)),
            model_dir,
            url_calibration,
            trust_list_path: env::var("CYBERSHIELD_TRUST_LIST").ok().map(PathBuf::from),
            domain_age,
            rdap_url: env::var("CYBERSHIELD_RDAP_URL")
                .unwrap_or_else(|_| DEFAULT_RDAP_URL.to_string()),
            lookup_timeout: millis_var("CYBERSHIELD_LOOKUP_TIMEOUT_MS", 5_000)?,
            classifier_timeout: millis_var("CYBERSHIELD_CLASSIFIER_TIMEOUT_MS", 2_000)?,
            ocr_command: env::var("CYBERSHIELD_OCR_COMMAND")
                .unwrap_or_else(|_| DEFAULT_COMMAND.to_string()),
            ocr_langs: env::var("CYBERSHIELD_OCR_LANGS")
                .unwrap_or_else(|_| DEFAULT_LANGS.to_string()),
            ocr_timeout: millis_var("CYBERSHIELD_OCR_TIMEOUT_MS", 30_000)?,
        })
    }

    /// The trust list: the configured file if set, the built-in list otherwise.
    /// A configured file that can't be read is an error, not a silent fallback.
    pub fn trust_list(&self) -> Result<TrustList> {
        match &self.trust_list_path {
            Some(path) => TrustList::from_json_file(path),
            None => Ok(TrustList::builtin()),
        }
    }

    /// Load the URL model if its file exists. A broken model file is logged
    /// and skipped so scans keep working in degraded mode.
    pub fn url_model(&self) -> Option<UrlModel> {
        if !self.url_model_path.exists() {
            info!(
                "No URL model at {}, URL scans run without a classifier",
                self.url_model_path.display()
            );
            return None;
        }
        match OnnxUrlClassifier::load(&self.url_model_path) {
            Ok(classifier) => {
                let classifier = Arc::new(classifier);
                Some(match self.url_calibration {
                    Calibration::Calibrated => Model::Calibrated(classifier),
                    Calibration::Uncalibrated => Model::Uncalibrated(classifier),
                })
            }
            Err(e) => {
                warn!("Failed to load URL model, continuing without it: {e:#}");
                None
            }
        }
    }

    /// Load the text model if its file exists.
    pub fn text_model(&self) -> Option<TextModel> {
        if !self.text_model_path.exists() {
            info!(
                "No text model at {}, text scans run on trigger words only",
                self.text_model_path.display()
            );
            return None;
        }
        match LinearTextClassifier::load(&self.text_model_path) {
            Ok(classifier) => Some(Model::Uncalibrated(Arc::new(classifier))),
            Err(e) => {
                warn!("Failed to load text model, continuing without it: {e:#}");
                None
            }
        }
    }

    pub fn domain_age_oracle(&self) -> Result<Option<Arc<dyn DomainAgeOracle>>> {
        match self.domain_age {
            DomainAgeBackend::Rdap => Ok(Some(Arc::new(RdapOracle::new(&self.rdap_url)?))),
            DomainAgeBackend::Off => Ok(None),
        }
    }

    /// Assemble a scanner from everything configured.
    pub fn build_scanner(&self) -> Result<Scanner> {
        let mut url = UrlPipeline::new(self.trust_list()?, KeywordList::scam_url_keywords())
            .with_timeouts(self.lookup_timeout, self.classifier_timeout);
        if let Some(model) = self.url_model() {
            url = url.with_model(model);
        }
        if let Some(oracle) = self.domain_age_oracle()? {
            url = url.with_oracle(oracle);
        }

        let mut text =
            TextPipeline::new(KeywordList::scam_text_triggers()).with_timeout(self.classifier_timeout);
        if let Some(model) = self.text_model() {
            text = text.with_model(model);
        }

        let ocr = TesseractOcr::new(&self.ocr_command, &self.ocr_langs, self.ocr_timeout);
        Ok(Scanner::new(url, text).with_ocr(Arc::new(ocr)))
    }
}

/// Returns the default directory for model files.
/// Uses the platform data directory: ~/.local/share/cybershield/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cybershield")
        .join("models")
}

/// Whether both model files exist in `dir`.
pub fn model_files_present(dir: &Path) -> bool {
    dir.join(URL_MODEL_FILE).exists() && dir.join(TEXT_MODEL_FILE).exists()
}

/// `calibrated` (default) or `uncalibrated`.
fn parse_calibration(raw: Option<&str>) -> Result<Calibration> {
    match raw.map(str::trim) {
        None | Some("calibrated") => Ok(Calibration::Calibrated),
        Some("uncalibrated") => Ok(Calibration::Uncalibrated),
        Some(other) => anyhow::bail!(
            "CYBERSHIELD_URL_CALIBRATION must be `calibrated` or `uncalibrated`, got `{other}`"
        ),
    }
}

/// `rdap` (default) or `off`.
fn parse_domain_age(raw: Option<&str>) -> Result<DomainAgeBackend> {
    match raw.map(str::trim) {
        None | Some("rdap") => Ok(DomainAgeBackend::Rdap),
        Some("off") => Ok(DomainAgeBackend::Off),
        Some(other) => {
            anyhow::bail!("CYBERSHIELD_DOMAIN_AGE must be `rdap` or `off`, got `{other}`")
        }
    }
}

fn millis_var(name: &str, default_ms: u64) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| anyhow::anyhow!("{name} must be a whole number of milliseconds: {e}")),
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

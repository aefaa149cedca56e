// Tesseract OCR via the command-line binary.
//
// The image goes in on stdin and the recognized text comes back on stdout,
// so nothing touches the filesystem. English and Hindi are read by default,
// which covers the bulk of the SMS and WhatsApp screenshots users submit.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::traits::OcrEngine;
use crate::error::OcrError;

pub const DEFAULT_COMMAND: &str = "tesseract";
pub const DEFAULT_LANGS: &str = "eng+hin";

/// OCR engine that shells out to `tesseract`.
pub struct TesseractOcr {
    command: String,
    langs: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(command: &str, langs: &str, timeout: Duration) -> Self {
        Self {
            command: command.to_string(),
            langs: langs.to_string(),
            timeout,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", &self.langs])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    OcrError::Unavailable(format!("`{}` not found on PATH", self.command))
                }
                _ => OcrError::Failed(e.into()),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Failed(anyhow::anyhow!("tesseract stdin unavailable")))?;
        let data = image.to_vec();
        // Feed stdin concurrently so a large image can't deadlock against a full stdout pipe
        let writer = tokio::spawn(async move {
            stdin.write_all(&data).await?;
            stdin.shutdown().await
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))?
            .map_err(|e| OcrError::Failed(e.into()))?;

        if let Ok(Err(e)) = writer.await {
            // Tesseract closing stdin early shows up as a broken pipe; the exit status decides
            debug!(error = %e, "tesseract stdin write did not complete");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "tesseract failed");
            return Err(OcrError::Failed(anyhow::anyhow!(
                "tesseract exited with {}",
                output.status
            )));
        }

        let text = normalize_ocr_text(&String::from_utf8_lossy(&output.stdout));
        debug!(chars = text.chars().count(), "OCR complete");
        Ok(text)
    }
}

/// Collapse OCR line breaks and runs of whitespace into single spaces.
pub fn normalize_ocr_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// OCR engine trait: the image pipeline only needs "bytes in, text out".

use async_trait::async_trait;

use crate::error::OcrError;

/// Anything that can read text out of an image.
///
/// An image with no legible text is `Ok(String::new())`, not an error.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError>;
}

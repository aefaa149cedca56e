// OCR: reads text out of screenshots so the text pipeline can judge it.

pub mod tesseract;
pub mod traits;

pub use traits::OcrEngine;

// CyberShield: layered scam and phishing detection for URLs, messages
// and screenshots.
//
// This is the library root. Each module corresponds to one layer or
// collaborator of the scanning pipeline.

pub mod classifier;
pub mod config;
pub mod domain_age;
pub mod error;
pub mod features;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod verdict;

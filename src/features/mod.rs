// URL feature extraction: turns a raw URL into the fixed-order numeric
// vector the URL classifier consumes.

pub mod extract;
pub mod url_parts;

pub use extract::{extract, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use url_parts::UrlParts;

// Decision pipelines: the layered URL and text classifiers plus the
// scanner that fronts them.

pub mod batch;
pub mod scanner;
pub mod text;
pub mod url;

pub use scanner::{ScanRequest, Scanner, ScannerStatus};
pub use text::TextPipeline;
pub use url::UrlPipeline;

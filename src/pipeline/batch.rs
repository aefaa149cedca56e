// Batch URL scanning.
//
// Scans are independent, so a list of URLs is fanned out with bounded
// concurrency and the results are put back in input order afterwards.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use super::scanner::Scanner;
use crate::error::InputError;
use crate::verdict::ScanReport;

/// Result of one line of a batch.
pub struct BatchItem {
    pub url: String,
    pub report: Result<ScanReport, InputError>,
}

/// Read a batch file: one URL per line, blank lines and `#` comments skipped.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Scan every URL with at most `concurrency` scans in flight.
///
/// Pass `show_progress = false` for non-interactive output.
pub async fn scan_urls(
    scanner: &Scanner,
    urls: Vec<String>,
    concurrency: usize,
    show_progress: bool,
) -> Vec<BatchItem> {
    let pb = if show_progress {
        let pb = ProgressBar::new(urls.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("  Scanning [{bar:30}] {pos}/{len} ({eta})")
        {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut indexed: Vec<(usize, BatchItem)> =
        stream::iter(urls.into_iter().enumerate().map(|(i, url)| {
            let pb = &pb;
            async move {
                let report = scanner.scan_url(&url).await;
                pb.inc(1);
                (i, BatchItem { url, report })
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    pb.finish_and_clear();

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, item)| item).collect()
}

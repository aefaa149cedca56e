// Colored terminal output for scan reports, feature vectors and status.
//
// main.rs delegates all human-facing formatting here; `--json` output
// bypasses this module entirely.

use colored::{ColoredString, Colorize};

use crate::features::FeatureVector;
use crate::pipeline::batch::BatchItem;
use crate::pipeline::ScannerStatus;
use crate::verdict::{ScanReport, ScanType, VerdictKind};

use super::truncate_chars;

/// Display a single scan report.
pub fn display_report(report: &ScanReport) {
    let title = match report.scan_type {
        ScanType::UrlScan => "URL scan",
        ScanType::TextScan => "Text scan",
        ScanType::ImageScan => "Image scan",
    };
    println!("\n{}", format!("=== {title} ===").bold());

    if let Some(input) = &report.input {
        println!("  {:<11} {}", "URL:".dimmed(), input);
    }
    if let Some(snippet) = &report.snippet {
        println!("  {:<11} {}", "Text:".dimmed(), snippet);
    }
    if let Some(text) = &report.extracted_text {
        let shown = if text.is_empty() {
            "(no text found)".to_string()
        } else {
            truncate_chars(text, 120)
        };
        println!("  {:<11} {}", "OCR text:".dimmed(), shown);
    }

    println!(
        "  {:<11} {}  ({:.1}% confidence)",
        "Result:".dimmed(),
        colorize_kind(report.result),
        report.confidence
    );
    if let Some(note) = &report.note {
        println!("  {:<11} {}", "Note:".dimmed(), note);
    }
    println!();
}

/// Display a labelled feature vector.
pub fn display_features(url: &str, features: &FeatureVector) {
    println!("\n{}", format!("=== Features for {url} ===").bold());
    for (i, (name, value)) in features.named().enumerate() {
        println!("  {:>2}. {:<22} {}", i + 1, name, format_value(value));
    }
    println!();
}

/// Display batch results, one line per URL, then a summary.
pub fn display_batch(items: &[BatchItem]) {
    println!(
        "\n{}",
        format!("=== Batch scan ({} URLs) ===", items.len()).bold()
    );
    println!();

    let mut threats = 0;
    let mut rejected = 0;
    for item in items {
        match &item.report {
            Ok(report) => {
                if report.result.is_threat() {
                    threats += 1;
                }
                println!(
                    "  {:<10} {:>5.1}%  {}",
                    colorize_kind(report.result),
                    report.confidence,
                    truncate_chars(&item.url, 80),
                );
            }
            Err(e) => {
                rejected += 1;
                println!("  {:<10} {:>6}  {} ({e})", "REJECTED".dimmed(), "", item.url);
            }
        }
    }

    println!();
    if threats > 0 {
        println!("  {} {} flagged as threats", "!!".red().bold(), threats);
    } else {
        println!("  {} no threats found", "ok".green());
    }
    if rejected > 0 {
        println!("  {} {} lines rejected", "~".yellow(), rejected);
    }
}

/// Display which collaborators are loaded.
pub fn display_status(status: &ScannerStatus) {
    println!("\n{}", "=== CyberShield status ===".bold());
    println!("  URL model:       {}", model_state(status.url_model));
    println!("  Text model:      {}", model_state(status.text_model));
    println!("  Domain age:      {}", on_off(status.domain_age));
    println!("  OCR:             {}", on_off(status.ocr));
    println!("  Trusted domains: {}", status.trusted_domains);
    println!();
}

pub fn colorize_kind(kind: VerdictKind) -> ColoredString {
    match kind {
        VerdictKind::Safe | VerdictKind::Ham => kind.as_str().green().bold(),
        VerdictKind::Phishing | VerdictKind::Spam => kind.as_str().red().bold(),
        VerdictKind::Unknown => kind.as_str().yellow(),
    }
}

fn model_state(state: Option<bool>) -> ColoredString {
    match state {
        Some(true) => "loaded (calibrated)".green(),
        Some(false) => "loaded (uncalibrated)".green(),
        None => "not loaded (degraded mode)".yellow(),
    }
}

fn on_off(enabled: bool) -> ColoredString {
    if enabled {
        "enabled".green()
    } else {
        "disabled".yellow()
    }
}

/// Integers print bare, fractions with four decimals.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

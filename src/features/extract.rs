// URL feature extraction for the statistical classifier.
//
// The field order here is the column order the URL model was trained on.
// Reordering, inserting, or removing a field silently breaks every deployed
// model, so FEATURE_NAMES is the single source of truth for the layout.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use super::url_parts::UrlParts;

/// Number of fields in a feature vector.
pub const FEATURE_COUNT: usize = 12;

/// Field names, in model column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "url_length",
    "host_length",
    "dot_count",
    "at_count",
    "slash_count",
    "host_hyphen_count",
    "host_entropy",
    "digit_ratio",
    "has_ipv4_literal",
    "suspicious_word_count",
    "risky_extension",
    "uses_shortener",
];

/// Words that show up disproportionately in credential-harvesting URLs.
pub const SUSPICIOUS_WORDS: [&str; 10] = [
    "login", "secure", "account", "update", "banking", "verify", "wallet", "confirm", "bonus",
    "free",
];

/// Path suffixes for executables and server-side scripts.
pub const RISKY_EXTENSIONS: [&str; 4] = [".exe", ".php", ".bat", ".cmd"];

/// Link shorteners that hide the real destination.
pub const SHORTENER_TOKENS: [&str; 5] = ["bit.ly", "goo.gl", "tinyurl", "ow.ly", "is.gd"];

/// Dotted quad with every octet in 0-255. The surrounding groups stop a
/// longer digit run from matching partially (`1.2.3.999` must not match
/// as `1.2.3.99`).
static IPV4_LITERAL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let octet = r"(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])";
    Regex::new(&format!(r"(?:^|[^0-9]){octet}\.{octet}\.{octet}\.{octet}(?:$|[^0-9])")).ok()
});

/// The 12-field numeric summary of a URL fed to the URL classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Single-precision copy for ONNX input tensors.
    pub fn to_f32(&self) -> [f32; FEATURE_COUNT] {
        self.values.map(|v| v as f32)
    }

    /// Look up a field by name. Returns None for unknown names.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    /// (name, value) pairs in model column order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

/// Compute the feature vector for a raw URL string.
///
/// Never fails: a URL that can't be decomposed still yields a full vector,
/// with the host-derived fields at zero.
pub fn extract(url: &str) -> FeatureVector {
    let parts = UrlParts::parse(url);
    let host = parts.host.as_str();
    let lower = url.to_lowercase();

    let url_length = url.chars().count();
    let digit_count = url.chars().filter(|c| c.is_ascii_digit()).count();
    let digit_ratio = if url_length > 0 {
        digit_count as f64 / url_length as f64
    } else {
        0.0
    };

    let suspicious = SUSPICIOUS_WORDS
        .iter()
        .filter(|word| lower.contains(*word))
        .count();

    let path = parts.path.to_lowercase();
    let risky_extension = RISKY_EXTENSIONS.iter().any(|ext| path.ends_with(ext));

    let uses_shortener = SHORTENER_TOKENS.iter().any(|token| host.contains(token));

    FeatureVector {
        values: [
            url_length as f64,
            host.chars().count() as f64,
            count_char(url, '.'),
            count_char(url, '@'),
            count_char(url, '/'),
            count_char(host, '-'),
            shannon_entropy(host),
            digit_ratio,
            flag(contains_ipv4_literal(url)),
            suspicious as f64,
            flag(risky_extension),
            flag(uses_shortener),
        ],
    }
}

/// Shannon entropy in bits over the byte values of `text`.
///
/// Random-looking hosts (`x7k2qpz9.top`) score high; dictionary words score
/// low. An empty string, or one repeated character, is exactly zero.
pub fn shannon_entropy(text: &str) -> f64 {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return 0.0;
    }

    let mut counts = [0usize; 256];
    for &b in bytes {
        counts[b as usize] += 1;
    }

    let len = bytes.len() as f64;
    let entropy: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum();

    // A single symbol gives -0.0; normalize so callers see a plain zero
    if entropy == 0.0 {
        0.0
    } else {
        entropy
    }
}

/// Whether `text` embeds a valid dotted-quad IPv4 address anywhere.
pub fn contains_ipv4_literal(text: &str) -> bool {
    IPV4_LITERAL
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

fn count_char(text: &str, target: char) -> f64 {
    text.chars().filter(|&c| c == target).count() as f64
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

// Keyword traps: cheap, high-precision checks that short-circuit the
// statistical stages.
//
// A trap is binary: one hit is enough, there is no weighting.

use serde::{Deserialize, Serialize};

/// Terms that mark a URL as a scam lure when they appear anywhere in it.
pub const SCAM_URL_KEYWORDS: &[&str] = &[
    "win", "winner", "lottery", "prize", "claim", "free", "offer", "urgent", "kyc", "reward",
    "gift", "jackpot", "cashback", "lucky",
];

/// Terms that mark a message as spam / smishing.
pub const SCAM_TEXT_TRIGGERS: &[&str] = &[
    "won",
    "lottery",
    "rupees",
    "lakh",
    "prize",
    "claim",
    "click here",
    "urgent",
    "expired",
    "blocked",
];

/// How a term has to line up with the haystack to count as a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Anywhere, including inside longer words (`freebies` hits `free`).
    Substring,
    /// Only where the term is not flanked by letters or digits
    /// (`won` hits "you WON!" but not "wonderful").
    WholeWord,
}

/// Immutable, lower-cased keyword list with a fixed match mode.
#[derive(Debug, Clone)]
pub struct KeywordList {
    terms: Vec<String>,
    mode: MatchMode,
}

impl KeywordList {
    pub fn new<S: AsRef<str>>(terms: &[S], mode: MatchMode) -> Self {
        let terms = terms
            .iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms, mode }
    }

    /// The URL scam-keyword trap.
    pub fn scam_url_keywords() -> Self {
        Self::new(SCAM_URL_KEYWORDS, MatchMode::Substring)
    }

    /// The text scam-trigger trap. Substring matching catches inflected
    /// forms like "lakhs", "prizes" and "claimable".
    pub fn scam_text_triggers() -> Self {
        Self::new(SCAM_TEXT_TRIGGERS, MatchMode::Substring)
    }

    /// All terms found in `haystack`, in list order.
    pub fn matches(&self, haystack: &str) -> Vec<&str> {
        let lower = haystack.to_lowercase();
        self.terms
            .iter()
            .filter(|term| self.term_hits(&lower, term))
            .map(String::as_str)
            .collect()
    }

    /// Whether any term appears in `haystack`.
    pub fn is_match(&self, haystack: &str) -> bool {
        let lower = haystack.to_lowercase();
        self.terms.iter().any(|term| self.term_hits(&lower, term))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    fn term_hits(&self, lower: &str, term: &str) -> bool {
        match self.mode {
            MatchMode::Substring => lower.contains(term),
            MatchMode::WholeWord => lower
                .match_indices(term)
                .any(|(start, _)| is_word_bounded(lower, start, start + term.len())),
        }
    }
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

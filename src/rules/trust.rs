// Domain trust list: known-safe brands checked before any scoring.
//
// Matching is by host, never by substring of the whole URL: a brand name in
// the path (`evil.example/google`) or a lookalike host (`evilgoogle.com`)
// must not inherit the brand's trust.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A trusted registrable domain and the brand name shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustEntry {
    pub domain: String,
    pub name: String,
}

impl TrustEntry {
    pub fn new(domain: &str, name: &str) -> Self {
        Self {
            domain: normalize_domain(domain),
            name: name.to_string(),
        }
    }
}

/// Built-in trust list: (domain, display name).
const BUILTIN_ENTRIES: &[(&str, &str)] = &[
    // Global tech
    ("google.com", "Google"),
    ("youtube.com", "YouTube"),
    ("facebook.com", "Facebook"),
    ("instagram.com", "Instagram"),
    ("whatsapp.com", "WhatsApp"),
    ("twitter.com", "Twitter"),
    ("x.com", "X"),
    ("linkedin.com", "LinkedIn"),
    ("github.com", "GitHub"),
    ("microsoft.com", "Microsoft"),
    ("apple.com", "Apple"),
    ("amazon.com", "Amazon"),
    ("amazon.in", "Amazon"),
    ("netflix.com", "Netflix"),
    ("spotify.com", "Spotify"),
    // Indian streaming & entertainment
    ("hotstar.com", "Hotstar"),
    ("jio.com", "Jio"),
    ("jiocinema.com", "JioCinema"),
    ("sonyliv.com", "SonyLIV"),
    ("zee5.com", "ZEE5"),
    ("mxplayer.in", "MX Player"),
    ("hungama.com", "Hungama"),
    ("gaana.com", "Gaana"),
    ("jiosaavn.com", "JioSaavn"),
    // Indian payments & banks
    ("paytm.com", "Paytm"),
    ("phonepe.com", "PhonePe"),
    ("pay.google.com", "Google Pay"),
    ("bhimupi.org.in", "BHIM"),
    ("npci.org.in", "NPCI"),
    ("razorpay.com", "Razorpay"),
    ("ccavenue.com", "CCAvenue"),
    ("billdesk.com", "BillDesk"),
    ("onlinesbi.sbi", "SBI"),
    ("sbi.co.in", "SBI"),
    ("hdfcbank.com", "HDFC Bank"),
    ("icicibank.com", "ICICI Bank"),
    ("axisbank.com", "Axis Bank"),
    ("kotak.com", "Kotak"),
    ("pnbindia.in", "PNB"),
    ("bankofbaroda.in", "Bank of Baroda"),
    ("canarabank.com", "Canara Bank"),
    ("indusind.com", "IndusInd Bank"),
    // Shopping & utilities
    ("flipkart.com", "Flipkart"),
    ("myntra.com", "Myntra"),
    ("meesho.com", "Meesho"),
    ("ajio.com", "AJIO"),
    ("tata.com", "Tata"),
    ("zomato.com", "Zomato"),
    ("swiggy.com", "Swiggy"),
    ("olacabs.com", "Ola"),
    ("uber.com", "Uber"),
    ("irctc.co.in", "IRCTC"),
    ("goindigo.in", "IndiGo"),
    ("airindia.com", "Air India"),
    ("makemytrip.com", "MakeMyTrip"),
];

/// Immutable set of trusted domains.
#[derive(Debug, Clone, Default)]
pub struct TrustList {
    entries: Vec<TrustEntry>,
}

impl TrustList {
    pub fn new(entries: Vec<TrustEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| TrustEntry {
                domain: normalize_domain(&e.domain),
                name: e.name,
            })
            .filter(|e| !e.domain.is_empty())
            .collect();
        Self { entries }
    }

    /// The trust list shipped with the binary.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_ENTRIES
                .iter()
                .map(|(domain, name)| TrustEntry::new(domain, name))
                .collect(),
        )
    }

    /// Load a trust list from a JSON array of `{"domain": ..., "name": ...}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trust list {}", path.display()))?;
        let entries: Vec<TrustEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse trust list {}", path.display()))?;
        Ok(Self::new(entries))
    }

    /// Find the entry covering `host`, preferring the most specific domain
    /// when several match (`pay.google.com` over `google.com`).
    pub fn lookup(&self, host: &str) -> Option<&TrustEntry> {
        let host = normalize_domain(host);
        if host.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|e| host_matches(&host, &e.domain))
            .max_by_key(|e| e.domain.len())
    }

    pub fn entries(&self) -> &[TrustEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True when `host` is `domain` or a subdomain of it on a label boundary.
pub fn host_matches(host: &str, domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    match host.strip_suffix(domain) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_matches('.').to_ascii_lowercase()
}

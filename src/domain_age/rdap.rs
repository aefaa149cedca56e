// RDAP domain-age oracle.
//
// RDAP is the JSON successor to WHOIS. `https://rdap.org` redirects each
// query to the authoritative registry, and the registry answers with a list
// of lifecycle events; the `registration` event carries the creation date.
//
// See RFC 9083 section 4.5 for the event list format.

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::traits::{DomainAge, DomainAgeOracle};
use crate::error::LookupError;

/// Default RDAP bootstrap endpoint.
pub const DEFAULT_RDAP_URL: &str = "https://rdap.org";

/// Second-level labels that sit under a country-code TLD and are not
/// themselves registrable (`example.co.in`, `example.gov.uk`).
const CC_SECOND_LEVELS: [&str; 8] = ["co", "com", "net", "org", "gov", "ac", "edu", "nic"];

/// Platforms that hand out subdomains to anyone. The platform's own
/// registration date says nothing about a tenant like `evil.github.io`.
const HOSTING_SUFFIXES: [&str; 22] = [
    "github.io",
    "gitlab.io",
    "netlify.app",
    "vercel.app",
    "pages.dev",
    "workers.dev",
    "web.app",
    "firebaseapp.com",
    "appspot.com",
    "herokuapp.com",
    "onrender.com",
    "fly.dev",
    "glitch.me",
    "repl.co",
    "surge.sh",
    "ngrok.io",
    "ngrok-free.app",
    "azurewebsites.net",
    "blogspot.com",
    "wordpress.com",
    "wixsite.com",
    "000webhostapp.com",
];

#[derive(Debug, Deserialize)]
struct RdapDomain {
    #[serde(default)]
    events: Vec<RdapEvent>,
}

#[derive(Debug, Deserialize)]
struct RdapEvent {
    #[serde(rename = "eventAction")]
    event_action: String,
    #[serde(rename = "eventDate")]
    event_date: String,
}

/// Domain-age lookups over RDAP.
pub struct RdapOracle {
    client: reqwest::Client,
    base_url: String,
}

impl RdapOracle {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("cybershield/0.1 (domain-age lookup)")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DomainAgeOracle for RdapOracle {
    async fn lookup(&self, domain: &str) -> Result<DomainAge, LookupError> {
        let Some(name) = registrable_domain(domain) else {
            debug!(domain, "No registrable domain, skipping RDAP lookup");
            return Ok(DomainAge::Unknown);
        };

        let url = format!("{}/domain/{}", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/rdap+json")
            .send()
            .await
            .map_err(|e| LookupError::Http(e.into()))?;

        // Unregistered domain or a TLD without RDAP service
        if response.status() == StatusCode::NOT_FOUND {
            debug!(domain = %name, "RDAP has no record");
            return Ok(DomainAge::Unknown);
        }

        if !response.status().is_success() {
            let status = response.status();
            return Err(LookupError::Http(anyhow::anyhow!(
                "RDAP returned {status} for {name}"
            )));
        }

        let body: RdapDomain = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        let age = match registration_date(&body)? {
            Some(created) => DomainAge::from_creation(created, Utc::now()),
            None => DomainAge::Unknown,
        };

        debug!(domain = %name, ?age, "RDAP lookup complete");
        Ok(age)
    }
}

/// The `registration` event date, if the registry published one.
fn registration_date(body: &RdapDomain) -> Result<Option<DateTime<Utc>>, LookupError> {
    let Some(event) = body
        .events
        .iter()
        .find(|e| e.event_action.eq_ignore_ascii_case("registration"))
    else {
        return Ok(None);
    };

    DateTime::parse_from_rfc3339(&event.event_date)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| LookupError::Parse(format!("bad eventDate {:?}: {e}", event.event_date)))
}

/// Reduce a host to the name a registry knows about.
///
/// `mail.google.com` -> `google.com`, `shop.example.co.in` -> `example.co.in`.
/// IP literals, single-label hosts and tenants of shared hosting platforms
/// have no registrable domain.
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return None;
    }

    if HOSTING_SUFFIXES
        .iter()
        .any(|suffix| host.strip_suffix(suffix).is_some_and(|rest| rest.ends_with('.')))
    {
        return None;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }

    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    let keep = if tld.len() == 2 && CC_SECOND_LEVELS.contains(&second) && labels.len() >= 3 {
        3
    } else {
        2
    };

    Some(labels[labels.len() - keep..].join("."))
}

// Domain-age oracle trait.
//
// Phishing domains are typically registered days before a campaign and
// abandoned weeks later, so a domain that has existed for months is strong
// evidence against a phishing verdict. Not knowing the age is normal (many
// registries hide it), which is why `Unknown` is a success value here and
// not an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::LookupError;

/// Domains older than this many days count as established.
pub const ESTABLISHED_AFTER_DAYS: i64 = 180;

/// Registration age of a domain, if the registry told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainAge {
    Known { days: i64 },
    Unknown,
}

impl DomainAge {
    /// Age in whole days between registration and `now`. Registration dates
    /// in the future (clock skew, bad data) count as zero days.
    pub fn from_creation(created: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        DomainAge::Known {
            days: (now - created).num_days().max(0),
        }
    }

    pub fn days(&self) -> Option<i64> {
        match self {
            DomainAge::Known { days } => Some(*days),
            DomainAge::Unknown => None,
        }
    }

    /// True only for a known age strictly above the threshold.
    pub fn is_established(&self) -> bool {
        matches!(self, DomainAge::Known { days } if *days > ESTABLISHED_AFTER_DAYS)
    }
}

/// Anything that can tell us how old a domain is.
#[async_trait]
pub trait DomainAgeOracle: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<DomainAge, LookupError>;
}

// Domain-age lookups: trait plus the RDAP-backed implementation.

pub mod rdap;
pub mod traits;

pub use traits::{DomainAge, DomainAgeOracle, ESTABLISHED_AFTER_DAYS};

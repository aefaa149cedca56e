// Static rule data: trust list and keyword traps.
//
// Built once at startup and handed to the pipelines by value; nothing here
// is mutated while requests are being handled.

pub mod keywords;
pub mod trust;

pub use keywords::{KeywordList, MatchMode};
pub use trust::{TrustEntry, TrustList};

//! URL handling module for Site-Sieve
//!
//! This module provides host extraction and the scope predicate that keeps the
//! crawl on a single site and away from static assets.

mod domain;
mod scope;

pub use domain::{extract_domain, host_key, pacing_key};
pub use scope::{ScopeFilter, BLOCKED_EXTENSIONS};

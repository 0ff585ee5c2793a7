//! Helpers for keeping personal data out of log lines.
//!
//! Mail addresses and message identifiers identify people; log output is
//! meant to be pasteable into bug reports, so these are masked or hashed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Masks the local part of an address, keeping its first character and the domain.
///
/// - `alice@example.com` → `a****@example.com`
/// - `not-an-address` → `****`
pub fn redact_address(address: &str) -> String {
    match address.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}****@{}", first, domain)
        }
        _ => "****".to_string(),
    }
}

/// Returns a short deterministic hash for correlating a value across log
/// lines without printing it.
pub fn short_hash(value: &str) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

//! Request fingerprinting
//!
//! A [`Fingerprint`] is the SHA-256 digest of a destination URL rendered as
//! lowercase hex. It is unseeded, so the same URL maps to the same key in every
//! process.

use sha2::{Digest, Sha256};
use std::fmt;

/// Hex length of a fingerprint (32 digest bytes)
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Cache key derived from a destination URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a destination URL
pub fn fingerprint(destination_url: &str) -> Fingerprint {
    let digest = Sha256::digest(destination_url.as_bytes());
    Fingerprint(hex::encode(digest))
}

/// Build the destination URL for an incoming path and query
///
/// An empty path is treated as `/`.
pub fn destination_url(origin_scheme: &str, origin_host: &str, path_and_query: &str) -> String {
    if path_and_query.is_empty() {
        format!("{}://{}/", origin_scheme, origin_host)
    } else {
        format!("{}://{}{}", origin_scheme, origin_host, path_and_query)
    }
}

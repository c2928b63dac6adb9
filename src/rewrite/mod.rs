//! Reference rewriting
//!
//! Replaces literal references to the origin with the public scheme/host in a
//! single leftmost, non-overlapping pass. At each position the first pair (in
//! the order below) that matches wins, and a consumed span is never rescanned:
//!
//! 1. `https://{origin_host}` -> `{public_scheme}://{public_host}`
//! 2. `http://{origin_host}`  -> `{public_scheme}://{public_host}`
//! 3. `{origin_host}`         -> `{public_host}`
//! 4. `https`                 -> `{public_scheme}`
//! 5. `http`                  -> `{public_scheme}`
//!
//! The pass works on bytes so any payload can be rewritten.

use regex::bytes::{Captures, Regex};

use crate::config::{Config, RewriteScope};

/// Transforms payload bytes before optimization
pub trait Rewriter: Send + Sync {
    fn rewrite(&self, payload: &[u8]) -> Vec<u8>;
}

/// Ordered literal replacement of origin references
#[derive(Debug, Clone)]
pub struct LiteralRewriter {
    matcher: Option<Regex>,
    replacements: Vec<Vec<u8>>,
}

impl LiteralRewriter {
    pub fn new(origin_host: &str, public_scheme: &str, public_host: &str) -> Self {
        let public_url = format!("{}://{}", public_scheme, public_host);
        let pairs = [
            (format!("https://{}", origin_host), public_url.clone()),
            (format!("http://{}", origin_host), public_url),
            (origin_host.to_string(), public_host.to_string()),
            ("https".to_string(), public_scheme.to_string()),
            ("http".to_string(), public_scheme.to_string()),
        ];

        // An empty needle would match between every byte
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .filter(|(needle, _)| !needle.is_empty())
            .collect();

        // Alternation is leftmost-first: at a given start the earliest group wins
        let pattern = pairs
            .iter()
            .map(|(needle, _)| format!("({})", regex::escape(needle)))
            .collect::<Vec<_>>()
            .join("|");

        let matcher = Regex::new(&pattern).ok();
        if matcher.is_none() {
            tracing::error!(pattern = %pattern, "Rewrite pattern failed to compile; rewriting disabled");
        }

        Self {
            matcher,
            replacements: pairs.into_iter().map(|(_, r)| r.into_bytes()).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.origin.host, &config.public.scheme, &config.public.host)
    }

    /// Convenience wrapper for UTF-8 text
    pub fn rewrite_str(&self, text: &str) -> String {
        String::from_utf8_lossy(&self.rewrite(text.as_bytes())).into_owned()
    }

    fn replacement_for(&self, caps: &Captures<'_>) -> &[u8] {
        (0..self.replacements.len())
            .find(|i| caps.get(i + 1).is_some())
            .map(|i| self.replacements[i].as_slice())
            .unwrap_or(&[])
    }
}

impl Rewriter for LiteralRewriter {
    fn rewrite(&self, payload: &[u8]) -> Vec<u8> {
        match &self.matcher {
            Some(matcher) => matcher
                .replace_all(payload, |caps: &Captures<'_>| self.replacement_for(caps).to_vec())
                .into_owned(),
            None => payload.to_vec(),
        }
    }
}

/// Rewrite with free-standing parameters
pub fn rewrite(
    text: &str,
    _origin_scheme: &str,
    origin_host: &str,
    public_scheme: &str,
    public_host: &str,
) -> String {
    LiteralRewriter::new(origin_host, public_scheme, public_host).rewrite_str(text)
}

/// Whether a payload with this content type is textual
///
/// Payloads without a content type are assumed to be text.
pub fn is_textual(content_type: &str) -> bool {
    let essence = media_type_essence(content_type);
    if essence.is_empty() {
        return true;
    }

    essence.starts_with("text/")
        || essence.ends_with("+xml")
        || essence.ends_with("+json")
        || matches!(
            essence.as_str(),
            "application/javascript"
                | "application/x-javascript"
                | "application/ecmascript"
                | "application/json"
                | "application/xml"
                | "application/xhtml+xml"
                | "application/manifest+json"
        )
}

/// Whether the rewriter applies to a payload of this content type
pub fn should_rewrite(scope: RewriteScope, content_type: &str) -> bool {
    match scope {
        RewriteScope::All => true,
        RewriteScope::Text => is_textual(content_type),
    }
}

/// Media type without parameters, lowercased (`Text/HTML; charset=x` -> `text/html`)
pub fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

// Shrinkray Library
// Caching reverse proxy that rewrites origin references and shrinks payloads

pub mod cache;
pub mod compression;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod metrics;
pub mod optimizer;
pub mod origin;
pub mod pipeline;
pub mod proxy;
pub mod request_coalescing;
pub mod rewrite;

/// Accept-Encoding header parsing
pub const GZIP_ENCODING: &str = "gzip";

/// A single encoding in an Accept-Encoding header with its quality value
#[derive(Debug, Clone, PartialEq)]
struct EncodingPreference {
    encoding: String,
    quality: f32,
}

impl EncodingPreference {
    /// Parse a single encoding preference (e.g., "gzip;q=0.8")
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let mut parts = s.split(';');
        let encoding = parts.next()?.trim().to_lowercase();

        let quality = parts
            .filter_map(|param| param.trim().strip_prefix("q="))
            .next()
            .map(|q| q.trim().parse::<f32>().unwrap_or(1.0))
            .unwrap_or(1.0);

        Some(EncodingPreference { encoding, quality })
    }
}

/// Whether the client accepts a gzip-encoded response
///
/// An explicit `gzip` entry decides; otherwise a `*` entry does. A quality of
/// 0 means "not acceptable".
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(accept_encoding) = accept_encoding else {
        return false;
    };

    let preferences: Vec<EncodingPreference> = accept_encoding
        .split(',')
        .filter_map(EncodingPreference::parse)
        .collect();

    let explicit = preferences
        .iter()
        .find(|pref| pref.encoding == GZIP_ENCODING || pref.encoding == "x-gzip");
    if let Some(pref) = explicit {
        return pref.quality > 0.0;
    }

    preferences
        .iter()
        .any(|pref| pref.encoding == "*" && pref.quality > 0.0)
}

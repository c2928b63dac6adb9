//! Text minification
//!
//! - HTML: `minify-html`
//! - SVG: a `quick-xml` pass that keeps the document well-formed XML
//! - CSS and JavaScript: `minifier`

use std::panic::{catch_unwind, AssertUnwindSafe};

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use super::error::OptimizeError;

/// Text formats with a dedicated minifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    Css,
    Html,
    JavaScript,
    Svg,
}

impl TextKind {
    /// Content type the dispatcher matches for this kind
    pub fn content_type(&self) -> &'static str {
        match self {
            TextKind::Css => "text/css",
            TextKind::Html => "text/html",
            TextKind::JavaScript => "text/javascript",
            TextKind::Svg => "image/svg+xml",
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "text/css" => Some(TextKind::Css),
            "text/html" => Some(TextKind::Html),
            "text/javascript" => Some(TextKind::JavaScript),
            "image/svg+xml" => Some(TextKind::Svg),
            _ => None,
        }
    }
}

/// Shrinks a text payload of a known kind
pub trait Minifier: Send + Sync {
    fn minify(&self, kind: TextKind, payload: &[u8]) -> Result<Vec<u8>, OptimizeError>;
}

/// Default minifier backed by `minify-html`, `quick-xml` and `minifier`
#[derive(Debug, Clone, Default)]
pub struct StandardMinifier;

impl StandardMinifier {
    fn html_config() -> minify_html::Cfg {
        let mut cfg = minify_html::Cfg::new();
        cfg.minify_css = true;
        cfg.minify_js = true;
        cfg
    }

    /// Drops comments and whitespace between elements.
    /// Tags and attributes are written back as they were read, quotes included.
    fn minify_svg(payload: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        let content_type = TextKind::Svg.content_type();
        let mut reader = Reader::from_reader(payload);
        reader.trim_text(true);
        let mut writer = Writer::new(Vec::with_capacity(payload.len()));
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(Event::Comment(_)) => {}
                Ok(event) => writer
                    .write_event(event)
                    .map_err(|e| OptimizeError::minify(content_type, e.to_string()))?,
                Err(e) => {
                    return Err(OptimizeError::minify(
                        content_type,
                        format!("invalid XML at byte {}: {}", reader.buffer_position(), e),
                    ))
                }
            }
            buf.clear();
        }

        Ok(writer.into_inner())
    }

    fn as_utf8(kind: TextKind, payload: &[u8]) -> Result<&str, OptimizeError> {
        std::str::from_utf8(payload).map_err(|_| OptimizeError::InvalidUtf8 {
            content_type: kind.content_type().to_string(),
        })
    }
}

impl Minifier for StandardMinifier {
    fn minify(&self, kind: TextKind, payload: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        let result = catch_unwind(AssertUnwindSafe(|| match kind {
            TextKind::Html => Ok(minify_html::minify(payload, &Self::html_config())),
            TextKind::Svg => Self::minify_svg(payload),
            TextKind::Css => {
                let text = Self::as_utf8(kind, payload)?;
                minifier::css::minify(text)
                    .map(|minified| minified.to_string().into_bytes())
                    .map_err(|e| OptimizeError::minify(kind.content_type(), e))
            }
            TextKind::JavaScript => {
                let text = Self::as_utf8(kind, payload)?;
                Ok(minifier::js::minify(text).to_string().into_bytes())
            }
        }));

        result.unwrap_or_else(|_| {
            Err(OptimizeError::Panicked {
                content_type: kind.content_type().to_string(),
            })
        })
    }
}

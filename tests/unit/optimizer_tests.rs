// Content optimizer unit tests

use bytes::Bytes;
use shrinkray::config::OptimizerConfig;
use shrinkray::optimizer::{ContentOptimizer, OptimizeError, Strategy, TextKind};

#[test]
fn test_unknown_types_return_identical_bytes() {
    let optimizer = ContentOptimizer::new(OptimizerConfig::default());
    let payload = Bytes::from_static(b"\x89PNG\r\n\x1a\n not really a png");

    for content_type in ["image/png", "application/pdf", "text/plain", "", "font/woff"] {
        let output = optimizer.optimize(content_type, payload.clone()).unwrap();
        assert_eq!(output, payload);
    }
}

#[test]
fn test_dispatch_table() {
    let optimizer = ContentOptimizer::new(OptimizerConfig::default());
    assert_eq!(optimizer.strategy_for("text/css"), Strategy::Minify(TextKind::Css));
    assert_eq!(optimizer.strategy_for("text/html"), Strategy::Minify(TextKind::Html));
    assert_eq!(
        optimizer.strategy_for("text/javascript"),
        Strategy::Minify(TextKind::JavaScript)
    );
    assert_eq!(optimizer.strategy_for("image/svg+xml"), Strategy::Minify(TextKind::Svg));
    assert_eq!(optimizer.strategy_for("image/jpeg"), Strategy::Recompress);
    assert_eq!(optimizer.strategy_for("application/javascript"), Strategy::Passthrough);
}

#[test]
fn test_css_shrinks() {
    let optimizer = ContentOptimizer::new(OptimizerConfig::default());
    let input = Bytes::from_static(b"a  {\n  color :  blue ;\n}\n\n\n/* c */\n");
    let output = optimizer.optimize("text/css", input.clone()).unwrap();
    assert!(output.len() < input.len());
}

#[test]
fn test_invalid_jpeg_is_an_error() {
    let optimizer = ContentOptimizer::new(OptimizerConfig::default());
    let result = optimizer.optimize("image/jpeg", Bytes::from_static(b"garbage"));
    assert!(matches!(result, Err(OptimizeError::DecodeFailed { .. })));
}

#[test]
fn test_svg_output_keeps_quoted_attributes() {
    let optimizer = ContentOptimizer::new(OptimizerConfig::default());
    let input = Bytes::from_static(
        b"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\">\n  <rect width=\"10\" height=\"10\" fill=\"red\"/>\n  <circle cx=\"5\" cy=\"5\" r=\"2\"></circle>\n</svg>\n",
    );
    let output = optimizer.optimize("image/svg+xml", input.clone()).unwrap();
    assert!(output.len() < input.len());

    let mut reader = quick_xml::Reader::from_reader(output.as_ref());
    let mut elements = Vec::new();
    loop {
        match reader.read_event().expect("minified SVG must stay well-formed") {
            quick_xml::events::Event::Eof => break,
            quick_xml::events::Event::Start(start) | quick_xml::events::Event::Empty(start) => {
                for attr in start.attributes() {
                    let attr = attr.expect("attribute values must stay quoted");
                    assert!(!attr.value.is_empty());
                }
                elements.push(String::from_utf8(start.name().as_ref().to_vec()).unwrap());
            }
            _ => {}
        }
    }
    assert_eq!(elements, vec!["svg", "rect", "circle"]);
}

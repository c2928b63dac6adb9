// Rewriter unit tests

use shrinkray::config::RewriteScope;
use shrinkray::rewrite::{rewrite, should_rewrite, LiteralRewriter, Rewriter};

#[test]
fn test_precedence_on_reference_input() {
    assert_eq!(
        rewrite(
            "https://monurl.com/x http monurl.com",
            "https",
            "monurl.com",
            "http",
            "manouvelleurl.com"
        ),
        "http://manouvelleurl.com/x http manouvelleurl.com"
    );
}

#[test]
fn test_rewritten_text_is_not_rescanned() {
    // The public host contains the origin host; it must not be replaced again
    let rewriter = LiteralRewriter::new("monurl.com", "https", "cdn.monurl.com");
    assert_eq!(
        rewriter.rewrite_str("https://monurl.com/a"),
        "https://cdn.monurl.com/a"
    );
}

#[test]
fn test_bare_scheme_tokens_are_replaced() {
    let rewriter = LiteralRewriter::new("monurl.com", "http", "manouvelleurl.com");
    assert_eq!(rewriter.rewrite_str("httpsx https"), "httpx http");
}

#[test]
fn test_binary_payload_rewrite_preserves_other_bytes() {
    let rewriter = LiteralRewriter::new("monurl.com", "http", "manouvelleurl.com");
    let mut payload = vec![0xff, 0x00];
    payload.extend_from_slice(b"monurl.com");
    payload.push(0xfe);

    let mut expected = vec![0xff, 0x00];
    expected.extend_from_slice(b"manouvelleurl.com");
    expected.push(0xfe);

    assert_eq!(rewriter.rewrite(&payload), expected);
}

#[test]
fn test_scope_selection() {
    assert!(should_rewrite(RewriteScope::Text, "text/html; charset=utf-8"));
    assert!(should_rewrite(RewriteScope::Text, "application/json"));
    assert!(should_rewrite(RewriteScope::Text, ""));
    assert!(!should_rewrite(RewriteScope::Text, "image/jpeg"));
    assert!(should_rewrite(RewriteScope::All, "image/jpeg"));
}

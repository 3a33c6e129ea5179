#![deny(clippy::pedantic)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
//! Inline-layer parser for GitHub-Flavored Markdown.
//!
//! This crate parses one *inline run* — the concatenated text content of a
//! block-level container, as produced by a block-layer parser — into a
//! concrete syntax tree covering emphasis, strong emphasis, code spans, the
//! four link shapes, images, autolinks, raw HTML, escapes, character
//! references, and line breaks, per the `CommonMark` 0.30 inline rules.
//!
//! The tree is lossless: every input byte appears under exactly one leaf,
//! and malformed markup never fails the parse — unmatched delimiters simply
//! degrade to plain text tokens.
//!
//! # Quick Start
//!
//! ```rust
//! use gfm_inline::{NodeKind, Options, parse_inline};
//!
//! let tree = parse_inline("some *emphatic* text", &Options::default()).unwrap();
//!
//! assert_eq!(tree.kind, NodeKind::Inline);
//! assert!(tree.children.iter().any(|n| n.kind == NodeKind::Emphasis));
//! ```
//!
//! Reference labels (`[label]`) are emitted structurally; resolving them
//! against a link-definition table is the caller's concern, so a lone
//! `[foo]` always parses as a `shortcut_link` carrying its label.

use tracing::instrument;

mod entities;
mod error;
pub(crate) mod grammar;
mod model;
#[cfg(test)]
mod proptests;

pub use error::Error;
pub use model::{ImageVariant, Node, NodeKind, Span};

/// Default cap on accepted input size.
pub const DEFAULT_MAX_INPUT_LEN: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Options {
    /// Whether offset 0 starts a block. Start-of-block counts as whitespace
    /// for emphasis flanking; pass `false` when handing over a run that
    /// continues preceding text.
    pub at_block_start: bool,
    /// Maximum accepted input length in bytes. Inputs beyond this fail with
    /// [`Error::InputTooLarge`]; everything below it parses.
    pub max_input_len: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            at_block_start: true,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

/// Parse one inline run into its syntax tree.
///
/// The returned node is the `inline` root spanning the whole input; its
/// descendants cover every byte. Non-ASCII characters are treated as opaque
/// word characters.
///
/// # Errors
/// Fails only when the input exceeds `options.max_input_len`. Malformed
/// markup is not an error; it degrades to plain text tokens.
#[instrument(skip(input), fields(len = input.len()))]
pub fn parse_inline(input: &str, options: &Options) -> Result<Node, Error> {
    if input.len() > options.max_input_len {
        return Err(Error::InputTooLarge {
            len: input.len(),
            limit: options.max_input_len,
        });
    }
    let state = grammar::ParserState::new(input, options.at_block_start);
    let events = grammar::inline_parser::run(input, &state)?;
    let children = grammar::resolve(events, &state);
    Ok(Node {
        kind: NodeKind::Inline,
        span: Span::new(0, input.len()),
        children,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn sexpr(input: &str) -> String {
        let tree = parse_inline(input, &Options::default()).expect("inline runs always parse");
        tree.to_sexpr(input)
    }

    #[rstest]
    // Code spans out-rank everything else.
    #[case("`foo`", r#"(inline (code_span (code_span_delimiter "`") "foo" (code_span_delimiter "`")))"#)]
    #[case("``foo``", r#"(inline (code_span (code_span_delimiter "``") "foo" (code_span_delimiter "``")))"#)]
    #[case("`*a*`", r#"(inline (code_span (code_span_delimiter "`") "*" "a" "*" (code_span_delimiter "`")))"#)]
    // Emphasis and strong emphasis.
    #[case("*foo*", r#"(inline (emphasis "*" "foo" "*"))"#)]
    #[case("**foo**", r#"(inline (strong_emphasis "*" "*" "foo" "*" "*"))"#)]
    #[case("***foo***", r#"(inline (emphasis "*" (strong_emphasis "*" "*" "foo" "*" "*") "*"))"#)]
    #[case("_foo_", r#"(inline (emphasis "_" "foo" "_"))"#)]
    // Intraword underscores are inert; intraword stars are not.
    #[case("_foo_bar", r#"(inline "_" "foo" "_" "bar")"#)]
    #[case("*foo_bar*", r#"(inline (emphasis "*" "foo" "_" "bar" "*"))"#)]
    #[case("foo*bar*", r#"(inline "foo" (emphasis "*" "bar" "*"))"#)]
    // Unmatched delimiters degrade to text.
    #[case("*foo", r#"(inline "*" "foo")"#)]
    #[case("foo*", r#"(inline "foo" "*")"#)]
    #[case("* foo *", r#"(inline "*" " " "foo" " " "*")"#)]
    // The four link shapes.
    #[case(
        "[foo](bar \"baz\")",
        r#"(inline (inline_link (link_text "[" "foo" "]") "(" (link_destination "bar") " " (link_title "\"baz\"") ")"))"#
    )]
    #[case("[foo](bar)", r#"(inline (inline_link (link_text "[" "foo" "]") "(" (link_destination "bar") ")"))"#)]
    #[case("[foo][bar]", r#"(inline (full_reference_link (link_text "[" "foo" "]") (link_label "[" "bar" "]")))"#)]
    #[case("[foo][]", r#"(inline (collapsed_reference_link (link_text "[" "foo" "]") "[" "]"))"#)]
    #[case("[foo]", r#"(inline (shortcut_link (link_text "[" "foo" "]")))"#)]
    // Images mirror links, tagged with the shape they were written in.
    #[case(
        "![alt](img.png)",
        r#"(inline (image:inline "!" (image_description "[" "alt" "]") "(" (link_destination "img.png") ")"))"#
    )]
    #[case("![alt]", r#"(inline (image:shortcut "!" (image_description "[" "alt" "]")))"#)]
    #[case(
        "![alt][ref]",
        r#"(inline (image:full_reference "!" (image_description "[" "alt" "]") (link_label "[" "ref" "]")))"#
    )]
    // Precedence: a link wins over the emphasis it contains; emphasis can
    // wrap a whole link.
    #[case(
        "*[foo](u)*",
        r#"(inline (emphasis "*" (inline_link (link_text "[" "foo" "]") "(" (link_destination "u") ")") "*"))"#
    )]
    #[case(
        "[*foo*](u)",
        r#"(inline (inline_link (link_text "[" (emphasis "*" "foo" "*") "]") "(" (link_destination "u") ")"))"#
    )]
    // Autolinks.
    #[case("<http://x>", r#"(inline (uri_autolink "<http://x>"))"#)]
    #[case("<user@example.com>", r#"(inline (email_autolink "<user@example.com>"))"#)]
    // Raw HTML.
    #[case("<div class=\"a\">", r#"(inline (html_tag "<div class=\"a\">"))"#)]
    #[case("<!-- note -->", r#"(inline (html_tag "<!-- note -->"))"#)]
    // Escapes and references.
    #[case("\\*foo\\*", r#"(inline (backslash_escape "\\*") "foo" (backslash_escape "\\*"))"#)]
    #[case("&amp;", r#"(inline (entity_reference "&amp;"))"#)]
    #[case("&#35;", r#"(inline (numeric_character_reference "&#35;"))"#)]
    #[case("&#x1F;", r#"(inline (numeric_character_reference "&#x1F;"))"#)]
    // Line breaks.
    #[case("a  \nb", r#"(inline "a" (hard_line_break "  \n") "b")"#)]
    #[case("a\\\nb", r#"(inline "a" (hard_line_break "\\\n") "b")"#)]
    #[case("a\nb", r#"(inline "a" (soft_line_break "\n") "b")"#)]
    fn test_scenarios(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sexpr(input), expected, "input: {input:?}");
    }

    #[rstest]
    // Nested emphasis needs either a different character or a strong
    // wrapper; same-character runs do not re-pair across a boundary.
    #[case("**a *b* c**")]
    #[case("*a **b** c*")]
    #[case("_a *b* c_")]
    fn test_nested_emphasis_shapes(#[case] input: &str) {
        let tree = parse_inline(input, &Options::default()).expect("inline runs always parse");
        let outer = &tree.children[0];
        assert!(matches!(
            outer.kind,
            NodeKind::Emphasis | NodeKind::StrongEmphasis
        ));
        assert!(
            outer
                .children
                .iter()
                .any(|n| matches!(n.kind, NodeKind::Emphasis | NodeKind::StrongEmphasis)),
            "expected an inner emphasis in {input:?}: {}",
            tree.to_sexpr(input)
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_link_may_not_contain_link() {
        let input = "[a [b](u) c](v)";
        let tree = parse_inline(input, &Options::default()).expect("inline runs always parse");
        // The inner link resolves; the outer brackets stay literal.
        let links: Vec<&Node> = tree.children.iter().filter(|n| n.kind.is_link()).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text(input), "[b](u)");
    }

    #[test]
    fn test_link_text_may_contain_image() {
        let input = "[a ![b](u) c](v)";
        let tree = parse_inline(input, &Options::default()).expect("inline runs always parse");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].kind, NodeKind::InlineLink);
        let text = &tree.children[0].children[0];
        assert_eq!(text.kind, NodeKind::LinkText);
        assert!(
            text.children
                .iter()
                .any(|n| matches!(n.kind, NodeKind::Image(_)))
        );
    }

    #[test]
    fn test_at_block_start_affects_flanking() {
        // At a block start the leading `_` can open. When the run continues
        // preceding text, offset 0 sits after a word character, which makes
        // the run right-flanking too and therefore inert for `_`.
        let fresh = parse_inline("_a_", &Options::default()).expect("parses");
        assert_eq!(fresh.children[0].kind, NodeKind::Emphasis);

        let continued = parse_inline(
            "_a_",
            &Options {
                at_block_start: false,
                ..Options::default()
            },
        )
        .expect("parses");
        assert_eq!(continued.children[0].kind, NodeKind::Punctuation);
    }

    #[test]
    fn test_input_limit() {
        let options = Options {
            max_input_len: 8,
            ..Options::default()
        };
        assert!(matches!(
            parse_inline("123456789", &options),
            Err(Error::InputTooLarge { len: 9, limit: 8 })
        ));
        assert!(parse_inline("12345678", &options).is_ok());
    }

    #[test]
    fn test_empty_input() {
        let tree = parse_inline("", &Options::default()).expect("parses");
        assert_eq!(tree.span, Span::new(0, 0));
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_serialized_tree_shape() {
        let input = "*a*";
        let tree = parse_inline(input, &Options::default()).expect("parses");
        let json = serde_json::to_value(&tree).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "inline",
                "start": 0,
                "end": 3,
                "children": [{
                    "kind": "emphasis",
                    "start": 0,
                    "end": 3,
                    "children": [
                        {"kind": "punctuation", "start": 0, "end": 1},
                        {"kind": "word", "start": 1, "end": 2},
                        {"kind": "punctuation", "start": 2, "end": 3},
                    ],
                }],
            })
        );
    }
}

//! Parser invariant tests using property-based testing.
//!
//! Organized by priority:
//! - P0: the parser never panics and never loses bytes
//! - P1: structural invariants (span nesting, non-nesting of links,
//!   delimiter symmetry)
//! - P2: serialization round-trips

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use crate::{Node, NodeKind, Options, parse_inline};

use super::generators::{any_inline_string, markup_soup};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        max_shrink_iters: 10000,
        .. ProptestConfig::default()
    })]

    // ====================================================================
    // P0: CRITICAL INVARIANTS
    // ====================================================================

    /// The parser must never panic, no matter how malformed the input.
    #[test]
    fn parser_never_panics(input in any_inline_string()) {
        let _ = parse_inline(&input, &Options::default());
    }

    /// Lossless cover: concatenating the text of all leaves reproduces the
    /// input byte for byte.
    #[test]
    fn leaves_cover_input(input in any_inline_string()) {
        let tree = parse_inline(&input, &Options::default()).expect("inline runs always parse");
        let mut rebuilt = String::new();
        for leaf in tree.leaves() {
            rebuilt.push_str(leaf.text(&input));
        }
        prop_assert_eq!(rebuilt, input);
    }

    // ====================================================================
    // P1: STRUCTURAL INVARIANTS
    // ====================================================================

    /// Children tile their parent exactly: contiguous, in order, first
    /// starting and last ending at the parent's boundaries.
    #[test]
    fn spans_nest_and_tile(input in any_inline_string()) {
        let tree = parse_inline(&input, &Options::default()).expect("inline runs always parse");
        prop_assert_eq!(tree.span.start, 0);
        prop_assert_eq!(tree.span.end, input.len());
        verify_tiling(&tree)?;
    }

    /// A link text never contains another link shape, at any depth.
    #[test]
    fn link_text_contains_no_link(input in markup_soup()) {
        let tree = parse_inline(&input, &Options::default()).expect("inline runs always parse");
        verify_no_link_under_link_text(&tree, false)?;
    }

    /// Code spans open and close with fences of equal length; emphasis
    /// delimiters match in character and count.
    #[test]
    fn delimiters_stay_balanced(input in markup_soup()) {
        let tree = parse_inline(&input, &Options::default()).expect("inline runs always parse");
        verify_delimiters(&tree, &input)?;
    }

    // ====================================================================
    // P2: SERIALIZATION
    // ====================================================================

    /// Serializing the tree back to source and reparsing yields the same
    /// tree.
    #[test]
    fn reparse_is_isomorphic(input in markup_soup()) {
        let options = Options::default();
        let tree = parse_inline(&input, &options).expect("inline runs always parse");
        let mut rebuilt = String::new();
        for leaf in tree.leaves() {
            rebuilt.push_str(leaf.text(&input));
        }
        let reparsed = parse_inline(&rebuilt, &options).expect("inline runs always parse");
        prop_assert_eq!(tree, reparsed);
    }
}

// ====================================================================
// Helpers
// ====================================================================

fn verify_tiling(node: &Node) -> Result<(), TestCaseError> {
    if node.children.is_empty() {
        return Ok(());
    }
    let mut cursor = node.span.start;
    for child in &node.children {
        prop_assert_eq!(
            child.span.start,
            cursor,
            "gap before {} in {}",
            child.kind.name(),
            node.kind.name()
        );
        prop_assert!(child.span.end >= child.span.start);
        cursor = child.span.end;
        verify_tiling(child)?;
    }
    prop_assert_eq!(cursor, node.span.end, "tail gap in {}", node.kind.name());
    Ok(())
}

fn verify_no_link_under_link_text(node: &Node, inside_text: bool) -> Result<(), TestCaseError> {
    if inside_text {
        prop_assert!(
            !node.kind.is_link(),
            "{} nested inside link text",
            node.kind.name()
        );
    }
    let inside_text = inside_text || node.kind == NodeKind::LinkText;
    for child in &node.children {
        verify_no_link_under_link_text(child, inside_text)?;
    }
    Ok(())
}

fn verify_delimiters(node: &Node, input: &str) -> Result<(), TestCaseError> {
    match node.kind {
        NodeKind::CodeSpan => {
            let open = node.children.first().expect("code span has delimiters");
            let close = node.children.last().expect("code span has delimiters");
            prop_assert_eq!(open.kind, NodeKind::CodeSpanDelimiter);
            prop_assert_eq!(close.kind, NodeKind::CodeSpanDelimiter);
            prop_assert_eq!(open.span.len(), close.span.len());
            prop_assert!(open.text(input).bytes().all(|b| b == b'`'));
        }
        NodeKind::Emphasis => {
            verify_emphasis_delimiters(node, input, 1)?;
        }
        NodeKind::StrongEmphasis => {
            verify_emphasis_delimiters(node, input, 2)?;
        }
        _ => {}
    }
    for child in &node.children {
        verify_delimiters(child, input)?;
    }
    Ok(())
}

fn verify_emphasis_delimiters(
    node: &Node,
    input: &str,
    width: usize,
) -> Result<(), TestCaseError> {
    prop_assert!(node.children.len() >= 2 * width + 1);
    let ch = node.children[0].text(input);
    prop_assert!(ch == "*" || ch == "_");
    for i in 0..width {
        prop_assert_eq!(node.children[i].text(input), ch);
        prop_assert_eq!(node.children[node.children.len() - 1 - i].text(input), ch);
    }
    Ok(())
}

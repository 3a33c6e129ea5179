//! Bracket resolution and the top-level event resolver.
//!
//! Walks the tokenizer's event stream left to right, expanding delimiter
//! runs into punctuation leaves and tracking `[`/`![` openers on a stack.
//! At each `]` the matching opener is popped and the input after the
//! bracket is scanned for a link suffix; the four link shapes are tried in
//! precedence order and the winning shape wraps the bracketed span.
//! A resolved link deactivates every enclosing link opener, so links never
//! nest; images stay active and may swallow links whole.

use std::collections::VecDeque;

use crate::model::{ImageVariant, Node, NodeKind, Span};

use super::emphasis::{Delimiter, process_emphasis};
use super::inline::{Event, SuffixShape, inline_parser};
use super::state::ParserState;

#[derive(Debug)]
struct Bracket {
    /// Index in the working item list of the `[` leaf.
    item_index: usize,
    image: bool,
    active: bool,
    /// Delimiter stack height when the bracket was opened; emphasis inside
    /// the bracketed span is resolved against this bottom.
    delims_len: usize,
}

/// Resolve a tokenized inline run into the root's child nodes.
pub(crate) fn resolve(events: Vec<Event>, state: &ParserState<'_>) -> Vec<Node> {
    let mut queue: VecDeque<Event> = events.into();
    let mut items: Vec<Node> = Vec::new();
    let mut delims: Vec<Delimiter> = Vec::new();
    let mut brackets: Vec<Bracket> = Vec::new();

    while let Some(event) = queue.pop_front() {
        match event {
            Event::Tree(node) => items.push(node),
            Event::Delimiter {
                span,
                ch,
                can_open,
                can_close,
            } => {
                let first_item = items.len();
                for offset in span.start..span.end {
                    items.push(Node::leaf(NodeKind::Punctuation, offset, offset + 1));
                }
                if can_open || can_close {
                    delims.push(Delimiter {
                        first_item,
                        count: span.len(),
                        orig_len: span.len(),
                        ch,
                        can_open,
                        can_close,
                        alive: true,
                    });
                }
            }
            Event::OpenBracket { span, image } => {
                if image {
                    items.push(Node::leaf(NodeKind::Punctuation, span.start, span.start + 1));
                }
                brackets.push(Bracket {
                    item_index: items.len(),
                    image,
                    active: true,
                    delims_len: delims.len(),
                });
                items.push(Node::leaf(NodeKind::Punctuation, span.end - 1, span.end));
            }
            Event::CloseBracket { span } => {
                close_bracket(
                    state,
                    span,
                    &mut queue,
                    &mut items,
                    &mut delims,
                    &mut brackets,
                );
            }
        }
    }

    process_emphasis(&mut items, &mut delims, 0);
    items
}

fn close_bracket(
    state: &ParserState<'_>,
    span: Span,
    queue: &mut VecDeque<Event>,
    items: &mut Vec<Node>,
    delims: &mut Vec<Delimiter>,
    brackets: &mut Vec<Bracket>,
) {
    let closer_leaf = Node::leaf(NodeKind::Punctuation, span.start, span.end);
    let Some(opener) = brackets.pop() else {
        items.push(closer_leaf);
        return;
    };
    if !opener.active {
        // A link already resolved inside an enclosing pair; the opener's
        // leaf stays behind as plain punctuation.
        items.push(closer_leaf);
        return;
    }

    let content_empty = items.len() == opener.item_index + 1;
    let base = span.end;
    let suffix = inline_parser::link_suffix_scan(&state.input[base..], state)
        .ok()
        .flatten()
        // A suffix that would split a span the tokenizer already committed
        // to (a code span, autolink, or HTML tag reaching past its end) is
        // void: those spans out-rank link structure.
        .filter(|suffix| boundary_is_clean(queue, base + suffix.len))
        // Reference and bare shapes need visible link text.
        .filter(|suffix| !content_empty || suffix.shape == SuffixShape::Inline);

    if content_empty && suffix.is_none() {
        items.push(closer_leaf);
        return;
    }

    let (shape, suffix_children) = match suffix {
        Some(mut suffix) => {
            let end = base + suffix.len;
            while queue.front().is_some_and(|event| event.span().end <= end) {
                queue.pop_front();
            }
            for child in &mut suffix.children {
                shift_spans(child, base);
            }
            (Some(suffix.shape), suffix.children)
        }
        None => (None, Vec::new()),
    };

    process_emphasis(items, delims, opener.delims_len);
    delims.truncate(opener.delims_len);

    let mut text_children: Vec<Node> = items.drain(opener.item_index..).collect();
    text_children.push(closer_leaf);

    let node = if opener.image {
        let bang = items
            .pop()
            .expect("image opener pushes a bang leaf before the bracket");
        let variant = match shape {
            None => ImageVariant::Shortcut,
            Some(SuffixShape::Inline) => ImageVariant::Inline,
            Some(SuffixShape::Collapsed) => ImageVariant::CollapsedReference,
            Some(SuffixShape::Full) => ImageVariant::FullReference,
        };
        tracing::debug!(start = bang.span.start, ?variant, "image");
        let mut children = vec![
            bang,
            Node::with_children(NodeKind::ImageDescription, text_children),
        ];
        children.extend(suffix_children);
        Node::with_children(NodeKind::Image(variant), children)
    } else {
        let kind = match shape {
            None => NodeKind::ShortcutLink,
            Some(SuffixShape::Inline) => NodeKind::InlineLink,
            Some(SuffixShape::Collapsed) => NodeKind::CollapsedReferenceLink,
            Some(SuffixShape::Full) => NodeKind::FullReferenceLink,
        };
        tracing::debug!(kind = kind.name(), "link");
        // Links may not contain links: every enclosing `[` stops matching.
        for bracket in brackets.iter_mut().filter(|bracket| !bracket.image) {
            bracket.active = false;
        }
        let mut children = vec![Node::with_children(NodeKind::LinkText, text_children)];
        children.extend(suffix_children);
        Node::with_children(kind, children)
    };
    items.push(node);
}

/// True when byte offset `end` lands on an event boundary in the pending
/// stream, i.e. consuming up to `end` would not split a committed span.
fn boundary_is_clean(queue: &VecDeque<Event>, end: usize) -> bool {
    for event in queue {
        let span = event.span();
        if span.end <= end {
            continue;
        }
        return span.start >= end;
    }
    true
}

fn shift_spans(node: &mut Node, base: usize) {
    node.span.start += base;
    node.span.end += base;
    for child in &mut node.children {
        shift_spans(child, base);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::model::NodeKind;

    use super::super::state::ParserState;
    use super::*;

    fn resolve_str(input: &str) -> Vec<Node> {
        let state = ParserState::new(input, true);
        let events = inline_parser::run(input, &state).expect("tokenizer is total");
        resolve(events, &state)
    }

    #[test]
    fn test_unmatched_brackets_degrade() {
        let nodes = resolve_str("a ] b [ c");
        assert!(nodes.iter().all(|n| !n.kind.is_link()));
    }

    #[test]
    fn test_shortcut_and_full_reference() {
        let nodes = resolve_str("[foo] [foo][bar]");
        let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::ShortcutLink,
                NodeKind::Whitespace,
                NodeKind::FullReferenceLink
            ]
        );
    }

    #[test]
    fn test_inner_link_wins_over_outer() {
        let input = "[a [b] c]";
        let nodes = resolve_str(input);
        let links: Vec<&Node> = nodes.iter().filter(|n| n.kind.is_link()).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text(input), "[b]");
    }

    #[test]
    fn test_empty_brackets_stay_literal() {
        let nodes = resolve_str("[]");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind, NodeKind::Punctuation);
    }

    #[test]
    fn test_empty_text_inline_link_is_allowed() {
        let nodes = resolve_str("[](u)");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::InlineLink);
    }

    #[test]
    fn test_image_may_contain_link() {
        let input = "![a [b](u)](v)";
        let nodes = resolve_str(input);
        assert_eq!(nodes.len(), 1);
        let NodeKind::Image(variant) = nodes[0].kind else {
            panic!("expected an image, got {:?}", nodes[0].kind);
        };
        assert_eq!(variant, crate::model::ImageVariant::Inline);
        let description = &nodes[0].children[1];
        assert_eq!(description.kind, NodeKind::ImageDescription);
        assert!(
            description
                .children
                .iter()
                .any(|n| n.kind == NodeKind::InlineLink)
        );
    }

    #[test]
    fn test_code_span_blocks_link_suffix() {
        // The destination would reach into a committed code span, so the
        // inline shape is void and the brackets fall back to a shortcut.
        let input = "[a](`b)`x";
        let nodes = resolve_str(input);
        assert_eq!(nodes[0].kind, NodeKind::ShortcutLink);
        assert!(nodes.iter().any(|n| n.kind == NodeKind::CodeSpan));
    }
}

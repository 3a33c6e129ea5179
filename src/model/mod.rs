use std::fmt::Write as _;

use serde::{
    Serialize,
    ser::{SerializeMap, Serializer},
};

/// A half-open byte range into the inline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Which of the four link shapes an image was written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVariant {
    Inline,
    FullReference,
    CollapsedReference,
    Shortcut,
}

/// The kind of a syntax tree node.
///
/// Interior kinds carry children that cover their span; token kinds are
/// leaves and own their bytes directly. `Image` is additionally tagged with
/// the link shape it was written in.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The root of a parsed inline run.
    Inline,
    Emphasis,
    StrongEmphasis,
    CodeSpan,
    CodeSpanDelimiter,
    LinkText,
    ImageDescription,
    ShortcutLink,
    CollapsedReferenceLink,
    FullReferenceLink,
    InlineLink,
    Image(ImageVariant),
    LinkLabel,
    LinkDestination,
    LinkTitle,
    UriAutolink,
    EmailAutolink,
    HtmlTag,
    BackslashEscape,
    EntityReference,
    NumericCharacterReference,
    HardLineBreak,
    // Token kinds: always leaves.
    Word,
    Digits,
    Whitespace,
    SoftLineBreak,
    Punctuation,
}

impl NodeKind {
    /// The stable external name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Inline => "inline",
            NodeKind::Emphasis => "emphasis",
            NodeKind::StrongEmphasis => "strong_emphasis",
            NodeKind::CodeSpan => "code_span",
            NodeKind::CodeSpanDelimiter => "code_span_delimiter",
            NodeKind::LinkText => "link_text",
            NodeKind::ImageDescription => "image_description",
            NodeKind::ShortcutLink => "shortcut_link",
            NodeKind::CollapsedReferenceLink => "collapsed_reference_link",
            NodeKind::FullReferenceLink => "full_reference_link",
            NodeKind::InlineLink => "inline_link",
            NodeKind::Image(_) => "image",
            NodeKind::LinkLabel => "link_label",
            NodeKind::LinkDestination => "link_destination",
            NodeKind::LinkTitle => "link_title",
            NodeKind::UriAutolink => "uri_autolink",
            NodeKind::EmailAutolink => "email_autolink",
            NodeKind::HtmlTag => "html_tag",
            NodeKind::BackslashEscape => "backslash_escape",
            NodeKind::EntityReference => "entity_reference",
            NodeKind::NumericCharacterReference => "numeric_character_reference",
            NodeKind::HardLineBreak => "hard_line_break",
            NodeKind::Word => "word",
            NodeKind::Digits => "digits",
            NodeKind::Whitespace => "whitespace",
            NodeKind::SoftLineBreak => "soft_line_break",
            NodeKind::Punctuation => "punctuation",
        }
    }

    /// Whether nodes of this kind are plain text tokens.
    #[must_use]
    pub const fn is_token(self) -> bool {
        matches!(
            self,
            NodeKind::Word
                | NodeKind::Digits
                | NodeKind::Whitespace
                | NodeKind::SoftLineBreak
                | NodeKind::Punctuation
        )
    }

    /// Whether nodes of this kind are one of the four link shapes.
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(
            self,
            NodeKind::ShortcutLink
                | NodeKind::CollapsedReferenceLink
                | NodeKind::FullReferenceLink
                | NodeKind::InlineLink
        )
    }
}

/// A node of the inline syntax tree.
///
/// The tree is a lossless cover of the input: concatenating the bytes of all
/// leaves (nodes without children) reproduces the inline run verbatim.
/// Interior node spans always equal the union of their children's spans.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<Node>,
}

impl Node {
    pub(crate) const fn leaf(kind: NodeKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
            children: Vec::new(),
        }
    }

    /// Wrap `children` in a new interior node, spanning from the first
    /// child's start to the last child's end.
    ///
    /// # Panics
    /// Panics if `children` is empty; interior nodes always have content.
    pub(crate) fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        let start = children
            .first()
            .expect("interior node must have children")
            .span
            .start;
        let end = children
            .last()
            .expect("interior node must have children")
            .span
            .end;
        Self {
            kind,
            span: Span::new(start, end),
            children,
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The source text this node covers.
    ///
    /// # Panics
    /// Panics if the span is out of bounds for `input`, which cannot happen
    /// for a tree parsed from `input`.
    #[must_use]
    pub fn text<'input>(&self, input: &'input str) -> &'input str {
        &input[self.span.start..self.span.end]
    }

    /// Collect the leaves of this subtree in source order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'tree>(&'tree self, out: &mut Vec<&'tree Node>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }

    /// Render the subtree as a compact S-expression, with token leaves
    /// shown as their quoted source text. Used by tests and debug output.
    #[must_use]
    pub fn to_sexpr(&self, input: &str) -> String {
        let mut out = String::new();
        self.write_sexpr(input, &mut out);
        out
    }

    fn write_sexpr(&self, input: &str, out: &mut String) {
        if self.kind.is_token() {
            let _ = write!(out, "{:?}", self.text(input));
            return;
        }
        let _ = write!(out, "({}", self.kind.name());
        if let NodeKind::Image(variant) = self.kind {
            let tag = match variant {
                ImageVariant::Inline => "inline",
                ImageVariant::FullReference => "full_reference",
                ImageVariant::CollapsedReference => "collapsed_reference",
                ImageVariant::Shortcut => "shortcut",
            };
            let _ = write!(out, ":{tag}");
        }
        if self.is_leaf() {
            let _ = write!(out, " {:?}", self.text(input));
        } else {
            for child in &self.children {
                out.push(' ');
                child.write_sexpr(input, out);
            }
        }
        out.push(')');
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", self.kind.name())?;
        if let NodeKind::Image(variant) = self.kind {
            map.serialize_entry("variant", &variant)?;
        }
        map.serialize_entry("start", &self.span.start)?;
        map.serialize_entry("end", &self.span.end)?;
        if !self.children.is_empty() {
            map.serialize_entry("children", &self.children)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_with_children_spans_union() {
        let node = Node::with_children(
            NodeKind::Emphasis,
            vec![
                Node::leaf(NodeKind::Punctuation, 0, 1),
                Node::leaf(NodeKind::Word, 1, 4),
                Node::leaf(NodeKind::Punctuation, 4, 5),
            ],
        );
        assert_eq!(node.span, Span::new(0, 5));
        assert_eq!(node.leaves().len(), 3);
    }

    #[test]
    fn test_sexpr_rendering() {
        let input = "*foo*";
        let node = Node::with_children(
            NodeKind::Inline,
            vec![Node::with_children(
                NodeKind::Emphasis,
                vec![
                    Node::leaf(NodeKind::Punctuation, 0, 1),
                    Node::leaf(NodeKind::Word, 1, 4),
                    Node::leaf(NodeKind::Punctuation, 4, 5),
                ],
            )],
        );
        assert_eq!(
            node.to_sexpr(input),
            r#"(inline (emphasis "*" "foo" "*"))"#
        );
    }

    #[test]
    fn test_serialize_shape() {
        let node = Node::leaf(NodeKind::Word, 0, 3);
        let json = serde_json::to_value(&node).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({"kind": "word", "start": 0, "end": 3})
        );
    }

    #[test]
    fn test_image_variant_serialized() {
        let node = Node {
            kind: NodeKind::Image(ImageVariant::Shortcut),
            span: Span::new(0, 6),
            children: vec![],
        };
        let json = serde_json::to_value(&node).expect("serializable");
        assert_eq!(json["variant"], "shortcut");
    }
}

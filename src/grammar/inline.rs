//! The tokenizer grammar.
//!
//! A single total pass over the inline run, producing a flat event stream.
//! PEG ordered choice encodes the precedence tiers: code spans, autolinks and
//! raw HTML are recognized as complete spans before emphasis delimiters or
//! brackets get a chance at the same offset, and a failed candidate (say, an
//! opening backtick run with no matching fence) backtracks so the bytes
//! degrade to plain token leaves.
//!
//! Emphasis delimiter runs and brackets are *not* resolved here; they are
//! emitted as events carrying flanking context and paired up by the
//! resolvers in `emphasis` and `link`.

use crate::model::{Node, NodeKind, Span};

use super::scanner;
use super::state::ParserState;

/// One tokenizer output.
#[derive(Debug)]
pub(crate) enum Event {
    /// A finished node: a structural span (code span, autolink, HTML tag,
    /// escape, reference, line break) or a plain token leaf.
    Tree(Node),
    /// A `*` or `_` delimiter run with its flanking capabilities.
    Delimiter {
        span: Span,
        ch: u8,
        can_open: bool,
        can_close: bool,
    },
    /// `[` or `![`; `span` covers the bang when present.
    OpenBracket { span: Span, image: bool },
    /// `]`.
    CloseBracket { span: Span },
}

impl Event {
    pub(crate) fn span(&self) -> Span {
        match self {
            Event::Tree(node) => node.span,
            Event::Delimiter { span, .. }
            | Event::OpenBracket { span, .. }
            | Event::CloseBracket { span } => *span,
        }
    }
}

/// Which link shape a parsed suffix selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SuffixShape {
    Inline,
    Collapsed,
    Full,
}

/// A parsed link/image suffix: the child nodes it contributes (spans
/// relative to the suffix start) and the bytes it consumes.
#[derive(Debug)]
pub(crate) struct Suffix {
    pub(crate) shape: SuffixShape,
    pub(crate) children: Vec<Node>,
    pub(crate) len: usize,
}

peg::parser! {
    pub(crate) grammar inline_parser(state: &ParserState<'_>) for str {

        /// Tokenize a whole inline run into a flat event stream. Total:
        /// every byte ends up in exactly one event.
        pub(crate) rule run() -> Vec<Event>
        = events:(event())* ![_] { events }

        rule event() -> Event
        = code_span()
        / autolink()
        / html_tag()
        / hard_line_break()
        / backslash_escape()
        / character_reference()
        / delimiter_run()
        / bracket()
        / soft_line_break()
        / whitespace_run()
        / digit_run()
        / word_run()
        / punctuation_char()

        // ------------------------------------------------------------------
        // Code spans
        // ------------------------------------------------------------------

        rule code_span() -> Event
        = start:position!() n:code_fence_open() content:code_span_content(n)
          close_start:position!() code_fence(n) end:position!()
        {
            tracing::debug!(start, end, fence = n, "code span");
            let mut children = Vec::with_capacity(content.len() + 2);
            children.push(Node::leaf(NodeKind::CodeSpanDelimiter, start, start + n));
            children.extend(content);
            children.push(Node::leaf(NodeKind::CodeSpanDelimiter, close_start, end));
            Event::Tree(Node::with_children(NodeKind::CodeSpan, children))
        }

        rule code_fence_open() -> usize
        = s:$("`"+) { s.len() }

        /// A backtick run of exactly `n` ticks. Runs are matched maximally,
        /// so a longer or shorter run fails here and the candidate
        /// backtracks.
        rule code_fence(n: usize)
        = s:$("`"+) {? if s.len() == n { Ok(()) } else { Err("code span fence") } }

        rule code_span_content(n: usize) -> Vec<Node>
        = parts:(code_span_token(n))* { parts.into_iter().flatten().collect() }

        /// Verbatim content: plain tokens, soft breaks, and backtick runs of
        /// the wrong length. No inline structure is recognized inside a code
        /// span.
        rule code_span_token(n: usize) -> Vec<Node>
        = start:position!() s:$("`"+)
          {?
              if s.len() == n {
                  return Err("code span content");
              }
              Ok((0..s.len())
                  .map(|i| Node::leaf(NodeKind::Punctuation, start + i, start + i + 1))
                  .collect())
          }
        / !"`" t:text_token() { vec![t] }

        // ------------------------------------------------------------------
        // Autolinks
        // ------------------------------------------------------------------

        rule autolink() -> Event = uri_autolink() / email_autolink()

        rule uri_autolink() -> Event
        = start:position!() "<" uri_scheme() ":" ([^ ' ' | '\t' | '\r' | '\n' | '<' | '>'])* ">" end:position!()
        {
            tracing::debug!(start, end, "uri autolink");
            Event::Tree(Node::leaf(NodeKind::UriAutolink, start, end))
        }

        // 2 to 32 characters, per CommonMark.
        rule uri_scheme()
        = ['a'..='z' | 'A'..='Z'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '+' | '.' | '-']*<1,31>

        rule email_autolink() -> Event
        = start:position!() "<" email_local() "@" email_domain_label() ++ "." ">" end:position!()
        {
            tracing::debug!(start, end, "email autolink");
            Event::Tree(Node::leaf(NodeKind::EmailAutolink, start, end))
        }

        rule email_local()
        = ['a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '!' | '#' | '$' | '%' | '&' | '\'' | '*'
            | '+' | '/' | '=' | '?' | '^' | '_' | '`' | '{' | '|' | '}' | '~' | '-']+

        /// One dot-separated domain label: alphanumeric with interior
        /// hyphens, at most 63 characters.
        rule email_domain_label()
        = label:$(['a'..='z' | 'A'..='Z' | '0'..='9'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '-']*)
          {?
              if label.len() > 63 || label.ends_with('-') {
                  return Err("autolink domain label");
              }
              Ok(())
          }

        // ------------------------------------------------------------------
        // Raw HTML
        // ------------------------------------------------------------------

        rule html_tag() -> Event
        = start:position!()
          (html_comment() / html_cdata() / html_declaration() / html_instruction()
            / html_closing_tag() / html_open_tag())
          end:position!()
        {
            tracing::debug!(start, end, "html tag");
            Event::Tree(Node::leaf(NodeKind::HtmlTag, start, end))
        }

        rule html_comment() = "<!--" (!"--" [_])* "-->"
        rule html_cdata() = "<![CDATA[" (!"]]>" [_])* "]]>"
        rule html_declaration() = "<!" ['a'..='z' | 'A'..='Z']+ (!">" [_])* ">"
        rule html_instruction() = "<?" (!"?>" [_])* "?>"
        rule html_closing_tag() = "</" html_tag_name() html_ws()? ">"
        rule html_open_tag() = "<" html_tag_name() html_attribute()* html_ws()? "/"? ">"

        rule html_tag_name() = ['a'..='z' | 'A'..='Z'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '-']*
        rule html_ws() = ([' ' | '\t']+ / eol())+
        rule html_attribute() = html_ws() html_attribute_name() html_attribute_value_spec()?
        rule html_attribute_name()
        = ['a'..='z' | 'A'..='Z' | '_' | ':']
          ['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' | ':' | '-']*
        rule html_attribute_value_spec() = html_ws()? "=" html_ws()? html_attribute_value()
        rule html_attribute_value()
        = "\"" [^ '"']* "\""
        / "'" [^ '\'']* "'"
        / [^ ' ' | '\t' | '\n' | '\r' | '"' | '\'' | '=' | '<' | '>' | '`']+

        // ------------------------------------------------------------------
        // Escapes, references, breaks
        // ------------------------------------------------------------------

        rule backslash_escape() -> Event
        = node:backslash_escape_node() { Event::Tree(node) }

        rule backslash_escape_node() -> Node
        = start:position!() "\\" [c if c.is_ascii_punctuation()] end:position!()
        { Node::leaf(NodeKind::BackslashEscape, start, end) }

        /// Backslash-newline, or two-or-more trailing spaces/tabs before a
        /// newline. The leaf covers the marker and the line ending.
        rule hard_line_break() -> Event
        = start:position!() ("\\" eol() / [' ' | '\t'] [' ' | '\t']+ eol()) end:position!()
        { Event::Tree(Node::leaf(NodeKind::HardLineBreak, start, end)) }

        rule character_reference() -> Event
        = numeric_character_reference() / entity_reference()

        rule numeric_character_reference() -> Event
        = start:position!()
          "&#" (['x' | 'X'] ['0'..='9' | 'a'..='f' | 'A'..='F']*<1,6> / ['0'..='9']*<1,7>) ";"
          end:position!()
        { Event::Tree(Node::leaf(NodeKind::NumericCharacterReference, start, end)) }

        rule entity_reference() -> Event
        = start:position!() "&" name:$(['a'..='z' | 'A'..='Z' | '0'..='9']+) ";" end:position!()
        {?
            if scanner::entity_expansion(name).is_none() {
                return Err("HTML5 entity");
            }
            Ok(Event::Tree(Node::leaf(NodeKind::EntityReference, start, end)))
        }

        // ------------------------------------------------------------------
        // Delimiters and brackets
        // ------------------------------------------------------------------

        rule delimiter_run() -> Event
        = start:position!() run:$("*"+ / "_"+) end:position!()
        {
            let ch = run.as_bytes()[0];
            let (can_open, can_close) =
                scanner::delimiter_caps(ch, state.class_before(start), state.class_after(end));
            Event::Delimiter { span: Span::new(start, end), ch, can_open, can_close }
        }

        rule bracket() -> Event
        = start:position!() "![" end:position!()
          { Event::OpenBracket { span: Span::new(start, end), image: true } }
        / start:position!() "[" end:position!()
          { Event::OpenBracket { span: Span::new(start, end), image: false } }
        / start:position!() "]" end:position!()
          { Event::CloseBracket { span: Span::new(start, end) } }

        // ------------------------------------------------------------------
        // Plain tokens
        // ------------------------------------------------------------------

        rule soft_line_break() -> Event = t:soft_line_break_token() { Event::Tree(t) }
        rule whitespace_run() -> Event = t:whitespace_token() { Event::Tree(t) }
        rule digit_run() -> Event = t:digits_token() { Event::Tree(t) }
        rule word_run() -> Event = t:word_token() { Event::Tree(t) }
        rule punctuation_char() -> Event = t:punctuation_token() { Event::Tree(t) }

        rule text_token() -> Node
        = soft_line_break_token()
        / whitespace_token()
        / digits_token()
        / word_token()
        / punctuation_token()

        rule soft_line_break_token() -> Node
        = start:position!() eol() end:position!()
        { Node::leaf(NodeKind::SoftLineBreak, start, end) }

        rule whitespace_token() -> Node
        = start:position!() [' ' | '\t']+ end:position!()
        { Node::leaf(NodeKind::Whitespace, start, end) }

        rule digits_token() -> Node
        = start:position!() ['0'..='9']+ end:position!()
        { Node::leaf(NodeKind::Digits, start, end) }

        rule word_token() -> Node
        = start:position!() [c if scanner::is_word_char(c)]+ end:position!()
        { Node::leaf(NodeKind::Word, start, end) }

        rule punctuation_token() -> Node
        = start:position!() [c if c.is_ascii_punctuation()] end:position!()
        { Node::leaf(NodeKind::Punctuation, start, end) }

        rule eol() = "\r\n" / "\n" / "\r"

        // ------------------------------------------------------------------
        // Link/image suffixes
        //
        // Invoked by the bracket resolver on the input remaining after a
        // `]`, with positions relative to that point. Ordered choice
        // reproduces the shape precedence: an inline suffix or an explicit
        // reference out-ranks the bare shortcut reading.
        // ------------------------------------------------------------------

        pub(crate) rule link_suffix_scan() -> Option<Suffix>
        = suffix:link_suffix() [_]* { Some(suffix) }
        / [_]* { None }

        rule link_suffix() -> Suffix
        = inline_link_suffix() / collapsed_reference_suffix() / full_reference_suffix()

        rule inline_link_suffix() -> Suffix
        = start:position!() "(" a:link_ws() dest:link_destination()? b:link_ws()
          title:link_title()? c:link_ws() close:position!() ")" end:position!()
        {?
            // A title must be separated from a destination by whitespace.
            if dest.is_some() && title.is_some() && b.is_empty() {
                return Err("whitespace before link title");
            }
            let mut children = vec![Node::leaf(NodeKind::Punctuation, start, start + 1)];
            children.extend(a);
            children.extend(dest);
            children.extend(b);
            children.extend(title);
            children.extend(c);
            children.push(Node::leaf(NodeKind::Punctuation, close, end));
            Ok(Suffix { shape: SuffixShape::Inline, children, len: end })
        }

        rule collapsed_reference_suffix() -> Suffix
        = start:position!() "[" mid:position!() "]" end:position!()
        {
            Suffix {
                shape: SuffixShape::Collapsed,
                children: vec![
                    Node::leaf(NodeKind::Punctuation, start, mid),
                    Node::leaf(NodeKind::Punctuation, mid, end),
                ],
                len: end,
            }
        }

        rule full_reference_suffix() -> Suffix
        = start:position!() "[" content:(link_label_token()*) close:position!() "]" end:position!()
        {?
            if close - start - 1 > 999 {
                return Err("link label too long");
            }
            if !content
                .iter()
                .any(|t| !matches!(t.kind, NodeKind::Whitespace | NodeKind::SoftLineBreak))
            {
                return Err("link label content");
            }
            let mut label = vec![Node::leaf(NodeKind::Punctuation, start, start + 1)];
            label.extend(content);
            label.push(Node::leaf(NodeKind::Punctuation, close, end));
            Ok(Suffix {
                shape: SuffixShape::Full,
                children: vec![Node::with_children(NodeKind::LinkLabel, label)],
                len: end,
            })
        }

        rule link_label_token() -> Node
        = backslash_escape_node()
        / soft_line_break_token()
        / whitespace_token()
        / digits_token()
        / word_token()
        / start:position!() [c if c.is_ascii_punctuation() && c != '[' && c != ']'] end:position!()
          { Node::leaf(NodeKind::Punctuation, start, end) }

        /// Whitespace allowed inside an inline suffix: space/tab runs and
        /// soft line breaks, but never a blank line.
        rule link_ws() -> Vec<Node>
        = parts:(link_ws_part())* { parts }

        rule link_ws_part() -> Node
        = whitespace_token()
        / t:soft_line_break_token() !([' ' | '\t']* eol()) { t }

        rule link_destination() -> Node
        = start:position!() "<" (link_dest_escape() / [^ '<' | '>' | '\n' | '\r'])* ">" end:position!()
          { Node::leaf(NodeKind::LinkDestination, start, end) }
        / !"<" start:position!() link_dest_part()+ end:position!()
          { Node::leaf(NodeKind::LinkDestination, start, end) }

        rule link_dest_escape() = "\\" [c if c.is_ascii_punctuation()]

        rule link_dest_part()
        = link_dest_escape()
        / "(" link_dest_part()* ")"
        / [^ ' ' | '\t' | '(' | ')' | '\u{0}'..='\u{1f}' | '\u{7f}']

        rule link_title() -> Node
        = start:position!() "\"" link_title_char('"')* "\"" end:position!()
          { Node::leaf(NodeKind::LinkTitle, start, end) }
        / start:position!() "'" link_title_char('\'')* "'" end:position!()
          { Node::leaf(NodeKind::LinkTitle, start, end) }
        / start:position!() "(" link_title_char(')')* ")" end:position!()
          { Node::leaf(NodeKind::LinkTitle, start, end) }

        /// One title content item. A soft break is fine; a blank line kills
        /// the candidate. Parenthesized titles admit no unescaped paren of
        /// either kind.
        rule link_title_char(closer: char)
        = "\\" [c if c.is_ascii_punctuation()]
        / eol() !([' ' | '\t']* eol())
        / [c if c != closer && c != '\n' && c != '\r' && !(closer == ')' && c == '(')]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn events(input: &str) -> Vec<Event> {
        let state = ParserState::new(input, true);
        inline_parser::run(input, &state).expect("tokenizer is total")
    }

    fn kinds(input: &str) -> Vec<String> {
        events(input)
            .iter()
            .map(|event| match event {
                Event::Tree(node) => node.kind.name().to_string(),
                Event::Delimiter { ch, .. } => format!("delim({})", *ch as char),
                Event::OpenBracket { image: true, .. } => "![".to_string(),
                Event::OpenBracket { image: false, .. } => "[".to_string(),
                Event::CloseBracket { .. } => "]".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_events_cover_input() {
        for input in [
            "",
            "plain words",
            "`code` and *stars*",
            "a [link](dest \"title\") b",
            "<http://example.com> <a@b.cc> <div class=\"x\">",
            "digits 123 mix \\* &amp; &#35; end  \nnext",
        ] {
            let mut pos = 0;
            for event in events(input) {
                assert_eq!(event.span().start, pos, "gap in {input:?}");
                pos = event.span().end;
            }
            assert_eq!(pos, input.len(), "tail gap in {input:?}");
        }
    }

    #[test]
    fn test_code_span_tokenization() {
        assert_eq!(kinds("`foo`"), ["code_span"]);
        // No closing fence of the same length: backticks degrade and the
        // shorter inner span wins from the next offset.
        assert_eq!(kinds("``x`"), ["punctuation", "code_span"]);
        // A double-backtick run inside a single-fence span is content; the
        // span runs to the exact-length closer.
        assert_eq!(kinds("`a``b`"), ["code_span"]);
    }

    #[test]
    fn test_code_span_swallows_markup() {
        let input = "`*a*`";
        let events = events(input);
        assert_eq!(events.len(), 1);
        let Event::Tree(node) = &events[0] else {
            panic!("expected a tree event");
        };
        assert_eq!(node.kind, NodeKind::CodeSpan);
        let contents: Vec<&str> = node.children.iter().map(|c| c.text(input)).collect();
        assert_eq!(contents, ["`", "*", "a", "*", "`"]);
    }

    #[test]
    fn test_autolinks() {
        assert_eq!(kinds("<http://x>"), ["uri_autolink"]);
        assert_eq!(kinds("<mailto:a@b.c>"), ["uri_autolink"]);
        assert_eq!(kinds("<a@b.example.com>"), ["email_autolink"]);
        // Scheme too short, no colon: falls through to an HTML open tag.
        assert_eq!(kinds("<em>"), ["html_tag"]);
        // Not an autolink, not a tag: plain punctuation.
        assert_eq!(
            kinds("<1:x>"),
            ["punctuation", "digits", "punctuation", "word", "punctuation"]
        );
    }

    #[test]
    fn test_scheme_length_cap() {
        let long = format!("<{}:x>", "a".repeat(33));
        assert!(!kinds(&long).contains(&"uri_autolink".to_string()));
        let max = format!("<{}:x>", "a".repeat(32));
        assert_eq!(kinds(&max), ["uri_autolink"]);
    }

    #[test]
    fn test_html_forms() {
        assert_eq!(kinds("<div class=\"a\" id=x>"), ["html_tag"]);
        assert_eq!(kinds("</div>"), ["html_tag"]);
        assert_eq!(kinds("<!-- note -->"), ["html_tag"]);
        assert_eq!(kinds("<?php echo ?>"), ["html_tag"]);
        assert_eq!(kinds("<!DOCTYPE html>"), ["html_tag"]);
        assert_eq!(kinds("<![CDATA[x]]>"), ["html_tag"]);
        // Double hyphen inside a comment kills the candidate.
        assert!(!kinds("<!-- a -- b -->").contains(&"html_tag".to_string()));
    }

    #[test]
    fn test_references_and_escapes() {
        assert_eq!(kinds("&amp;"), ["entity_reference"]);
        assert_eq!(kinds("&#123;"), ["numeric_character_reference"]);
        assert_eq!(kinds("&#xAB;"), ["numeric_character_reference"]);
        assert_eq!(
            kinds("&bogus;"),
            ["punctuation", "word", "punctuation"]
        );
        assert_eq!(kinds("\\*"), ["backslash_escape"]);
        assert_eq!(kinds("\\a"), ["punctuation", "word"]);
    }

    #[test]
    fn test_breaks() {
        assert_eq!(kinds("a\nb"), ["word", "soft_line_break", "word"]);
        assert_eq!(kinds("a  \nb"), ["word", "hard_line_break", "word"]);
        assert_eq!(kinds("a\\\nb"), ["word", "hard_line_break", "word"]);
        assert_eq!(kinds("a \nb"), ["word", "whitespace", "soft_line_break", "word"]);
    }

    #[test]
    fn test_delimiter_events() {
        assert_eq!(
            kinds("*a* _b_ ![c]"),
            [
                "delim(*)",
                "word",
                "delim(*)",
                "whitespace",
                "delim(_)",
                "word",
                "delim(_)",
                "whitespace",
                "![",
                "word",
                "]"
            ]
        );
    }

    #[test]
    fn test_intraword_underscore_is_inert() {
        let input = "foo_bar_";
        let flags: Vec<(bool, bool)> = events(input)
            .iter()
            .filter_map(|event| match event {
                Event::Delimiter { can_open, can_close, .. } => Some((*can_open, *can_close)),
                _ => None,
            })
            .collect();
        assert_eq!(flags, [(false, false), (false, true)]);
    }

    #[test]
    fn test_suffix_scan_inline() {
        let state = ParserState::new("", true);
        let suffix = inline_parser::link_suffix_scan("(dest \"title\") tail", &state)
            .expect("scan is total")
            .expect("suffix expected");
        assert_eq!(suffix.shape, SuffixShape::Inline);
        assert_eq!(suffix.len, 14);
        let kinds: Vec<&str> = suffix.children.iter().map(|c| c.kind.name()).collect();
        assert_eq!(
            kinds,
            ["punctuation", "link_destination", "whitespace", "link_title", "punctuation"]
        );
    }

    #[test]
    fn test_suffix_scan_reference_forms() {
        let state = ParserState::new("", true);
        let collapsed = inline_parser::link_suffix_scan("[]", &state)
            .expect("scan is total")
            .expect("suffix expected");
        assert_eq!(collapsed.shape, SuffixShape::Collapsed);

        let full = inline_parser::link_suffix_scan("[bar] x", &state)
            .expect("scan is total")
            .expect("suffix expected");
        assert_eq!(full.shape, SuffixShape::Full);
        assert_eq!(full.len, 5);

        // Whitespace-only labels are not references.
        let blank = inline_parser::link_suffix_scan("[ ]", &state).expect("scan is total");
        assert!(blank.is_none());

        let none = inline_parser::link_suffix_scan(" (x)", &state).expect("scan is total");
        assert!(none.is_none());
    }

    #[test]
    fn test_suffix_title_rejects_blank_line() {
        let state = ParserState::new("", true);
        let broken = inline_parser::link_suffix_scan("(d \"a\n\nb\")", &state)
            .expect("scan is total");
        assert!(broken.is_none());

        let fine = inline_parser::link_suffix_scan("(d \"a\nb\")", &state)
            .expect("scan is total");
        assert!(fine.is_some());
    }

    #[test]
    fn test_suffix_destination_flavors() {
        let state = ParserState::new("", true);
        for (input, expected_len) in [
            ("(<a b>)", 7),       // angle-bracketed destinations may hold spaces
            ("(a(b)c)", 7),       // balanced parentheses nest
            ("(\\))", 4),         // escaped paren
            ("()", 2),            // empty is fine
        ] {
            let suffix = inline_parser::link_suffix_scan(input, &state)
                .expect("scan is total")
                .unwrap_or_else(|| panic!("suffix expected for {input:?}"));
            assert_eq!(suffix.len, expected_len, "{input:?}");
        }
        // An unbalanced close paren ends the destination; the suffix stops
        // there and the rest stays ordinary input.
        let unbalanced = inline_parser::link_suffix_scan("(a))x", &state).expect("scan is total");
        assert_eq!(unbalanced.map(|s| s.len), Some(3));
    }
}

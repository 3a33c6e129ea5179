//! Emphasis resolution: the `CommonMark` delimiter-stack algorithm.
//!
//! Delimiter runs arrive from the tokenizer with their flanking
//! capabilities already computed; this pass pairs closers with openers,
//! preferring strong (two-character) pairs, truncating runs in place so a
//! `***` run can participate in both a strong and a regular emphasis.

use crate::model::{Node, NodeKind};

/// One `*`/`_` run awaiting resolution.
///
/// `first_item` and `count` locate the run's single-character punctuation
/// leaves in the working item list. `orig_len` is the run length as scanned;
/// the "multiple of 3" rule consults it even after truncation.
#[derive(Debug)]
pub(crate) struct Delimiter {
    pub(crate) first_item: usize,
    pub(crate) count: usize,
    pub(crate) orig_len: usize,
    pub(crate) ch: u8,
    pub(crate) can_open: bool,
    pub(crate) can_close: bool,
    pub(crate) alive: bool,
}

/// Pair up delimiters in `delims[bottom..]`, wrapping matched spans of
/// `items` in `emphasis`/`strong_emphasis` nodes. Unmatched runs simply
/// stay behind as punctuation leaves.
pub(crate) fn process_emphasis(items: &mut Vec<Node>, delims: &mut [Delimiter], bottom: usize) {
    // One cut-off per (char, closer length mod 3, closer can-open) bucket:
    // once a search for an opener below some index fails, later closers of
    // the same bucket never rescan that part of the stack. Prevents
    // quadratic behavior on runs like `*a**b**c*...`.
    let mut openers_bottom = [bottom; 7];

    let mut closer = bottom;
    while closer < delims.len() {
        if !(delims[closer].alive && delims[closer].can_close) {
            closer += 1;
            continue;
        }

        let bucket = bucket_of(&delims[closer]);
        let floor = openers_bottom[bucket].max(bottom);
        let mut opener = None;
        let mut mod_three_rule_invoked = false;
        let mut idx = closer;
        while idx > floor {
            idx -= 1;
            let candidate = &delims[idx];
            if !candidate.alive || !candidate.can_open || candidate.ch != delims[closer].ch {
                continue;
            }
            // Rules 9/10: when either delimiter of the pair could serve both
            // roles, a combined length that is a multiple of 3 disqualifies
            // the pair, unless both lengths are themselves multiples of 3.
            let odd_match = (delims[closer].can_open || candidate.can_close)
                && (candidate.orig_len + delims[closer].orig_len) % 3 == 0
                && !(candidate.orig_len % 3 == 0 && delims[closer].orig_len % 3 == 0);
            if odd_match {
                mod_three_rule_invoked = true;
            } else {
                opener = Some(idx);
                break;
            }
        }

        if let Some(opener) = opener {
            insert_emphasis(items, delims, opener, closer);
            if delims[closer].count == 0 {
                closer += 1;
            }
            // Otherwise the truncated closer goes around again.
        } else {
            if !mod_three_rule_invoked {
                openers_bottom[bucket] = closer;
            }
            if !delims[closer].can_open {
                delims[closer].alive = false;
            }
            closer += 1;
        }
    }
}

fn bucket_of(delim: &Delimiter) -> usize {
    if delim.ch == b'_' {
        0
    } else {
        1 + usize::from(delim.can_open) * 3 + delim.orig_len % 3
    }
}

/// Wrap the span between `opener` and `closer` in an emphasis node, taking
/// two delimiter characters from each side when both runs still have them.
fn insert_emphasis(items: &mut Vec<Node>, delims: &mut [Delimiter], opener: usize, closer: usize) {
    let use_delims = if delims[opener].count >= 2 && delims[closer].count >= 2 {
        2
    } else {
        1
    };

    // Opener characters come off the tail of its run, closer characters off
    // the head, so leftovers stay adjacent to the new node.
    let take_start = delims[opener].first_item + delims[opener].count - use_delims;
    let take_end = delims[closer].first_item + use_delims;
    let children: Vec<Node> = items.drain(take_start..take_end).collect();
    let kind = if use_delims == 2 {
        NodeKind::StrongEmphasis
    } else {
        NodeKind::Emphasis
    };
    tracing::trace!(opener, closer, use_delims, "emphasis pair");
    items.insert(take_start, Node::with_children(kind, children));
    let delta = take_end - take_start - 1;

    delims[opener].count -= use_delims;
    if delims[opener].count == 0 {
        delims[opener].alive = false;
    }
    delims[closer].count -= use_delims;
    delims[closer].first_item = take_start + 1;
    if delims[closer].count == 0 {
        delims[closer].alive = false;
    }
    // Anything between the pair can no longer match outward.
    for delim in &mut delims[opener + 1..closer] {
        delim.alive = false;
    }
    for delim in &mut delims[closer + 1..] {
        delim.first_item -= delta;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::model::NodeKind;

    use super::*;

    fn punct_run(items: &mut Vec<Node>, at: usize, len: usize) -> usize {
        let first = items.len();
        for i in 0..len {
            items.push(Node::leaf(NodeKind::Punctuation, at + i, at + i + 1));
        }
        first
    }

    #[test]
    fn test_single_pair() {
        // *foo*
        let mut items = Vec::new();
        let mut delims = Vec::new();
        let first = punct_run(&mut items, 0, 1);
        delims.push(Delimiter {
            first_item: first,
            count: 1,
            orig_len: 1,
            ch: b'*',
            can_open: true,
            can_close: false,
            alive: true,
        });
        items.push(Node::leaf(NodeKind::Word, 1, 4));
        let first = punct_run(&mut items, 4, 1);
        delims.push(Delimiter {
            first_item: first,
            count: 1,
            orig_len: 1,
            ch: b'*',
            can_open: false,
            can_close: true,
            alive: true,
        });

        process_emphasis(&mut items, &mut delims, 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, NodeKind::Emphasis);
        assert_eq!(items[0].children.len(), 3);
    }

    #[test]
    fn test_triple_run_nests_strong_inside_emphasis() {
        // ***a***
        let mut items = Vec::new();
        let mut delims = Vec::new();
        let first = punct_run(&mut items, 0, 3);
        delims.push(Delimiter {
            first_item: first,
            count: 3,
            orig_len: 3,
            ch: b'*',
            can_open: true,
            can_close: false,
            alive: true,
        });
        items.push(Node::leaf(NodeKind::Word, 3, 4));
        let first = punct_run(&mut items, 4, 3);
        delims.push(Delimiter {
            first_item: first,
            count: 3,
            orig_len: 3,
            ch: b'*',
            can_open: false,
            can_close: true,
            alive: true,
        });

        process_emphasis(&mut items, &mut delims, 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, NodeKind::Emphasis);
        assert_eq!(items[0].children[1].kind, NodeKind::StrongEmphasis);
    }

    #[test]
    fn test_unmatched_runs_stay_literal() {
        // *foo (no closer)
        let mut items = Vec::new();
        let mut delims = Vec::new();
        let first = punct_run(&mut items, 0, 1);
        delims.push(Delimiter {
            first_item: first,
            count: 1,
            orig_len: 1,
            ch: b'*',
            can_open: true,
            can_close: false,
            alive: true,
        });
        items.push(Node::leaf(NodeKind::Word, 1, 4));

        process_emphasis(&mut items, &mut delims, 0);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, NodeKind::Punctuation);
    }

    #[test]
    fn test_mismatched_characters_do_not_pair() {
        // *foo_
        let mut items = Vec::new();
        let mut delims = Vec::new();
        let first = punct_run(&mut items, 0, 1);
        delims.push(Delimiter {
            first_item: first,
            count: 1,
            orig_len: 1,
            ch: b'*',
            can_open: true,
            can_close: false,
            alive: true,
        });
        items.push(Node::leaf(NodeKind::Word, 1, 4));
        let first = punct_run(&mut items, 4, 1);
        delims.push(Delimiter {
            first_item: first,
            count: 1,
            orig_len: 1,
            ch: b'_',
            can_open: false,
            can_close: true,
            alive: true,
        });

        process_emphasis(&mut items, &mut delims, 0);
        assert_eq!(items.len(), 3);
    }
}

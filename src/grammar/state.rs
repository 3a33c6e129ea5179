use super::scanner::CharClass;

/// Context threaded through the tokenizer grammar.
///
/// Holds the full inline run so flanking classification can look at the
/// character before a delimiter run, and the start-of-block hint used for
/// offset 0.
#[derive(Debug)]
pub(crate) struct ParserState<'input> {
    pub(crate) input: &'input str,
    pub(crate) at_block_start: bool,
}

impl<'input> ParserState<'input> {
    pub(crate) fn new(input: &'input str, at_block_start: bool) -> Self {
        Self {
            input,
            at_block_start,
        }
    }

    /// Class of the character immediately before byte offset `pos`.
    ///
    /// Offset 0 is start-of-block when the block layer says so (treated as
    /// whitespace, like any start of line); otherwise the run continues
    /// preceding text and the context is a word character.
    pub(crate) fn class_before(&self, pos: usize) -> CharClass {
        if pos == 0 {
            return if self.at_block_start {
                CharClass::Whitespace
            } else {
                CharClass::Other
            };
        }
        self.input[..pos]
            .chars()
            .next_back()
            .map_or(CharClass::Whitespace, CharClass::of)
    }

    /// Class of the character at byte offset `pos`; end of input counts as
    /// whitespace.
    pub(crate) fn class_after(&self, pos: usize) -> CharClass {
        self.input[pos..]
            .chars()
            .next()
            .map_or(CharClass::Whitespace, CharClass::of)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_boundary_classes() {
        let state = ParserState::new("a*é", true);
        assert_eq!(state.class_before(0), CharClass::Whitespace);
        assert_eq!(state.class_before(1), CharClass::Other);
        assert_eq!(state.class_before(2), CharClass::Punctuation);
        assert_eq!(state.class_after(1), CharClass::Punctuation);
        assert_eq!(state.class_after(2), CharClass::Other);
        assert_eq!(state.class_after(4), CharClass::Whitespace);
    }

    #[test]
    fn test_mid_paragraph_run() {
        let state = ParserState::new("*x", false);
        assert_eq!(state.class_before(0), CharClass::Other);
    }
}

use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    #[error("input of {len} bytes exceeds the configured limit of {limit}")]
    InputTooLarge { len: usize, limit: usize },

    #[error("grammar error: {0}")]
    Grammar(#[from] peg::error::ParseError<peg::str::LineCol>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_too_large_display() {
        let error = Error::InputTooLarge {
            len: 2048,
            limit: 1024,
        };
        assert_eq!(
            format!("{error}"),
            "input of 2048 bytes exceeds the configured limit of 1024"
        );
    }
}

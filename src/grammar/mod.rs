mod emphasis;
mod inline;
mod link;
mod scanner;
mod state;

pub(crate) use inline::inline_parser;
pub(crate) use link::resolve;
pub(crate) use state::ParserState;

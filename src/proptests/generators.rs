//! Input generators tuned to exercise the inline grammar.

use proptest::prelude::*;

/// Markup-dense soup: fragments that open, close, and half-open every
/// construct the grammar knows, concatenated in random order. Most outputs
/// are pathological, which is the point.
pub(super) fn markup_soup() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("*".to_string()),
        Just("**".to_string()),
        Just("***".to_string()),
        Just("_".to_string()),
        Just("__".to_string()),
        Just("`".to_string()),
        Just("``".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just("![".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("](u)".to_string()),
        Just("](u \"t\")".to_string()),
        Just("][ref]".to_string()),
        Just("[]".to_string()),
        Just("\\*".to_string()),
        Just("\\".to_string()),
        Just("&amp;".to_string()),
        Just("&#35;".to_string()),
        Just("&bogus;".to_string()),
        Just("<http://x>".to_string()),
        Just("<a@b.cc>".to_string()),
        Just("<div a=\"b\">".to_string()),
        Just("<!-- c -->".to_string()),
        Just("<".to_string()),
        Just(" ".to_string()),
        Just("\t".to_string()),
        Just("\n".to_string()),
        Just("  \n".to_string()),
        Just("\\\n".to_string()),
        "[a-z]{1,6}",
        "[0-9]{1,4}",
    ];
    prop::collection::vec(fragment, 0..48).prop_map(|fragments| fragments.concat())
}

/// Arbitrary text, including non-ASCII, mixed with occasional markup soup.
pub(super) fn any_inline_string() -> impl Strategy<Value = String> {
    prop_oneof![".{0,64}", markup_soup()]
}

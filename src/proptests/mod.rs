//! Property-based tests for the inline parser.
//!
//! These verify invariants that must hold for ANY input, not just specific
//! scenarios: the tree covers the input losslessly, spans nest and stay in
//! bounds, link texts contain no links, and delimiters stay balanced.

mod generators;
mod invariants;

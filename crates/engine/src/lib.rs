//! Analysis orchestration for presentation style checks.
//!
//! The [`Analyzer`] opens a deck, resolves the slide selection, runs every
//! inspector slide by slide and returns the findings together with the
//! deck statistics the conformance score is computed from.

pub mod analyzer;

#[cfg(test)]
mod fixture;

pub use analyzer::{Analysis, Analyzer};

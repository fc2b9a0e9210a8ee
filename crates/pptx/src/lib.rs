//! PPTX (Office Open XML) reader for the style checks.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into the
//! [`deckcheck_core::Deck`] model: slide order and size, the shape tree with
//! fills, text and fonts, and the embedded pictures.

pub mod parser;

pub use parser::PptxParser;

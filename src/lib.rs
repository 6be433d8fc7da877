//! Structured-document to Markdown conversion
//!
//! Takes a lossless block-level capture of a word-processing document
//! (paragraphs with runs and style attributes, tables, image anchors
//! with surrounding context) and infers the document structure that
//! the source format never states outright:
//!
//! - Heading detection from style names, font size, and text shape
//! - List recognition with nesting and original-marker preservation
//! - Code block detection from multiple weak signals, with language
//!   guessing for the fence
//! - Heading hierarchy normalization (no skipped levels)
//! - Context-scored image placement, with an appendix for images that
//!   cannot be confidently placed
//!
//! The conversion engine never fails: unclassifiable content renders
//! as plain paragraphs and every image appears exactly once.

pub mod block;
pub mod classify;
pub mod code_detect;
pub mod heading;
pub mod list_format;
pub mod markdown_gen;
pub mod pipeline;
pub mod placement;

// Re-export public API
pub use block::{Block, Document, ImageAnchor, Paragraph, Run, TableBlock};
pub use classify::Role;
pub use pipeline::{ConversionResult, ConversionStats, ConvertError, ConvertOptions, Converter};
pub use placement::{Placements, ScoreWeights};

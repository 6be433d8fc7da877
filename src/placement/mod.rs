//! Context-scored image placement
//!
//! Decides where each extracted image belongs in the rendered block
//! sequence. Matching runs in stages: explicit figure citations,
//! context scoring against the anchor's surrounding paragraphs, and a
//! heuristic fallback so no image is silently dropped. Unplaceable
//! images collect in a trailing appendix section.

mod resolve;
mod score;
mod types;

pub use resolve::place;
pub use score::{longest_common_substring, score_anchor_block};
pub use types::{PlacementCandidate, Placements, ScoreWeights};

//! Placement data types and scoring weights

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scoring weights for image placement.
///
/// Every signal the placement engine uses is tunable here, so a
/// config file can trade precision against recall without a rebuild.
/// The defaults are tuned on Chinese/English technical documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// A body block explicitly cites the image by number ("如图3")
    pub explicit_reference: i32,
    /// Exact match against the anchor's owning paragraph
    pub exact_paragraph: i32,
    /// Substring containment with the owning paragraph
    pub paragraph_substring: i32,
    /// Base score scaled by common-substring overlap ratio
    pub paragraph_lcs: i32,
    /// Match against the text immediately before the image
    pub text_before: i32,
    /// Bonus when the block ends with that preceding text
    pub text_before_suffix: i32,
    /// Exact match against a context paragraph, decaying per step
    pub neighbor_exact: i32,
    pub neighbor_exact_decay: i32,
    pub neighbor_substring: i32,
    pub neighbor_substring_decay: i32,
    pub neighbor_lcs: i32,
    pub neighbor_lcs_decay: i32,
    /// Block mentions a figure-indicator keyword
    pub indicator_keyword: i32,
    /// Block ends with a colon, introducing what follows
    pub colon_ending: i32,
    /// Block ends a sentence
    pub sentence_ending: i32,
    /// Score assigned to fallback placements
    pub fallback: i32,
    /// Candidates below this score are discarded
    pub min_candidate: i32,
    /// Common substrings shorter than this contribute nothing
    pub min_shared_chars: usize,
    /// Cap on text length fed to the common-substring search
    pub lcs_cap: usize,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            explicit_reference: 150,
            exact_paragraph: 100,
            paragraph_substring: 80,
            paragraph_lcs: 60,
            text_before: 40,
            text_before_suffix: 30,
            neighbor_exact: 25,
            neighbor_exact_decay: 5,
            neighbor_substring: 15,
            neighbor_substring_decay: 3,
            neighbor_lcs: 10,
            neighbor_lcs_decay: 2,
            indicator_keyword: 20,
            colon_ending: 15,
            sentence_ending: 5,
            fallback: 10,
            min_candidate: 20,
            min_shared_chars: 10,
            lcs_cap: 200,
        }
    }
}

impl ScoreWeights {
    /// Load weights from a TOML file, falling back to defaults for
    /// any field the file omits.
    pub fn from_toml_file(path: &Path) -> Result<Self, crate::pipeline::ConvertError> {
        let content = std::fs::read_to_string(path)?;
        let weights = toml::from_str(&content)
            .map_err(|e| crate::pipeline::ConvertError::Config(e.to_string()))?;
        Ok(weights)
    }
}

/// A scored candidate position for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementCandidate {
    /// Index of the rendered block the image goes after
    pub block_index: usize,
    /// Index into the document's anchor list
    pub anchor_index: usize,
    pub score: i32,
}

/// Final placement decision for all images
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placements {
    /// (block_index, anchor_index) pairs, ascending by block index
    pub bound: Vec<(usize, usize)>,
    /// Anchors with no usable position, in document order
    pub appendix: Vec<usize>,
}

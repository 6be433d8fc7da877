//! Heading level normalization
//!
//! Heuristic classification occasionally produces visually broken
//! nesting, e.g. an h1 followed directly by an h4. A single forward
//! pass clamps any heading that jumps more than one level deeper than
//! the previous heading; decreasing jumps are left alone. The tracker
//! follows the emitted (clamped) level, so the pass is idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#+)\s+(.*)$").unwrap());

/// Normalize heading levels across rendered Markdown blocks.
/// The first heading may be any level; each later heading is clamped
/// to at most one level deeper than the heading before it.
pub fn normalize_heading_levels(blocks: &[String]) -> Vec<String> {
    let mut normalized = Vec::with_capacity(blocks.len());
    let mut current_level = 0usize;

    for block in blocks {
        match RE_HEADING.captures(block) {
            Some(caps) => {
                let level = caps[1].len();
                let emitted = if current_level == 0 || level <= current_level + 1 {
                    normalized.push(block.clone());
                    level
                } else {
                    let clamped = current_level + 1;
                    normalized.push(format!("{} {}", "#".repeat(clamped), &caps[2]));
                    clamped
                };
                current_level = emitted;
            }
            None => normalized.push(block.clone()),
        }
    }

    normalized
}

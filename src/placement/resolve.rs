//! Candidate collection and placement resolution
//!
//! Gathers scored candidates for every image anchor, guarantees each
//! anchor has at least one candidate via a fallback chain, then
//! resolves candidates into final positions: ascending block order,
//! best score per position, each anchor bound at most once. Anchors
//! that still have no position go to the appendix.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::score::{ends_with_colon, score_anchor_block};
use super::types::{PlacementCandidate, Placements, ScoreWeights};
use crate::block::ImageAnchor;

/// Explicit figure citation with a number, e.g. "图3" or "Figure 2"
static RE_EXPLICIT_FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(图|figure|fig\.)\s*(\d+)").unwrap());

/// Numbered figure mention, used to keep the fallback chain away from
/// blocks that already cite a specific figure
static RE_NUMBERED_FIGURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"图\s*\d+").unwrap());

static RE_FALLBACK_INDICATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(图|figure|image|如图|图片|见图|如下图|示意图|截图|图表|示例|下图)").unwrap()
});

/// Collect scored placement candidates for all anchors.
///
/// A block's first figure citation matching an anchor's sequence
/// number gets the explicit-reference score; later citations in the
/// same block are ignored, so the other anchors keep their fallback
/// route instead of losing a same-index tie. Context scoring runs for
/// every (block, anchor) pair with context; candidates below the
/// minimum score are dropped.
fn collect_candidates(
    blocks: &[String],
    anchors: &[ImageAnchor],
    weights: &ScoreWeights,
) -> Vec<PlacementCandidate> {
    let mut candidates = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        let lower = block.to_lowercase();
        let Some(caps) = RE_EXPLICIT_FIGURE.captures(&lower) else {
            continue;
        };
        let Ok(fig_num) = caps[2].parse::<u32>() else {
            continue;
        };
        for (a, anchor) in anchors.iter().enumerate() {
            if anchor.number == fig_num {
                candidates.push(PlacementCandidate {
                    block_index: i,
                    anchor_index: a,
                    score: weights.explicit_reference,
                });
            }
        }
    }

    for i in 0..blocks.len() {
        for (a, anchor) in anchors.iter().enumerate() {
            let Some(ctx) = anchor.context.as_ref() else {
                continue;
            };
            let score = score_anchor_block(blocks, i, ctx, weights);
            if score >= weights.min_candidate {
                candidates.push(PlacementCandidate {
                    block_index: i,
                    anchor_index: a,
                    score,
                });
            }
        }
    }

    candidates
}

/// Pick a position for an anchor no candidate covered. Prefers blocks
/// that talk about figures without citing a number, then blocks ending
/// in a colon, then the first heading, then an early block.
fn fallback_position(blocks: &[String]) -> usize {
    for (i, block) in blocks.iter().enumerate() {
        let lower = block.to_lowercase();
        if RE_FALLBACK_INDICATOR.is_match(&lower) && !RE_NUMBERED_FIGURE.is_match(&lower) {
            return i;
        }
    }

    for (i, block) in blocks.iter().enumerate() {
        if ends_with_colon(block) {
            return i;
        }
    }

    for (i, block) in blocks.iter().enumerate() {
        if block.starts_with('#') && i + 1 < blocks.len() {
            return i;
        }
    }

    if blocks.len() > 5 {
        5.min(blocks.len() - 1)
    } else {
        0
    }
}

/// Resolve anchors into final placements over the rendered blocks
pub fn place(blocks: &[String], anchors: &[ImageAnchor], weights: &ScoreWeights) -> Placements {
    if anchors.is_empty() {
        return Placements::default();
    }
    if blocks.is_empty() {
        return Placements {
            bound: Vec::new(),
            appendix: (0..anchors.len()).collect(),
        };
    }

    let mut candidates = collect_candidates(blocks, anchors, weights);

    // Every anchor gets at least one candidate
    let covered: Vec<bool> = {
        let mut covered = vec![false; anchors.len()];
        for c in &candidates {
            covered[c.anchor_index] = true;
        }
        covered
    };
    for (a, has) in covered.iter().enumerate() {
        if !has {
            candidates.push(PlacementCandidate {
                block_index: fallback_position(blocks),
                anchor_index: a,
                score: weights.fallback,
            });
        }
    }

    // Best candidate per position
    let mut best_at: BTreeMap<usize, PlacementCandidate> = BTreeMap::new();
    for c in candidates {
        match best_at.get(&c.block_index) {
            Some(existing) if existing.score >= c.score => {}
            _ => {
                best_at.insert(c.block_index, c);
            }
        }
    }

    // Bind in ascending block order; an anchor already bound at an
    // earlier position leaves later positions empty
    let mut used = vec![false; anchors.len()];
    let mut bound = Vec::new();
    for (pos, c) in best_at {
        if used[c.anchor_index] {
            continue;
        }
        used[c.anchor_index] = true;
        bound.push((pos, c.anchor_index));
        log::debug!(
            "image {} placed after block {} (score {})",
            anchors[c.anchor_index].number,
            pos,
            c.score
        );
    }

    let appendix: Vec<usize> = (0..anchors.len()).filter(|&a| !used[a]).collect();
    if !appendix.is_empty() {
        log::debug!("{} image(s) deferred to appendix", appendix.len());
    }

    Placements { bound, appendix }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::AnchorContext;

    fn blocks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn anchor(number: u32, context: Option<AnchorContext>) -> ImageAnchor {
        ImageAnchor {
            ref_id: format!("rId{number}"),
            path: format!("media/image_{number}.png").into(),
            number,
            context,
        }
    }

    #[test]
    fn test_explicit_reference_wins() {
        let blocks = blocks(&[
            "unrelated paragraph",
            "详细流程见图2，说明如下。",
            "closing remarks",
        ]);
        let anchors = vec![anchor(2, None)];
        let placements = place(&blocks, &anchors, &ScoreWeights::default());
        assert_eq!(placements.bound, vec![(1, 0)]);
        assert!(placements.appendix.is_empty());
    }

    #[test]
    fn test_block_citing_two_figures_counts_only_the_first() {
        // "图1和图2" cites both; only figure 1 binds here, and
        // figure 2 still reaches an inline position via the fallback
        // chain instead of the appendix
        let blocks = blocks(&[
            "部署结构如图1和图2所示。",
            "组件说明如下：",
            "closing remarks",
        ]);
        let anchors = vec![anchor(1, None), anchor(2, None)];
        let placements = place(&blocks, &anchors, &ScoreWeights::default());
        assert_eq!(placements.bound, vec![(0, 0), (1, 1)]);
        assert!(placements.appendix.is_empty());
    }

    #[test]
    fn test_context_match_binds_owning_paragraph() {
        let blocks = blocks(&[
            "Introduction paragraph here.",
            "The architecture diagram below shows every component:",
            "Closing summary text.",
        ]);
        let ctx = AnchorContext {
            paragraph_text: "The architecture diagram below shows every component:".into(),
            ..AnchorContext::default()
        };
        let anchors = vec![anchor(1, Some(ctx))];
        let placements = place(&blocks, &anchors, &ScoreWeights::default());
        assert_eq!(placements.bound, vec![(1, 0)]);
    }

    #[test]
    fn test_anchor_bound_at_most_once() {
        // The same anchor scores on two blocks; only the earlier wins
        let blocks = blocks(&["shared caption text goes here:", "shared caption text goes here:"]);
        let ctx = AnchorContext {
            paragraph_text: "shared caption text goes here:".into(),
            ..AnchorContext::default()
        };
        let anchors = vec![anchor(1, Some(ctx))];
        let placements = place(&blocks, &anchors, &ScoreWeights::default());
        assert_eq!(placements.bound, vec![(0, 0)]);
    }

    #[test]
    fn test_every_anchor_appears_exactly_once() {
        let blocks = blocks(&["first text.", "second text.", "third text."]);
        let anchors = vec![anchor(1, None), anchor(2, None), anchor(3, None)];
        let placements = place(&blocks, &anchors, &ScoreWeights::default());
        let total = placements.bound.len() + placements.appendix.len();
        assert_eq!(total, anchors.len());

        let mut seen: Vec<usize> = placements
            .bound
            .iter()
            .map(|&(_, a)| a)
            .chain(placements.appendix.iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_contextless_anchors_share_fallback_then_appendix() {
        // Both anchors fall back to the same position; the second
        // cannot bind there and lands in the appendix
        let blocks = blocks(&["下图展示了部署结构", "other text"]);
        let anchors = vec![anchor(1, None), anchor(2, None)];
        let placements = place(&blocks, &anchors, &ScoreWeights::default());
        assert_eq!(placements.bound.len(), 1);
        assert_eq!(placements.bound[0].0, 0);
        assert_eq!(placements.appendix.len(), 1);
    }

    #[test]
    fn test_fallback_prefers_colon_over_heading() {
        let blocks = blocks(&["# Title", "setup steps are:", "more text"]);
        assert_eq!(fallback_position(&blocks), 1);
    }

    #[test]
    fn test_fallback_early_block_when_nothing_matches() {
        let short = blocks(&["a", "b", "c"]);
        assert_eq!(fallback_position(&short), 0);

        let long = blocks(&["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(fallback_position(&long), 5);
    }

    #[test]
    fn test_empty_blocks_push_everything_to_appendix() {
        let anchors = vec![anchor(1, None), anchor(2, None)];
        let placements = place(&[], &anchors, &ScoreWeights::default());
        assert!(placements.bound.is_empty());
        assert_eq!(placements.appendix, vec![0, 1]);
    }
}

//! Context scoring for image placement
//!
//! Scores how well a rendered block matches an image anchor's
//! captured context. Signals combine additively: the owning
//! paragraph, the text immediately before the image, surrounding
//! context paragraphs matched against nearby blocks, and textual
//! cues (figure keywords, colon endings, sentence endings).

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::ScoreWeights;
use crate::block::AnchorContext;

/// Words suggesting the block introduces or discusses a figure
static RE_FIGURE_INDICATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(图|figure|image|如图|图片|见图|如下图|示意图|截图|图表|示例|下图|界面|流程图|架构图|结构图)",
    )
    .unwrap()
});

pub(crate) fn ends_with_colon(block: &str) -> bool {
    let t = block.trim_end();
    t.ends_with(':') || t.ends_with('：')
}

pub(crate) fn ends_sentence(block: &str) -> bool {
    let t = block.trim_end();
    ['.', '。', '!', '！', '?', '？']
        .iter()
        .any(|c| t.ends_with(*c))
}

/// Longest common substring of two strings, character-based.
/// Inputs are truncated to `cap` characters to bound the DP table.
pub fn longest_common_substring(a: &str, b: &str, cap: usize) -> String {
    if a.is_empty() || b.is_empty() {
        return String::new();
    }

    let s1: Vec<char> = a.chars().take(cap).collect();
    let s2: Vec<char> = b.chars().take(cap).collect();
    let (m, n) = (s1.len(), s2.len());

    // Rolling single row keeps the table O(n)
    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];
    let mut max_len = 0usize;
    let mut end_pos = 0usize;

    for i in 1..=m {
        for j in 1..=n {
            if s1[i - 1] == s2[j - 1] {
                curr[j] = prev[j - 1] + 1;
                if curr[j] > max_len {
                    max_len = curr[j];
                    end_pos = i;
                }
            } else {
                curr[j] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(0);
    }

    s1[end_pos - max_len..end_pos].iter().collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Ratio-scaled common-substring score, or 0 when the overlap is too
/// short to be meaningful.
fn lcs_score(context: &str, block: &str, base: i32, weights: &ScoreWeights) -> i32 {
    if char_len(context) < weights.min_shared_chars {
        return 0;
    }
    let common = longest_common_substring(context, block, weights.lcs_cap);
    let shared = char_len(&common);
    if shared < weights.min_shared_chars {
        return 0;
    }
    let ratio = shared as f32 / char_len(context) as f32;
    (base as f32 * ratio) as i32
}

/// Score how well `blocks[index]` fits as the insertion point for an
/// anchor with the given captured context.
pub fn score_anchor_block(
    blocks: &[String],
    index: usize,
    ctx: &AnchorContext,
    weights: &ScoreWeights,
) -> i32 {
    let block = blocks[index].as_str();
    let mut score = 0i32;

    // Owning paragraph: exact, containment, then fuzzy overlap
    let owner = ctx.paragraph_text.trim();
    if !owner.is_empty() && !block.is_empty() {
        if owner == block.trim() {
            score += weights.exact_paragraph;
        } else if block.contains(owner) {
            score += weights.paragraph_substring;
        } else {
            score += lcs_score(owner, block, weights.paragraph_lcs, weights);
        }
    }

    // Text immediately before the image is the strongest positional cue
    let before_image = ctx.text_before_image.trim();
    if !before_image.is_empty() && block.contains(before_image) {
        score += weights.text_before;
        if block.trim_end().ends_with(before_image) {
            score += weights.text_before_suffix;
        }
    }

    // Context paragraphs before the image, nearest first, matched
    // against the blocks preceding this position
    for (j, prev_ctx) in ctx.before.iter().rev().enumerate() {
        let prev_ctx = prev_ctx.trim();
        if prev_ctx.is_empty() {
            continue;
        }
        let j = j as i32;
        for k in 1..=5usize {
            let Some(prev_index) = index.checked_sub(k) else {
                break;
            };
            let prev_block = blocks[prev_index].as_str();

            if prev_ctx == prev_block.trim() {
                score += weights.neighbor_exact - j * weights.neighbor_exact_decay;
                break;
            } else if prev_block.contains(prev_ctx) {
                score += weights.neighbor_substring - j * weights.neighbor_substring_decay;
                break;
            } else {
                let base = weights.neighbor_lcs - j * weights.neighbor_lcs_decay;
                let s = lcs_score(prev_ctx, prev_block, base, weights);
                if s != 0 {
                    score += s;
                    break;
                }
            }
        }
    }

    // Context paragraphs after the image, matched against following blocks
    for (j, next_ctx) in ctx.after.iter().enumerate() {
        let next_ctx = next_ctx.trim();
        if next_ctx.is_empty() {
            continue;
        }
        let j = j as i32;
        for k in 1..=5usize {
            let next_index = index + k;
            if next_index >= blocks.len() {
                break;
            }
            let next_block = blocks[next_index].as_str();

            if next_ctx == next_block.trim() {
                score += weights.neighbor_exact - j * weights.neighbor_exact_decay;
                break;
            } else if next_block.contains(next_ctx) {
                score += weights.neighbor_substring - j * weights.neighbor_substring_decay;
                break;
            } else {
                let base = weights.neighbor_lcs - j * weights.neighbor_lcs_decay;
                let s = lcs_score(next_ctx, next_block, base, weights);
                if s != 0 {
                    score += s;
                    break;
                }
            }
        }
    }

    // Textual cues on the block itself
    if RE_FIGURE_INDICATOR.is_match(&block.to_lowercase()) {
        score += weights.indicator_keyword;
    }
    if ends_with_colon(block) {
        score += weights.colon_ending;
    }
    if ends_sentence(block) {
        score += weights.sentence_ending;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_paragraph(text: &str) -> AnchorContext {
        AnchorContext {
            paragraph_text: text.to_string(),
            ..AnchorContext::default()
        }
    }

    fn blocks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lcs_basic() {
        assert_eq!(longest_common_substring("hello world", "say hello", 200), "hello");
        assert_eq!(longest_common_substring("", "anything", 200), "");
        assert_eq!(longest_common_substring("abc", "xyz", 200), "");
    }

    #[test]
    fn test_lcs_multibyte() {
        let common = longest_common_substring("系统架构示意图如下", "整体系统架构示意图", 200);
        assert_eq!(common, "系统架构示意图");
    }

    #[test]
    fn test_lcs_respects_cap() {
        let a = format!("{}shared-tail-text", "x".repeat(300));
        let b = "shared-tail-text".to_string();
        // The shared text sits past the cap in `a`
        assert_eq!(longest_common_substring(&a, &b, 200), "");
    }

    #[test]
    fn test_exact_paragraph_match() {
        let w = ScoreWeights::default();
        let blocks = blocks(&["The deployment topology is shown below."]);
        let ctx = ctx_with_paragraph("The deployment topology is shown below.");
        let score = score_anchor_block(&blocks, 0, &ctx, &w);
        // Exact match plus sentence ending
        assert_eq!(score, w.exact_paragraph + w.sentence_ending);
    }

    #[test]
    fn test_substring_beats_fuzzy() {
        let w = ScoreWeights::default();
        let blocks = blocks(&["Intro text where the deployment topology appears inline"]);
        let ctx = ctx_with_paragraph("the deployment topology");
        let score = score_anchor_block(&blocks, 0, &ctx, &w);
        assert_eq!(score, w.paragraph_substring);
    }

    #[test]
    fn test_text_before_suffix_bonus() {
        let w = ScoreWeights::default();
        let blocks = blocks(&["Some lead-in and the figure caption"]);
        let ctx = AnchorContext {
            text_before_image: "the figure caption".into(),
            ..AnchorContext::default()
        };
        let score = score_anchor_block(&blocks, 0, &ctx, &w);
        assert_eq!(
            score,
            w.text_before + w.text_before_suffix + w.indicator_keyword
        );
    }

    #[test]
    fn test_neighbor_decay() {
        let w = ScoreWeights::default();
        let blocks = blocks(&["preceding paragraph", "target block"]);
        // Two context paragraphs; only the farther one matches, so the
        // nearest-first scan reaches it at j=1
        let ctx = AnchorContext {
            before: vec!["preceding paragraph".into(), "no such text".into()],
            ..AnchorContext::default()
        };
        let score = score_anchor_block(&blocks, 1, &ctx, &w);
        assert_eq!(score, w.neighbor_exact - w.neighbor_exact_decay);
    }

    #[test]
    fn test_colon_and_indicator_cues() {
        let w = ScoreWeights::default();
        let blocks = blocks(&["系统架构如下图所示："]);
        let ctx = ctx_with_paragraph("completely unrelated context paragraph");
        let score = score_anchor_block(&blocks, 0, &ctx, &w);
        assert_eq!(score, w.indicator_keyword + w.colon_ending);
    }

    #[test]
    fn test_empty_context_scores_only_cues() {
        let w = ScoreWeights::default();
        let blocks = blocks(&["plain text with no cues"]);
        let score = score_anchor_block(&blocks, 0, &AnchorContext::default(), &w);
        assert_eq!(score, 0);
    }
}

//! List item formatting
//!
//! Renders paragraphs classified as list items into Markdown list
//! lines, translating the zoo of source markers (digits, letters,
//! parenthesized ordinals, Chinese numerals, bullet glyphs, task
//! boxes) into `-` / `N.` lines. Non-numeric ordinals that Markdown
//! cannot express keep their original marker parenthetically so no
//! information is lost.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::{Indent, Paragraph};

/// Points of left indent per nesting level
const INDENT_PT_PER_LEVEL: f32 = 36.0;

/// Centimeters of left indent per nesting level
const INDENT_CM_PER_LEVEL: f32 = 0.7;

static RE_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)([.、)）])\s*(.*)").unwrap());

static RE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-zA-Z])([.、)）])\s*(.*)").unwrap());

static RE_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\((\d+|[a-zA-Z])\)\s*(.*)").unwrap());

static RE_CHINESE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([一二三四五六七八九十]+)[、.]\s*(.*)").unwrap());

static RE_HEAVY_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([●■□▪▫◆◇▶▷►▻])\s*(.*)").unwrap());

static RE_TASK_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*+]\s+\[\s?\]\s*(.*)").unwrap());

static RE_TASK_DONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*+]\s+\[[xX]\]\s*(.*)").unwrap());

static RE_UNORDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([-\x{2013}\x{2014}•◦○※＊*+>·])\s*(.*)").unwrap());

/// Marker plus captured leading whitespace, for indent-level inference
static RE_PREFIX_SPACES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\s*)([-\x{2013}\x{2014}•◦○※＊*+>·]|\d+[.、)]|[a-zA-Z][.、)]|\([a-zA-Z0-9]+\)|\[[xX\s]\])\s",
    )
    .unwrap()
});

const CHINESE_NUMERALS: &[(&str, u32)] = &[
    ("一", 1),
    ("二", 2),
    ("三", 3),
    ("四", 4),
    ("五", 5),
    ("六", 6),
    ("七", 7),
    ("八", 8),
    ("九", 9),
    ("十", 10),
];

/// Derive the 0-based nesting level independently of the marker.
/// The maximum of all available signals wins: measured indent,
/// style-name level digit, leading whitespace, and bullet glyph depth.
pub fn nesting_level(para: &Paragraph) -> usize {
    let mut level = 0usize;

    if let Some(indent) = para.style.left_indent {
        let from_indent = match indent {
            Indent::Pt(v) => (v / INDENT_PT_PER_LEVEL) as usize,
            Indent::Cm(v) => (v / INDENT_CM_PER_LEVEL) as usize,
        };
        level = level.max(from_indent);
    }

    let style = para.style_name_lower();
    if !style.is_empty() {
        // Deepest declared level wins; styles commonly embed a digit
        // ("List Bullet 2", "列表 级别 3")
        for digit in (1..=9usize).rev() {
            if style.contains(&format!("level {digit}"))
                || style.contains(&format!("级别 {digit}"))
                || style.contains(&digit.to_string())
            {
                level = level.max(digit - 1);
                break;
            }
        }
    }

    let text = &para.text;
    if let Some(caps) = RE_PREFIX_SPACES.captures(text) {
        let spaces = caps.get(1).map(|m| m.as_str().chars().count()).unwrap_or(0);
        level = level.max(spaces / 2);
    }

    // Hollow and square glyphs conventionally mark deeper levels
    let head: String = text.trim_start().chars().take(5).collect();
    if head.contains('◦') || head.contains('○') {
        level = level.max(1);
    } else if ['▪', '▫', '■', '□'].iter().any(|g| head.contains(*g)) {
        level = level.max(2);
    }

    level
}

/// Render a list paragraph as a Markdown list line with `2*level`
/// leading spaces.
pub fn format(para: &Paragraph, level: usize) -> String {
    let text = para.text.trim();
    let indent = "  ".repeat(level);

    if let Some(caps) = RE_NUMERIC.captures(text) {
        return format!("{indent}{}. {}", &caps[1], caps[3].trim());
    }

    if let Some(caps) = RE_LETTER.captures(text) {
        // Markdown has no lettered lists; keep the original marker
        return format!("{indent}1. {} (原标记: {})", caps[3].trim(), &caps[1]);
    }

    if let Some(caps) = RE_PAREN.captures(text) {
        let marker = &caps[1];
        let body = caps[2].trim();
        if marker.chars().all(|c| c.is_ascii_digit()) {
            return format!("{indent}{marker}. {body}");
        }
        return format!("{indent}1. {body} (原标记: ({marker}))");
    }

    if let Some(caps) = RE_CHINESE.captures(text) {
        let numeral = &caps[1];
        let body = caps[2].trim();
        if let Some((_, n)) = CHINESE_NUMERALS.iter().find(|(cn, _)| *cn == numeral) {
            return format!("{indent}{n}. {body}");
        }
        return format!("{indent}1. {body} (原标记: {numeral}、)");
    }

    if let Some(caps) = RE_HEAVY_BULLET.captures(text) {
        return format!("{indent}- {}", caps[2].trim());
    }

    // Task markers must run before the generic dash pattern
    if let Some(caps) = RE_TASK_OPEN.captures(text) {
        return format!("{indent}- [ ] {}", caps[1].trim());
    }
    if let Some(caps) = RE_TASK_DONE.captures(text) {
        return format!("{indent}- [x] {}", caps[1].trim());
    }

    if let Some(caps) = RE_UNORDERED.captures(text) {
        return format!("{indent}- {}", caps[2].trim());
    }

    // No recognizable marker: the style name decides ordered vs not
    let style = para.style_name_lower();
    if ["list", "列表", "bullet"].iter().any(|k| style.contains(k)) {
        if ["number", "编号", "order"].iter().any(|k| style.contains(k)) {
            return format!("{indent}1. {text}");
        }
        return format!("{indent}- {text}");
    }

    format!("{indent}- {text}")
}

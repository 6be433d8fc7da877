//! Per-block role classification
//!
//! Decides what a source paragraph "is" in Markdown terms from weak,
//! inconsistent signals: style names (English and Chinese), font
//! metrics, indentation, and textual shape. The cascade order is a
//! contract: heading checks run first, then list checks, then code
//! detection, and anything left is plain prose. Classification of a
//! block inspects only that block; cross-block fixes are separate
//! passes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::{Block, Paragraph};
use crate::code_detect;
use crate::list_format;

/// Inferred structural role of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Heading with level 1-6
    Heading { level: u8 },
    /// List item with 0-based nesting level
    ListItem { level: usize },
    /// Code block (language guessed at render time)
    Code,
    Table,
    Plain,
}

/// Style-name keywords marking a heading family (either locale)
const HEADING_STYLE_KEYWORDS: &[&str] = &["heading", "标题", "title"];

/// Bare title styles that map to level 1
const TITLE_STYLES: &[&str] = &["title", "标题", "主标题"];

/// Style-name keywords marking a list family
const LIST_STYLE_KEYWORDS: &[&str] = &["list", "列表", "bullet", "number", "编号"];

/// Domain keywords whose presence suggests a heading line
const HEADING_KEYWORDS: &[&str] = &["RAG", "LLM", "API", "PDF", "HTML"];

/// Headings longer than this many characters are assumed to be prose
const MAX_HEADING_CHARS: usize = 100;

/// Short lines ending in a colon are list headers, not list items
const MAX_LIST_HEADER_CHARS: usize = 30;

static RE_CAPS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,}\b").unwrap());

static RE_UNORDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-\x{2013}\x{2014}•◦○※＊*+>·]\s").unwrap());

static RE_HEAVY_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[●■□▪▫◆◇▶▷►▻]\s").unwrap());

static RE_ORDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+|[a-zA-Z]|[ivxIVX]+)[.、)]\s").unwrap());

static RE_PAREN_ORDERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(\d+\)\s").unwrap());

static RE_CHINESE_ORDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[一二三四五六七八九十]+[、.]\s*").unwrap());

static RE_TASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[-*+]\s+\[(\s?|\s?x\s?)\]").unwrap());

/// Classify one block. First match wins; the ordering is part of the
/// contract (a block matching both list and code signals is a list).
pub fn classify(block: &Block) -> Role {
    let para = match block {
        Block::Table(_) => return Role::Table,
        Block::Paragraph(p) => p,
    };

    // Malformed input: nothing to classify, treated as plain and
    // skipped at render time
    if para.is_empty() {
        return Role::Plain;
    }

    let level = heading_level(para);
    if level > 0 {
        return Role::Heading { level };
    }

    if is_list_item(para) {
        return Role::ListItem {
            level: list_format::nesting_level(para),
        };
    }

    if code_detect::is_code(para) {
        return Role::Code;
    }

    Role::Plain
}

/// Heading level 1-6, or 0 when the paragraph is not a heading.
///
/// Style names are the most reliable signal and are checked first;
/// text-shape heuristics only apply when the style says nothing.
pub fn heading_level(para: &Paragraph) -> u8 {
    if let Some(level) = style_heading_level(para) {
        return level;
    }

    let text = para.text.trim();
    if text.is_empty() {
        return 0;
    }

    // Markdown-style heading typed into the document
    if let Some(level) = hash_prefix_level(text) {
        return level;
    }

    shape_heading_level(para, text)
}

/// Level from the style name, when it names a heading
fn style_heading_level(para: &Paragraph) -> Option<u8> {
    let style = para.style_name_lower();
    if style.is_empty() || !HEADING_STYLE_KEYWORDS.iter().any(|k| style.contains(k)) {
        return None;
    }

    for level in 1..=6u8 {
        let candidates = [
            format!("heading {level}"),
            format!("heading{level}"),
            format!("标题 {level}"),
            format!("标题{level}"),
            format!("h{level}"),
        ];
        if candidates.iter().any(|c| style.contains(c.as_str())) {
            return Some(level);
        }
    }

    // A bare Title-equivalent style is the document's main heading
    if TITLE_STYLES.contains(&style.as_str()) {
        return Some(1);
    }

    None
}

/// A run of leading '#' characters followed by whitespace
fn hash_prefix_level(text: &str) -> Option<u8> {
    let hashes = text.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &text[hashes..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(hashes as u8)
    } else {
        None
    }
}

/// Text-shape fallback: short, emphatic lines with large/bold fonts
/// and no indent look like headings; the font size picks the level.
fn shape_heading_level(para: &Paragraph, text: &str) -> u8 {
    if text.chars().count() >= MAX_HEADING_CHARS {
        return 0;
    }

    let heading_shaped = is_all_caps(text)
        || RE_CAPS_RUN.is_match(text)
        || HEADING_KEYWORDS.iter().any(|k| text.contains(k));
    if !heading_shaped {
        return 0;
    }

    let zero_indent = para.left_indent_pt() == 0.0;
    if !zero_indent {
        return 0;
    }

    let all_bold = para.all_runs_bold();
    let size = para.max_font_size_pt().unwrap_or(0.0);

    if size > 14.0 {
        if size >= 20.0 {
            1
        } else if size >= 18.0 {
            2
        } else if size >= 16.0 {
            3
        } else {
            4
        }
    } else if all_bold {
        4
    } else {
        0
    }
}

/// True when the text has letters and none of them are lowercase
fn is_all_caps(text: &str) -> bool {
    let mut has_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            has_alpha = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    has_alpha
}

/// List-item detection: style name, indent shape, then prefix markers.
pub fn is_list_item(para: &Paragraph) -> bool {
    let style = para.style_name_lower();
    if LIST_STYLE_KEYWORDS.iter().any(|k| style.contains(k)) {
        return true;
    }

    // Left indent with no first-line indent is the typical list shape
    if para.style.left_indent.is_some() && para.style.first_line_indent.is_none() {
        return true;
    }

    let text = para.text.trim();
    if text.is_empty() {
        return false;
    }

    // A short line ending in a colon announces a list, it is not an item
    if text.chars().count() < MAX_LIST_HEADER_CHARS && (text.ends_with(':') || text.ends_with('：'))
    {
        return false;
    }

    if RE_UNORDERED.is_match(text)
        || RE_HEAVY_BULLET.is_match(text)
        || RE_ORDERED.is_match(text)
        || RE_PAREN_ORDERED.is_match(text)
        || RE_CHINESE_ORDERED.is_match(text)
        || RE_TASK.is_match(text)
    {
        return true;
    }

    // Bullet glyph at the head of a run even when the paragraph text
    // was reassembled without it
    para.runs.iter().any(|r| {
        let head: String = r.text.chars().take(2).collect();
        !r.text.trim().is_empty() && ['•', '○', '■', '◦'].iter().any(|s| head.contains(*s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Indent, Run, StyleDescriptor, TableBlock};

    fn styled(text: &str, style: &str) -> Paragraph {
        Paragraph {
            text: text.into(),
            runs: vec![],
            style: StyleDescriptor {
                style_name: Some(style.into()),
                ..StyleDescriptor::default()
            },
        }
    }

    #[test]
    fn test_heading_from_style_name() {
        assert_eq!(heading_level(&styled("Background", "Heading 2")), 2);
        assert_eq!(heading_level(&styled("概述", "标题 3")), 3);
        assert_eq!(heading_level(&styled("概述", "标题3")), 3);
        assert_eq!(heading_level(&styled("Intro", "heading1")), 1);
        assert_eq!(heading_level(&styled("Doc Title", "Title")), 1);
        assert_eq!(heading_level(&styled("文档", "主标题")), 1);
    }

    #[test]
    fn test_heading_from_hash_prefix() {
        assert_eq!(heading_level(&Paragraph::from_text("# Intro")), 1);
        assert_eq!(heading_level(&Paragraph::from_text("### Deep")), 3);
        assert_eq!(heading_level(&Paragraph::from_text("####### Too deep")), 0);
        // No whitespace after the hashes: likely a tag, not a heading
        assert_eq!(heading_level(&Paragraph::from_text("#hashtag")), 0);
        // Bare hashes count as a heading marker
        assert_eq!(heading_level(&Paragraph::from_text("##")), 2);
    }

    #[test]
    fn test_heading_from_font_size_table() {
        let mut para = Paragraph {
            text: "SYSTEM OVERVIEW".into(),
            runs: vec![Run {
                text: "SYSTEM OVERVIEW".into(),
                bold: true,
                font_size_pt: Some(20.0),
                ..Run::default()
            }],
            style: StyleDescriptor::default(),
        };
        assert_eq!(heading_level(&para), 1);

        para.runs[0].font_size_pt = Some(18.0);
        assert_eq!(heading_level(&para), 2);
        para.runs[0].font_size_pt = Some(16.0);
        assert_eq!(heading_level(&para), 3);
        para.runs[0].font_size_pt = Some(15.0);
        assert_eq!(heading_level(&para), 4);
    }

    #[test]
    fn test_heading_bold_only_is_level_4() {
        let para = Paragraph {
            text: "API Reference".into(),
            runs: vec![Run {
                text: "API Reference".into(),
                bold: true,
                ..Run::default()
            }],
            style: StyleDescriptor::default(),
        };
        assert_eq!(heading_level(&para), 4);
    }

    #[test]
    fn test_heading_rejected_with_indent() {
        let para = Paragraph {
            text: "API Reference".into(),
            runs: vec![Run {
                text: "API Reference".into(),
                bold: true,
                font_size_pt: Some(20.0),
                ..Run::default()
            }],
            style: StyleDescriptor {
                left_indent: Some(Indent::Pt(18.0)),
                ..StyleDescriptor::default()
            },
        };
        assert_eq!(heading_level(&para), 0);
    }

    #[test]
    fn test_long_line_is_not_heading() {
        let long = "API ".repeat(30);
        assert_eq!(heading_level(&Paragraph::from_text(long)), 0);
    }

    #[test]
    fn test_plain_sentence_is_not_heading() {
        assert_eq!(
            heading_level(&Paragraph::from_text("this is an ordinary sentence.")),
            0
        );
    }

    #[test]
    fn test_list_from_style() {
        assert!(is_list_item(&styled("anything", "List Bullet")));
        assert!(is_list_item(&styled("任意", "编号列表")));
    }

    #[test]
    fn test_list_from_indent_shape() {
        let para = Paragraph {
            text: "indented without first-line indent".into(),
            runs: vec![],
            style: StyleDescriptor {
                left_indent: Some(Indent::Pt(36.0)),
                ..StyleDescriptor::default()
            },
        };
        assert!(is_list_item(&para));
    }

    #[test]
    fn test_list_from_markers() {
        for text in [
            "- dash item",
            "• bullet item",
            "● heavy bullet",
            "1. numbered",
            "a) lettered",
            "(1) parenthesized",
            "一、中文编号",
            "- [ ] open task",
            "- [X] done task",
            "> quoted item",
        ] {
            assert!(is_list_item(&Paragraph::from_text(text)), "{text}");
        }
    }

    #[test]
    fn test_inline_checkbox_is_not_a_task_marker() {
        // A task marker must open the line; "[x]" in running prose
        // does not make the paragraph a list item
        let prose = "Choose the option marked [x] in the settings dialog";
        assert!(!is_list_item(&Paragraph::from_text(prose)));
        assert_eq!(
            classify(&Block::Paragraph(Paragraph::from_text(prose))),
            Role::Plain
        );
        assert!(!is_list_item(&Paragraph::from_text("已勾选 [ x] 的条目会被同步")));
    }

    #[test]
    fn test_short_colon_line_is_excluded() {
        assert!(!is_list_item(&Paragraph::from_text("配置步骤：")));
        assert!(!is_list_item(&Paragraph::from_text("Steps:")));
        // Long colon-terminated lines are not list headers
        let long = format!("{}:", "word ".repeat(10).trim_end());
        assert!(!is_list_item(&Paragraph::from_text(long)));
    }

    #[test]
    fn test_bullet_glyph_in_run() {
        let para = Paragraph {
            text: "reassembled text".into(),
            runs: vec![Run {
                text: "• item".into(),
                ..Run::default()
            }],
            style: StyleDescriptor::default(),
        };
        assert!(is_list_item(&para));
    }

    #[test]
    fn test_classify_order_heading_wins_over_list() {
        // Style says heading, text looks like a numbered item
        let para = styled("1. Introduction", "Heading 1");
        assert_eq!(classify(&Block::Paragraph(para)), Role::Heading { level: 1 });
    }

    #[test]
    fn test_classify_list_wins_over_code() {
        // A numbered line mentioning code still classifies as a list
        let para = Paragraph::from_text("1. run `git commit` to save");
        assert!(matches!(
            classify(&Block::Paragraph(para)),
            Role::ListItem { .. }
        ));
    }

    #[test]
    fn test_classify_table() {
        let table = TableBlock {
            rows: vec![vec!["h".into()]],
        };
        assert_eq!(classify(&Block::Table(table)), Role::Table);
    }

    #[test]
    fn test_classify_empty_paragraph_is_plain() {
        assert_eq!(
            classify(&Block::Paragraph(Paragraph::default())),
            Role::Plain
        );
    }
}

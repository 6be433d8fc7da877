//! Markdown rendering and assembly
//!
//! Renders classified blocks into Markdown lines (inline run
//! formatting, tables, fenced code, image references, the optional
//! table of contents) and joins the final block sequence with spacing
//! rules keyed on adjacent block-type transitions.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as FmtWrite;

use crate::block::{Paragraph, TableBlock};

/// Render a plain paragraph from its runs, applying bold/italic
/// emphasis and hyperlinks. Falls back to the raw paragraph text when
/// there are no usable runs.
pub fn render_paragraph(para: &Paragraph) -> String {
    let mut formatted = String::new();

    for run in &para.runs {
        if run.text.is_empty() {
            continue;
        }
        let mut piece = run.text.clone();

        if let Some(url) = run.hyperlink.as_deref() {
            if !url.is_empty() {
                piece = format!("[{piece}]({url})");
            }
        }

        if run.bold && run.italic {
            piece = format!("***{piece}***");
        } else if run.bold {
            piece = format!("**{piece}**");
        } else if run.italic {
            piece = format!("*{piece}*");
        }

        formatted.push_str(&piece);
    }

    if formatted.trim().is_empty() {
        para.text.trim().to_string()
    } else {
        formatted.trim().to_string()
    }
}

/// Render a table. The first row is the header; `|` in cells is
/// escaped and empty cells render as a single space so rows stay
/// well-formed.
pub fn render_table(table: &TableBlock) -> String {
    let mut rows = table.rows.iter();
    let header = match rows.next() {
        Some(h) if !h.is_empty() => h,
        _ => return String::new(),
    };

    let mut md = String::new();
    let cells: Vec<String> = header.iter().map(|c| escape_cell(c)).collect();
    let _ = write!(md, "| {} |", cells.join(" | "));
    let _ = write!(md, "\n| {} |", vec!["---"; header.len()].join(" | "));

    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        let _ = write!(md, "\n| {} |", cells.join(" | "));
    }

    md
}

fn escape_cell(cell: &str) -> String {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        " ".to_string()
    } else {
        trimmed.replace('|', "\\|")
    }
}

/// Render a heading line at the given level (1-6)
pub fn render_heading(level: u8, text: &str) -> String {
    format!("{} {}", "#".repeat(level as usize), text.trim())
}

/// Render a fenced code block. The fence always closes.
pub fn render_code(text: &str, language: &str) -> String {
    format!("```{language}\n{}\n```", text.trim())
}

/// Render an inline image reference for a placed anchor
pub fn render_image(number: u32, filename: &str) -> String {
    format!("![图片{number}]({filename})")
}

/// Heading text for the appendix section holding unplaced images
pub const APPENDIX_HEADING: &str = "## 附录：其他图片";

static RE_TOC_ANCHOR_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());

/// Build a GitHub-style anchor slug for a heading text
pub fn heading_anchor(text: &str) -> String {
    RE_TOC_ANCHOR_STRIP
        .replace_all(text, "")
        .trim()
        .to_lowercase()
        .replace(' ', "-")
}

/// Generate a table-of-contents block from (level, text) headings.
/// Empty titles and titles that slug down to nothing are skipped.
pub fn generate_toc(headings: &[(u8, String)]) -> String {
    let mut md = String::from("## 目录\n");

    for (level, text) in headings {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let anchor = heading_anchor(text);
        if anchor.is_empty() {
            continue;
        }
        let indent = "  ".repeat((*level as usize).saturating_sub(1));
        let _ = write!(md, "\n{indent}- [{text}](#{anchor})");
    }

    md
}

/// Block type for assembler spacing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Code,
    Table,
    Image,
    UnorderedList,
    OrderedList,
    Paragraph,
}

static RE_UL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+]\s").unwrap());
static RE_OL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s").unwrap());

/// Identify a rendered block's type from its leading characters
pub fn kind_of(block: &str) -> BlockKind {
    if block.starts_with('#') {
        BlockKind::Heading
    } else if block.starts_with("```") {
        BlockKind::Code
    } else if block.starts_with('|') && block[1..].contains('|') {
        BlockKind::Table
    } else if block.starts_with("![") {
        BlockKind::Image
    } else if RE_UL_LINE.is_match(block) {
        BlockKind::UnorderedList
    } else if RE_OL_LINE.is_match(block) {
        BlockKind::OrderedList
    } else {
        BlockKind::Paragraph
    }
}

impl BlockKind {
    fn is_list_or_paragraph(self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::UnorderedList | BlockKind::OrderedList
        )
    }
}

/// Join rendered blocks into the final Markdown text.
///
/// A single blank line is inserted wherever the block-type transition
/// materially affects rendering: before a heading, around code fences,
/// tables, and images, and between paragraph and list blocks of
/// different types. Identical consecutive types get no blank line.
pub fn assemble(blocks: &[String]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(blocks.len() * 2);
    let mut prev_kind: Option<BlockKind> = None;

    for block in blocks {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let kind = kind_of(block);

        if let Some(prev) = prev_kind {
            if prev != kind {
                let needs_blank = kind == BlockKind::Heading
                    || prev == BlockKind::Code
                    || kind == BlockKind::Code
                    || prev == BlockKind::Table
                    || kind == BlockKind::Table
                    || prev == BlockKind::Image
                    || kind == BlockKind::Image
                    || (prev.is_list_or_paragraph() && kind.is_list_or_paragraph());
                if needs_blank {
                    lines.push(String::new());
                }
            }
        }

        lines.push(block.to_string());
        prev_kind = Some(kind);
    }

    lines.join("\n")
}

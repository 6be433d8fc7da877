//! Document conversion pipeline
//!
//! Drives the full conversion: title extraction, block
//! classification and rendering, table-of-contents generation,
//! heading normalization, image placement, and final assembly.
//! Conversion itself never fails; errors only arise at the I/O
//! boundary when loading input or configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::block::{Block, Document, Paragraph};
use crate::classify::{self, Role};
use crate::heading::normalize_heading_levels;
use crate::markdown_gen::{
    assemble, generate_toc, render_code, render_heading, render_image, render_paragraph,
    render_table, APPENDIX_HEADING,
};
use crate::placement::{place, ScoreWeights};
use crate::{code_detect, list_format};

/// Errors at the conversion boundary
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Conversion options
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Placement scoring weights
    pub weights: ScoreWeights,
    /// Emit a table of contents when the document has enough headings
    pub emit_toc: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            emit_toc: true,
        }
    }
}

/// Minimum heading count before a table of contents is worthwhile
const TOC_MIN_HEADINGS: usize = 4;

/// Counters for what the conversion produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub headings: usize,
    pub lists: usize,
    pub code_blocks: usize,
    pub tables: usize,
    pub paragraphs: usize,
    pub images_inline: usize,
    pub images_appendix: usize,
}

/// Output of one conversion
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub markdown: String,
    /// Image paths referenced by the output, in sequence order
    pub referenced_images: Vec<PathBuf>,
    pub stats: ConversionStats,
}

/// Document-to-Markdown converter
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Convert a structured document into Markdown.
    ///
    /// Runs end to end on any input: unclassifiable blocks render as
    /// plain paragraphs and unplaceable images go to the appendix, so
    /// malformed content degrades instead of failing.
    pub fn convert(&self, doc: &Document) -> ConversionResult {
        let mut stats = ConversionStats::default();

        let (title, title_index) = extract_title(&doc.blocks);
        log::info!(
            "converting document: {} blocks, {} images",
            doc.blocks.len(),
            doc.images.len()
        );

        // Classify and render body blocks, merging adjacent code
        // paragraphs into a single fence
        let mut body: Vec<String> = Vec::with_capacity(doc.blocks.len());
        let mut headings: Vec<(u8, String)> = Vec::new();
        let mut i = 0;
        while i < doc.blocks.len() {
            if Some(i) == title_index {
                i += 1;
                continue;
            }
            let block = &doc.blocks[i];

            match classify::classify(block) {
                Role::Heading { level } => {
                    let Block::Paragraph(para) = block else {
                        unreachable!("heading role only applies to paragraphs")
                    };
                    let text = heading_text(para);
                    headings.push((level, text.clone()));
                    body.push(render_heading(level, &text));
                    stats.headings += 1;
                }
                Role::ListItem { level } => {
                    let Block::Paragraph(para) = block else {
                        unreachable!("list role only applies to paragraphs")
                    };
                    body.push(list_format::format(para, level));
                    stats.lists += 1;
                }
                Role::Code => {
                    let mut code_lines: Vec<&str> = Vec::new();
                    while i < doc.blocks.len() {
                        if Some(i) == title_index {
                            break;
                        }
                        match &doc.blocks[i] {
                            Block::Paragraph(p) if classify::classify(&doc.blocks[i]) == Role::Code => {
                                code_lines.push(p.text.trim_end());
                                i += 1;
                            }
                            _ => break,
                        }
                    }
                    let code = code_lines.join("\n");
                    let language = code_detect::guess_language(&code);
                    body.push(render_code(&code, language));
                    stats.code_blocks += 1;
                    continue;
                }
                Role::Table => {
                    let Block::Table(table) = block else {
                        unreachable!("table role only applies to tables")
                    };
                    let rendered = render_table(table);
                    if !rendered.is_empty() {
                        body.push(rendered);
                        stats.tables += 1;
                    }
                }
                Role::Plain => {
                    let Block::Paragraph(para) = block else {
                        unreachable!("plain role only applies to paragraphs")
                    };
                    let rendered = render_paragraph(para);
                    if !rendered.is_empty() {
                        body.push(rendered);
                        stats.paragraphs += 1;
                    }
                }
            }
            i += 1;
        }

        let mut md_blocks: Vec<String> = Vec::with_capacity(body.len() + 2);
        if let Some(title) = &title {
            md_blocks.push(format!("# {title}"));
        }
        if self.options.emit_toc && headings.len() >= TOC_MIN_HEADINGS {
            log::info!("emitting table of contents ({} headings)", headings.len());
            md_blocks.push(generate_toc(&headings));
        }
        md_blocks.extend(body);

        let md_blocks = normalize_heading_levels(&md_blocks);

        // Place images and interleave them with the blocks
        let placements = place(&md_blocks, &doc.images, &self.options.weights);
        stats.images_inline = placements.bound.len();
        stats.images_appendix = placements.appendix.len();

        let mut with_images: Vec<String> = Vec::with_capacity(md_blocks.len() + doc.images.len());
        let mut bound = placements.bound.iter().peekable();
        for (pos, block) in md_blocks.into_iter().enumerate() {
            with_images.push(block);
            while let Some(&&(p, a)) = bound.peek() {
                if p != pos {
                    break;
                }
                let anchor = &doc.images[a];
                with_images.push(render_image(anchor.number, &anchor.filename()));
                bound.next();
            }
        }
        if !placements.appendix.is_empty() {
            with_images.push(APPENDIX_HEADING.to_string());
            for &a in &placements.appendix {
                let anchor = &doc.images[a];
                with_images.push(render_image(anchor.number, &anchor.filename()));
            }
        }

        let markdown = assemble(&with_images);

        let mut referenced: Vec<&crate::block::ImageAnchor> = doc.images.iter().collect();
        referenced.sort_by_key(|a| a.number);
        let referenced_images = referenced.into_iter().map(|a| a.path.clone()).collect();

        log::info!(
            "conversion done: {} headings, {} lists, {} code blocks, {} tables, {} images inline, {} in appendix",
            stats.headings,
            stats.lists,
            stats.code_blocks,
            stats.tables,
            stats.images_inline,
            stats.images_appendix
        );

        ConversionResult {
            markdown,
            referenced_images,
            stats,
        }
    }
}

/// Find the document title: a paragraph with an explicit title style,
/// or a level-1 heading opening the document.
fn extract_title(blocks: &[Block]) -> (Option<String>, Option<usize>) {
    for (i, block) in blocks.iter().enumerate() {
        let Block::Paragraph(para) = block else {
            continue;
        };
        let style = para.style_name_lower();
        if style.contains("title") || style == "主标题" || style == "标题" {
            let text = para.text.trim();
            if !text.is_empty() {
                return (Some(text.to_string()), Some(i));
            }
        }
    }

    if let Some(Block::Paragraph(first)) = blocks.first() {
        if classify::heading_level(first) == 1 {
            let text = first.text.trim();
            if !text.is_empty() {
                return (Some(text.to_string()), Some(0));
            }
        }
    }

    (None, None)
}

/// Heading text with any typed-in hash prefix stripped
fn heading_text(para: &Paragraph) -> String {
    let text = para.text.trim();
    let stripped = text.trim_start_matches('#');
    if stripped.len() != text.len() {
        stripped.trim_start().to_string()
    } else {
        text.to_string()
    }
}

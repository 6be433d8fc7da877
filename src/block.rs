//! Document block model
//!
//! Flat, typed value objects describing the source document after
//! extraction: ordered paragraph/table blocks with style metadata, and
//! image anchors carrying the positional context used for placement.
//! Upstream extractors produce these once; the engine consumes them
//! read-only.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Numbering format carried by a paragraph's numbering descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberingFormat {
    Bullet,
    Decimal,
    LowerRoman,
    LowerLetter,
}

/// Numbering descriptor (from the source document's list definitions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Numbering {
    pub format: NumberingFormat,
    /// 0-based nesting level
    pub level: u8,
    /// Level text template, e.g. `"%1."`
    #[serde(default)]
    pub level_text: Option<String>,
}

/// Indentation measurement with its source unit
///
/// Extractors report indents in whatever unit the document used; the
/// list-level heuristics divide by a unit-specific step (36pt or 0.7cm
/// per level), so the unit must survive extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum Indent {
    Pt(f32),
    Cm(f32),
}

impl Indent {
    /// Value converted to points (1cm = 28.35pt)
    pub fn points(self) -> f32 {
        match self {
            Indent::Pt(v) => v,
            Indent::Cm(v) => v * 28.35,
        }
    }
}

/// A contiguous span of text sharing one formatting state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    /// Hyperlink target, when the run is a link
    #[serde(default)]
    pub hyperlink: Option<String>,
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(default)]
    pub font_size_pt: Option<f32>,
    /// Run-level background/highlight attribute
    #[serde(default)]
    pub highlight: bool,
}

/// Style metadata extracted once per paragraph
///
/// The classifier operates on this flat descriptor instead of reflecting
/// over a document library's live object graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleDescriptor {
    #[serde(default)]
    pub style_name: Option<String>,
    #[serde(default)]
    pub left_indent: Option<Indent>,
    #[serde(default)]
    pub first_line_indent: Option<Indent>,
    /// Paragraph shading fill color, when present
    #[serde(default)]
    pub shading_fill: Option<String>,
    #[serde(default)]
    pub numbering: Option<Numbering>,
}

/// A paragraph block: full text plus its ordered runs and style
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub style: StyleDescriptor,
}

impl Paragraph {
    /// Paragraph built from bare text (no runs, no style)
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// True when the paragraph carries neither text nor runs
    /// (malformed input, classified Plain and skipped)
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// True when every non-whitespace run is bold (and at least one run exists)
    pub fn all_runs_bold(&self) -> bool {
        let mut any = false;
        for run in &self.runs {
            if run.text.trim().is_empty() {
                continue;
            }
            if !run.bold {
                return false;
            }
            any = true;
        }
        any
    }

    /// Largest font size across runs, if any run reports one
    pub fn max_font_size_pt(&self) -> Option<f32> {
        self.runs
            .iter()
            .filter_map(|r| r.font_size_pt)
            .fold(None, |acc, v| {
                Some(match acc {
                    Some(a) if a >= v => a,
                    _ => v,
                })
            })
    }

    /// Left indent in points (0.0 when absent)
    pub fn left_indent_pt(&self) -> f32 {
        self.style.left_indent.map(Indent::points).unwrap_or(0.0)
    }

    /// Lowercased style name ("" when absent)
    pub fn style_name_lower(&self) -> String {
        self.style
            .style_name
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
    }
}

/// A table: ordered rows of cell text. The first row is the header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableBlock {
    pub rows: Vec<Vec<String>>,
}

/// One structural unit of the source document, in original order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(TableBlock),
}

/// Positional context of an image in the source document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchorContext {
    /// Index of the paragraph that owned the image run
    pub paragraph_index: usize,
    /// Full text of the owning paragraph
    pub paragraph_text: String,
    /// Up to 5 preceding paragraph texts, nearest last
    #[serde(default)]
    pub before: Vec<String>,
    /// Up to 5 following paragraph texts, nearest first
    #[serde(default)]
    pub after: Vec<String>,
    /// Owning-paragraph text before the image run
    #[serde(default)]
    pub text_before_image: String,
    /// Owning-paragraph text after the image run
    #[serde(default)]
    pub text_after_image: String,
}

/// An extracted image plus its positional context
///
/// `number` is 1-based and follows extraction order; `ref_id` is unique
/// per image. An anchor with no resolvable context has `context: None`
/// and is still placed via the fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnchor {
    pub ref_id: String,
    pub path: PathBuf,
    pub number: u32,
    #[serde(default)]
    pub context: Option<AnchorContext>,
}

impl ImageAnchor {
    /// File name component used in Markdown image references
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }
}

/// A complete extracted document: ordered blocks plus image anchors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub images: Vec<ImageAnchor>,
}

impl Document {
    /// Parse a document from its JSON interchange form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a document from a JSON file on disk
    pub fn from_json_file(path: &Path) -> Result<Self, crate::pipeline::ConvertError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }
}

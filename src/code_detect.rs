//! Code block detection and language guessing
//!
//! Code paragraphs rarely announce themselves: the style name helps when
//! present, but most documents only hint at code through monospace
//! fonts, background shading, indentation, or the text itself looking
//! like a program. Detection therefore combines weak signals; no single
//! one is authoritative except an explicit code style name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::Paragraph;

/// Style-name keywords that mark a paragraph as code outright
const CODE_STYLE_KEYWORDS: &[&str] = &[
    "code",
    "代码",
    "verbatim",
    "preformatted",
    "source",
    "program",
    "command",
    "terminal",
];

/// Monospace font families typical of code runs
const MONOSPACE_FONTS: &[&str] = &[
    "courier",
    "consolas",
    "monaco",
    "monospace",
    "menlo",
    "lucida console",
    "dejavu sans mono",
    "fixedsys",
];

/// Fraction of run text that must carry a highlight/background
/// attribute for the paragraph to count as background-shaded
const BACKGROUND_RUN_RATIO: f64 = 0.6;

/// Left indent (points) above which indentation counts as a code signal
const CODE_INDENT_PT: f32 = 10.0;

/// Syntax patterns spanning declarations, control structures, SQL,
/// shebangs, bracket-only lines, YAML, and common CLI invocations
static SYNTAX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Declarations
        r"^(function|def|class|import|from|var|let|const)\s+\w+",
        r"^(public|private|protected)\s+\w+\s+\w+",
        r"^\s*(if|for|while|switch|try|catch)\s*\(",
        r"^\s*return\s+.+;?\s*$",
        r"^(SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER)\s+",
        // Markers and special syntax
        r"<\?php|\?>",
        r"^```\w*$",
        r"^#!/bin/(bash|sh|python|perl)",
        // Bracket-only lines and YAML
        r"^\s*[{}]\s*$",
        r"^\s*[\[\]]\s*$",
        r"^(\s*)[\w\-]+:\s*\w+",
        // Command lines
        r"^(\$|>)\s+[\w\-.]+",
        r"\bgit\s+(commit|push|pull|clone|checkout|add)\b",
        r"\bdocker\s+(run|build|exec|ps|images)\b",
        r"\bnpm\s+(install|run|build|start)\b",
        r"curl\s+https?://",
        r"wget\s+https?://",
        r"ssh\s+\w+@[\w.]+",
        r"cd\s+[\w/\-.]+",
        r"pip\s+install",
        r"apt\s+(install|update|upgrade)",
        r"yum\s+(install|update)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid syntax pattern"))
    .collect()
});

/// Shell command prefixes often rendered as shaded one-liners
static BASH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\s*cd\s+",
        r"^\s*mkdir\s+",
        r"^\s*ls\s+",
        r"^\s*rm\s+",
        r"^\s*sudo\s+",
        r"^\s*apt\s+",
        r"^\s*yum\s+",
        r"^\s*docker\s+",
        r"^\s*git\s+",
        r"^\s*npm\s+",
        r"^\s*python\s+",
        r"^\s*pip\s+",
        r"^\s*javac\s+",
        r"^\s*mv\s+",
        r"^\s*cp\s+",
        r"^http",
        r"^https",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("valid bash pattern"))
    .collect()
});

/// Path/URL-like tokens indicating technical content
const TECH_TOKENS: &[&str] = &["http://", "https://", "file://", "/usr/", "./"];

/// Short command verbs for the inline-command check
const COMMAND_VERBS: &[&str] = &[
    "cd ", "mkdir", "rmdir", "touch", "chmod", "mv ", "cp ", "rm ", "tar ", "zip ", "unzip",
    "ping ", "curl ",
];

/// Decide whether a paragraph is a code block.
///
/// Combination rule, in priority order (any branch true means code):
/// monospace with background or syntax; background with syntax;
/// background alone; indent with syntax or generic markers; bash-like
/// command with background or monospace; syntax match on short text;
/// technical token on short non-URL text; short inline command.
pub fn is_code(para: &Paragraph) -> bool {
    let style = para.style_name_lower();
    if CODE_STYLE_KEYWORDS.iter().any(|k| style.contains(k)) {
        return true;
    }

    let text = para.text.trim();
    if text.is_empty() {
        return false;
    }
    let len = text.chars().count();

    let has_monospace = para.runs.iter().any(|r| {
        r.font_name
            .as_deref()
            .map(|name| {
                let name = name.to_lowercase();
                MONOSPACE_FONTS.iter().any(|f| name.contains(f))
            })
            .unwrap_or(false)
    });

    let has_background = para.style.shading_fill.is_some() || background_ratio(para) > BACKGROUND_RUN_RATIO;
    let has_indent = para.left_indent_pt() > CODE_INDENT_PT;
    let has_syntax = SYNTAX_PATTERNS.iter().any(|re| re.is_match(text));
    let has_markers = generic_markers(text);
    let is_bash = BASH_PATTERNS.iter().any(|re| re.is_match(text));

    if (has_monospace && (has_background || has_syntax))
        || (has_background && has_syntax)
        || has_background
    {
        return true;
    }
    if has_indent && (has_syntax || has_markers) {
        return true;
    }
    if is_bash && (has_background || has_monospace) {
        return true;
    }
    if has_syntax && len < 200 {
        return true;
    }
    // URL/path tokens, but not a paragraph that is itself a bare URL
    if TECH_TOKENS.iter().any(|t| text.contains(t))
        && !text.starts_with("http://")
        && !text.starts_with("https://")
        && len < 150
    {
        return true;
    }
    let lower = text.to_lowercase();
    if len < 80 && COMMAND_VERBS.iter().any(|cmd| lower.contains(cmd)) {
        return true;
    }

    false
}

/// Fraction of the paragraph's run-text length carrying a highlight
fn background_ratio(para: &Paragraph) -> f64 {
    let total: usize = para.runs.iter().map(|r| r.text.chars().count()).sum();
    if total == 0 {
        return 0.0;
    }
    let highlighted: usize = para
        .runs
        .iter()
        .filter(|r| r.highlight)
        .map(|r| r.text.chars().count())
        .sum();
    highlighted as f64 / total as f64
}

/// Generic code markers: balanced braces, assignment with statement
/// terminator, Python-style colon plus control keyword, HTML-like tags
fn generic_markers(text: &str) -> bool {
    (text.contains('{') && text.contains('}'))
        || (text.contains('=') && text.contains(';'))
        || (text.contains(':')
            && ["if", "else", "for", "while", "try", "except", "finally"]
                .iter()
                .any(|kw| text.contains(kw)))
        || (text.contains('<') && text.contains('>') && text.contains('/'))
}

/// Ordered language-guess table: first family whose pattern matches wins
static LANGUAGE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("python", r"\b(def|class|import|from|print)\b"),
        (
            "javascript",
            r"\b(function|var|let|const|require|console\.log)\b",
        ),
        (
            "sql",
            r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER)\b",
        ),
        ("bash", r"\b(docker|apt|yum|rpm|git|cd|mkdir|tar|curl)\b"),
        ("html", r"<\w+>.*?</\w+>|<\w+.*?/>"),
        ("cpp", r"^\s*#include|int\s+main\s*\("),
        (
            "java",
            r"\b(package|import java|public class|public static void main)\b",
        ),
        (
            "csharp",
            r"\b(using System|namespace|public class|private void)\b",
        ),
        ("go", r"\b(func|package main|import \(|fmt\.)\b"),
        ("php", r"<\?php|\b(echo|namespace|use [\w\\]+;)\b"),
        ("rust", r"\b(fn|let mut|impl|struct|enum|match)\b"),
        (
            "r",
            r"\b(library|tidyverse|dplyr|ggplot2|data\.frame)\b",
        ),
        ("yaml", r"(^|\n)[ \t]*(#|//|;)[ \t]*\[?[A-Za-z0-9\-_]+\]?[ \t]*:"),
        ("json", r#"\{\s*"[^"]+"\s*:\s*[^{}]+\}"#),
        (
            "typescript",
            r"\b(module|export|component|ngOnInit|@Input|@Output)\b",
        ),
        ("jquery", r"\$\(.*\)|\$\.\w+\("),
        (
            "vue",
            r"<template>|export default \{|methods:|computed:",
        ),
    ]
    .iter()
    .map(|(lang, p)| (*lang, Regex::new(p).expect("valid language pattern")))
    .collect()
});

/// Guess the fence language tag for a code block.
/// Returns "" when no family matches (untagged fence).
pub fn guess_language(text: &str) -> &'static str {
    let text = text.trim();
    for (lang, re) in LANGUAGE_PATTERNS.iter() {
        if re.is_match(text) {
            return lang;
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Indent, Run, StyleDescriptor};

    fn para(text: &str) -> Paragraph {
        Paragraph::from_text(text)
    }

    fn shaded(text: &str) -> Paragraph {
        Paragraph {
            text: text.into(),
            runs: vec![],
            style: StyleDescriptor {
                shading_fill: Some("D9D9D9".into()),
                ..StyleDescriptor::default()
            },
        }
    }

    #[test]
    fn test_style_name_is_authoritative() {
        let mut p = para("anything goes");
        p.style.style_name = Some("Source Code".into());
        assert!(is_code(&p));
        p.style.style_name = Some("代码块".into());
        assert!(is_code(&p));
    }

    #[test]
    fn test_background_alone_is_code() {
        assert!(is_code(&shaded("def f():\n    return 1")));
        assert!(is_code(&shaded("just shaded prose")));
    }

    #[test]
    fn test_highlight_ratio() {
        let p = Paragraph {
            text: "x = compute(y);".into(),
            runs: vec![
                Run {
                    text: "x = compute".into(),
                    highlight: true,
                    ..Run::default()
                },
                Run {
                    text: "(y);".into(),
                    highlight: false,
                    ..Run::default()
                },
            ],
            style: StyleDescriptor::default(),
        };
        // 11 of 15 chars highlighted, above the 60% threshold
        assert!(background_ratio(&p) > 0.6);
        assert!(is_code(&p));
    }

    #[test]
    fn test_syntax_short_text() {
        assert!(is_code(&para("def handler(event):")));
        assert!(is_code(&para("SELECT id FROM users WHERE age > 30")));
        assert!(is_code(&para("git commit -m \"fix\"")));
    }

    #[test]
    fn test_monospace_with_syntax() {
        let p = Paragraph {
            text: "for (i = 0; i < n; i++)".into(),
            runs: vec![Run {
                text: "for (i = 0; i < n; i++)".into(),
                font_name: Some("Consolas".into()),
                ..Run::default()
            }],
            style: StyleDescriptor::default(),
        };
        assert!(is_code(&p));
    }

    #[test]
    fn test_indent_with_markers() {
        let p = Paragraph {
            text: "result = value;".into(),
            runs: vec![],
            style: StyleDescriptor {
                left_indent: Some(Indent::Pt(24.0)),
                ..StyleDescriptor::default()
            },
        };
        assert!(is_code(&p));
    }

    #[test]
    fn test_bare_url_is_not_code() {
        assert!(!is_code(&para("https://example.com/docs")));
    }

    #[test]
    fn test_path_token_is_code() {
        assert!(is_code(&para("配置文件位于 /usr/local/etc/app.conf")));
    }

    #[test]
    fn test_plain_prose_is_not_code() {
        assert!(!is_code(&para("This paragraph describes the system in plain prose without any technical markers at all, and it is long enough that nothing short-circuits.")));
        assert!(!is_code(&para("")));
    }

    #[test]
    fn test_guess_language_python() {
        assert_eq!(guess_language("def f():\n    return 1"), "python");
    }

    #[test]
    fn test_guess_language_ordering() {
        // "function" hits javascript before later families
        assert_eq!(guess_language("function render() {}"), "javascript");
        assert_eq!(guess_language("SELECT * FROM t"), "sql");
        assert_eq!(guess_language("docker run -it ubuntu"), "bash");
        assert_eq!(guess_language("#include <stdio.h>"), "cpp");
        assert_eq!(guess_language("fn main() {}"), "rust");
    }

    #[test]
    fn test_guess_language_unknown() {
        assert_eq!(guess_language("nothing recognizable here"), "");
    }
}

//! Plain-text to markdown normalization for assistant replies
//!
//! Agent replies often arrive as loosely formatted prose with literal `\n`
//! escapes instead of line breaks, and with code pasted in as bare lines.
//! This module guesses paragraph, list, and code structure so that a regular
//! markdown renderer produces something readable.
//!
//! The code detection is a fixed heuristic and misfires on some prose: a
//! paragraph of three or more lines where any line looks like `word:` is
//! treated as code. That behaviour is kept as-is.

use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

static CODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Keyword-leading lines
        r"(?m)^(import|from|def|class|function|const|let|var|if|for|while)",
        // Assignment or key-like lines
        r"(?m)^[ ]*[a-zA-Z_][a-zA-Z0-9_]*\s*[=:]",
        // Brace or bracket-leading lines
        r"(?m)^[ ]*[{}\[\]()]",
        // Comments
        r"(?m)^\s*//|^\s*#|^\s*/\*",
        // Trailing semicolons
        r"(?m);\s*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("code pattern is valid"))
    .collect()
});

/// Language tag guessed for a paragraph classified as code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    C,
    Java,
    Text,
}

impl Language {
    /// Guess from a fixed set of indicators. First family to match wins.
    pub fn guess(code: &str) -> Self {
        let has_any = |needles: &[&str]| needles.iter().any(|n| code.contains(n));

        if has_any(&["import ", "def ", "print("]) {
            Language::Python
        } else if has_any(&["function ", "const ", "console.log"]) {
            Language::JavaScript
        } else if has_any(&["#include", "int main"]) {
            Language::C
        } else if has_any(&["public class", "System.out"]) {
            Language::Java
        } else {
            Language::Text
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::C => "c",
            Language::Java => "java",
            Language::Text => "text",
        }
    }
}

/// One paragraph of normalized output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Ordinary prose, emitted unchanged
    Plain(String),
    /// Bullet list, emitted unchanged so markdown handles it
    List(String),
    /// Bare code that gets wrapped in a fence
    Code { language: Language, body: String },
    /// Text that is already inside a markdown fence
    Fenced(String),
}

impl Block {
    pub fn to_markdown(&self) -> String {
        match self {
            Block::Plain(text) | Block::List(text) | Block::Fenced(text) => text.clone(),
            Block::Code { language, body } => {
                format!("{FENCE}{}\n{body}\n{FENCE}", language.tag())
            }
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Block::Code { .. })
    }
}

/// Replace literal `\n\n` and `\n` escape sequences with real line breaks.
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n\\n", "\n\n").replace("\\n", "\n")
}

fn looks_like_list(paragraph: &str) -> bool {
    paragraph.starts_with("- ")
        || paragraph.starts_with("* ")
        || paragraph.contains("\n- ")
        || paragraph.contains("\n* ")
}

fn looks_like_code(paragraph: &str) -> bool {
    let has_code = CODE_PATTERNS.iter().any(|p| p.is_match(paragraph));
    has_code && paragraph.split('\n').count() > 2
}

/// Classify a single trimmed paragraph. The list check runs first, so a
/// paragraph with both bullets and code-like lines stays a list.
pub fn classify(paragraph: &str) -> Block {
    if looks_like_list(paragraph) {
        return Block::List(paragraph.to_string());
    }

    if looks_like_code(paragraph) {
        return Block::Code {
            language: Language::guess(paragraph),
            body: paragraph.to_string(),
        };
    }

    Block::Plain(paragraph.to_string())
}

fn fence_lines(paragraph: &str) -> usize {
    paragraph
        .lines()
        .filter(|line| line.trim_start().starts_with(FENCE))
        .count()
}

/// Split `text` into classified paragraphs.
///
/// Paragraphs that sit inside an existing fence are passed through, so
/// feeding this module its own output never nests fences.
pub fn normalize_blocks(text: &str) -> Vec<Block> {
    let converted = unescape_newlines(text);
    let mut in_fence = false;

    converted
        .split("\n\n")
        .map(|paragraph| {
            let paragraph = paragraph.trim();

            if in_fence || paragraph.starts_with(FENCE) {
                if fence_lines(paragraph) % 2 == 1 {
                    in_fence = !in_fence;
                }
                return Block::Fenced(paragraph.to_string());
            }

            classify(paragraph)
        })
        .collect()
}

/// Convert loosely formatted assistant text into markdown.
pub fn normalize(text: &str) -> String {
    normalize_blocks(text)
        .iter()
        .map(Block::to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

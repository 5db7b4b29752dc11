//! Markdown to HTML mapping for assistant messages
//!
//! Walks the pulldown-cmark event stream and emits HTML with the class names
//! the chat page styles against. Raw HTML inside a message is escaped, never
//! passed through.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

const INLINE_CODE: &str = "bg-gray-100 dark:bg-gray-700 text-gray-900 dark:text-gray-100 px-1.5 py-0.5 rounded text-sm font-mono border";
const CODE_BLOCK: &str =
    "bg-gray-900 dark:bg-gray-800 text-gray-100 rounded-lg p-4 my-4 overflow-x-auto border";
const CODE_BLOCK_INNER: &str = "text-sm font-mono whitespace-pre";
const PARAGRAPH: &str = "mb-3 leading-relaxed whitespace-pre-line";
const H1: &str = "text-xl font-bold mb-3 text-gray-900 dark:text-gray-100";
const H2: &str = "text-lg font-semibold mb-2 text-gray-900 dark:text-gray-100";
const H3: &str = "text-md font-medium mb-2 text-gray-900 dark:text-gray-100";
const UL: &str = "list-disc ml-6 mb-3 space-y-1";
const OL: &str = "list-decimal ml-6 mb-3 space-y-1";
const LI: &str = "leading-relaxed";
const LINK: &str =
    "text-blue-600 dark:text-blue-400 underline hover:text-blue-800 dark:hover:text-blue-300";
const TABLE_WRAP: &str = "overflow-x-auto my-4";
const TABLE: &str = "min-w-full border border-gray-300 dark:border-gray-600 rounded-lg";
const TH: &str = "border border-gray-300 dark:border-gray-600 bg-gray-50 dark:bg-gray-700 px-3 py-2 text-left font-semibold";
const TD: &str = "border border-gray-300 dark:border-gray-600 px-3 py-2";
const BLOCKQUOTE: &str =
    "border-l-4 border-gray-300 dark:border-gray-600 pl-4 my-3 italic text-gray-700 dark:text-gray-300";
const STRONG: &str = "font-semibold text-gray-900 dark:text-gray-100";
const EM: &str = "italic";

/// Escape text for use in HTML content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a text node, turning literal `\n` sequences and real newlines into
/// explicit `<br />` breaks.
pub fn text_with_breaks(text: &str) -> String {
    text.replace("\\n", "\n")
        .split('\n')
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br />")
}

fn safe_href(dest: &str) -> String {
    let scheme = dest.trim_start().to_ascii_lowercase();
    if scheme.starts_with("javascript:") || scheme.starts_with("vbscript:") {
        return "#".to_string();
    }
    escape_html(dest)
}

fn heading_class(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => H1,
        HeadingLevel::H2 => H2,
        _ => H3,
    }
}

/// What to emit when the matching end event arrives
enum Frame {
    Close(String),
    TableHead,
    CodeBlock,
}

#[derive(Default)]
struct HtmlWriter {
    out: String,
    stack: Vec<Frame>,
    in_table_head: bool,
    in_code_block: bool,
}

impl HtmlWriter {
    fn open(&mut self, open: String, close: impl Into<String>) {
        self.out.push_str(&open);
        self.stack.push(Frame::Close(close.into()));
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(format!("<p class=\"{PARAGRAPH}\">"), "</p>"),
            Tag::Heading { level, .. } => self.open(
                format!("<{level} class=\"{}\">", heading_class(level)),
                format!("</{level}>"),
            ),
            Tag::BlockQuote(..) => self.open(
                format!("<blockquote class=\"{BLOCKQUOTE}\">"),
                "</blockquote>",
            ),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| format!(" language-{}", escape_html(lang)))
                        .unwrap_or_default(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.out.push_str(&format!(
                    "<pre class=\"{CODE_BLOCK}\"><code class=\"{CODE_BLOCK_INNER}{language}\">"
                ));
                self.in_code_block = true;
                self.stack.push(Frame::CodeBlock);
            }
            Tag::List(Some(1)) => self.open(format!("<ol class=\"{OL}\">"), "</ol>"),
            Tag::List(Some(start)) => self.open(
                format!("<ol class=\"{OL}\" start=\"{start}\">"),
                "</ol>",
            ),
            Tag::List(None) => self.open(format!("<ul class=\"{UL}\">"), "</ul>"),
            Tag::Item => self.open(format!("<li class=\"{LI}\">"), "</li>"),
            Tag::Table(_) => self.open(
                format!("<div class=\"{TABLE_WRAP}\"><table class=\"{TABLE}\">"),
                "</tbody></table></div>",
            ),
            Tag::TableHead => {
                self.out.push_str("<thead><tr>");
                self.in_table_head = true;
                self.stack.push(Frame::TableHead);
            }
            Tag::TableRow => self.open("<tr>".to_string(), "</tr>"),
            Tag::TableCell => {
                if self.in_table_head {
                    self.open(format!("<th class=\"{TH}\">"), "</th>");
                } else {
                    self.open(format!("<td class=\"{TD}\">"), "</td>");
                }
            }
            Tag::Emphasis => self.open(format!("<em class=\"{EM}\">"), "</em>"),
            Tag::Strong => self.open(format!("<strong class=\"{STRONG}\">"), "</strong>"),
            Tag::Strikethrough => self.open("<del>".to_string(), "</del>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let title = if title.is_empty() {
                    String::new()
                } else {
                    format!(" title=\"{}\"", escape_html(&title))
                };
                self.open(
                    format!(
                        "<a href=\"{}\"{title} target=\"_blank\" rel=\"noopener noreferrer\" class=\"{LINK}\">",
                        safe_href(&dest_url)
                    ),
                    "</a>",
                );
            }
            // Images, footnotes, and metadata degrade to their inner text
            _ => self.stack.push(Frame::Close(String::new())),
        }
    }

    fn end(&mut self) {
        match self.stack.pop() {
            Some(Frame::Close(close)) => self.out.push_str(&close),
            Some(Frame::TableHead) => {
                self.out.push_str("</tr></thead><tbody>");
                self.in_table_head = false;
            }
            Some(Frame::CodeBlock) => {
                self.out.push_str("</code></pre>");
                self.in_code_block = false;
            }
            None => {}
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) if self.in_code_block => self.out.push_str(&escape_html(&text)),
            Event::Text(text) => self.out.push_str(&text_with_breaks(&text)),
            Event::Code(code) => self.out.push_str(&format!(
                "<code class=\"{INLINE_CODE}\">{}</code>",
                escape_html(&code)
            )),
            Event::Html(html) | Event::InlineHtml(html) => {
                self.out.push_str(&text_with_breaks(&html))
            }
            Event::SoftBreak | Event::HardBreak => self.out.push_str("<br />"),
            Event::Rule => self.out.push_str("<hr />"),
            Event::TaskListMarker(checked) => self.out.push_str(if checked {
                "<input type=\"checkbox\" disabled checked /> "
            } else {
                "<input type=\"checkbox\" disabled /> "
            }),
            _ => {}
        }
    }
}

/// Render markdown to an HTML fragment with the chat page's classes.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut writer = HtmlWriter::default();
    for event in Parser::new_ext(markdown, options) {
        writer.event(event);
    }
    writer.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_node_breaks_on_newlines() {
        assert_eq!(text_with_breaks("a\\nb\nc"), "a<br />b<br />c");
        assert_eq!(text_with_breaks("<b>"), "&lt;b&gt;");
    }

    #[test]
    fn test_fenced_code_block_keeps_language() {
        let html = markdown_to_html("```python\nx = 1\n```");
        assert!(html.starts_with("<pre class=\""));
        assert!(html.contains("language-python"));
        assert!(html.contains("x = 1\n</code></pre>"));
        assert!(!html.contains("<br />"));
    }

    #[test]
    fn test_inline_code_is_small_span() {
        let html = markdown_to_html("use `cargo` here");
        assert!(html.contains(&format!("<code class=\"{INLINE_CODE}\">cargo</code>")));
    }

    #[test]
    fn test_headings_three_levels() {
        let html = markdown_to_html("# One\n\n## Two\n\n### Three\n\n#### Four");
        assert!(html.contains(&format!("<h1 class=\"{H1}\">One</h1>")));
        assert!(html.contains(&format!("<h2 class=\"{H2}\">Two</h2>")));
        assert!(html.contains(&format!("<h3 class=\"{H3}\">Three</h3>")));
        assert!(html.contains(&format!("<h4 class=\"{H3}\">Four</h4>")));
    }

    #[test]
    fn test_links_open_in_new_context() {
        let html = markdown_to_html("[docs](https://docs.letta.com)");
        assert!(html.contains("href=\"https://docs.letta.com\""));
        assert!(html.contains("target=\"_blank\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
    }

    #[test]
    fn test_script_links_neutralized() {
        let html = markdown_to_html("[x](javascript:alert(1))");
        assert!(html.contains("href=\"#\""));
    }

    #[test]
    fn test_lists() {
        let html = markdown_to_html("- a\n- b\n\n1. one\n2. two");
        assert!(html.contains(&format!("<ul class=\"{UL}\">")));
        assert!(html.contains(&format!("<ol class=\"{OL}\">")));
        assert_eq!(html.matches("<li ").count(), 4);
    }

    #[test]
    fn test_table_is_wrapped_and_bordered() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.starts_with(&format!("<div class=\"{TABLE_WRAP}\"><table")));
        assert!(html.contains(&format!("<th class=\"{TH}\">a</th>")));
        assert!(html.contains(&format!("<td class=\"{TD}\">2</td>")));
        assert!(html.ends_with("</tbody></table></div>"));
    }

    #[test]
    fn test_blockquote_and_inline_styles() {
        let html = markdown_to_html("> **bold** and *soft*");
        assert!(html.contains(&format!("<blockquote class=\"{BLOCKQUOTE}\">")));
        assert!(html.contains(&format!("<strong class=\"{STRONG}\">bold</strong>")));
        assert!(html.contains(&format!("<em class=\"{EM}\">soft</em>")));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = markdown_to_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_soft_break_becomes_line_break() {
        let html = markdown_to_html("line one\nline two");
        assert_eq!(
            html,
            format!("<p class=\"{PARAGRAPH}\">line one<br />line two</p>")
        );
    }
}

//! Markdown rendering as an ordered pipeline of text rewrites.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::code_block;
use crate::util::{escape_html, replace_outside_tags};

/// Instance namespace used by [`MarkdownRenderer::default`].
const DEFAULT_INSTANCE_ID: &str = "md";

/// Ordered substitution applied with [`Regex::replace_all`].
struct Substitution {
    pattern: Regex,
    replacement: &'static str,
}

impl Substitution {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        let pattern = Regex::new(pattern).expect("markdown pattern should compile");
        Self {
            pattern,
            replacement,
        }
    }
}

static HEADINGS: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    vec![
        Substitution::new(r"(?m)^###[ \t]+(.+?)[ \t]*$", "<h3>${1}</h3>"),
        Substitution::new(r"(?m)^##[ \t]+(.+?)[ \t]*$", "<h2>${1}</h2>"),
        Substitution::new(r"(?m)^#[ \t]+(.+?)[ \t]*$", "<h1>${1}</h1>"),
    ]
});

// Bold before italic, otherwise `**x**` tokenizes as nested italics
static EMPHASIS: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    vec![
        Substitution::new(r"\*\*([^\n]+?)\*\*", "<strong>${1}</strong>"),
        Substitution::new(r"\b__([^\n]+?)__\b", "<strong>${1}</strong>"),
        Substitution::new(r"\*([^\s*][^*\n]*?)\*", "<em>${1}</em>"),
        Substitution::new(r"\b_([^_\n]+)_\b", "<em>${1}</em>"),
    ]
});

static INLINE_CODE: LazyLock<Substitution> =
    LazyLock::new(|| Substitution::new(r"`([^`\n]+)`", "<code>${1}</code>"));

static LINK: LazyLock<Substitution> = LazyLock::new(|| {
    Substitution::new(
        r#"\[([^\]\n]+)\]\(([^)\s"]+)\)"#,
        r#"<a href="${2}" target="_blank" rel="noopener noreferrer">${1}</a>"#,
    )
});

static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*\d+\.[ \t]+(.*)$").expect("list pattern should compile")
});

static UNORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*[-*][ \t]+(.*)$").expect("list pattern should compile")
});

static BLOCKQUOTE: LazyLock<Substitution> = LazyLock::new(|| {
    Substitution::new(r"(?m)^&gt;[ \t]?(.*)$", "<blockquote>${1}</blockquote>")
});

static RULE: LazyLock<Substitution> =
    LazyLock::new(|| Substitution::new(r"(?m)^---[ \t]*$", "<hr>"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern should compile"));

/// Opening tags that mark a line as block level during paragraph grouping.
const BLOCK_TAGS: &[&str] = &["<h1>", "<h2>", "<h3>", "<ul>", "<ol>", "<blockquote>", "<hr>"];

/// Kind of list a list item line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    fn tag(&self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

/// Renders the lightweight Markdown dialect used in course content.
///
/// Rendering is best effort and never fails: malformed input produces
/// mis-rendered markup, never an error. Each call owns its code block
/// table, so one renderer can be shared freely.
///
/// Supported syntax: fenced code blocks with optional language tag,
/// headings up to level three, bold and italic, inline code, links,
/// ordered and unordered lists, blockquotes, horizontal rules and
/// paragraphs.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    instance_id: String,
}

impl MarkdownRenderer {
    /// Creates renderer with an instance namespace.
    ///
    /// The namespace is embedded in every code block identifier, so two
    /// renderers with different identifiers can place their fragments on
    /// one page without collisions.
    ///
    /// # Arguments
    ///
    /// * `instance_id`: Namespace for code block identifiers
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }

    /// Instance namespace for code block identifiers.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// DOM identifier this renderer gives the code block at `index`.
    ///
    /// Matches the copy button's `data-code-id` and the hidden holder's
    /// `id` in rendered fragments.
    pub fn code_id(&self, index: usize) -> String {
        code_block::dom_id(&self.instance_id, index)
    }

    /// Renders markdown content to an HTML fragment.
    ///
    /// Code blocks are swapped for placeholder tokens first, so none of the
    /// later rewrites touch code. The remaining text is escaped, then
    /// headings, emphasis, inline code, links, lists, blockquotes, rules and
    /// paragraphs are applied in that order. Finally each placeholder is
    /// replaced by its highlighted block.
    ///
    /// # Arguments
    ///
    /// * `content`: Markdown content to render
    ///
    /// # Returns
    ///
    /// HTML fragment; empty for blank input
    pub fn render(&self, content: &str) -> String {
        let text = normalize(content);
        let (text, blocks) = code_block::extract(&text);

        let html = escape_html(&text);
        let html = render_headings(&html);
        let html = render_emphasis(&html);
        let html = apply(&INLINE_CODE, &html);
        let html = apply(&LINK, &html);
        let html = render_lists(&html);
        let html = render_blockquotes(&html);
        let html = apply(&RULE, &html);
        let html = wrap_paragraphs(&html);
        let html = code_block::restore(&html, &blocks, &self.instance_id);

        debug!(
            instance_id = %self.instance_id,
            input_bytes = content.len(),
            output_bytes = html.len(),
            code_blocks = blocks.len(),
            "Rendered markdown"
        );

        html
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_INSTANCE_ID)
    }
}

/// Renders markdown content with a one-off renderer.
///
/// # Examples
///
/// ```
/// let html = lessonmark::render("**bold** and *italic*", "demo");
/// assert_eq!(html, "<p><strong>bold</strong> and <em>italic</em></p>");
/// ```
pub fn render(source: &str, instance_id: &str) -> String {
    MarkdownRenderer::new(instance_id).render(source)
}

/// Unifies line endings.
fn normalize(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

fn apply(substitution: &Substitution, html: &str) -> String {
    substitution
        .pattern
        .replace_all(html, substitution.replacement)
        .into_owned()
}

fn render_headings(html: &str) -> String {
    HEADINGS
        .iter()
        .fold(html.to_string(), |html, heading| apply(heading, &html))
}

/// Applies bold then italic rules.
///
/// Rules only rewrite text between tags, so a delimiter left inside a bold
/// span never pairs with one outside it.
fn render_emphasis(html: &str) -> String {
    EMPHASIS.iter().fold(html.to_string(), |html, emphasis| {
        replace_outside_tags(&html, &emphasis.pattern, emphasis.replacement)
    })
}

/// Classifies a line as a list item and returns its content.
fn list_item(line: &str) -> Option<(ListKind, &str)> {
    let (kind, caps) = if let Some(caps) = ORDERED_ITEM.captures(line) {
        (ListKind::Ordered, caps)
    } else {
        (ListKind::Unordered, UNORDERED_ITEM.captures(line)?)
    };

    caps.get(1).map(|m| (kind, m.as_str()))
}

/// Converts list item lines and merges contiguous runs into lists.
///
/// Every item line becomes an `<li>`. A run of adjacent items of the same
/// kind is greedily gathered into one `<ol>` or `<ul>` written on a single
/// line; a different kind or any other line ends the run.
fn render_lists(html: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut run: Option<(ListKind, Vec<&str>)> = None;

    for line in html.split('\n') {
        let Some((kind, item)) = list_item(line) else {
            if let Some(finished) = run.take() {
                lines.push(close_list(finished));
            }
            lines.push(line.to_string());
            continue;
        };

        match run.as_mut() {
            Some((current, items)) if *current == kind => items.push(item),
            _ => {
                if let Some(finished) = run.replace((kind, vec![item])) {
                    lines.push(close_list(finished));
                }
            }
        }
    }

    if let Some(finished) = run {
        lines.push(close_list(finished));
    }

    lines.join("\n")
}

fn close_list((kind, items): (ListKind, Vec<&str>)) -> String {
    let tag = kind.tag();
    let mut list = format!("<{}>", tag);
    for item in items {
        list.push_str("<li>");
        list.push_str(item);
        list.push_str("</li>");
    }
    list.push_str(&format!("</{}>", tag));
    list
}

/// Converts quoted lines; adjacent quoted lines share one blockquote.
fn render_blockquotes(html: &str) -> String {
    apply(&BLOCKQUOTE, html).replace("</blockquote>\n<blockquote>", "<br>")
}

fn is_block_line(line: &str) -> bool {
    let line = line.trim_start();
    BLOCK_TAGS.iter().any(|tag| line.starts_with(tag)) || code_block::is_placeholder_line(line)
}

/// Groups text into paragraphs.
///
/// Blank lines separate chunks. Inside a chunk, consecutive lines that are
/// not block level are wrapped together in one `<p>`; block level lines are
/// written as they are. Whitespace around a paragraph is dropped, inner
/// line breaks and indentation are kept.
fn wrap_paragraphs(html: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for chunk in PARAGRAPH_BREAK.split(html.trim()) {
        let mut paragraph: Vec<&str> = Vec::new();

        for line in chunk.split('\n') {
            if is_block_line(line) {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(line.trim().to_string());
            } else if !line.trim().is_empty() {
                paragraph.push(line);
            }
        }

        flush_paragraph(&mut paragraph, &mut blocks);
    }

    blocks.join("\n")
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    blocks.push(format!("<p>{}</p>", paragraph.join("\n").trim()));
    paragraph.clear();
}

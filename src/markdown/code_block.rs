//! Fenced code block extraction, placeholders and block markup.

use maud::{Markup, PreEscaped, html};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::highlight::highlight;

/// Delimits placeholder tokens. Stripped from text outside fences so a
/// document can never contain a forged token.
const PLACEHOLDER_DELIMITER: char = '\u{1A}';

/// Label shown in the header of a block without a language tag.
const DEFAULT_LABEL: &str = "text";

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?P<lang>[^\s`]*)[^\n]*\n(?P<code>.*?)```")
        .expect("fence pattern should compile")
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1ACODEBLOCK(?P<index>\d+)\x1A").expect("placeholder pattern should compile")
});

static PLACEHOLDER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\x1ACODEBLOCK\d+\x1A$").expect("placeholder pattern should compile")
});

/// Code fenced with triple backticks.
///
/// Holds the language tag and raw source exactly as written between the
/// fences, minus the final line break and any indentation before the
/// closing fence, plus the block position in its
/// document. The position keys the DOM identifier shared by the copy button
/// and the hidden raw-source holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    language: String,
    source: String,
    index: usize,
}

impl CodeBlock {
    /// Creates a code block.
    pub fn new(language: impl Into<String>, source: impl Into<String>, index: usize) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            index,
        }
    }

    /// Language tag from the opening fence, empty when omitted.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Raw, unescaped source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Zero based position of the block in its document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Header label, falling back to `text` for untagged blocks.
    pub fn label(&self) -> &str {
        if self.language.is_empty() {
            DEFAULT_LABEL
        } else {
            &self.language
        }
    }

    /// DOM identifier of the hidden raw-source holder.
    ///
    /// Namespaced by renderer instance so several rendered fragments on one
    /// page never share an identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use lessonmark::CodeBlock;
    ///
    /// let block = CodeBlock::new("js", "let a;", 2);
    /// assert_eq!(block.dom_id("abc"), "code-abc-2");
    /// ```
    pub fn dom_id(&self, instance_id: &str) -> String {
        dom_id(instance_id, self.index)
    }

    /// Renders the block with header, highlighted body and hidden source.
    ///
    /// The copy button carries the holder identifier in `data-code-id`; the
    /// view layer attaches the click handler.
    ///
    /// # Arguments
    ///
    /// * `instance_id`: Renderer instance namespace
    ///
    /// # Returns
    ///
    /// Code block markup
    pub fn render(&self, instance_id: &str) -> Markup {
        let id = self.dom_id(instance_id);
        let label = self.label();

        html! {
            div class="code-block" data-language=(label) {
                div class="code-header" {
                    span class="code-lang" { (label) }
                    button type="button" class="copy-btn" data-code-id=(id) aria-label="Copy code" {
                        "Copy"
                    }
                }
                pre {
                    code class=(format!("language-{}", label)) {
                        (PreEscaped(highlight(&self.source, &self.language)))
                    }
                }
                textarea id=(id) class="code-raw" hidden readonly { (self.source) }
            }
        }
    }
}

/// DOM identifier of the block at `index` within instance `instance_id`.
pub(crate) fn dom_id(instance_id: &str, index: usize) -> String {
    format!("code-{}-{}", instance_id, index)
}

/// Placeholder token for the block at `index`.
pub(crate) fn placeholder(index: usize) -> String {
    format!(
        "{delim}CODEBLOCK{index}{delim}",
        delim = PLACEHOLDER_DELIMITER
    )
}

/// Whether a line consists of a single placeholder token.
pub(crate) fn is_placeholder_line(line: &str) -> bool {
    PLACEHOLDER_LINE.is_match(line.trim())
}

/// Replaces fenced regions with placeholder tokens.
///
/// Unterminated fences do not match and stay in the text. The placeholder
/// delimiter is removed from text outside fences; code bodies keep it.
///
/// # Arguments
///
/// * `text`: Document text with normalized line endings
///
/// # Returns
///
/// Text with placeholders and the extracted blocks in document order
pub(crate) fn extract(text: &str) -> (String, Vec<CodeBlock>) {
    let mut blocks = Vec::new();
    let mut replaced = String::with_capacity(text.len());
    let mut last = 0;

    for caps in FENCE.captures_iter(text) {
        let Some(fence) = caps.get(0) else {
            continue;
        };
        push_text(&mut replaced, &text[last..fence.start()]);
        last = fence.end();

        let language = caps.name("lang").map_or("", |m| m.as_str());
        let code = caps.name("code").map_or("", |m| m.as_str());

        let index = blocks.len();
        blocks.push(CodeBlock::new(
            language.replace(PLACEHOLDER_DELIMITER, ""),
            fence_body(code),
            index,
        ));
        replaced.push_str(&placeholder(index));
    }

    push_text(&mut replaced, &text[last..]);
    (replaced, blocks)
}

fn push_text(out: &mut String, text: &str) {
    out.extend(text.chars().filter(|&c| c != PLACEHOLDER_DELIMITER));
}

/// Drops the last line break of a fence body along with the indentation
/// of the closing fence that follows it.
fn fence_body(code: &str) -> &str {
    match code.rfind('\n') {
        Some(pos) if code[pos + 1..].trim_matches([' ', '\t']).is_empty() => &code[..pos],
        _ => code,
    }
}

/// Replaces every placeholder token with its rendered block.
///
/// Each index appears once in the text, so each block is substituted
/// exactly once. A token without a matching block is dropped rather than
/// leaked.
pub(crate) fn restore(html: &str, blocks: &[CodeBlock], instance_id: &str) -> String {
    PLACEHOLDER
        .replace_all(html, |caps: &Captures<'_>| {
            caps["index"]
                .parse::<usize>()
                .ok()
                .and_then(|index| blocks.get(index))
                .map(|block| block.render(instance_id).into_string())
                .unwrap_or_default()
        })
        .into_owned()
}

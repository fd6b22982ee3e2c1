//! Text utilities shared by the renderer and highlighter

use regex::{Regex, Replacer};

/// Escapes the three characters that can open markup.
///
/// Replaces `&` first so entities produced for `<` and `>` are not escaped
/// twice. Quotes are left untouched; fragments never place user text inside
/// attribute values except link targets, which are delimited by the link
/// pattern itself.
///
/// # Arguments
///
/// * `text`: Plain text to escape
///
/// # Returns
///
/// Text safe to place between HTML tags
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Reverses [`escape_html`] plus the quote entities maud emits.
///
/// `&amp;` is decoded last so `&amp;lt;` yields the literal text `&lt;`.
pub fn unescape_html(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Applies a regex replacement to text outside of HTML tags.
///
/// Input is assumed to be escaped, so every literal `<` opens a tag emitted
/// by an earlier rewrite. Tags are copied through untouched and each text
/// run between tags is rewritten independently, which means a match never
/// spans a tag boundary.
///
/// # Arguments
///
/// * `html`: Escaped text that may already contain markup
/// * `pattern`: Pattern to apply to each text run
/// * `replacement`: Replacement template or closure
///
/// # Returns
///
/// Rewritten HTML
pub fn replace_outside_tags<R: Replacer + Clone>(
    html: &str,
    pattern: &Regex,
    replacement: R,
) -> String {
    let mut result = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(tag_start) = rest.find('<') {
        let (text, tail) = rest.split_at(tag_start);
        result.push_str(&pattern.replace_all(text, replacement.clone()));

        let tag_end = tail.find('>').map_or(tail.len(), |pos| pos + 1);
        result.push_str(&tail[..tag_end]);
        rest = &tail[tag_end..];
    }

    result.push_str(&pattern.replace_all(rest, replacement));
    result
}

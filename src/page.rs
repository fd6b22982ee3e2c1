//! Standalone preview page wrapper

use maud::{DOCTYPE, Markup, PreEscaped, html};

const MARKDOWN_CSS: &str = include_str!("../assets/markdown.css");
const COPY_SCRIPT: &str = include_str!("../assets/copy.js");

/// Wraps a rendered fragment in a complete HTML document.
///
/// The stylesheet and the copy button script are inlined so the page works
/// from a single file. The script reads each button's `data-code-id`, copies
/// the hidden holder's text, shows "Copied!" for two seconds, and raises a
/// short toast when the clipboard refuses the write.
///
/// # Arguments
///
/// * `title`: Page title text
/// * `fragment`: Fragment produced by the markdown renderer
///
/// # Returns
///
/// Complete HTML document
pub fn preview_page(title: &str, fragment: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(MARKDOWN_CSS)) }
            }
            body {
                article class="markdown-body" {
                    (PreEscaped(fragment))
                }
                script { (PreEscaped(COPY_SCRIPT)) }
            }
        }
    }
}

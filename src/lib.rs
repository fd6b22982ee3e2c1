//! Lightweight Markdown rendering for course content.

mod clipboard;
mod config;
mod highlight;
mod markdown;
mod page;
mod util;

pub use clipboard::{
    ACK_DURATION, Clipboard, CopyButton, CopyOutcome, MemoryClipboard, NOTIFICATION_DURATION,
    Notification, SystemClipboard, copy_code_block, extract_raw_source,
};
pub use config::Config;
pub use highlight::{HighlightClass, Language, highlight};
pub use markdown::{CodeBlock, MarkdownRenderer, render};
pub use page::preview_page;
pub use util::{escape_html, unescape_html};

//! Markdown rendering for the course content dialect.
//!
//! This module renders a small Markdown subset to HTML fragments with a
//! fixed pipeline of regex rewrites. Fenced code blocks are pulled out
//! before any rewrite runs and come back as highlighted blocks with a copy
//! button and a hidden copy of their raw source.

mod code_block;
mod renderer;

pub use code_block::CodeBlock;
pub use renderer::{MarkdownRenderer, render};

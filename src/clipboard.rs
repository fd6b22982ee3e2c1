//! Copy-to-clipboard flow for rendered code blocks.
//!
//! Every rendered code block carries a copy button and a hidden holder with
//! the block's escaped raw source. This module implements what happens on a
//! click: read the holder, write the clipboard, and show a short
//! acknowledgment on the button. A failed write only produces a transient
//! notification.

use anyhow::{Context, Result, anyhow};
use copypasta::{ClipboardContext, ClipboardProvider};
use maud::html;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::util::unescape_html;

/// How long a button shows the copied state after a successful copy.
pub const ACK_DURATION: Duration = Duration::from_secs(2);

/// How long a failure notification stays visible.
pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

/// Destination for copied text.
pub trait Clipboard {
    /// Replaces the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns error if the clipboard is unavailable or rejects the write
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// In-process clipboard holding the last written text.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written, if any.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Operating system clipboard.
///
/// The platform context is opened on the first write, so constructing one
/// never fails and a headless host only errors when a copy is attempted.
/// On X11 the selection is served by this process and lasts only while it
/// runs, unless a clipboard manager takes it over.
#[derive(Default)]
pub struct SystemClipboard {
    context: Option<ClipboardContext>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the platform clipboard context has been opened.
    pub fn is_open(&self) -> bool {
        self.context.is_some()
    }

    fn open(&mut self) -> Result<&mut ClipboardContext> {
        if self.context.is_none() {
            let context = ClipboardContext::new()
                .map_err(|e| anyhow!("Failed to open system clipboard: {}", e))?;
            self.context = Some(context);
        }

        self.context.as_mut().context("System clipboard is not open")
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.open()?
            .set_contents(text.to_string())
            .map_err(|e| anyhow!("Failed to write system clipboard: {}", e))
    }
}

/// Transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub duration: Duration,
}

impl Notification {
    fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duration: NOTIFICATION_DURATION,
        }
    }
}

/// Result of a copy click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Failed(Notification),
}

/// Acknowledgment state of one copy button.
///
/// Each successful copy arms its own timer. Timers are independent: the
/// first one to expire reverts the button, and later ones revert it again.
#[derive(Debug, Default, Clone)]
pub struct CopyButton {
    copied: bool,
    timers: Vec<Instant>,
}

impl CopyButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the button currently shows the copied state.
    pub fn is_copied(&self) -> bool {
        self.copied
    }

    /// Button caption for the current state.
    pub fn label(&self) -> &'static str {
        if self.copied { "Copied!" } else { "Copy" }
    }

    /// Enters the copied state and arms a revert timer.
    pub fn acknowledge(&mut self, now: Instant) {
        self.copied = true;
        self.timers.push(now + ACK_DURATION);
    }

    /// Fires every timer due at `now`.
    pub fn tick(&mut self, now: Instant) {
        let before = self.timers.len();
        self.timers.retain(|deadline| *deadline > now);
        if self.timers.len() < before {
            self.copied = false;
        }
    }
}

/// Reads the raw source of a code block from a rendered fragment.
///
/// Looks up the hidden holder by its DOM identifier and decodes its
/// content.
///
/// # Arguments
///
/// * `fragment`: Rendered HTML fragment
/// * `code_id`: Holder identifier, such as `code-abc-0`
///
/// # Returns
///
/// Raw source, or None when no holder has that identifier
pub fn extract_raw_source(fragment: &str, code_id: &str) -> Option<String> {
    // The holder id attribute is escaped by maud
    let escaped_id = html! { (code_id) }.into_string();
    let opening = format!("<textarea id=\"{}\"", escaped_id);
    let tag_start = fragment.find(&opening)?;
    let content_start = tag_start + fragment[tag_start..].find('>')? + 1;
    let content_end = content_start + fragment[content_start..].find("</textarea>")?;

    Some(unescape_html(&fragment[content_start..content_end]))
}

/// Handles a click on a code block copy button.
///
/// Never returns an error: a missing holder or a clipboard failure becomes
/// a transient notification and leaves the button untouched.
///
/// # Arguments
///
/// * `fragment`: Rendered HTML fragment containing the block
/// * `code_id`: Identifier from the button's `data-code-id`
/// * `clipboard`: Clipboard to write to
/// * `button`: Acknowledgment state of the clicked button
/// * `now`: Click time
///
/// # Returns
///
/// Copy outcome
pub fn copy_code_block(
    fragment: &str,
    code_id: &str,
    clipboard: &mut dyn Clipboard,
    button: &mut CopyButton,
    now: Instant,
) -> CopyOutcome {
    let Some(source) = extract_raw_source(fragment, code_id) else {
        warn!(code_id, "Code block not found");
        return CopyOutcome::Failed(Notification::transient("Code block not found"));
    };

    match clipboard.write_text(&source) {
        Ok(()) => {
            debug!(code_id, bytes = source.len(), "Copied code block");
            button.acknowledge(now);
            CopyOutcome::Copied
        }
        Err(e) => {
            warn!(code_id, error = %format!("{:#}", e), "Failed to copy code block");
            CopyOutcome::Failed(Notification::transient("Failed to copy code"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::render;

    struct DeniedClipboard;

    impl Clipboard for DeniedClipboard {
        fn write_text(&mut self, _text: &str) -> Result<()> {
            anyhow::bail!("Clipboard permission denied")
        }
    }

    #[test]
    fn test_extract_raw_source() {
        // Arrange
        let fragment = render("```js\nif (a < b && c) {}\n```", "abc");

        // Act
        let source = extract_raw_source(&fragment, "code-abc-0");

        // Assert
        assert_eq!(source.as_deref(), Some("if (a < b && c) {}"));
    }

    #[test]
    fn test_extract_raw_source_ignores_button_attribute() {
        // Arrange: the button's data-code-id also contains `id="code-abc-1"`
        let fragment = render("```\nfirst\n```\n\n```\nsecond\n```", "abc");

        // Act
        let source = extract_raw_source(&fragment, "code-abc-1");

        // Assert
        assert_eq!(source.as_deref(), Some("second"));
    }

    #[test]
    fn test_extract_raw_source_missing() {
        // Arrange & Act
        let source = extract_raw_source("<p>nothing</p>", "code-abc-0");

        // Assert
        assert!(source.is_none());
    }

    #[test]
    fn test_copy_success_acknowledges() {
        // Arrange
        let fragment = render("```py\nprint(\"hi\")\n```", "c");
        let mut clipboard = MemoryClipboard::new();
        let mut button = CopyButton::new();
        let now = Instant::now();

        // Act
        let outcome = copy_code_block(&fragment, "code-c-0", &mut clipboard, &mut button, now);

        // Assert
        assert_eq!(outcome, CopyOutcome::Copied);
        assert_eq!(clipboard.contents(), Some("print(\"hi\")"));
        assert!(button.is_copied());
        assert_eq!(button.label(), "Copied!");
    }

    #[test]
    fn test_copy_failure_notifies_without_state_change() {
        // Arrange
        let fragment = render("```\nx\n```", "c");
        let mut button = CopyButton::new();

        // Act
        let outcome = copy_code_block(
            &fragment,
            "code-c-0",
            &mut DeniedClipboard,
            &mut button,
            Instant::now(),
        );

        // Assert
        match outcome {
            CopyOutcome::Failed(notification) => {
                assert_eq!(notification.message, "Failed to copy code");
                assert_eq!(notification.duration, NOTIFICATION_DURATION);
            }
            CopyOutcome::Copied => panic!("Expected failure"),
        }
        assert!(!button.is_copied());
    }

    #[test]
    fn test_copy_unknown_block() {
        // Arrange
        let mut clipboard = MemoryClipboard::new();
        let mut button = CopyButton::new();

        // Act
        let outcome = copy_code_block(
            "<p>x</p>",
            "code-c-9",
            &mut clipboard,
            &mut button,
            Instant::now(),
        );

        // Assert
        assert!(matches!(outcome, CopyOutcome::Failed(_)));
        assert!(clipboard.contents().is_none());
    }

    #[test]
    fn test_button_reverts_after_ack_duration() {
        // Arrange
        let mut button = CopyButton::new();
        let start = Instant::now();
        button.acknowledge(start);

        // Act
        button.tick(start + Duration::from_millis(1999));
        let still_copied = button.is_copied();
        button.tick(start + ACK_DURATION);

        // Assert
        assert!(still_copied);
        assert!(!button.is_copied());
        assert_eq!(button.label(), "Copy");
    }

    #[test]
    fn test_button_overlapping_timers_are_independent() {
        // Arrange
        let mut button = CopyButton::new();
        let start = Instant::now();
        button.acknowledge(start);
        button.acknowledge(start + Duration::from_secs(1));

        // Act: first timer fires and reverts even though a second is pending
        button.tick(start + ACK_DURATION);
        let after_first = button.is_copied();
        button.tick(start + Duration::from_secs(3));

        // Assert
        assert!(!after_first);
        assert!(!button.is_copied());
    }

    #[test]
    fn test_system_clipboard_opens_lazily() {
        // Arrange & Act
        let clipboard = SystemClipboard::new();

        // Assert
        assert!(!clipboard.is_open());
    }

    #[test]
    fn test_copy_missing_block_leaves_system_clipboard_closed() {
        // Arrange
        let mut clipboard = SystemClipboard::new();
        let mut button = CopyButton::new();

        // Act
        let outcome = copy_code_block(
            "<p>x</p>",
            "code-c-0",
            &mut clipboard,
            &mut button,
            Instant::now(),
        );

        // Assert
        assert!(matches!(outcome, CopyOutcome::Failed(_)));
        assert!(!clipboard.is_open());
    }

    #[test]
    fn test_extract_raw_source_with_escaped_instance_id() {
        // Arrange
        let fragment = render("```\nquoted id\n```", "a\"b&c<d>");

        // Act
        let source = extract_raw_source(&fragment, "code-a\"b&c<d>-0");

        // Assert
        assert_eq!(source.as_deref(), Some("quoted id"));
    }
}

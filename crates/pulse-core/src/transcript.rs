//! The on-screen transcript: an append-only list of messages plus the
//! transient typing placeholder.

use serde::{Deserialize, Serialize};

use crate::sanitize::TextFormatter;

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A rendered transcript entry. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
    html: String,
    position: usize,
}

impl Message {
    pub fn role(&self) -> Role {
        self.role
    }

    /// The raw text as it was appended.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The sanitized fragment to display.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Insertion order within the transcript.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// What a renderer walks over: messages, then the placeholder if shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    Message(&'a Message),
    Typing,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    formatter: TextFormatter,
    messages: Vec<Message>,
    typing: bool,
    /// Viewport follows the end of the content until the user scrolls away.
    pinned_to_bottom: bool,
    scroll: u16,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(TextFormatter::default())
    }
}

impl Transcript {
    pub fn new(formatter: TextFormatter) -> Self {
        Self {
            formatter,
            messages: Vec::new(),
            typing: false,
            pinned_to_bottom: true,
            scroll: 0,
        }
    }

    /// Format `raw`, append it as the last message and scroll to it.
    pub fn append(&mut self, role: Role, raw: &str) -> &Message {
        let position = self.messages.len();
        self.messages.push(Message {
            role,
            text: raw.to_string(),
            html: self.formatter.format(raw),
            position,
        });
        self.scroll_to_bottom();
        &self.messages[position]
    }

    pub fn show_typing(&mut self) {
        if !self.typing {
            self.typing = true;
            self.scroll_to_bottom();
        }
    }

    pub fn remove_typing(&mut self) {
        self.typing = false;
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn scroll_to_bottom(&mut self) {
        self.pinned_to_bottom = true;
    }

    pub fn is_pinned_to_bottom(&self) -> bool {
        self.pinned_to_bottom
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Manual scroll. Unpins the viewport from the bottom.
    pub fn scroll_by(&mut self, delta: i32) {
        self.pinned_to_bottom = false;
        self.scroll = (i32::from(self.scroll) + delta).clamp(0, i32::from(u16::MAX)) as u16;
    }

    /// Called by the renderer once it knows the content and viewport height.
    pub fn resolve_scroll(&mut self, content_lines: u16, visible_lines: u16) -> u16 {
        let max = content_lines.saturating_sub(visible_lines);
        if self.pinned_to_bottom || self.scroll >= max {
            self.scroll = max;
            self.pinned_to_bottom = true;
        }
        self.scroll
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.messages
            .iter()
            .map(Entry::Message)
            .chain(self.typing.then_some(Entry::Typing))
    }

    /// Tear the transcript down, e.g. when the active chat changes.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.typing = false;
        self.scroll = 0;
        self.pinned_to_bottom = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_formats_and_orders() {
        let mut transcript = Transcript::default();
        transcript.append(Role::User, "hi <there>");
        transcript.append(Role::Assistant, "**hello**");

        let messages = transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role(), Role::User);
        assert_eq!(messages[0].html(), "hi &lt;there&gt;");
        assert_eq!(messages[1].text(), "**hello**");
        assert_eq!(messages[1].html(), "hello");
        assert_eq!(messages[1].position(), 1);
    }

    #[test]
    fn test_show_typing_twice_leaves_one_placeholder() {
        let mut transcript = Transcript::default();
        transcript.show_typing();
        transcript.show_typing();

        let typing = transcript
            .entries()
            .filter(|e| matches!(e, Entry::Typing))
            .count();
        assert_eq!(typing, 1);
    }

    #[test]
    fn test_remove_typing_without_placeholder_is_noop() {
        let mut transcript = Transcript::default();
        transcript.remove_typing();
        assert!(!transcript.is_typing());
        assert_eq!(transcript.entries().count(), 0);
    }

    #[test]
    fn test_placeholder_comes_after_messages() {
        let mut transcript = Transcript::default();
        transcript.append(Role::User, "question");
        transcript.show_typing();

        let entries: Vec<_> = transcript.entries().collect();
        assert!(matches!(entries[0], Entry::Message(_)));
        assert_eq!(entries[1], Entry::Typing);
    }

    #[test]
    fn test_scroll_pinning() {
        let mut transcript = Transcript::default();
        assert_eq!(transcript.resolve_scroll(50, 20), 30);

        transcript.scroll_by(-10);
        assert!(!transcript.is_pinned_to_bottom());
        assert_eq!(transcript.resolve_scroll(60, 20), 20);

        transcript.append(Role::Assistant, "more");
        assert_eq!(transcript.resolve_scroll(70, 20), 50);
    }

    #[test]
    fn test_clear() {
        let mut transcript = Transcript::default();
        transcript.append(Role::User, "a");
        transcript.show_typing();
        transcript.clear();
        assert!(transcript.is_empty());
        assert!(!transcript.is_typing());
    }
}

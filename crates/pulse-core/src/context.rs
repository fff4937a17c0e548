//! UI-agnostic view state shared by every component.
//!
//! One `UiContext` is built at startup and handed to the session, the
//! history panel and the renderer. Nothing looks widgets up by name.

use crate::sanitize::TextFormatter;
use crate::theme::Theme;
use crate::transcript::Transcript;

/// Ticks a notification stays on screen.
pub const NOTIFICATION_TICKS: u8 = 20;

/// The message input box.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    text: String,
    /// Cursor position in characters, not bytes.
    cursor: usize,
}

impl InputField {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True when there is something worth sending.
    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Number of lines the box needs to show its content.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = self.byte_index(self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = self.byte_index(self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = self.byte_index(self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    /// Empty the box and shrink it back to one line.
    pub fn reset(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendButton {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient message shown outside the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    remaining_ticks: u8,
}

#[derive(Debug, Clone)]
pub struct UiContext {
    pub input: InputField,
    pub send_button: SendButton,
    pub transcript: Transcript,
    /// The greeting shown until the first message goes out.
    pub show_welcome: bool,
    pub theme: Theme,
    notification: Option<Notification>,
}

impl UiContext {
    pub fn new(formatter: TextFormatter, theme: Theme) -> Self {
        Self {
            input: InputField::default(),
            send_button: SendButton { enabled: true },
            transcript: Transcript::new(formatter),
            show_welcome: true,
            theme,
            notification: None,
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notification = Some(Notification {
            message: message.into(),
            level,
            remaining_ticks: NOTIFICATION_TICKS,
        });
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Advance timers. Returns true if anything visible changed.
    pub fn tick(&mut self) -> bool {
        let Some(notification) = self.notification.as_mut() else {
            return false;
        };
        notification.remaining_ticks = notification.remaining_ticks.saturating_sub(1);
        if notification.remaining_ticks == 0 {
            self.notification = None;
            return true;
        }
        false
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new(TextFormatter::default(), Theme::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_editing_is_utf8_safe() {
        let mut input = InputField::default();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.move_left();
        input.move_left();
        input.backspace();
        assert_eq!(input.text(), "hélo");
        assert_eq!(input.cursor(), 2);

        input.move_home();
        input.delete();
        assert_eq!(input.text(), "élo");

        input.move_end();
        input.insert('!');
        assert_eq!(input.text(), "élo!");
    }

    #[test]
    fn test_input_active_and_reset() {
        let mut input = InputField::default();
        input.set_text("   ");
        assert!(!input.is_active());

        input.set_text("line one\nline two");
        assert!(input.is_active());
        assert_eq!(input.line_count(), 2);

        input.reset();
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor(), 0);
        assert_eq!(input.line_count(), 1);
    }

    #[test]
    fn test_notification_expires() {
        let mut ui = UiContext::default();
        ui.notify(NotificationLevel::Error, "not registered");
        for _ in 0..NOTIFICATION_TICKS - 1 {
            assert!(!ui.tick());
        }
        assert!(ui.notification().is_some());
        assert!(ui.tick());
        assert!(ui.notification().is_none());
    }
}

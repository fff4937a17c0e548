pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod http;
pub mod sanitize;
pub mod session;
pub mod theme;
pub mod transcript;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use api::{ChatBackend, ChatId, ChatSummary, StoredMessage};
pub use client::PulseClient;
pub use config::Config;
pub use context::{InputField, Notification, NotificationLevel, UiContext};
pub use error::{BackendError, StoreError};
pub use history::{ChatHistoryPanel, ClickTarget, HistoryAction, HistoryView};
pub use http::HttpBackend;
pub use sanitize::{format_text, LineBreaks, TextFormatter};
pub use session::{ChatSession, SendCompletion, SendOutcome, SendState};
pub use theme::{Theme, ThemeStore};
pub use transcript::{Entry, Message, Role, Transcript};

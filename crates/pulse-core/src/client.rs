//! The client shell: owns the backend and every component, and exposes the
//! operations a front end binds keys or buttons to.

use std::sync::Arc;

use crate::api::ChatBackend;
use crate::config::Config;
use crate::context::{NotificationLevel, UiContext};
use crate::error::BackendError;
use crate::history::{ChatHistoryPanel, ClickTarget, HistoryAction};
use crate::http::HttpBackend;
use crate::sanitize::TextFormatter;
use crate::session::{ChatSession, SendCompletion};
use crate::theme::{Theme, ThemeStore};

pub const MSG_NOT_REGISTERED: &str = "Register to create more chats";
pub const MSG_NEW_CHAT_FAILED: &str = "Could not create a new chat";
pub const MSG_SWITCH_FAILED: &str = "Could not open that chat";
pub const MSG_DELETE_FAILED: &str = "Could not delete that chat";
pub const MSG_HISTORY_FAILED: &str = "Could not load chat history";

pub struct PulseClient {
    backend: Arc<dyn ChatBackend>,
    ui: UiContext,
    session: ChatSession,
    history: ChatHistoryPanel,
    themes: Option<ThemeStore>,
}

impl PulseClient {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        formatter: TextFormatter,
        themes: Option<ThemeStore>,
    ) -> Self {
        let theme = themes.as_ref().map(ThemeStore::load).unwrap_or_default();
        Self {
            session: ChatSession::new(Arc::clone(&backend)),
            backend,
            ui: UiContext::new(formatter, theme),
            history: ChatHistoryPanel::new(),
            themes,
        }
    }

    /// HTTP backend and on-disk theme preference, as configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let backend = HttpBackend::new(&config.server_url, config.request_timeout())?;
        let themes = match ThemeStore::default_location() {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!("theme preference will not persist: {e}");
                None
            }
        };
        tracing::info!(server = %backend.base_url(), "client configured");
        Ok(Self::new(Arc::new(backend), config.formatter(), themes))
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiContext {
        &mut self.ui
    }

    pub fn history(&self) -> &ChatHistoryPanel {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ChatHistoryPanel {
        &mut self.history
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Load the active chat, the way a fresh page would.
    pub async fn start(&mut self) {
        self.reload_view().await;
    }

    pub fn send_message(&mut self) -> bool {
        self.session.send_message(&mut self.ui)
    }

    /// Non-blocking: finish the outstanding send if its reply is in.
    pub async fn poll(&mut self) -> Option<SendCompletion> {
        let done = self.session.poll(&mut self.ui).await?;
        self.after_send(&done).await;
        Some(done)
    }

    /// Wait for the outstanding send, if any.
    pub async fn wait_for_reply(&mut self) -> Option<SendCompletion> {
        let done = self.session.wait(&mut self.ui).await?;
        self.after_send(&done).await;
        Some(done)
    }

    pub fn cancel_send(&self) {
        self.session.cancel();
    }

    async fn after_send(&mut self, done: &SendCompletion) {
        if done.history_refresh && self.history.is_open() {
            self.refresh_history().await;
        }
    }

    pub async fn toggle_history(&mut self) {
        if self.history.is_open() {
            self.history.close();
        } else {
            self.history.open();
            self.refresh_history().await;
        }
    }

    pub async fn refresh_history(&mut self) {
        if self.history.refresh(&*self.backend).await.is_err() {
            self.ui.notify(NotificationLevel::Error, MSG_HISTORY_FAILED);
        }
    }

    /// Activate a history row. A `ConfirmDelete` result means the front end
    /// should ask the user and then call [`confirm_delete`](Self::confirm_delete).
    pub async fn activate_chat(&mut self, index: usize, target: ClickTarget) -> HistoryAction {
        let result = self
            .history
            .activate(&*self.backend, index, target)
            .await;
        self.apply(result, MSG_SWITCH_FAILED).await
    }

    pub async fn confirm_delete(&mut self) -> HistoryAction {
        let result = self.history.confirm_delete(&*self.backend).await;
        self.apply(result, MSG_DELETE_FAILED).await
    }

    pub fn cancel_delete(&mut self) {
        self.history.cancel_delete();
    }

    async fn apply(
        &mut self,
        result: Result<HistoryAction, BackendError>,
        failure: &str,
    ) -> HistoryAction {
        match result {
            Ok(HistoryAction::ReloadView) => {
                self.reload_view().await;
                HistoryAction::ReloadView
            }
            Ok(action) => action,
            Err(e) => {
                tracing::warn!("{failure}: {e}");
                self.ui.notify(NotificationLevel::Error, failure);
                HistoryAction::None
            }
        }
    }

    /// Start a new chat. Returns true if the view was reloaded.
    pub async fn new_chat(&mut self) -> bool {
        match self.backend.new_chat().await {
            Ok(()) => {
                tracing::info!("new chat created");
                self.reload_view().await;
                true
            }
            Err(BackendError::Unauthorized) => {
                tracing::info!("new chat rejected: not registered");
                self.ui.notify(NotificationLevel::Error, MSG_NOT_REGISTERED);
                false
            }
            Err(e) => {
                tracing::warn!("new chat failed: {e}");
                self.ui.notify(NotificationLevel::Error, MSG_NEW_CHAT_FAILED);
                false
            }
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.ui.theme = self.ui.theme.toggle();
        if let Some(store) = &self.themes {
            if let Err(e) = store.save(self.ui.theme) {
                tracing::warn!("failed to save theme preference: {e}");
            }
        }
        self.ui.theme
    }

    /// Rebuild the transcript from the server's active chat.
    pub async fn reload_view(&mut self) {
        self.session.abandon(&mut self.ui);
        self.ui.transcript.clear();
        self.ui.input.reset();
        self.ui.show_welcome = true;

        if let Err(e) = self.load_current_chat().await {
            tracing::warn!("could not load active chat: {e}");
        }
        self.ui.show_welcome = self.ui.transcript.is_empty();

        if self.history.is_open() {
            self.refresh_history().await;
        }
    }

    async fn load_current_chat(&mut self) -> Result<(), BackendError> {
        let chats = self.backend.list_chats().await?;
        let Some(current) = chats.iter().find(|c| c.is_current) else {
            return Ok(());
        };

        let messages = self.backend.chat_messages(&current.id).await?;
        tracing::debug!(id = %current.id, count = messages.len(), "loaded active chat");
        for message in &messages {
            if let Some(role) = message.role() {
                self.ui.transcript.append(role, &message.content);
            }
        }
        Ok(())
    }

    /// Advance UI timers. Returns true if a redraw is needed.
    pub fn tick(&mut self) -> bool {
        self.ui.tick()
    }
}

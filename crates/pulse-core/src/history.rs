//! The chat history panel: list of earlier chats with select and delete.

use crate::api::{ChatBackend, ChatId, ChatSummary};
use crate::error::BackendError;

/// What the panel currently shows. Rebuilt wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HistoryView {
    /// Never fetched.
    #[default]
    Unloaded,
    Empty,
    Rows(Vec<ChatSummary>),
}

/// Which part of a row an activation hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Row,
    DeleteButton,
}

/// What the caller has to do after a panel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    None,
    /// The active chat changed; rebuild the transcript from the server.
    ReloadView,
    /// Only the list changed.
    Refreshed,
    /// A delete is waiting for the user to confirm.
    ConfirmDelete { id: ChatId, title: String },
}

#[derive(Debug, Default)]
pub struct ChatHistoryPanel {
    open: bool,
    view: HistoryView,
    selected: usize,
    pending_delete: Option<ChatSummary>,
}

impl ChatHistoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.pending_delete = None;
    }

    pub fn view(&self) -> &HistoryView {
        &self.view
    }

    pub fn rows(&self) -> &[ChatSummary] {
        match &self.view {
            HistoryView::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn pending_delete(&self) -> Option<&ChatSummary> {
        self.pending_delete.as_ref()
    }

    pub fn nav_down(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Fetch the chat list and replace the panel's contents. On failure the
    /// previous contents stay.
    pub async fn refresh(&mut self, backend: &dyn ChatBackend) -> Result<(), BackendError> {
        let chats = match backend.list_chats().await {
            Ok(chats) => chats,
            Err(e) => {
                tracing::warn!("failed to load chat history: {e}");
                return Err(e);
            }
        };

        tracing::debug!(count = chats.len(), "chat history refreshed");
        self.view = if chats.is_empty() {
            HistoryView::Empty
        } else {
            HistoryView::Rows(chats)
        };

        // Keep the cursor on the current chat if there is one.
        let rows = self.rows();
        let selected = rows
            .iter()
            .position(|c| c.is_current)
            .unwrap_or(self.selected)
            .min(rows.len().saturating_sub(1));
        self.selected = selected;
        Ok(())
    }

    /// Dispatch an activation of row `index`. A hit on the delete button
    /// never selects the row.
    pub async fn activate(
        &mut self,
        backend: &dyn ChatBackend,
        index: usize,
        target: ClickTarget,
    ) -> Result<HistoryAction, BackendError> {
        match target {
            ClickTarget::DeleteButton => Ok(self.request_delete(index)),
            ClickTarget::Row => self.select(backend, index).await,
        }
    }

    /// Make row `index` the active chat.
    pub async fn select(
        &mut self,
        backend: &dyn ChatBackend,
        index: usize,
    ) -> Result<HistoryAction, BackendError> {
        let Some(chat) = self.rows().get(index).cloned() else {
            return Ok(HistoryAction::None);
        };
        self.selected = index;

        tracing::info!(id = %chat.id, "switching chat");
        backend.load_chat(&chat.id).await?;
        Ok(HistoryAction::ReloadView)
    }

    /// Start deleting row `index`. Nothing is sent until confirmed.
    pub fn request_delete(&mut self, index: usize) -> HistoryAction {
        let Some(chat) = self.rows().get(index).cloned() else {
            return HistoryAction::None;
        };
        self.selected = index;
        let action = HistoryAction::ConfirmDelete {
            id: chat.id.clone(),
            title: chat.title.clone(),
        };
        self.pending_delete = Some(chat);
        action
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the chat waiting for confirmation, then refresh the list.
    pub async fn confirm_delete(
        &mut self,
        backend: &dyn ChatBackend,
    ) -> Result<HistoryAction, BackendError> {
        let Some(chat) = self.pending_delete.take() else {
            return Ok(HistoryAction::None);
        };

        tracing::info!(id = %chat.id, current = chat.is_current, "deleting chat");
        backend.delete_chat(&chat.id).await?;

        if let Err(e) = self.refresh(backend).await {
            tracing::warn!("chat deleted but list refresh failed: {e}");
        }

        Ok(if chat.is_current {
            HistoryAction::ReloadView
        } else {
            HistoryAction::Refreshed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{summary, FakeBackend};

    fn backend() -> FakeBackend {
        FakeBackend::with_chats(vec![
            summary("a", "Recipes", false),
            summary("b", "Travel", true),
            summary("c", "Taxes", false),
        ])
    }

    #[tokio::test]
    async fn test_refresh_replaces_contents() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        assert_eq!(panel.view(), &HistoryView::Unloaded);

        panel.refresh(&backend).await.unwrap();
        assert_eq!(panel.rows().len(), 3);
        assert_eq!(panel.selected(), 1);

        let empty = FakeBackend::default();
        panel.refresh(&empty).await.unwrap();
        assert_eq!(panel.view(), &HistoryView::Empty);
        assert!(panel.rows().is_empty());
        assert_eq!(panel.selected(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_rows() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        panel.refresh(&backend).await.unwrap();

        backend.fail_listing(true);
        assert!(panel.refresh(&backend).await.is_err());
        assert_eq!(panel.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_select_loads_and_reloads_view() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        panel.refresh(&backend).await.unwrap();

        let action = panel.activate(&backend, 0, ClickTarget::Row).await.unwrap();
        assert_eq!(action, HistoryAction::ReloadView);
        assert!(backend.calls().contains(&"load:a".to_string()));
    }

    #[tokio::test]
    async fn test_delete_button_never_selects() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        panel.refresh(&backend).await.unwrap();

        let action = panel
            .activate(&backend, 2, ClickTarget::DeleteButton)
            .await
            .unwrap();
        assert_eq!(
            action,
            HistoryAction::ConfirmDelete {
                id: ChatId::new("c"),
                title: "Taxes".into()
            }
        );
        assert!(!backend.calls().iter().any(|c| c.starts_with("load:")));
        assert!(!backend.calls().iter().any(|c| c.starts_with("delete:")));
    }

    #[tokio::test]
    async fn test_delete_other_chat_only_refreshes() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        panel.refresh(&backend).await.unwrap();

        panel.request_delete(0);
        let action = panel.confirm_delete(&backend).await.unwrap();
        assert_eq!(action, HistoryAction::Refreshed);
        assert_eq!(panel.rows().len(), 2);
        assert!(panel.pending_delete().is_none());
    }

    #[tokio::test]
    async fn test_delete_current_chat_reloads_view() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        panel.refresh(&backend).await.unwrap();

        panel.request_delete(1);
        let action = panel.confirm_delete(&backend).await.unwrap();
        assert_eq!(action, HistoryAction::ReloadView);
        assert_eq!(panel.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_delete_sends_nothing() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        panel.refresh(&backend).await.unwrap();

        panel.request_delete(0);
        panel.cancel_delete();
        let action = panel.confirm_delete(&backend).await.unwrap();
        assert_eq!(action, HistoryAction::None);
        assert!(!backend.calls().iter().any(|c| c.starts_with("delete:")));
    }

    #[tokio::test]
    async fn test_navigation_is_clamped() {
        let backend = backend();
        let mut panel = ChatHistoryPanel::new();
        panel.refresh(&backend).await.unwrap();

        panel.nav_down();
        panel.nav_down();
        panel.nav_down();
        assert_eq!(panel.selected(), 2);
        for _ in 0..5 {
            panel.nav_up();
        }
        assert_eq!(panel.selected(), 0);
    }
}

use ratatui::layout::Rect;
use pulse_core::{Config, HistoryAction, PulseClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Transcript,
    History,
}

pub struct App {
    pub should_quit: bool,
    pub focus: FocusPane,
    pub client: PulseClient,

    /// Title of the chat awaiting delete confirmation.
    pub confirm_delete: Option<String>,
    pub show_help: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing dots

    // Panel areas for mouse hit-testing (updated during render)
    pub transcript_area: Option<Rect>,
    pub history_area: Option<Rect>,
    pub input_area: Option<Rect>,
    /// First history row drawn; click rows are relative to it.
    pub history_offset: usize,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::with_client(PulseClient::from_config(config)?))
    }

    pub fn with_client(client: PulseClient) -> Self {
        Self {
            should_quit: false,
            focus: FocusPane::Input,
            client,
            confirm_delete: None,
            show_help: false,
            animation_frame: 0,
            transcript_area: None,
            history_area: None,
            input_area: None,
            history_offset: 0,
        }
    }

    /// Tick animation frame and timers (called by Tick event)
    pub fn tick(&mut self) {
        if self.client.session().is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.client.tick();
    }

    /// Collect a finished reply, if any.
    pub async fn poll_reply(&mut self) {
        if self.client.poll().await.is_some() {
            // Back to the input box once the reply is in
            if self.focus == FocusPane::Transcript {
                self.focus = FocusPane::Input;
            }
        }
    }

    pub fn send(&mut self) {
        if self.client.send_message() {
            self.focus = FocusPane::Input;
        }
    }

    pub async fn toggle_history(&mut self) {
        self.client.toggle_history().await;
        self.confirm_delete = None;
        self.focus = if self.client.history().is_open() {
            FocusPane::History
        } else {
            FocusPane::Input
        };
    }

    /// Follow up on a history panel result.
    pub fn handle_history_action(&mut self, action: HistoryAction) {
        match action {
            HistoryAction::ConfirmDelete { title, .. } => {
                self.confirm_delete = Some(title);
            }
            HistoryAction::ReloadView => {
                self.confirm_delete = None;
                self.focus = FocusPane::Input;
            }
            HistoryAction::Refreshed | HistoryAction::None => {
                self.confirm_delete = None;
            }
        }
    }

    pub fn cycle_focus(&mut self) {
        let history_open = self.client.history().is_open();
        self.focus = match self.focus {
            FocusPane::Input => FocusPane::Transcript,
            FocusPane::Transcript if history_open => FocusPane::History,
            FocusPane::Transcript | FocusPane::History => FocusPane::Input,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let config = Config {
            server_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        };
        App::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_focus_cycle_skips_closed_history() {
        let mut app = app();
        app.cycle_focus();
        assert_eq!(app.focus, FocusPane::Transcript);
        app.cycle_focus();
        assert_eq!(app.focus, FocusPane::Input);
    }

    #[tokio::test]
    async fn test_confirm_prompt_follows_history_action() {
        let mut app = app();
        app.handle_history_action(HistoryAction::ConfirmDelete {
            id: pulse_core::ChatId::new("1"),
            title: "Recipes".into(),
        });
        assert_eq!(app.confirm_delete.as_deref(), Some("Recipes"));

        app.handle_history_action(HistoryAction::Refreshed);
        assert!(app.confirm_delete.is_none());
    }
}

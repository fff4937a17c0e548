//! The single-flight send pipeline.
//!
//! `send_message` does all of its bookkeeping synchronously (check the
//! state, append the user message, lock the send button) and only then
//! hands the request to a spawned task. The task's result is collected by
//! `poll` or `wait`, and both funnel into `complete`, which is the only
//! place the session leaves `Sending`.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::api::ChatBackend;
use crate::context::UiContext;
use crate::error::BackendError;
use crate::transcript::Role;

/// Shown when the server answered with a non-2xx status.
pub const MSG_MODEL_ERROR: &str = "❌ Something went wrong. Please try again";
/// Shown when no usable response came back.
pub const MSG_CONNECTION_ERROR: &str = "❌ Connection error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Reply(String),
    ModelError,
    ConnectionError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCompletion {
    pub outcome: SendOutcome,
    /// The chat list changed (title, recency) and an open panel should refresh.
    pub history_refresh: bool,
}

struct InFlight {
    task: JoinHandle<Result<String, BackendError>>,
    cancel: CancellationToken,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    state: SendState,
    in_flight: Option<InFlight>,
    /// Parent of every request's token; cancelling it cancels the request.
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self::with_cancellation(backend, CancellationToken::new())
    }

    pub fn with_cancellation(backend: Arc<dyn ChatBackend>, cancel: CancellationToken) -> Self {
        Self {
            backend,
            state: SendState::Idle,
            in_flight: None,
            cancel,
        }
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == SendState::Sending
    }

    /// Send whatever is in the input box.
    ///
    /// Returns `false` without touching anything when the input is blank or
    /// a send is already outstanding. Must be called inside a tokio runtime.
    pub fn send_message(&mut self, ui: &mut UiContext) -> bool {
        let message = ui.input.text().trim().to_string();
        if message.is_empty() || self.is_sending() {
            return false;
        }

        self.state = SendState::Sending;
        ui.show_welcome = false;
        ui.transcript.append(Role::User, &message);
        ui.input.reset();
        ui.send_button.enabled = false;
        ui.transcript.show_typing();

        tracing::info!(chars = message.chars().count(), "sending message");

        let backend = Arc::clone(&self.backend);
        let cancel = self.cancel.child_token();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(BackendError::Cancelled),
                result = backend.send_chat(&message) => result,
            }
        });

        self.in_flight = Some(InFlight { task, cancel });
        true
    }

    /// Finish the outstanding send if its request has resolved.
    pub async fn poll(&mut self, ui: &mut UiContext) -> Option<SendCompletion> {
        if !self.in_flight.as_ref()?.task.is_finished() {
            return None;
        }
        self.wait(ui).await
    }

    /// Wait for the outstanding send, if any, and finish it.
    pub async fn wait(&mut self, ui: &mut UiContext) -> Option<SendCompletion> {
        let mut in_flight = self.in_flight.take()?;
        let joined = (&mut in_flight.task).await;
        drop(in_flight);
        Some(self.complete(ui, joined))
    }

    /// Ask the outstanding request to stop. It resolves as a connection error.
    pub fn cancel(&self) {
        if let Some(in_flight) = &self.in_flight {
            tracing::info!("cancelling outstanding send");
            in_flight.cancel.cancel();
        }
    }

    /// Drop the outstanding send without showing a result. Used when the
    /// transcript is about to be rebuilt for another chat.
    pub fn abandon(&mut self, ui: &mut UiContext) {
        if self.in_flight.take().is_some() {
            tracing::info!("abandoning outstanding send");
        }
        ui.transcript.remove_typing();
        ui.send_button.enabled = true;
        self.state = SendState::Idle;
    }

    fn complete(
        &mut self,
        ui: &mut UiContext,
        joined: Result<Result<String, BackendError>, JoinError>,
    ) -> SendCompletion {
        let outcome = match joined {
            Ok(Ok(reply)) => SendOutcome::Reply(reply),
            Ok(Err(err)) => {
                tracing::warn!("chat request failed: {err}");
                classify(&err)
            }
            Err(err) => {
                tracing::error!("chat request task failed: {err}");
                SendOutcome::ConnectionError
            }
        };

        ui.transcript.remove_typing();
        match &outcome {
            SendOutcome::Reply(text) => ui.transcript.append(Role::Assistant, text),
            SendOutcome::ModelError => ui.transcript.append(Role::Assistant, MSG_MODEL_ERROR),
            SendOutcome::ConnectionError => {
                ui.transcript.append(Role::Assistant, MSG_CONNECTION_ERROR)
            }
        };
        ui.send_button.enabled = true;
        self.state = SendState::Idle;

        tracing::debug!(?outcome, "send complete");

        SendCompletion {
            history_refresh: matches!(outcome, SendOutcome::Reply(_)),
            outcome,
        }
    }
}

/// A 2xx body that is not JSON counts as a lost connection, like no
/// response at all. Everything else the server answered is a model error.
fn classify(err: &BackendError) -> SendOutcome {
    if err.is_transport() || matches!(err, BackendError::Decode(_)) {
        SendOutcome::ConnectionError
    } else {
        SendOutcome::ModelError
    }
}

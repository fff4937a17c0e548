//! In-memory backend for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::api::{ChatBackend, ChatId, ChatSummary, StoredMessage};
use crate::error::BackendError;

#[derive(Debug, Clone)]
pub enum FakeReply {
    Ok(String),
    Status(u16),
    Transport,
    Panic,
}

pub struct FakeBackend {
    chat_reply: Mutex<FakeReply>,
    chats: Mutex<Vec<ChatSummary>>,
    messages: Mutex<HashMap<ChatId, Vec<StoredMessage>>>,
    new_chat_status: Mutex<Option<u16>>,
    fail_listing: AtomicBool,
    hold: AtomicBool,
    release: Notify,
    calls: Mutex<Vec<String>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            chat_reply: Mutex::new(FakeReply::Ok("ok".into())),
            chats: Mutex::new(Vec::new()),
            messages: Mutex::new(HashMap::new()),
            new_chat_status: Mutex::new(None),
            fail_listing: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            release: Notify::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

pub fn summary(id: &str, title: &str, is_current: bool) -> ChatSummary {
    ChatSummary {
        id: ChatId::new(id),
        title: title.to_string(),
        updated_at: "2024-05-01T10:00:00".to_string(),
        is_current,
    }
}

impl FakeBackend {
    pub fn with_chats(chats: Vec<ChatSummary>) -> Self {
        let backend = Self::default();
        *backend.chats.lock().unwrap() = chats;
        backend
    }

    pub fn set_chat_reply(&self, reply: FakeReply) {
        *self.chat_reply.lock().unwrap() = reply;
    }

    pub fn set_messages(&self, id: &str, messages: &[(&str, &str)]) {
        let stored = messages
            .iter()
            .map(|(role, content)| StoredMessage {
                role: role.to_string(),
                content: content.to_string(),
            })
            .collect();
        self.messages.lock().unwrap().insert(ChatId::new(id), stored);
    }

    pub fn set_new_chat_status(&self, status: Option<u16>) {
        *self.new_chat_status.lock().unwrap() = status;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make `send_chat` wait until [`release_reply`](Self::release_reply).
    pub fn hold_replies(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release_reply(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
        self.release.notify_one();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn chat_calls(&self) -> usize {
        self.sent_messages().len()
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.strip_prefix("chat:").map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn status(code: u16) -> BackendError {
    match code {
        401 => BackendError::Unauthorized,
        code => BackendError::Status(StatusCode::from_u16(code).unwrap()),
    }
}

fn transport_error() -> BackendError {
    let err = reqwest::Client::new().get("not a url").build().unwrap_err();
    BackendError::Transport(err)
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn send_chat(&self, message: &str) -> Result<String, BackendError> {
        self.record(format!("chat:{message}"));
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        let reply = self.chat_reply.lock().unwrap().clone();
        match reply {
            FakeReply::Ok(text) => Ok(text),
            FakeReply::Status(code) => Err(status(code)),
            FakeReply::Transport => Err(transport_error()),
            FakeReply::Panic => panic!("backend blew up"),
        }
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError> {
        self.record("list".into());
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(status(500));
        }
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn load_chat(&self, id: &ChatId) -> Result<(), BackendError> {
        self.record(format!("load:{id}"));
        let mut chats = self.chats.lock().unwrap();
        if !chats.iter().any(|c| &c.id == id) {
            return Err(status(404));
        }
        for chat in chats.iter_mut() {
            chat.is_current = &chat.id == id;
        }
        Ok(())
    }

    async fn delete_chat(&self, id: &ChatId) -> Result<(), BackendError> {
        self.record(format!("delete:{id}"));
        let mut chats = self.chats.lock().unwrap();
        let before = chats.len();
        chats.retain(|c| &c.id != id);
        if chats.len() == before {
            return Err(status(404));
        }
        Ok(())
    }

    async fn new_chat(&self) -> Result<(), BackendError> {
        self.record("new".into());
        if let Some(code) = *self.new_chat_status.lock().unwrap() {
            return Err(status(code));
        }
        let mut chats = self.chats.lock().unwrap();
        for chat in chats.iter_mut() {
            chat.is_current = false;
        }
        let id = format!("new-{}", chats.len() + 1);
        chats.insert(0, summary(&id, "New chat", true));
        Ok(())
    }

    async fn chat_messages(&self, id: &ChatId) -> Result<Vec<StoredMessage>, BackendError> {
        self.record(format!("messages:{id}"));
        Ok(self
            .messages
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

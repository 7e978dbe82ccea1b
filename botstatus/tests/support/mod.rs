//! Scripted in-memory messaging platform for integration tests.
//!
//! Each bot follows a [`BotScript`]; edits consume per-chat queues of canned
//! responses. Every call is recorded with the (tokio) time it happened, so
//! tests running with paused time can assert on waits.

#![allow(dead_code)]

use async_trait::async_trait;
use botstatus::common::config::{MonitorConfig, MonitorSettings};
use botstatus::common::types::{BotEntry, DestinationChannel, MessageRef};
use botstatus::platform::{MessagingPlatform, PlatformError};
use botstatus::shutdown::ShutdownController;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// How a bot behaves when probed
#[derive(Debug, Clone)]
pub enum BotScript {
    /// A reply becomes visible `after` the stimulus was sent
    Replies { after: Duration },
    /// Nothing ever arrives after the stimulus
    Silent,
    /// Sending the stimulus fails
    SendFails(PlatformError),
    /// History is empty after sending
    EmptyHistory,
}

/// One recorded edit call
#[derive(Debug, Clone)]
pub struct EditCall {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub at: Instant,
}

#[derive(Debug, Clone)]
struct Sent {
    stimulus: MessageRef,
    at: Instant,
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, BotScript>,
    names: HashMap<String, String>,
    sent: HashMap<String, Sent>,
    edit_responses: HashMap<i64, VecDeque<Result<(), PlatformError>>>,
    edits: Vec<EditCall>,
    calls: Vec<String>,
    read: Vec<String>,
    shutdown_on_send: Option<(String, ShutdownController)>,
    shutdown_on_edit: Option<(i64, ShutdownController)>,
    next_id: i64,
}

/// Scripted platform
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<State>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, handle: &str, script: BotScript) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(handle.to_string(), script);
        self
    }

    pub fn name(self, handle: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .names
            .insert(handle.to_string(), name.to_string());
        self
    }

    /// Queue responses for edits on `chat_id`; once drained, edits succeed.
    pub fn edit_responses(
        self,
        chat_id: i64,
        responses: impl IntoIterator<Item = Result<(), PlatformError>>,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .edit_responses
            .entry(chat_id)
            .or_default()
            .extend(responses);
        self
    }

    /// Request shutdown right after the stimulus to `handle` is sent.
    pub fn shutdown_on_send(self, handle: &str, shutdown: ShutdownController) -> Self {
        self.state.lock().unwrap().shutdown_on_send = Some((handle.to_string(), shutdown));
        self
    }

    /// Request shutdown right after `chat_id` is edited.
    pub fn shutdown_on_edit(self, chat_id: i64, shutdown: ShutdownController) -> Self {
        self.state.lock().unwrap().shutdown_on_edit = Some((chat_id, shutdown));
        self
    }

    pub fn edits(&self) -> Vec<EditCall> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn read_handles(&self) -> Vec<String> {
        self.state.lock().unwrap().read.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl MessagingPlatform for MockPlatform {
    async fn verify_session(&self) -> Result<String, PlatformError> {
        self.record("verify_session".to_string());
        Ok("monitor".to_string())
    }

    async fn send_message(&self, handle: &str, _text: &str) -> Result<MessageRef, PlatformError> {
        self.record(format!("send_message:{}", handle));
        let mut state = self.state.lock().unwrap();

        if let Some(BotScript::SendFails(e)) = state.scripts.get(handle) {
            return Err(e.clone());
        }

        state.next_id += 10;
        let stimulus = MessageRef::new(state.next_id, Utc::now());
        state.sent.insert(
            handle.to_string(),
            Sent {
                stimulus,
                at: Instant::now(),
            },
        );

        if let Some((target, shutdown)) = &state.shutdown_on_send {
            if target == handle {
                shutdown.request_shutdown();
            }
        }
        Ok(stimulus)
    }

    async fn latest_message(&self, handle: &str) -> Result<Option<MessageRef>, PlatformError> {
        self.record(format!("latest_message:{}", handle));
        let state = self.state.lock().unwrap();

        let Some(sent) = state.sent.get(handle) else {
            return Ok(None);
        };
        match state.scripts.get(handle) {
            Some(BotScript::Replies { after }) if sent.at.elapsed() >= *after => {
                let date = sent.stimulus.date
                    + chrono::Duration::from_std(*after).unwrap_or_else(|_| chrono::Duration::zero());
                Ok(Some(MessageRef::new(sent.stimulus.id + 1, date)))
            }
            Some(BotScript::EmptyHistory) => Ok(None),
            _ => Ok(Some(sent.stimulus)),
        }
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), PlatformError> {
        self.record(format!("edit_message_text:{}", chat_id));
        let mut state = self.state.lock().unwrap();
        state.edits.push(EditCall {
            chat_id,
            message_id,
            text: text.to_string(),
            at: Instant::now(),
        });

        let response = state
            .edit_responses
            .get_mut(&chat_id)
            .and_then(|q| q.pop_front())
            .unwrap_or(Ok(()));

        if let Some((target, shutdown)) = &state.shutdown_on_edit {
            if *target == chat_id {
                shutdown.request_shutdown();
            }
        }
        response
    }

    async fn mark_read(&self, handle: &str) -> Result<(), PlatformError> {
        self.record(format!("mark_read:{}", handle));
        self.state.lock().unwrap().read.push(handle.to_string());
        Ok(())
    }

    async fn resolve_display_name(&self, handle: &str) -> Result<String, PlatformError> {
        self.record(format!("resolve_display_name:{}", handle));
        self.state
            .lock()
            .unwrap()
            .names
            .get(handle)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(handle.to_string()))
    }
}

/// Bots named `<key>` with handle `@<key>_bot`
pub fn bots(keys: &[&str]) -> Vec<BotEntry> {
    keys.iter()
        .map(|k| BotEntry::new(*k, format!("@{}_bot", k)))
        .collect()
}

/// Destinations `chan<N>` on chat `-100N`, message `N`
pub fn destinations(count: i64) -> Vec<DestinationChannel> {
    (1..=count)
        .map(|n| DestinationChannel::new(format!("chan{}", n), -100 - n, n))
        .collect()
}

pub fn config(
    bots: Vec<BotEntry>,
    destinations: Vec<DestinationChannel>,
    settings: MonitorSettings,
) -> Arc<MonitorConfig> {
    Arc::new(MonitorConfig::new(bots, destinations, settings))
}

#![allow(dead_code)]

use async_trait::async_trait;
use chat_relay::history::{ HistoryStore, MemoryHistoryStore };
use chat_relay::llm::chat::{ ChatClient, FragmentStream };
use chat_relay::llm::{ LlmError, LlmType };
use chat_relay::models::chat::ChatMessage;
use chat_relay::relay::{ ChatRelay, RelayOptions };
use futures::stream::{ self, StreamExt };
use std::collections::VecDeque;
use std::sync::{ Arc, Mutex };
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum Step {
    Say(&'static str),
    Fail(&'static str),
}

#[derive(Clone, Debug)]
pub enum Reply {
    Stream(Vec<Step>),
    Refuse(&'static str),
}

/// Inference client that plays back canned replies, one per call, and
/// remembers the history it was handed each time.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
    step_delay: Duration,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
            step_delay: Duration::ZERO,
        }
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn saying(fragments: &[&'static str]) -> Self {
        Self::new(vec![Reply::Stream(fragments.iter().map(|f| Step::Say(*f)).collect())])
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, LlmError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let reply = self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Stream(Vec::new()));

        let steps = match reply {
            Reply::Refuse(message) => return Err(LlmError::Upstream(message.to_string())),
            Reply::Stream(steps) => steps,
        };
        let items: Vec<Result<String, LlmError>> = steps
            .into_iter()
            .map(|step| match step {
                Step::Say(text) => Ok(text.to_string()),
                Step::Fail(message) => Err(LlmError::Upstream(message.to_string())),
            })
            .collect();

        let delay = self.step_delay;
        Ok(Box::pin(stream::iter(items).then(move |item| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            item
        })))
    }

    fn model(&self) -> &str {
        "scripted"
    }

    fn base_url(&self) -> &str {
        "memory://scripted"
    }

    fn llm_type(&self) -> LlmType {
        LlmType::Ollama
    }
}

pub fn relay_with(client: Arc<ScriptedClient>) -> (ChatRelay, Arc<MemoryHistoryStore>) {
    let history = Arc::new(MemoryHistoryStore::default());
    let store: Arc<dyn HistoryStore> = history.clone();
    let relay = ChatRelay::new(client, store, RelayOptions {
        fragment_delay: Duration::ZERO,
    });
    (relay, history)
}

pub fn transcript(messages: &[ChatMessage]) -> Vec<(String, String)> {
    messages
        .iter()
        .map(|m| (m.role.to_string(), m.content.clone()))
        .collect()
}

pub fn pair(role: &str, content: &str) -> (String, String) {
    (role.to_string(), content.to_string())
}

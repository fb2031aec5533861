pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use futures::{ Stream, StreamExt };
use log::{ debug, warn };
use reqwest::Client as HttpClient;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use super::{ LlmConfig, LlmError, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use crate::models::chat::ChatMessage;

/// Lazily produced text increments of one assistant reply, in model order.
/// The stream ends when the reply is complete; an `Err` item means the reply
/// was cut short.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Starts a streaming completion over the full message history.
    ///
    /// Connection and HTTP status failures are returned directly; failures
    /// after the first byte arrive as an `Err` item on the stream.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, LlmError>;

    fn model(&self) -> &str;

    fn base_url(&self) -> &str;

    fn llm_type(&self) -> LlmType;
}

/// `{role, content}` pair as both providers expect it.
#[derive(Serialize, Debug)]
pub(crate) struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

pub(crate) fn wire_messages(messages: &[ChatMessage]) -> Vec<WireMessage<'_>> {
    messages
        .iter()
        .map(|m| WireMessage { role: m.role.as_str(), content: &m.content })
        .collect()
}

/// What a provider line parser made of one line of the response body.
#[derive(Debug, PartialEq)]
pub enum LineEvent {
    Fragment(String),
    /// Last increment of the reply, carried on the completion line itself.
    FinalFragment(String),
    Skip,
    Done,
}

pub type LineParser = fn(&str) -> Result<LineEvent, LlmError>;

/// Longest line accepted from an inference server before the stream is failed.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits a byte stream into `\n`-terminated lines. Bytes are only decoded
/// once a line is complete, so multi-byte characters that straddle chunk
/// boundaries survive.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    // Bytes of `pending` already known to hold no newline.
    scanned: usize,
    max_line: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn with_limit(max_line: usize) -> Self {
        Self { pending: Vec::new(), scanned: 0, max_line }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, LlmError> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(offset) = self.pending[self.scanned..].iter().position(|b| *b == b'\n') {
            let pos = self.scanned + offset;
            if pos > self.max_line {
                return Err(LlmError::LineTooLong(self.max_line));
            }
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            self.scanned = 0;
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            lines.push(line.trim_end_matches('\r').to_string());
        }
        self.scanned = self.pending.len();
        if self.pending.len() > self.max_line {
            return Err(LlmError::LineTooLong(self.max_line));
        }
        Ok(lines)
    }

    /// Remaining unterminated line once the body has ended, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        self.scanned = 0;
        let raw = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
        Some(line)
    }
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => Arc::new(OllamaClient::from_config(config)?),
        LlmType::OpenAI => Arc::new(OpenAIChatClient::from_config(config)?),
    };
    Ok(client)
}

/// Posts `payload` and turns the line-oriented response body into a
/// [`FragmentStream`] using the provider's `line_parser`.
pub async fn http_stream_generate(
    http: &HttpClient,
    url: &str,
    payload: &(impl Serialize + Sync),
    line_parser: LineParser,
    bearer: Option<&str>,
) -> Result<FragmentStream, LlmError> {
    let mut req = http.post(url).json(payload);
    if let Some(token) = bearer {
        req = req.header(AUTHORIZATION, format!("Bearer {}", token));
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(LlmError::Status { status, body });
    }

    let (tx, rx) = mpsc::channel(32);
    let mut bytes = resp.bytes_stream();
    let url = url.to_string();

    tokio::spawn(async move {
        let mut buffer = LineBuffer::default();
        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::Http(e))).await;
                    return;
                }
            };
            let lines = match buffer.push(&chunk) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!("Inference stream from {} rejected: {}", url, e);
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };
            for line in lines {
                match forward_line(&tx, line_parser, &line).await {
                    Forwarded::More => {}
                    Forwarded::Done => {
                        debug!("Inference stream from {} complete", url);
                        return;
                    }
                    Forwarded::Stop => return,
                }
            }
        }
        if let Some(line) = buffer.finish() {
            match forward_line(&tx, line_parser, &line).await {
                Forwarded::More => {}
                Forwarded::Done => {
                    debug!("Inference stream from {} complete", url);
                    return;
                }
                Forwarded::Stop => return,
            }
        }
        warn!("Inference stream from {} closed without a completion marker", url);
        let _ = tx
            .send(Err(LlmError::Upstream("stream ended before completion marker".into())))
            .await;
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}

enum Forwarded {
    More,
    Done,
    /// An error was forwarded or the receiver went away.
    Stop,
}

async fn forward_line(
    tx: &mpsc::Sender<Result<String, LlmError>>,
    line_parser: LineParser,
    line: &str,
) -> Forwarded {
    if line.trim().is_empty() {
        return Forwarded::More;
    }
    match line_parser(line) {
        Ok(LineEvent::Fragment(text)) => match tx.send(Ok(text)).await {
            Ok(()) => Forwarded::More,
            Err(_) => Forwarded::Stop,
        },
        Ok(LineEvent::FinalFragment(text)) => match tx.send(Ok(text)).await {
            Ok(()) => Forwarded::Done,
            Err(_) => Forwarded::Stop,
        },
        Ok(LineEvent::Skip) => Forwarded::More,
        Ok(LineEvent::Done) => Forwarded::Done,
        Err(e) => {
            warn!("Inference stream line rejected: {} ({})", e, line);
            let _ = tx.send(Err(e)).await;
            Forwarded::Stop
        }
    }
}

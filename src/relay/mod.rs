mod error;
mod turn;

pub use error::RelayError;
pub use turn::{ Turn, TurnState };

use futures::StreamExt;
use log::{ debug, info, warn };
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{ mpsc, Mutex };
use tokio_stream::wrappers::UnboundedReceiverStream;
use crate::history::HistoryStore;
use crate::llm::chat::{ ChatClient, FragmentStream };
use crate::models::chat::{ ChatMessage, StreamRecord };

/// Records of one turn, in the order the model produced them.
pub type TurnStream = UnboundedReceiverStream<StreamRecord>;

#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Pause after each emitted fragment. Zero only yields.
    pub fragment_delay: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            fragment_delay: Duration::from_millis(100),
        }
    }
}

/// Runs chat turns against one shared conversation log.
///
/// Turns are serialized: the turn lock is taken before the user message is
/// appended and released only after the assistant reply is appended (or the
/// turn aborts). The lock is FIFO, so concurrent requests land in the log as
/// contiguous user/assistant pairs in the order they were accepted.
///
/// Records reach the caller over an unbounded channel, so the lock is held
/// for as long as the model generates and never waits on the caller reading.
#[derive(Clone)]
pub struct ChatRelay {
    client: Arc<dyn ChatClient>,
    history: Arc<dyn HistoryStore>,
    turn_lock: Arc<Mutex<()>>,
    options: RelayOptions,
}

impl ChatRelay {
    pub fn new(
        client: Arc<dyn ChatClient>,
        history: Arc<dyn HistoryStore>,
        options: RelayOptions,
    ) -> Self {
        Self {
            client,
            history,
            turn_lock: Arc::new(Mutex::new(())),
            options,
        }
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    /// Appends `user_input` to the log, opens the model stream over the whole
    /// log and returns the stream of records for the caller.
    ///
    /// Waits while another turn is in flight. An `Err` means no stream was
    /// started; if the user message had already been appended it stays in the
    /// log, but no assistant message is ever added for this turn.
    pub async fn start_turn(&self, user_input: String) -> Result<TurnStream, RelayError> {
        if user_input.trim().is_empty() {
            return Err(RelayError::InvalidInput("user_input must not be empty".into()));
        }

        let mut turn = Turn::new();
        let guard = self.turn_lock.clone().lock_owned().await;
        debug!("Turn {} admitted ({} chars)", turn.id(), user_input.chars().count());

        self.history.append(ChatMessage::user(user_input)).await;
        let context = self.history.snapshot().await;

        let upstream = match self.client.stream_chat(&context).await {
            Ok(stream) => stream,
            Err(e) => {
                turn.abort();
                warn!("Turn {} aborted before first fragment: {}", turn.id(), e);
                return Err(RelayError::Upstream(e));
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let history = Arc::clone(&self.history);
        let delay = self.options.fragment_delay;

        tokio::spawn(async move {
            let _guard = guard;
            drive_turn(turn, upstream, tx, history, delay).await;
        });

        Ok(UnboundedReceiverStream::new(rx))
    }
}

async fn drive_turn(
    mut turn: Turn,
    mut upstream: FragmentStream,
    tx: mpsc::UnboundedSender<StreamRecord>,
    history: Arc<dyn HistoryStore>,
    delay: Duration,
) -> TurnState {
    while let Some(item) = upstream.next().await {
        match item {
            Ok(fragment) => {
                turn.push_fragment(&fragment);
                if tx.send(StreamRecord::fragment(fragment)).is_err() {
                    turn.abort();
                    warn!(
                        "Turn {}: client went away after {} fragment(s), reply discarded",
                        turn.id(),
                        turn.fragments()
                    );
                    return turn.state();
                }
                pace(delay).await;
            }
            Err(e) => {
                let discarded = turn.abort().map(|partial| partial.len()).unwrap_or(0);
                warn!(
                    "Turn {} failed after {} fragment(s), discarding {} bytes of partial reply: {}",
                    turn.id(),
                    turn.fragments(),
                    discarded,
                    e
                );
                let _ = tx.send(StreamRecord::error(format!("turn failed: {}", e)));
                return turn.state();
            }
        }
    }

    let fragments = turn.fragments();
    if let Some(reply) = turn.complete() {
        info!("Turn {} completed: {} fragment(s), {} bytes", turn.id(), fragments, reply.len());
        history.append(ChatMessage::assistant(reply)).await;
    }
    turn.state()
}

async fn pace(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

mod memory;

pub use memory::{ MemoryHistoryStore, DEFAULT_GREETING };

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use crate::cli::Args;
use crate::models::chat::ChatMessage;

/// Ordered, process-lifetime transcript shared by every turn.
///
/// Insertion order is the prompt order handed to the inference client, so
/// implementations must never reorder. Appends are unconditional: the store
/// does not validate roles or enforce user/assistant alternation.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, message: ChatMessage);

    async fn snapshot(&self) -> Vec<ChatMessage>;

    async fn len(&self) -> usize;
}

pub fn initialize_history_store(args: &Args) -> Arc<dyn HistoryStore> {
    info!("Conversation log kept in memory, seeded with: {:?}", args.greeting);
    Arc::new(MemoryHistoryStore::with_greeting(&args.greeting))
}

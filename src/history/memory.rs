use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::history::HistoryStore;
use crate::models::chat::ChatMessage;

pub const DEFAULT_GREETING: &str = "How can I help you?";

pub struct MemoryHistoryStore {
    messages: RwLock<Vec<ChatMessage>>,
}

impl MemoryHistoryStore {
    /// A log that already holds the assistant greeting, so it is never empty.
    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            messages: RwLock::new(vec![ChatMessage::assistant(greeting)]),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::with_greeting(DEFAULT_GREETING)
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, message: ChatMessage) {
        self.messages.write().await.push(message);
    }

    async fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    async fn len(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[tokio::test]
    async fn fresh_log_holds_only_the_greeting() {
        let store = MemoryHistoryStore::default();
        let messages = store.snapshot().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn append_keeps_insertion_order() {
        let store = MemoryHistoryStore::with_greeting("hi");
        store.append(ChatMessage::user("one")).await;
        store.append(ChatMessage::user("two")).await;
        store.append(ChatMessage::assistant("three")).await;

        let contents: Vec<String> = store
            .snapshot().await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["hi", "one", "two", "three"]);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_later_appends() {
        let store = MemoryHistoryStore::default();
        let before = store.snapshot().await;
        store.append(ChatMessage::user("later")).await;
        assert_eq!(before.len(), 1);
        assert_eq!(store.len().await, 2);
    }
}

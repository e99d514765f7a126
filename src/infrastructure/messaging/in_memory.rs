use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::services::queue::MessageQueue;

/// FIFO queue backing drain mode and tests.
#[derive(Default)]
pub struct InMemoryQueue {
    messages: Mutex<VecDeque<String>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn push(&self, message_as_json: String) -> anyhow::Result<()> {
        self.messages.lock().await.push_back(message_as_json);
        Ok(())
    }

    async fn pop(&self) -> anyhow::Result<Option<String>> {
        Ok(self.messages.lock().await.pop_front())
    }
}

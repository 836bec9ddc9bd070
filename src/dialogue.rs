//! Conversion dialogue module for handling conversation state with users.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::ChatId;

use crate::errors::BotError;

/// Represents the conversation state of one chat
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionState {
    #[default]
    Idle,
    AwaitingText,
    AwaitingType {
        pending_text: String,
    },
}

impl ConversionState {
    /// Text waiting for a file type, if any
    pub fn pending_text(&self) -> Option<&str> {
        match self {
            ConversionState::AwaitingType { pending_text } => Some(pending_text),
            _ => None,
        }
    }
}

/// Type alias for our conversion dialogue
pub type ConversionDialogue = Dialogue<ConversionState, InMemStorage<ConversionState>>;

/// Per-chat session storage.
///
/// Cloning shares the underlying map. Returning a session to `Idle` removes
/// its entry, so only chats parked mid-conversation hold memory.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<InMemStorage<ConversionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            storage: InMemStorage::new(),
        }
    }

    /// Dialogue handle for one chat
    pub fn dialogue(&self, chat_id: ChatId) -> ConversionDialogue {
        Dialogue::new(Arc::clone(&self.storage), chat_id)
    }

    /// Current state of a chat; unknown chats are `Idle`
    pub async fn state(&self, chat_id: ChatId) -> Result<ConversionState, BotError> {
        self.dialogue(chat_id)
            .get_or_default()
            .await
            .map_err(|e| BotError::Storage(e.to_string()))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

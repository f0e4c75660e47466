pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::{
    base::types::{Res, Void},
    extract::RawMessage,
};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Slack. Implementing this trait allows different chat services to be used
/// with clerk-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the bot user ID.
    ///
    /// Returns the unique identifier for the bot in the chat platform,
    /// which is used to detect when the bot is mentioned.
    fn bot_user_id(&self) -> &str;

    /// Start the chat client listener.
    ///
    /// This sets up event listeners for the chat platform and begins processing
    /// incoming mentions and events.
    async fn start(&self) -> Void;

    /// Send a message to a channel thread.
    ///
    /// Used for acknowledgements, confirmations, and error replies, keeping
    /// all bot chatter inside the thread it was summoned from.
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void;

    /// Get the parent message of a thread.
    ///
    /// Retrieves the first message of the thread, which is the message the
    /// user wants clipped into the knowledge base.
    async fn get_parent_message(&self, channel_id: &str, thread_ts: &str) -> Res<RawMessage>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}

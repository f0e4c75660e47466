//! Runtime services and shared state for clerk-bot.

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{chat::ChatClient, kb::KbClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the knowledge-base client, chat client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The knowledge-base client instance.
    pub kb: KbClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the knowledge-base client.
        let kb = KbClient::notion(&config)?;

        // Initialize the slack client.
        let chat = ChatClient::slack(&config, kb.clone()).await?;

        Ok(Self { config, kb, chat })
    }

    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}

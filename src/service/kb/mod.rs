pub mod notion;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::{base::types::Res, extract::ExtractedMessage};

// Traits.

/// Generic knowledge-base client trait that clients must implement.
///
/// This trait defines the core functionality for persisting extracted message
/// records. Implementing this trait allows different knowledge-base backends
/// to be used with clerk-bot.
#[async_trait]
pub trait GenericKbClient: Send + Sync + 'static {
    /// Persists one extracted message record as a new entry.
    ///
    /// Returns the backend's representation of the created entry, which the
    /// bot echoes back in its confirmation reply.
    async fn create_entry(&self, record: &ExtractedMessage) -> Res<Value>;

    /// Lists all entries currently stored in the knowledge base.
    async fn list_entries(&self) -> Res<Vec<Value>>;
}

// Structs.

/// Knowledge-base client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct KbClient {
    inner: Arc<dyn GenericKbClient>,
}

impl Deref for KbClient {
    type Target = dyn GenericKbClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl KbClient {
    pub fn new(inner: Arc<dyn GenericKbClient>) -> Self {
        Self { inner }
    }
}

//! Library root for `clerk-bot`.
//!
//! Clerk-bot is a Slack knowledge-clipping assistant designed to:
//! - Listen for @-mentions inside channel threads
//! - Fetch the thread's parent message
//! - Extract its salient content (clean text, first link, permalink)
//! - File the result as a page in a Notion database
//!
//! The bot integrates with Slack for chat and Notion for persistence.
//! The architecture is built around extensible traits that allow for
//! different implementations of each service.

#[deny(missing_docs)]
pub mod base;
pub mod extract;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the clerk-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with knowledge-base and chat clients
/// - Starts the socket-mode event loop for processing mentions
pub async fn start(config: Config) -> Void {
    info!("Starting clerk-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().unwrap();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}

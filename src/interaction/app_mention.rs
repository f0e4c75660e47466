//! This module handles app mentions: the "clip this thread" request.

use tracing::{Instrument, error, info, instrument};

use crate::{
    base::{config::Config, types::Void},
    extract,
    service::{chat::ChatClient, kb::KbClient},
};

/// Handles an app mention event.
///
/// A mention inside a thread means "save this thread's parent message to the
/// knowledge base". A mention outside a thread gets a nudge reply instead.
/// The event is processed on a spawned task so the socket listener is never
/// blocked.
#[instrument(skip_all)]
pub fn handle_app_mention(channel_id: String, thread_ts: Option<String>, mention_ts: String, kb: KbClient, chat: ChatClient, config: Config) {
    tokio::spawn(async move {
        // Process the event.
        let result = handle_app_mention_internal(&channel_id, thread_ts.as_deref(), &mention_ts, &kb, &chat, &config).in_current_span().await;

        // Log any errors, and let the requester know something went wrong.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);

            let reply_ts = thread_ts.as_deref().unwrap_or(&mention_ts);
            let _ = chat.send_message(&channel_id, reply_ts, &format!("Sorry, something went wrong: {err}")).await;
        }
    });
}

/// Internal function to handle the app mention event.
#[instrument(skip_all)]
async fn handle_app_mention_internal(channel_id: &str, thread_ts: Option<&str>, mention_ts: &str, kb: &KbClient, chat: &ChatClient, config: &Config) -> Void {
    // The bot only clips thread parents, so a top-level mention has nothing
    // to point at.
    let Some(thread_ts) = thread_ts else {
        chat.send_message(channel_id, mention_ts, "Please mention me from within a thread, not from the main conversation!").await?;
        return Ok(());
    };

    // Acknowledge receipt.
    chat.send_message(channel_id, thread_ts, "Fetching the parent message ...").await?;

    // Get the parent message and derive the structured record.

    let parent = chat.get_parent_message(channel_id, thread_ts).await?;
    let record = extract::extract_message(&parent, config.workspace_domain.as_deref(), Some(channel_id));

    // Persist it.

    let created = kb.create_entry(&record).await?;

    info!("Stored message {} in the knowledge base.", record.timestamp);

    // Confirm success.

    let reference = created["url"].as_str().or(created["id"].as_str()).unwrap_or_default();
    chat.send_message(channel_id, thread_ts, &format!("Saved! {reference}")).await?;

    Ok(())
}

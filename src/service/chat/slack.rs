//! Chat service integration for clerk-bot.
//!
//! This module provides functionality for interacting with chat platforms like Slack:
//! - Receiving mention and message events over socket mode
//! - Sending threaded replies
//! - Retrieving a thread's parent message
//!
//! It implements the `GenericChatClient` trait for Slack.

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    extract::RawMessage,
    interaction,
    service::kb::KbClient,
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{debug, info, instrument, warn};

use std::{ops::Deref, sync::Arc};

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, kb: KbClient) -> Res<Self> {
        let client = SlackChatClient::new(config, kb).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    kb: KbClient,
    chat: ChatClient,
    config: Config,
    bot_user_id: String,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub bot_user_id: String,
    pub client: Arc<FullClient>,
    pub kb: KbClient,
    pub config: Config,
}

impl Deref for SlackChatClient {
    type Target = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, kb: KbClient) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
            kb,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event)
            .with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            kb: self.kb.clone(),
            chat: ChatClient::from(self.clone()),
            config: self.config.clone(),
            bot_user_id: self.bot_user_id.clone(),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message)
            .with_as_user(true)
            .with_thread_ts(SlackTs(thread_ts.to_string()))
            .with_link_names(true);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_parent_message(&self, channel_id: &str, thread_ts: &str) -> Res<RawMessage> {
        // `conversations.replies` returns all messages in a thread; the first
        // one is always the parent.
        let request = SlackApiConversationsRepliesRequest::new(SlackChannelId(channel_id.to_string()), SlackTs(thread_ts.to_string()))
            .with_limit(1)
            .with_inclusive(true);

        let session = self.client.open_session(&self.bot_token);

        let response = session.conversations_replies(&request).await.map_err(|e| anyhow::anyhow!("Failed to fetch thread replies: {}", e))?;

        let parent = response.messages.into_iter().next().ok_or_else(|| anyhow::anyhow!("No parent message found for thread {}", thread_ts))?;

        Ok(RawMessage {
            ts: parent.origin.ts.0,
            user: parent.sender.user.map(|u| u.0).unwrap_or_default(),
            text: parent.content.text.unwrap_or_default(),
            channel: Some(channel_id.to_string()),
            team: None,
        })
    }
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    warn!("[COMMAND] {:#?}", event);
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("No app commands are currently supported.".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, _states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warn!("[INTERACTION] {:#?}", event);
    Ok(())
}

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    match event {
        SlackEventCallbackBody::AppMention(mention) => {
            info!("Received app mention event ...");

            // Self-mentions can happen when the bot's own confirmations quote
            // the mention text.
            if mention.user.0 == user_state.bot_user_id {
                warn!("Skipping app mention event from the bot itself.");
                return Ok(());
            }

            let channel_id = mention.channel.0.to_owned();
            let thread_ts = mention.origin.thread_ts.clone().map(|ts| ts.0);
            let mention_ts = mention.origin.ts.0.to_owned();

            interaction::app_mention::handle_app_mention(
                channel_id,
                thread_ts,
                mention_ts,
                user_state.kb.clone(),
                user_state.chat.clone(),
                user_state.config.clone(),
            );
        }
        SlackEventCallbackBody::Message(message) => {
            // Plain messages are not clipped; the bot only acts on mentions.
            let text = message.content.as_ref().map(|c| c.text.as_deref()).unwrap_or_default().unwrap_or_default();

            if text.contains(&user_state.bot_user_id) {
                debug!("Skipping message event; the app mention handler takes care of it.");
            } else {
                debug!("Ignoring plain message event.");
            }
        }
        _ => {
            warn!("Received unhandled push event.")
        }
    }

    Ok(())
}

// Tests.

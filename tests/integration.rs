#![cfg(test)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use clerk_bot::{
    base::{
        config::{Config, ConfigInner},
        types::{Res, Void},
    },
    extract::{ExtractedMessage, RawMessage},
    runtime::Runtime,
    service::{
        chat::{ChatClient, GenericChatClient},
        kb::{GenericKbClient, KbClient},
    },
};
use mockall::mock;
use serde_json::{Value, json};

// Mocks.

// Mock chat client for testing.

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        fn bot_user_id(&self) -> &str;
        async fn start(&self) -> Void;
        async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void;
        async fn get_parent_message(&self, channel_id: &str, thread_ts: &str) -> Res<RawMessage>;
    }
}

// Mock knowledge-base client for testing.

mock! {
    pub Kb {}

    #[async_trait]
    impl GenericKbClient for Kb {
        async fn create_entry(&self, record: &ExtractedMessage) -> Res<Value>;
        async fn list_entries(&self) -> Res<Vec<Value>>;
    }
}

/// Mock chat client that records every sent message and serves a fixed parent.
fn get_mock_chat(parent: RawMessage, sent: Arc<Mutex<Vec<String>>>) -> MockChat {
    let mut mock = MockChat::new();

    mock.expect_bot_user_id().return_const("U12345".to_string());
    mock.expect_start().returning(|| Ok(()));
    mock.expect_send_message().returning(move |_, _, text| {
        sent.lock().unwrap().push(text.to_string());
        Ok(())
    });
    mock.expect_get_parent_message().returning(move |_, _| Ok(parent.clone()));

    mock
}

/// Mock knowledge-base client that captures every created record.
fn get_mock_kb(created: Arc<Mutex<Vec<ExtractedMessage>>>) -> MockKb {
    let mut mock = MockKb::new();

    mock.expect_create_entry().returning(move |record| {
        created.lock().unwrap().push(record.clone());
        Ok(json!({ "id": "page_1", "url": "https://www.notion.so/page_1" }))
    });
    mock.expect_list_entries().returning(|| Ok(vec![]));

    mock
}

fn get_test_config() -> Config {
    Config {
        inner: Arc::new(ConfigInner {
            slack_app_token: "xapp-test".to_string(),
            slack_bot_token: "xoxb-test".to_string(),
            slack_signing_secret: "test_secret".to_string(),
            notion_integration_token: "ntn_test".to_string(),
            notion_api_version: "2025-09-03".to_string(),
            notion_database_id: "db_test".to_string(),
            workspace_domain: Some("acme".to_string()),
        }),
    }
}

fn get_test_parent() -> RawMessage {
    RawMessage {
        ts: "1764342743.964639".to_string(),
        user: "U09R0LJRDMM".to_string(),
        text: "beautiful link <http://xano.com|xano.com>".to_string(),
        channel: Some("C123ABC456".to_string()),
        team: None,
    }
}

/// Helper function to setup the test environment.
fn setup_test_environment(parent: RawMessage, sent: Arc<Mutex<Vec<String>>>, created: Arc<Mutex<Vec<ExtractedMessage>>>) -> Runtime {
    let config = get_test_config();

    // We create mocked versions of the chat and knowledge-base clients that
    // record what the handler does with them.
    let chat = ChatClient::new(Arc::new(get_mock_chat(parent, sent)));
    let kb = KbClient::new(Arc::new(get_mock_kb(created)));

    Runtime { config, kb, chat }
}

/// Wait for the spawned handler task to produce the expected effect.
async fn wait_for(condition: impl Fn() -> bool, max_attempts: u32, delay_ms: u64) -> bool {
    for _ in 0..max_attempts {
        if condition() {
            return true;
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    condition()
}

#[tokio::test]
async fn test_threaded_mention_clips_parent_message() {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let created = Arc::new(Mutex::new(Vec::new()));
    let runtime = setup_test_environment(get_test_parent(), sent.clone(), created.clone());

    // A mention inside a thread: the parent is the thread's first message.
    clerk_bot::interaction::app_mention::handle_app_mention(
        "C123ABC456".to_string(),
        Some("1764342743.964639".to_string()),
        "1764342750.000100".to_string(),
        runtime.kb.clone(),
        runtime.chat.clone(),
        runtime.config.clone(),
    );

    let processed = wait_for(|| !created.lock().unwrap().is_empty(), 50, 20).await;
    assert!(processed, "Timeout waiting for the mention to be processed");

    // Verify the persisted record carries the extracted content.
    let records = created.lock().unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.timestamp, "1764342743.964639");
    assert_eq!(record.user, "U09R0LJRDMM");
    assert_eq!(record.url.as_deref(), Some("http://xano.com"));
    assert_eq!(record.link_title.as_deref(), Some("xano.com"));
    assert_eq!(record.message_content, "beautiful link xano.com");
    assert_eq!(record.permalink, "https://acme.slack.com/archives/C123ABC456/p1764342743964639");
    drop(records);

    // Verify the bot acknowledged and confirmed in-thread.
    let confirmed = wait_for(|| sent.lock().unwrap().iter().any(|text| text.starts_with("Saved!")), 50, 20).await;
    assert!(confirmed, "Expected a confirmation reply");

    let messages = sent.lock().unwrap();
    assert!(messages.iter().any(|text| text.contains("Fetching the parent message")));
    assert!(messages.iter().any(|text| text.contains("https://www.notion.so/page_1")));
}

#[tokio::test]
async fn test_top_level_mention_gets_a_nudge() {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let created = Arc::new(Mutex::new(Vec::new()));
    let runtime = setup_test_environment(get_test_parent(), sent.clone(), created.clone());

    // A mention outside of a thread has no parent to clip.
    clerk_bot::interaction::app_mention::handle_app_mention(
        "C123ABC456".to_string(),
        None,
        "1764342750.000100".to_string(),
        runtime.kb.clone(),
        runtime.chat.clone(),
        runtime.config.clone(),
    );

    let replied = wait_for(|| !sent.lock().unwrap().is_empty(), 50, 20).await;
    assert!(replied, "Timeout waiting for the nudge reply");

    let messages = sent.lock().unwrap();
    assert!(messages.iter().any(|text| text.contains("within a thread")));

    // Nothing was persisted.
    assert!(created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_parent_fetch_failure_is_reported_in_thread() {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let created: Arc<Mutex<Vec<ExtractedMessage>>> = Arc::new(Mutex::new(Vec::new()));

    // A chat client whose parent fetch always fails.
    let mut mock_chat = MockChat::new();
    mock_chat.expect_bot_user_id().return_const("U12345".to_string());
    let sent_clone = sent.clone();
    mock_chat.expect_send_message().returning(move |_, _, text| {
        sent_clone.lock().unwrap().push(text.to_string());
        Ok(())
    });
    mock_chat.expect_get_parent_message().returning(|_, thread_ts| Err(anyhow::anyhow!("No parent message found for thread {}", thread_ts)));

    let chat = ChatClient::new(Arc::new(mock_chat));
    let kb = KbClient::new(Arc::new(get_mock_kb(created.clone())));

    clerk_bot::interaction::app_mention::handle_app_mention(
        "C123ABC456".to_string(),
        Some("1764342743.964639".to_string()),
        "1764342750.000100".to_string(),
        kb,
        chat,
        get_test_config(),
    );

    let reported = wait_for(|| sent.lock().unwrap().iter().any(|text| text.contains("something went wrong")), 50, 20).await;
    assert!(reported, "Expected an error reply in the thread");

    assert!(created.lock().unwrap().is_empty());
}

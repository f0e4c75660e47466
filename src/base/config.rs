//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default Notion API version header value.
fn default_notion_api_version() -> String {
    "2025-09-03".to_string()
}

/// Configuration for the clerk-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Shared inner configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The configuration values themselves, deserialized from env and file sources.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app token (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Slack signing secret (`SLACK_SIGNING_SECRET`).
    pub slack_signing_secret: String,
    /// Notion integration token (`NOTION_INTEGRATION_TOKEN`).
    pub notion_integration_token: String,
    /// Notion API version header value (`NOTION_API_VERSION`).
    #[serde(default = "default_notion_api_version")]
    pub notion_api_version: String,
    /// Notion database ID that receives clipped messages (`NOTION_DATABASE_ID`).
    pub notion_database_id: String,
    /// Optional Slack workspace domain used when building permalinks
    /// (`WORKSPACE_DOMAIN`), e.g. `acme` for `acme.slack.com`.
    ///
    /// When absent, permalinks fall back to the team ID carried on the
    /// message itself, or degrade to an empty string.
    #[serde(default)]
    pub workspace_domain: Option<String>,
}

impl Config {
    /// Loads configuration from the environment (prefix `CLERK_BOT`), plus an
    /// optional TOML file, and validates the result.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("CLERK_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.notion_integration_token.is_empty() {
            return Err(anyhow::anyhow!("A Notion integration token is required."));
        }

        if result.notion_database_id.is_empty() {
            return Err(anyhow::anyhow!("A Notion database ID is required."));
        }

        if result.notion_api_version.is_empty() {
            return Err(anyhow::anyhow!("The Notion API version must not be empty."));
        }

        Ok(result)
    }
}

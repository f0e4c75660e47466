//! The message-content extraction engine.
//!
//! This module is the heart of clerk-bot: a pure, total transformation from a
//! raw Slack message (mrkdwn markup, mentions, HTML-escaped entities) into a
//! structured record ready for the knowledge base:
//! - Clean, human-readable text with all markup resolved
//! - The first embedded link and its display label
//! - A canonical permalink for the message
//!
//! No I/O happens here. Every input, however malformed, produces a
//! structurally valid record; unresolvable fields degrade to `None` or empty
//! strings rather than errors.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Host suffix for message permalinks, e.g. `acme.slack.com`.
const SLACK_ARCHIVE_HOST: &str = "slack.com";

// Slack mrkdwn token grammars.
//
// Each pattern matches exactly one token class, and no rule's replacement text
// can re-match a later rule, so the formatting pass is a fixed sequence of
// single-pass substitutions rather than a cascade.
// Source: https://docs.slack.dev/messaging/formatting-message-text/

/// `<http://...>`, `<https://...|label>`, `<mailto:...|label>`.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<((?:https?://|mailto:)[^|>]+)(?:\|([^>]+))?>").expect("link pattern compiles"));

/// `<#C123>` or `<#C123|general>`.
static CHANNEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<#([^|>]+)(?:\|([^>]+))?>").expect("channel pattern compiles"));

/// `<@U123>` or `<@U123|alice>`.
static USER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@([^|>]+)(?:\|([^>]+))?>").expect("user pattern compiles"));

/// `<!subteam^S123>` or `<!subteam^S123|@eng>`.
static SUBTEAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!subteam\^([^|>]+)(?:\|([^>]+))?>").expect("subteam pattern compiles"));

/// `<!here>`, `<!channel>`, `<!everyone>`.
static BROADCAST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!(here|channel|everyone)>").expect("broadcast pattern compiles"));

// Data types.

/// A raw Slack message as delivered by the events API or
/// `conversations.replies`.
///
/// The timestamp is an opaque, order-preserving `<seconds>.<micros>` string;
/// it is never parsed as a number here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message timestamp, e.g. `"1512085950.000216"`.
    pub ts: String,
    /// Platform identifier of the sender.
    pub user: String,
    /// Raw message body, possibly containing mrkdwn tokens.
    #[serde(default)]
    pub text: String,
    /// Channel the message was posted in, when known.
    #[serde(default)]
    pub channel: Option<String>,
    /// Workspace (team) identifier, used as a permalink-domain fallback.
    #[serde(default)]
    pub team: Option<String>,
}

/// A link token found in a message body.
///
/// `url` is always non-empty; `title` is `None` when the token carries no
/// display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub url: String,
    pub title: Option<String>,
}

/// The structured record derived from one raw message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMessage {
    /// Timestamp copied verbatim from the input.
    pub timestamp: String,
    /// URL of the first link in the text, if any.
    pub url: Option<String>,
    /// Display label of the first link, if any.
    pub link_title: Option<String>,
    /// Sender identifier copied verbatim from the input.
    pub user: String,
    /// Message body with all markup resolved to its human-readable form.
    pub message_content: String,
    /// Canonical permalink, or the empty string when it cannot be built.
    pub permalink: String,
}

// Operations.

/// Scans the text left to right and collects every link token in order of
/// appearance.
///
/// Only `http://`, `https://`, and `mailto:` schemes count as links; channel,
/// user, subteam, and broadcast tokens are untouched.
pub fn extract_links(text: &str) -> Vec<ExtractedLink> {
    LINK_RE
        .captures_iter(text)
        .map(|caps| ExtractedLink {
            url: caps[1].to_string(),
            title: caps.get(2).map(|m| m.as_str().to_string()),
        })
        .collect()
}

/// Resolves all mrkdwn tokens in the text to their human-readable form and
/// unescapes HTML entities.
///
/// Substitution order matters: links first (so a label like `@alice` survives
/// untouched), then channel, user, and subteam references, then broadcast
/// markers, then entity unescaping last. Malformed fragments that match no
/// grammar are left as literal text.
pub fn clean_text(text: &str) -> String {
    let text = LINK_RE.replace_all(text, |caps: &Captures| match caps.get(2) {
        Some(label) => label.as_str().to_string(),
        None => caps[1].to_string(),
    });

    let text = CHANNEL_RE.replace_all(&text, |caps: &Captures| match caps.get(2) {
        Some(name) => format!("#{}", name.as_str()),
        None => format!("#{}", &caps[1]),
    });

    let text = USER_RE.replace_all(&text, |caps: &Captures| match caps.get(2) {
        Some(name) => format!("@{}", name.as_str()),
        None => format!("@{}", &caps[1]),
    });

    let text = SUBTEAM_RE.replace_all(&text, |caps: &Captures| match caps.get(2) {
        Some(label) => label.as_str().to_string(),
        None => format!("@{}", &caps[1]),
    });

    let text = BROADCAST_RE.replace_all(&text, "$1");

    text.replace("&amp;", "&").replace("&lt;", "<").replace("&gt;", ">")
}

/// Builds the archive permalink for a message:
/// `https://<domain>.slack.com/archives/<channel>/p<ts-without-dot>`.
///
/// The domain is lowercased and the single `.` separator is removed from the
/// timestamp, e.g. `"1512085950.000216"` becomes `p1512085950000216`.
pub fn build_permalink(domain: &str, channel: &str, ts: &str) -> String {
    let domain = domain.to_lowercase();
    let ts_without_dot = ts.replacen('.', "", 1);

    format!("https://{domain}.{SLACK_ARCHIVE_HOST}/archives/{channel}/p{ts_without_dot}")
}

/// Derives the structured record for a raw message.
///
/// This never fails: missing or malformed fields degrade to `None`/empty
/// defaults. When the text contains several links, only the first is surfaced
/// in `url`/`link_title`; the rest remain (reformatted) inside
/// `message_content`.
///
/// The permalink domain is resolved by ordered fallback: the explicit
/// `workspace_domain` argument first, then the message's own `team`. The
/// channel is `channel_override` first, then the message's `channel`. If no
/// channel (or no domain) resolves, the permalink is the empty string.
pub fn extract_message(message: &RawMessage, workspace_domain: Option<&str>, channel_override: Option<&str>) -> ExtractedMessage {
    let first_link = extract_links(&message.text).into_iter().next();

    let channel = channel_override.or(message.channel.as_deref());
    let permalink = match (workspace_domain, message.team.as_deref(), channel) {
        (Some(domain), _, Some(channel)) => build_permalink(domain, channel, &message.ts),
        (None, Some(team), Some(channel)) => build_permalink(team, channel, &message.ts),
        _ => String::new(),
    };

    let (url, link_title) = match first_link {
        Some(link) => (Some(link.url), link.title),
        None => (None, None),
    };

    ExtractedMessage {
        timestamp: message.ts.clone(),
        url,
        link_title,
        user: message.user.clone(),
        message_content: clean_text(&message.text),
        permalink,
    }
}

// Tests.

//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by clerk-bot:
//! - Chat services (e.g., Slack)
//! - Knowledge-base services (e.g., Notion)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod kb;

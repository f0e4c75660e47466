//! Event handling and user interactions for clerk-bot.
//!
//! This module provides functionality for handling mention events:
//! - Fetching the parent message of the thread the bot was summoned from
//! - Running the extraction engine over it
//! - Persisting the record and confirming in-thread

pub mod app_mention;

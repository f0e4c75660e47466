//! Core types, configuration, and shared state for clerk-bot.
//!
//! This module contains the foundational components used across the application:
//! - Configuration management
//! - Common type aliases

pub mod config;
pub mod types;

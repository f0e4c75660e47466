//! Common type aliases used across clerk-bot.

/// Catch-all error type.
pub type Err = anyhow::Error;
/// Result with the catch-all error type.
pub type Res<T> = Result<T, Err>;
/// Result with no success value.
pub type Void = Res<()>;

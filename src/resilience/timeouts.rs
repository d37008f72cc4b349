//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Keep timeout errors distinct from other I/O errors
//!
//! Client-side reads and writes are deliberately left without deadlines;
//! a stalled client can hold its session open.

use std::future::Future;
use std::time::Duration;

use crate::error::Phase;

/// Outcome of a deadline-bounded operation.
#[derive(Debug)]
pub enum Deadline<T> {
    /// The operation finished in time (successfully or not).
    Completed(T),
    /// The deadline elapsed first.
    Elapsed { phase: Phase, after: Duration },
}

/// Run `fut` under `after`, tagging an expiry with `phase`.
pub async fn within<F, T>(phase: Phase, after: Duration, fut: F) -> Deadline<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(value) => Deadline::Completed(value),
        Err(_) => Deadline::Elapsed { phase, after },
    }
}

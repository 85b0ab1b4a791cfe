//! Backoff schedule and suspension primitive.
//!
//! The wait between retry attempts prefers a server-supplied hint and
//! otherwise grows exponentially (1s, 2s, 4s, ...). Suspension goes
//! through the [`Sleeper`] trait so tests can record delays instead of
//! spending wall-clock time.

use async_trait::async_trait;
use std::time::Duration;

/// Wait time before retry attempt number `attempt` (zero-based).
///
/// `retry_after` is the server hint in seconds; when absent the delay
/// is `2^attempt` seconds.
pub fn backoff_delay(attempt: u32, retry_after: Option<u64>) -> Duration {
    match retry_after {
        Some(secs) => Duration::from_secs(secs),
        None => Duration::from_secs(1u64 << attempt.min(16)),
    }
}

/// Cooperative suspension between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_schedule() {
        assert_eq!(backoff_delay(0, None), Duration::from_secs(1));
        assert_eq!(backoff_delay(1, None), Duration::from_secs(2));
        assert_eq!(backoff_delay(2, None), Duration::from_secs(4));
    }

    #[test]
    fn test_server_hint_wins() {
        assert_eq!(backoff_delay(0, Some(60)), Duration::from_secs(60));
        assert_eq!(backoff_delay(3, Some(5)), Duration::from_secs(5));
    }

    #[test]
    fn test_large_attempt_does_not_overflow() {
        let delay = backoff_delay(u32::MAX, None);
        assert_eq!(delay, Duration::from_secs(1 << 16));
    }
}

use std::time::Duration;

/// High-level classification of a transfer error, for log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read/low-speed).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection refused/reset, DNS, etc.).
    Connection,
    /// Server returned a non-2xx status.
    Http(u16),
    /// Body ended before the advertised length.
    Partial,
    /// Local disk write failed.
    Storage,
    /// Anything else.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempt budget spent.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Bounded attempts with a fixed delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Must be at least 1.
    pub max_attempts: u32,
    /// Delay between a failed attempt and the next one.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Decide what happens after attempt `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_recovery_behaviour() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.delay, Duration::from_secs(20));
    }

    #[test]
    fn fixed_delay_until_budget_spent() {
        let p = RetryPolicy::new(3, Duration::from_secs(5));
        assert_eq!(p.decide(1), RetryDecision::RetryAfter(Duration::from_secs(5)));
        assert_eq!(p.decide(2), RetryDecision::RetryAfter(Duration::from_secs(5)));
        assert_eq!(p.decide(3), RetryDecision::NoRetry);
    }

    #[test]
    fn single_attempt_never_retries() {
        let p = RetryPolicy::new(1, Duration::ZERO);
        assert_eq!(p.decide(1), RetryDecision::NoRetry);
    }
}

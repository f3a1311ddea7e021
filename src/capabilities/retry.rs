//! Retry manager with exponential backoff
//!
//! Bounded retry for idempotent read-only capability calls (search, embed,
//! rerank). Generation and classification calls must not go through this
//! path: re-invoking them risks duplicate side-effecting generations.

use crate::errors::{ResearchError, Result};
use std::time::Duration;
use tokio::time::sleep;

/// Maximum delay cap (8 seconds)
const MAX_DELAY_MS: u64 = 8000;

/// Retry manager with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryManager {
    /// Maximum retry attempts
    max_retries: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Enable jitter
    enable_jitter: bool,
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryManager {
    /// Create new retry manager with default settings
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Create retry manager with custom settings
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Execute a read-only operation with retry logic
    pub async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !self.is_retryable(&e) {
                        return Err(e);
                    }

                    attempt += 1;

                    if attempt >= self.max_retries {
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt);
                    sleep(delay).await;
                }
            }
        }
    }

    /// Calculate delay for given attempt number
    fn calculate_delay(&self, attempt: u32) -> Duration {
        // Binary exponential backoff: 2^attempt
        let exponential_delay = self.base_delay_ms * 2u64.pow(attempt);

        // Cap at maximum delay
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        // Add jitter if enabled (±25% random variation)
        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Check if error is retryable
    ///
    /// Only transient capability failures are retried. Route and alignment
    /// contract breaches are configuration errors; cancellation must
    /// propagate immediately.
    fn is_retryable(&self, error: &ResearchError) -> bool {
        match error {
            ResearchError::Capability { .. } => true,
            ResearchError::IoError(_) => true,

            ResearchError::InvalidRoute { .. } => false,
            ResearchError::InvalidAlignment { .. } => false,
            ResearchError::Cancelled => false,
            ResearchError::SerializationError(_) => false,
            ResearchError::ConfigError(_) => false,
            ResearchError::Generic(_) => false,
        }
    }

    /// Get max retries
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

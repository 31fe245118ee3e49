/// Rate limiting module for login, registration and survey submission.
///
/// Implements sliding window rate limiting using in-memory storage (DashMap).
/// This is suitable for single-instance deployments.
///
/// Limits are read from the `[rate_limit]` section of the application config
/// on every check, so a config reload takes effect immediately.
///
/// # Example Usage
///
/// ```rust,ignore
/// use crate::rate_limit::check_login_rate_limit;
///
/// if let Err(e) = check_login_rate_limit("192.168.1.1", "alice@example.com") {
///     return Err(error::ErrorTooManyRequests(
///         format!("Too many attempts. Try again in {} seconds", e.retry_after_seconds)
///     ));
/// }
/// ```
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config;

/// Global rate limiter instance
pub static RATE_LIMITER: Lazy<Arc<RateLimiter>> = Lazy::new(|| Arc::new(RateLimiter::new()));

/// Longest window any limit uses; older timestamps are dropped on cleanup.
pub const MAX_WINDOW: Duration = Duration::from_secs(3600);

/// Rate limiter using in-memory storage
pub struct RateLimiter {
    /// Map of (action_type:identifier) -> Request timestamps
    requests: DashMap<String, Vec<Instant>>,
}

/// Error returned when rate limit is exceeded
#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Number of seconds until the rate limit resets
    pub retry_after_seconds: u64,
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Too many attempts. Try again in {} seconds",
            self.retry_after_seconds
        )
    }
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }

    /// Check if a request should be rate limited, recording it when allowed.
    ///
    /// # Arguments
    /// * `action` - The action being rate limited (e.g., "login", "submit")
    /// * `identifier` - Unique identifier for the requester (e.g., IP address)
    /// * `max_requests` - Maximum number of requests allowed in the window
    /// * `window` - Time window for the rate limit
    pub fn check_rate_limit(
        &self,
        action: &str,
        identifier: &str,
        max_requests: usize,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        let key = format!("{}:{}", action, identifier);
        let now = Instant::now();

        let mut entry = self.requests.entry(key).or_default();

        // Remove requests outside the time window (sliding window)
        entry.retain(|&timestamp| now.duration_since(timestamp) < window);

        if entry.len() >= max_requests {
            let oldest = entry[0];
            let retry_after = window.saturating_sub(now.duration_since(oldest));

            return Err(RateLimitError {
                retry_after_seconds: retry_after.as_secs() + 1, // Round up
            });
        }

        entry.push(now);

        Ok(())
    }

    /// Drops timestamps older than `max_age` and keys left without any.
    ///
    /// Called periodically from the server's cleanup tick.
    pub fn cleanup_old_entries(&self, max_age: Duration) {
        let now = Instant::now();
        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&timestamp| now.duration_since(timestamp) < max_age);
            !timestamps.is_empty()
        });
    }

    /// Clear all requests for a specific action/identifier
    pub fn clear_requests(&self, action: &str, identifier: &str) {
        let key = format!("{}:{}", action, identifier);
        self.requests.remove(&key);
    }

    /// Get the number of tracked keys (for monitoring/debugging)
    pub fn tracked_keys_count(&self) -> usize {
        self.requests.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helper functions for rate-limited actions
// ============================================================================

/// Check rate limit for login attempts per IP+email combination
pub fn check_login_rate_limit(ip: &str, email: &str) -> Result<(), RateLimitError> {
    let config = app_config::rate_limit();
    RATE_LIMITER.check_rate_limit(
        "login",
        &format!("{}:{}", ip, email),
        config.login_max_attempts as usize,
        Duration::from_secs(config.login_window_seconds as u64),
    )
}

/// Called on successful login so earlier typos do not count against the user
pub fn clear_login_attempts(ip: &str, email: &str) {
    RATE_LIMITER.clear_requests("login", &format!("{}:{}", ip, email));
}

/// Check rate limit for registration attempts (each one sends an email)
pub fn check_registration_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    let config = app_config::rate_limit();
    RATE_LIMITER.check_rate_limit(
        "registration",
        ip,
        config.registration_per_hour as usize,
        Duration::from_secs(3600),
    )
}

/// Check rate limit for one-time code verification and resend
pub fn check_otp_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    let config = app_config::rate_limit();
    RATE_LIMITER.check_rate_limit(
        "otp",
        ip,
        config.otp_max_attempts as usize,
        Duration::from_secs(config.otp_window_seconds as u64),
    )
}

/// Check rate limit for survey submissions per client
pub fn check_submission_rate_limit(identifier: &str) -> Result<(), RateLimitError> {
    let config = app_config::rate_limit();
    RATE_LIMITER.check_rate_limit(
        "submit",
        identifier,
        config.submissions_per_minute as usize,
        Duration::from_secs(60),
    )
}

/// Prune the global limiter.
pub fn cleanup_old_entries_public() {
    RATE_LIMITER.cleanup_old_entries(MAX_WINDOW);
}

// Time Provider Port (for testability)

use std::sync::atomic::{AtomicI64, Ordering};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that advances by one millisecond on every read.
///
/// Gives strictly increasing `created_at` values in tests.
pub struct TickingTimeProvider {
    now: AtomicI64,
}

impl TickingTimeProvider {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }
}

impl TimeProvider for TickingTimeProvider {
    fn now_millis(&self) -> i64 {
        self.now.fetch_add(1, Ordering::SeqCst)
    }
}

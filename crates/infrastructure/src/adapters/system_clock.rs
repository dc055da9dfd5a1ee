//! System clock adapter

use chrono::{DateTime, Utc};
use vareval_application::ports::Clock;

/// Clock backed by the system time, used for `now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_matches_now() {
        let clock = SystemClock::new();
        let before = Utc::now().timestamp_millis();
        let millis = clock.now_millis();
        let after = Utc::now().timestamp_millis();
        assert!(before <= millis && millis <= after);
    }
}

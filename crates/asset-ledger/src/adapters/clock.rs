//! Wall clock for production wiring. Tests use `test_utils::MockTimeSource`.

use crate::ports::outbound::TimeSource;
use shared_types::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, read from the system clock.
///
/// A clock set before 1970 reads as 0, which makes every archive record
/// look fresh rather than expired.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemTimeSource.now() > 1_577_836_800);
    }
}

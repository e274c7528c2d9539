pub mod log;

pub use log::EventLog;

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock unix time in milliseconds, 0 if the clock is before 1970
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

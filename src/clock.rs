use chrono::{Local, Utc};

/// Milliseconds since the Unix epoch, used for participant activity stamps
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Local wall-clock time formatted as HH:mm:ss, used for message timestamps
pub fn wall_clock_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

//! Time source for acceptance stamps and session directories
//!
//! Commands take one reading at start-up and reuse it, so every acceptance
//! written by a single `accept` shares the same timestamp and the session
//! directory name matches the moment the command began.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time
pub trait TimeProvider {
    fn now(&self) -> DateTime<Utc>;
}

/// Production provider backed by the system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Provider frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider(pub DateTime<Utc>);

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Name of a session directory, `YYYYMMDD-HHMMSS` in UTC
pub fn session_slug(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// Human-readable duration for stage timing lines
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

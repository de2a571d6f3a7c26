//! Server clock used to stamp `ServerTimestamp` writes.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Strictly increasing UTC clock with microsecond precision.
///
/// Two calls never return the same instant: when the wall clock has not moved
/// past the previous reading, the previous reading plus one microsecond is used.
#[derive(Debug, Default)]
pub struct ServerClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ServerClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let wall = DateTime::from_timestamp_micros(wall.timestamp_micros()).unwrap_or(wall);

        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = match *last {
            Some(prev) if wall <= prev => prev + Duration::microseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}

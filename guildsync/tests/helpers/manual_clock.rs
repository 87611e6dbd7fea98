//! Deterministic time and ids

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use guildsync_common::{Clock, IdGenerator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Clock that only moves when slept on or advanced
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// 2024-06-01T12:00:00Z
    pub fn fixed() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }

    /// Current time as Unix seconds
    pub fn now_secs(&self) -> i64 {
        self.now.lock().unwrap().timestamp()
    }

    /// Current time as Unix milliseconds
    pub fn now_millis(&self) -> i64 {
        self.now.lock().unwrap().timestamp_millis()
    }

    /// Durations passed to `sleep`, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
    }
}

/// Ids `req-1`, `req-2`, ...
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        format!("req-{}", self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

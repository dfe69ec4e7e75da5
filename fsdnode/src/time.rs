//! Wall-clock plumbing for the periodic controller.
//!
//! The controller schedules every duty against whole Unix seconds, so the
//! clock surface is deliberately small: seconds for duty arithmetic,
//! milliseconds for the lag-probe payload. A [`ManualClock`] stands in for
//! the system clock in tests, where duty intervals are crossed by advancing
//! time instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};

/// Unix timestamp in whole seconds.
pub type UnixTime = i64;

/// Source of wall-clock time for the controller.
pub trait Clock: Send {
    /// Current time in whole Unix seconds.
    fn now_unix(&self) -> UnixTime;

    /// Current time in Unix milliseconds (lag-probe payloads).
    fn now_millis(&self) -> i64;
}

/// Production clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> UnixTime {
        self.now_millis() / 1000
    }

    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Hand-cranked clock for tests.
///
/// Shared by handle: clone the `Arc` before boxing it into the node, then
/// drive time with [`ManualClock::advance`] from the test body.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock starting at the given Unix second.
    pub fn starting_at(now: UnixTime) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(now),
        })
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Pin the clock to an absolute Unix second.
    pub fn set(&self, now: UnixTime) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> UnixTime {
        self.now.load(Ordering::SeqCst)
    }

    fn now_millis(&self) -> i64 {
        self.now_unix() * 1000
    }
}

impl<C: Clock + ?Sized + Sync> Clock for Arc<C> {
    fn now_unix(&self) -> UnixTime {
        (**self).now_unix()
    }

    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Format a timestamp as the legacy compact GMT form `YYYYMMDDhhmmss`.
///
/// Used for the roster `UPDATE` field and per-client connect times.
pub fn sprint_gmt(ts: UnixTime) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y%m%d%H%M%S").to_string())
        .unwrap_or_default()
}

/// Format a timestamp as the roster date stamp `YYYY/MM/DD hh:mm:ss` (GMT).
pub fn sprint_gmt_date(ts: UnixTime) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y/%m/%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

//! Per-client fixed-window rate limiting.
//!
//! Two windows are tracked for every client: a rolling minute and the current
//! local calendar day. Counters live in a shared map, reset lazily when a
//! request arrives after the window expired, and are swept periodically so
//! idle clients do not accumulate. The limiter itself never fails; a poisoned
//! lock is recovered, not propagated.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Local};
use serde::Serialize;
use tracing::debug;

use crate::config::RateLimitConfig;

const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

const DENIAL_MINUTE: &str = "잠시 후 다시 시도해주세요. (분당 요청 한도 초과)";
const DENIAL_DAY: &str = "오늘의 상담 한도에 도달했습니다. 내일 다시 이용해주세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LimitWindow {
    Minute,
    Day,
}

impl LimitWindow {
    /// User-facing denial text for the exhausted window.
    #[must_use]
    pub const fn denial_message(self) -> &'static str {
        match self {
            Self::Minute => DENIAL_MINUTE,
            Self::Day => DENIAL_DAY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Local>,
}

/// Outcome of a single admission check. An allowed request reports how many
/// more would pass right now; a denial names the exhausted window and when
/// it reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateDecision {
    Allowed {
        remaining: u32,
    },
    Denied {
        window: LimitWindow,
        reset_at: DateTime<Local>,
    },
}

impl RateDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<(String, LimitWindow), WindowEntry>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Admits or denies one request for `client` at the current time. Both
    /// window counters advance on an allowed request; a denial leaves the
    /// other window untouched.
    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Local::now())
    }

    pub fn check_at(&self, client: &str, now: DateTime<Local>) -> RateDecision {
        let mut entries = self.lock_entries();

        let (minute_count, minute_reset) = hit_count(
            &mut entries,
            client,
            LimitWindow::Minute,
            now,
            now + ChronoDuration::seconds(60),
        );
        if minute_count > self.config.per_minute {
            debug!(client, "minute window exhausted");
            return RateDecision::Denied {
                window: LimitWindow::Minute,
                reset_at: minute_reset,
            };
        }

        let (day_count, day_reset) = hit_count(
            &mut entries,
            client,
            LimitWindow::Day,
            now,
            next_local_midnight(now),
        );
        if day_count > self.config.per_day {
            debug!(client, "daily window exhausted");
            return RateDecision::Denied {
                window: LimitWindow::Day,
                reset_at: day_reset,
            };
        }

        RateDecision::Allowed {
            remaining: (self.config.per_minute - minute_count)
                .min(self.config.per_day - day_count),
        }
    }

    /// Drops every entry whose window has already closed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Local::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Local>) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.reset_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "swept expired rate-limit entries");
        }
        removed
    }

    /// Number of live `(client, window)` counters.
    #[must_use]
    pub fn tracked_entries(&self) -> usize {
        self.lock_entries().len()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<(String, LimitWindow), WindowEntry>> {
        // A panic while holding the lock leaves counters at worst slightly
        // stale; admission control must keep working regardless.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Increments the counter for one `(client, window)` pair, restarting the
/// window first if it has expired. Returns the new count and the reset time.
fn hit_count(
    entries: &mut HashMap<(String, LimitWindow), WindowEntry>,
    client: &str,
    window: LimitWindow,
    now: DateTime<Local>,
    reset_at: DateTime<Local>,
) -> (u32, DateTime<Local>) {
    let entry = entries
        .entry((client.to_string(), window))
        .or_insert(WindowEntry { count: 0, reset_at });
    if now > entry.reset_at {
        entry.count = 0;
        entry.reset_at = reset_at;
    }
    entry.count += 1;
    (entry.count, entry.reset_at)
}

/// Start of the next local calendar day. Falls back to now + 24h when the
/// local timezone has no midnight (DST gaps).
fn next_local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .unwrap_or_else(|| now + ChronoDuration::hours(24))
}

/// Stops the background sweeper on drop.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a thread that sweeps expired entries every ten minutes until the
/// returned handle is dropped.
#[must_use]
pub fn start_sweeper(limiter: Arc<RateLimiter>) -> SweeperHandle {
    let (stop, rx) = mpsc::channel();
    let join = std::thread::spawn(move || loop {
        match rx.recv_timeout(SWEEP_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                limiter.sweep_expired();
            }
        }
    });
    SweeperHandle {
        stop,
        join: Some(join),
    }
}

/// Derives the limiter key from proxy headers, preferring `x-forwarded-for`
/// (first hop) over `x-real-ip`. Absent headers collapse to a shared
/// `unknown` bucket.
#[must_use]
pub fn client_key(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    if let Some(forwarded) = forwarded_for {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return normalize_client_id(first);
            }
        }
    }
    match real_ip.map(str::trim) {
        Some(ip) if !ip.is_empty() => normalize_client_id(ip),
        _ => "unknown".to_string(),
    }
}

/// Strips the IPv4-mapped IPv6 prefix so `::ffff:10.0.0.1` and `10.0.0.1`
/// share one bucket.
fn normalize_client_id(raw: &str) -> String {
    raw.strip_prefix("::ffff:").unwrap_or(raw).to_string()
}

//! Per-second and per-day admission control for outbound calls.
//!
//! ```no_run
//! # async fn demo() -> alpha_quotes::Result<()> {
//! use alpha_quotes::QuotaTracker;
//!
//! let quota = QuotaTracker::new(500, 5); // 500 calls per day, 5 calls per second
//! let answer = quota.admit(|| async { Ok(42) }).await?;
//! # let _ = answer;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use tokio::time::sleep;

use crate::config::QuotaSettings;
use crate::error::{AppError, Result};

mod schedule;

use schedule::ResetSchedule;

/// One call budget. The high half of `state` is the reset epoch, the low half the count, so a
/// reservation and a reset can never interleave.
#[derive(Debug, Default)]
pub(crate) struct Window {
    state: AtomicU64,
}

fn pack(epoch: u32, count: u32) -> u64 {
    (u64::from(epoch) << 32) | u64::from(count)
}

fn unpack(state: u64) -> (u32, u32) {
    ((state >> 32) as u32, state as u32)
}

impl Window {
    fn count(&self) -> u32 {
        unpack(self.state.load(Ordering::SeqCst)).1
    }

    fn epoch(&self) -> u32 {
        unpack(self.state.load(Ordering::SeqCst)).0
    }

    fn reset(&self) {
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                let (epoch, _) = unpack(state);
                Some(pack(epoch.wrapping_add(1), 0))
            });
    }

    /// Takes a slot if the count is below `limit`, returning the epoch it was taken in.
    fn try_reserve(&self, limit: Option<u32>) -> Option<u32> {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                let (epoch, count) = unpack(state);
                match limit {
                    Some(limit) if count >= limit => None,
                    _ => Some(pack(epoch, count.saturating_add(1))),
                }
            })
            .ok()
            .map(|previous| unpack(previous).0)
    }

    /// Gives a slot back, unless a reset since `epoch` already cleared it.
    fn release(&self, epoch: u32) {
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                let (current, count) = unpack(state);
                (current == epoch && count > 0).then(|| pack(current, count - 1))
            });
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    second: Window,
    day: Window,
}

impl Counters {
    fn reset_second(&self) {
        self.second.reset();
    }

    fn reset_day(&self) {
        self.day.reset();
    }
}

/// Snapshot of the admitted-call counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    pub second_count: u32,
    pub day_count: u32,
}

/// Limits the per-second and per-day execution counts of the work it admits.
///
/// A slot is reserved in both windows before the work runs, so the admitted count never
/// exceeds a limit, even with many concurrent callers. Both windows reset on fixed intervals
/// anchored to construction time. The reset thread only runs while some limit is set, and
/// stops when the tracker is dropped.
pub struct QuotaTracker {
    settings: QuotaSettings,
    counters: Arc<Counters>,
    _schedule: Option<ResetSchedule>,
}

impl QuotaTracker {
    /// Zero for either limit means that window is uncapped.
    pub fn new(day_limit: u32, second_limit: u32) -> Self {
        Self::with_settings(QuotaSettings::from_limits(day_limit, second_limit))
    }

    pub fn unlimited() -> Self {
        Self::with_settings(QuotaSettings::default())
    }

    pub fn with_settings(settings: QuotaSettings) -> Self {
        let settings = settings.normalized();
        let counters = Arc::new(Counters::default());
        let schedule = (settings.per_second.is_some() || settings.per_day.is_some()).then(|| {
            ResetSchedule::spawn(
                Arc::clone(&counters),
                settings.second_window,
                settings.day_window,
            )
        });

        Self {
            settings,
            counters,
            _schedule: schedule,
        }
    }

    pub fn settings(&self) -> &QuotaSettings {
        &self.settings
    }

    pub fn day_limit(&self) -> Option<u32> {
        self.settings.per_day
    }

    pub fn second_limit(&self) -> Option<u32> {
        self.settings.per_second
    }

    pub fn usage(&self) -> QuotaUsage {
        QuotaUsage {
            second_count: self.counters.second.count(),
            day_count: self.counters.day.count(),
        }
    }

    /// Runs `work` once both windows have room for it.
    ///
    /// Fails with [`AppError::DailyLimitReached`] without running `work` when the day budget is
    /// spent. When the second budget is spent the call waits, polling every
    /// `poll_interval`, until the next per-second reset. Slots are consumed whether `work`
    /// succeeds or fails. Dropping the returned future before `work` starts gives them back.
    pub async fn admit<F, Fut, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let day_slot = self.reserve_day()?;
        let second_slot = self.reserve_second().await;

        // A day reset during the wait wiped the first slot; count the call in the new day.
        let day_slot = if day_slot.is_current() {
            day_slot
        } else {
            debug!("day window rolled over while waiting, reserving again");
            self.reserve_day()?
        };

        day_slot.commit();
        second_slot.commit();

        work().await
    }

    fn reserve_day(&self) -> Result<Reservation<'_>> {
        if let Some(epoch) = self.counters.day.try_reserve(self.settings.per_day) {
            return Ok(Reservation::new(&self.counters.day, epoch));
        }

        warn!(
            "daily limit of {} calls reached, rejecting call",
            self.settings.per_day.unwrap_or_default()
        );
        Err(AppError::DailyLimitReached)
    }

    async fn reserve_second(&self) -> Reservation<'_> {
        let mut delayed = false;
        loop {
            if let Some(epoch) = self.counters.second.try_reserve(self.settings.per_second) {
                if delayed {
                    debug!("per-second slot freed, resuming call");
                }
                return Reservation::new(&self.counters.second, epoch);
            }

            if !delayed {
                debug!(
                    "per-second limit of {} calls reached, delaying call",
                    self.settings.per_second.unwrap_or_default()
                );
                delayed = true;
            }
            sleep(self.settings.poll_interval).await;
        }
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl fmt::Debug for QuotaTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotaTracker")
            .field("settings", &self.settings)
            .field("usage", &self.usage())
            .finish()
    }
}

/// A reserved slot that is handed back on drop unless committed.
struct Reservation<'a> {
    window: &'a Window,
    epoch: u32,
    committed: bool,
}

impl<'a> Reservation<'a> {
    fn new(window: &'a Window, epoch: u32) -> Self {
        Self {
            window,
            epoch,
            committed: false,
        }
    }

    /// False once the window has reset since the slot was taken.
    fn is_current(&self) -> bool {
        self.window.epoch() == self.epoch
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.window.release(self.epoch);
        }
    }
}

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::Counters;

/// Owned background thread that zeroes the window counters on fixed intervals.
pub(super) struct ResetSchedule {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ResetSchedule {
    pub(super) fn spawn(
        counters: Arc<Counters>,
        second_window: Duration,
        day_window: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let anchor = Instant::now();
            let mut next_second = anchor + second_window;
            let mut next_day = anchor + day_window;

            loop {
                let deadline = next_second.min(next_day);
                let timeout = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(timeout) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let now = Instant::now();
                if now >= next_second {
                    counters.reset_second();
                    next_second = advance(next_second, second_window, now);
                }
                if now >= next_day {
                    counters.reset_day();
                    next_day = advance(next_day, day_window, now);
                }
            }
        });

        Self {
            stop: Some(tx),
            handle: Some(handle),
        }
    }
}

/// Skips ticks that were missed while the thread was descheduled, like a ticker does.
fn advance(mut deadline: Instant, window: Duration, now: Instant) -> Instant {
    while deadline <= now {
        deadline += window;
    }
    deadline
}

impl Drop for ResetSchedule {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

//! Deadlines measured on an injected [`Timebase`], replacing iteration-count
//! busy waits so tests can run timeouts in virtual time.
use embassy_time::{Duration, Instant};

use crate::driver::traits::timebase::Timebase;

/// Point in time after which a bounded wait gives up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` after `now`.
    pub fn after(now: Instant, timeout: Duration) -> Self {
        Self { at: now + timeout }
    }

    /// Deadline `millis` after the current instant of `time`.
    pub fn from_now<T: Timebase>(time: &T, millis: u32) -> Self {
        Self::after(time.now(), Duration::from_millis(millis as u64))
    }

    pub fn at(&self) -> Instant {
        self.at
    }

    /// Reached or passed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.at
    }

    /// Time left at `now`, zero once expired.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.at
            .checked_duration_since(now)
            .unwrap_or(Duration::from_ticks(0))
    }
}

/// Poll `probe` every `poll_ms` until it yields a value or `timeout_ms` elapses.
///
/// The probe runs once up front, then after every sleep that ends before the
/// deadline. Once the budget is used up the result is `None`, even if the
/// value would have been available at that instant.
pub async fn poll_until<T, R>(
    time: &mut T,
    timeout_ms: u32,
    poll_ms: u32,
    mut probe: impl FnMut() -> Option<R>,
) -> Option<R>
where
    T: Timebase,
{
    let deadline = Deadline::from_now(time, timeout_ms);
    if let Some(value) = probe() {
        return Some(value);
    }
    while !deadline.is_expired(time.now()) {
        let left = deadline.remaining(time.now()).as_millis() as u32;
        time.delay_ms(poll_ms.max(1).min(left.max(1))).await;
        if deadline.is_expired(time.now()) {
            break;
        }
        if let Some(value) = probe() {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests;

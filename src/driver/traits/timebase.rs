//! Time source abstraction: a monotonic clock for deadlines and an
//! asynchronous delay for settling and blinking.
use embassy_time::Instant;

/// Injected time base. On target it wraps `embassy_time::{Instant, Timer}`;
/// tests substitute a virtual clock.
pub trait Timebase {
    /// Current instant on the monotonic clock.
    fn now(&self) -> Instant;

    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;
}

//! Unit tests for deadlines and bounded polling.
use super::*;
use core::cell::Cell;

/// Virtual clock: `delay_ms` advances time and resolves immediately.
struct VirtualTime<'c> {
    now_ms: &'c Cell<u64>,
}

impl Timebase for VirtualTime<'_> {
    fn now(&self) -> Instant {
        Instant::from_millis(self.now_ms.get())
    }

    async fn delay_ms(&mut self, millis: u32) {
        self.now_ms.set(self.now_ms.get() + millis as u64);
    }
}

#[test]
/// Expiry is inclusive of the deadline instant.
fn test_deadline_expiry() {
    let deadline = Deadline::after(Instant::from_millis(100), Duration::from_millis(50));
    assert_eq!(deadline.at(), Instant::from_millis(150));
    assert!(!deadline.is_expired(Instant::from_millis(149)));
    assert!(deadline.is_expired(Instant::from_millis(150)));
    assert_eq!(
        deadline.remaining(Instant::from_millis(120)),
        Duration::from_millis(30)
    );
    assert_eq!(
        deadline.remaining(Instant::from_millis(200)),
        Duration::from_ticks(0)
    );
}

#[test]
fn test_deadline_from_timebase() {
    let clock = Cell::new(40);
    let time = VirtualTime { now_ms: &clock };
    assert_eq!(Deadline::from_now(&time, 60).at(), Instant::from_millis(100));
}

#[tokio::test(start_paused = true)]
/// An immediately available value costs no delay.
async fn test_poll_until_immediate() {
    let clock = Cell::new(0);
    let mut time = VirtualTime { now_ms: &clock };
    let result = poll_until(&mut time, 1000, 1, || Some(7)).await;
    assert_eq!(result, Some(7));
    assert_eq!(clock.get(), 0);
}

#[tokio::test(start_paused = true)]
/// Value showing up after a few polls is returned.
async fn test_poll_until_late_value() {
    let clock = Cell::new(0);
    let mut time = VirtualTime { now_ms: &clock };
    let calls = Cell::new(0);
    let result = poll_until(&mut time, 1000, 10, || {
        calls.set(calls.get() + 1);
        (calls.get() == 4).then_some("frame")
    })
    .await;
    assert_eq!(result, Some("frame"));
    assert_eq!(clock.get(), 30);
}

#[tokio::test(start_paused = true)]
/// Nothing arrives: `None` once the timeout has elapsed, not before.
async fn test_poll_until_times_out() {
    let clock = Cell::new(5);
    let mut time = VirtualTime { now_ms: &clock };
    let result: Option<u8> = poll_until(&mut time, 100, 30, || None).await;
    assert_eq!(result, None);
    assert_eq!(clock.get(), 105);
}

#[tokio::test(start_paused = true)]
/// A zero budget still probes once.
async fn test_poll_until_zero_budget() {
    let clock = Cell::new(0);
    let mut time = VirtualTime { now_ms: &clock };
    let calls = Cell::new(0);
    let result: Option<u8> = poll_until(&mut time, 0, 1, || {
        calls.set(calls.get() + 1);
        None
    })
    .await;
    assert_eq!(result, None);
    assert_eq!(calls.get(), 1);
}

#[tokio::test(start_paused = true)]
/// A value that only exists once the budget is spent counts as a timeout.
async fn test_poll_until_value_at_exhaustion_is_timeout() {
    let clock = Cell::new(0);
    let mut time = VirtualTime { now_ms: &clock };
    let result = poll_until(&mut time, 100, 10, || (clock.get() >= 100).then_some("late")).await;
    assert_eq!(result, None);
    assert_eq!(clock.get(), 100);
}

#[tokio::test(start_paused = true)]
/// The last poll before the deadline still sees the value.
async fn test_poll_until_value_just_before_deadline() {
    let clock = Cell::new(0);
    let mut time = VirtualTime { now_ms: &clock };
    let result = poll_until(&mut time, 100, 10, || (clock.get() >= 90).then_some("in time")).await;
    assert_eq!(result, Some("in time"));
    assert_eq!(clock.get(), 90);
}

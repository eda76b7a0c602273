//! Event channel delivery tests.
use super::*;
use crate::config::{BitRate, DriverConfig};
use crate::core::MAX_DLC;
use crate::driver::message_object::MessageObject;
use crate::driver::traits::status_panel::NoPanel;
use embassy_time::Instant;
use embedded_can::StandardId;

/// Controller that accepts everything.
struct Silent;

impl CanPeripheral for Silent {
    type Error = ();

    fn set_bit_rate(&mut self, _bit_rate: BitRate) -> Result<(), ()> {
        Ok(())
    }

    fn setup_object(&mut self, _object: &MessageObject) -> Result<(), ()> {
        Ok(())
    }

    fn enable(&mut self, _loopback: bool) -> Result<(), ()> {
        Ok(())
    }

    fn enable_interrupts(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn transmit(
        &mut self,
        _slot: u8,
        _id: StandardId,
        _dlc: u8,
        _data: &[u8; MAX_DLC],
    ) -> Result<(), ()> {
        Ok(())
    }

    fn error_status(&mut self) -> ErrorStatus {
        ErrorStatus::default()
    }
}

fn ready_driver() -> CanDriver<Silent, NoPanel> {
    let driver = CanDriver::new(DriverConfig::default(), Silent, NoPanel);
    driver.initialize().unwrap();
    driver
}

#[test]
/// Events are applied in posting order by `drain`.
fn test_drain_applies_in_order() {
    let channel = EventChannel::<4>::new();
    let driver = ready_driver();
    let sink = EventSink::new(&channel);
    let runner = EventRunner::new(&driver, &channel);

    let first = Message::from_raw(0x456, &[1]).unwrap();
    let second = Message::from_raw(0x456, &[2]).unwrap();
    assert!(sink.frame_received(first));
    assert!(sink.frame_received(second.with_timestamp(Instant::from_millis(5))));
    assert!(sink.transmit_complete(driver.config().tx_slot()));

    assert_eq!(runner.drain(), 3);
    assert_eq!(runner.drain(), 0);

    // Single slot: the later frame won.
    let pending = driver.receive().unwrap();
    assert_eq!(pending.payload(), &[2]);
    assert_eq!(pending.timestamp(), Instant::from_millis(5));
    assert_eq!(driver.statistics().transmissions_confirmed, 1);
}

#[test]
/// A full channel refuses the event instead of blocking.
fn test_full_channel_drops_event() {
    let channel = EventChannel::<2>::new();
    let sink = EventSink::new(&channel);
    let other = sink.clone();

    assert!(sink.error_status(ErrorStatus(ErrorStatus::TX_WARNING)));
    assert!(other.error_status(ErrorStatus(ErrorStatus::RX_WARNING)));
    assert!(!sink.transmit_complete(1));
}

#[test]
/// Confirmations for other slots are not counted.
fn test_foreign_slot_confirmation_ignored() {
    let channel = EventChannel::<2>::new();
    let driver = ready_driver();
    let sink = EventSink::new(&channel);
    let runner = EventRunner::new(&driver, &channel);

    sink.transmit_complete(7);
    runner.drain();
    assert_eq!(driver.statistics().transmissions_confirmed, 0);
}

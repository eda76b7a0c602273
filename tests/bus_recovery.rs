//! Error statuses delivered through the event channel: soft warnings are
//! counted, bus-off re-initializes the controller and traffic resumes.
mod helpers {
    include!("helpers/mod.rs");
}

use helpers::{MockPeripheral, PanelLog, DEPTH};
use twincan::{
    config::{BitRate, DriverConfig, Mode},
    driver::{
        error_handler::ErrorStatus,
        events::{EventChannel, EventRunner, EventSink},
        message_object::{ObjectState, Role},
        state::Reaction,
        CanDriver,
    },
};

#[test]
fn test_bus_off_reinitializes_and_traffic_resumes() {
    let channel_a = EventChannel::<DEPTH>::new();
    let channel_b = EventChannel::<DEPTH>::new();
    let config = DriverConfig::builder()
        .with_bit_rate(BitRate::Kbps250)
        .build()
        .unwrap();

    let peripheral_a = MockPeripheral::new(&channel_a).with_peer(&channel_b);
    let log_a = peripheral_a.log();
    let driver_a = CanDriver::new(config, peripheral_a, PanelLog::default());
    let driver_b = CanDriver::new(
        config.peer(),
        MockPeripheral::new(&channel_b).with_peer(&channel_a),
        PanelLog::default(),
    );
    driver_a.initialize().unwrap();
    driver_b.initialize().unwrap();
    let runner_a = EventRunner::new(&driver_a, &channel_a);
    let runner_b = EventRunner::new(&driver_b, &channel_b);

    // Interrupt side of node A reports bus-off.
    let irq = EventSink::new(&channel_a);
    assert!(irq.error_status(ErrorStatus::from_bits(ErrorStatus::BUS_OFF | 0x3)));
    assert_eq!(runner_a.drain(), 1);

    let stats = driver_a.statistics();
    assert_eq!(stats.error_count, 1);
    assert_eq!(stats.bus_off_recoveries, 1);
    assert_eq!(stats.last_error_code, ErrorStatus::BUS_OFF | 0x3);
    assert_eq!(driver_a.object_state(Role::Transmit), ObjectState::Enabled);
    assert_eq!(driver_a.object_state(Role::Receive), ObjectState::Enabled);
    driver_a.with_panel(|panel| assert!(panel.error));
    {
        let log = log_a.lock().unwrap();
        assert_eq!(log.bit_rates, vec![BitRate::Kbps250, BitRate::Kbps250]);
        assert_eq!(log.enables, 2);
        assert_eq!(log.objects.len(), 4);
    }

    // Same identifiers after recovery, in both directions.
    driver_a.send(config.tx_id(), &[0x10, 0x20], 2);
    runner_b.drain();
    let at_b = driver_b.receive().expect("frame at B");
    assert_eq!(at_b.id().as_raw(), 0x123);
    assert_eq!(at_b.payload(), &[0x10, 0x20]);

    driver_b.send(config.rx_id(), &[0x30], 1);
    runner_a.drain();
    let at_a = driver_a.receive().expect("frame at A");
    assert_eq!(at_a.id().as_raw(), 0x456);
    assert_eq!(at_a.payload(), &[0x30]);
}

#[test]
fn test_soft_errors_are_only_counted() {
    let channel = EventChannel::<DEPTH>::new();
    let peripheral = MockPeripheral::new(&channel);
    let log = peripheral.log();
    let driver = CanDriver::new(DriverConfig::default(), peripheral, PanelLog::default());
    driver.initialize().unwrap();

    for bits in [
        ErrorStatus::TX_WARNING,
        ErrorStatus::RX_WARNING | 0x1,
        ErrorStatus::TX_ERROR_PASSIVE,
    ] {
        let reaction = driver.on_error_status(ErrorStatus::from_bits(bits));
        assert!(matches!(reaction, Reaction::Error(_)));
    }

    let stats = driver.statistics();
    assert_eq!(stats.error_count, 3);
    assert_eq!(stats.last_error_code, ErrorStatus::TX_ERROR_PASSIVE);
    assert_eq!(stats.bus_off_recoveries, 0);
    assert_eq!(log.lock().unwrap().enables, 1);
}

#[test]
/// Frames on the receive identifier come back on the echo identifier with
/// identical payload.
fn test_echo_round_trip() {
    let channel_a = EventChannel::<DEPTH>::new();
    let channel_b = EventChannel::<DEPTH>::new();
    let config_a = DriverConfig::default();
    let config_b = DriverConfig::builder()
        .with_tx_id(0x456)
        .with_rx_id(0x123)
        .with_mode(Mode::SelfTest)
        .build()
        .unwrap();

    let driver_a = CanDriver::new(
        config_a,
        MockPeripheral::new(&channel_a).with_peer(&channel_b),
        PanelLog::default(),
    );
    let driver_b = CanDriver::new(
        config_b,
        MockPeripheral::new(&channel_b).with_peer(&channel_a),
        PanelLog::default(),
    );
    driver_a.initialize().unwrap();
    driver_b.initialize().unwrap();
    let runner_a = EventRunner::new(&driver_a, &channel_a);
    let runner_b = EventRunner::new(&driver_b, &channel_b);

    let payload = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];
    driver_a.send(config_a.tx_id(), &payload, payload.len());
    runner_b.drain();
    runner_a.drain();

    let echoed = driver_a.receive().expect("echo at A");
    assert_eq!(echoed.id().as_raw(), 0x789);
    assert_eq!(echoed.payload(), &payload);
    assert_eq!(driver_a.statistics().messages_received, 1);
    assert_eq!(driver_b.statistics().messages_transmitted, 1);
    // The echo responder does not drain B's slot.
    assert!(driver_b.has_pending());
}

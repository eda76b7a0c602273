//! # Two-node self-test on the host
//!
//! Two simulated controllers wired back to back:
//! - node A runs the six-case battery,
//! - node B echoes every frame it receives on the echo identifier.
//!
//! ```bash
//! cargo run --example two_node_selftest
//! ```

use std::time::Instant as StdInstant;

use critical_section as _;
use embassy_time::Instant;
use embedded_can::StandardId;
use static_cell::StaticCell;
use twincan::{
    config::{BitRate, DriverConfig, Mode},
    core::{Message, MAX_DLC},
    driver::{
        error_handler::ErrorStatus,
        events::{EventChannel, EventRunner, EventSink},
        message_object::MessageObject,
        traits::{
            peripheral::CanPeripheral,
            status_panel::{Indicator, StatusPanel},
            timebase::Timebase,
        },
        CanDriver,
    },
    selftest::{ledger::Outcome, SelfTest},
};

const DEPTH: usize = 32;

static CHANNEL_A: StaticCell<EventChannel<DEPTH>> = StaticCell::new();
static CHANNEL_B: StaticCell<EventChannel<DEPTH>> = StaticCell::new();

// ============================================================================
// Simulated hardware
// ============================================================================

/// Controller whose bus is the peer node's event channel.
struct Wire {
    own: EventSink<'static, DEPTH>,
    peer: EventSink<'static, DEPTH>,
    name: &'static str,
}

impl CanPeripheral for Wire {
    type Error = ();

    fn set_bit_rate(&mut self, bit_rate: BitRate) -> Result<(), Self::Error> {
        println!("[{}] bit rate {} kbps", self.name, bit_rate.kbps());
        Ok(())
    }

    fn setup_object(&mut self, object: &MessageObject) -> Result<(), Self::Error> {
        println!(
            "[{}] slot {} -> {:?} on {:#05x}",
            self.name,
            object.slot(),
            object.role(),
            object.id().as_raw()
        );
        Ok(())
    }

    fn enable(&mut self, _loopback: bool) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enable_interrupts(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transmit(
        &mut self,
        slot: u8,
        id: StandardId,
        dlc: u8,
        data: &[u8; MAX_DLC],
    ) -> Result<(), Self::Error> {
        println!(
            "[{}] tx {:#05x} {:02x?}",
            self.name,
            id.as_raw(),
            &data[..dlc as usize]
        );
        self.peer
            .frame_received(Message::received(id, *data, dlc as usize, Instant::from_millis(0)));
        self.own.transmit_complete(slot);
        Ok(())
    }

    fn error_status(&mut self) -> ErrorStatus {
        ErrorStatus::default()
    }
}

struct ConsoleLeds;

impl StatusPanel for ConsoleLeds {
    fn set(&mut self, indicator: Indicator, on: bool) {
        println!("    {:?} -> {}", indicator, if on { "on" } else { "off" });
    }

    fn toggle(&mut self, _indicator: Indicator) {}
}

struct HostClock {
    origin: StdInstant,
}

impl Timebase for HostClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.origin.elapsed().as_micros() as u64)
    }

    async fn delay_ms(&mut self, millis: u32) {
        tokio::time::sleep(std::time::Duration::from_millis(millis as u64)).await;
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let channel_a: &'static EventChannel<DEPTH> = CHANNEL_A.init(EventChannel::new());
    let channel_b: &'static EventChannel<DEPTH> = CHANNEL_B.init(EventChannel::new());

    let config_a = DriverConfig::builder()
        .with_mode(Mode::SelfTest)
        .build()
        .expect("valid configuration");

    let driver_a = CanDriver::new(
        config_a,
        Wire {
            own: EventSink::new(channel_a),
            peer: EventSink::new(channel_b),
            name: "A",
        },
        ConsoleLeds,
    );
    let driver_b = CanDriver::new(
        config_a.peer(),
        Wire {
            own: EventSink::new(channel_b),
            peer: EventSink::new(channel_a),
            name: "B",
        },
        ConsoleLeds,
    );
    driver_a.initialize().expect("node A init");
    driver_b.initialize().expect("node B init");

    let runner_a = EventRunner::new(&driver_a, channel_a);
    let runner_b = EventRunner::new(&driver_b, channel_b);
    let mut harness = SelfTest::new(
        &driver_a,
        HostClock {
            origin: StdInstant::now(),
        },
    );

    let ledger = tokio::select! {
        ledger = harness.run_battery() => ledger,
        _ = runner_a.drive() => unreachable!(),
        _ = runner_b.drive() => unreachable!(),
    };

    println!("\n=== Results ===");
    for record in ledger.iter() {
        let verdict = match record.outcome {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
        };
        println!(
            "Test {}: {:<22} {}",
            record.case.number(),
            record.case.name(),
            verdict
        );
    }
    println!("{} passed, {} failed", ledger.passed(), ledger.failed());
    println!("Node A: {:?}", driver_a.statistics());
    println!("Node B: {:?}", driver_b.statistics());
}

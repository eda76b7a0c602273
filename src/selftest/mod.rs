//! On-target self-test harness: a fixed battery of six cases run against a
//! live driver, graded from the driver statistics, then reported forever on
//! the status indicators.
//!
//! ## Reporting pattern
//!
//! Both indicators are switched off, the activity indicator blinks once per
//! passed case, a pause follows, then the error indicator blinks once per
//! failed case, and a longer pause closes the cycle.
//!
//! ## Two-node topology
//!
//! Node A runs the harness; node B runs with echo enabled and the mirrored
//! configuration ([`DriverConfig::peer`](crate::config::DriverConfig::peer)).
//! Every frame A sends on its transmit identifier reaches B's receive
//! identifier and comes back on the echo identifier, which A accepts.
//! In loopback, A receives its own frames directly.
pub mod ledger;

use crate::driver::traits::{
    peripheral::CanPeripheral,
    status_panel::{Indicator, StatusPanel},
    timebase::Timebase,
};
use crate::driver::CanDriver;
use crate::infra::deadline::poll_until;
use ledger::{Outcome, TestCase, TestLedger};

/// Payload of the single-transmit case.
pub const TRANSMIT_PATTERN: [u8; 8] = [0xAA, 0x55, 0xFF, 0x00, 0x11, 0x22, 0x33, 0x44];
/// Payload of the round-trip case; must come back unchanged.
pub const INTEGRITY_PATTERN: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// Frames sent by the burst case.
pub const BURST_LEN: u32 = 5;
/// Bytes 2..8 of every burst frame; bytes 0..2 carry the sequence number.
const BURST_FILL: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

/// Delays and timeouts used by the harness, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HarnessTiming {
    /// Wait before the first case so the peer node can boot.
    pub startup_ms: u32,
    /// Settling time after each case and after sends awaiting a reply.
    pub settle_ms: u32,
    /// Budget for a frame to show up in the receive slot.
    pub receive_timeout_ms: u32,
    /// Interval between two polls of the receive slot.
    pub poll_ms: u32,
    /// Spacing between burst frames.
    pub burst_spacing_ms: u32,
    /// Half period of one reporting blink.
    pub pulse_ms: u32,
    /// Pause between the pass and fail blink groups.
    pub pattern_pause_ms: u32,
    /// Pause closing a reporting cycle.
    pub cycle_pause_ms: u32,
}

impl Default for HarnessTiming {
    fn default() -> Self {
        Self {
            startup_ms: 500,
            settle_ms: 100,
            receive_timeout_ms: 1000,
            poll_ms: 1,
            burst_spacing_ms: 20,
            pulse_ms: 200,
            pattern_pause_ms: 500,
            cycle_pause_ms: 1000,
        }
    }
}

/// Self-test harness bound to one driver.
pub struct SelfTest<'a, P, S, T>
where
    P: CanPeripheral,
    S: StatusPanel,
    T: Timebase,
{
    driver: &'a CanDriver<P, S>,
    time: T,
    timing: HarnessTiming,
    ledger: TestLedger,
}

impl<'a, P, S, T> SelfTest<'a, P, S, T>
where
    P: CanPeripheral,
    S: StatusPanel,
    T: Timebase,
{
    pub fn new(driver: &'a CanDriver<P, S>, time: T) -> Self {
        Self {
            driver,
            time,
            timing: HarnessTiming::default(),
            ledger: TestLedger::new(),
        }
    }

    pub fn with_timing(mut self, timing: HarnessTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn ledger(&self) -> &TestLedger {
        &self.ledger
    }

    /// Run the battery then report forever. Never returns.
    pub async fn run(mut self) {
        self.run_battery().await;
        self.report_forever().await;
    }

    /// Run the six cases in order and return the resulting ledger.
    ///
    /// Statistics are reset first; a previous ledger is discarded.
    pub async fn run_battery(&mut self) -> TestLedger {
        self.time.delay_ms(self.timing.startup_ms).await;
        self.driver.with_panel(|panel| {
            panel.set(Indicator::Activity, false);
            panel.set(Indicator::Error, false);
        });
        self.driver.reset_statistics();
        self.ledger = TestLedger::new();

        for case in TestCase::ALL {
            let outcome = self.run_case(case).await;
            self.ledger.record(case, outcome);
            self.signal(outcome);

            #[cfg(feature = "defmt")]
            defmt::info!("Test {} ({}): {}", case.number(), case.name(), outcome);

            self.time.delay_ms(self.timing.settle_ms).await;
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Self-test done: {} passed, {} failed",
            self.ledger.passed(),
            self.ledger.failed()
        );

        self.ledger.clone()
    }

    /// Run a single case against the current driver state.
    pub async fn run_case(&mut self, case: TestCase) -> Outcome {
        let passed = match case {
            TestCase::Initialization => self.check_initialization(),
            TestCase::SingleTransmit => self.check_single_transmit().await,
            TestCase::SingleReceive => self.check_single_receive().await,
            TestCase::DataIntegrity => self.check_data_integrity().await,
            TestCase::SequentialBurst => self.check_sequential_burst().await,
            TestCase::ErrorFree => self.check_error_free(),
        };
        Outcome::from(passed)
    }

    /// Blink the totals once.
    pub async fn report_cycle(&mut self) {
        let (passed, failed) = (self.ledger.passed(), self.ledger.failed());
        self.driver.with_panel(|panel| {
            panel.set(Indicator::Activity, false);
            panel.set(Indicator::Error, false);
        });

        self.blink(Indicator::Activity, passed).await;
        self.time.delay_ms(self.timing.pattern_pause_ms).await;
        self.blink(Indicator::Error, failed).await;
        self.time.delay_ms(self.timing.cycle_pause_ms).await;
    }

    /// Terminal reporting state. Never returns.
    pub async fn report_forever(&mut self) {
        loop {
            self.report_cycle().await;
        }
    }

    async fn blink(&mut self, indicator: Indicator, count: u32) {
        for _ in 0..count {
            self.driver.with_panel(|panel| panel.toggle(indicator));
            self.time.delay_ms(self.timing.pulse_ms).await;
            self.driver.with_panel(|panel| panel.toggle(indicator));
            self.time.delay_ms(self.timing.pulse_ms).await;
        }
    }

    fn signal(&self, outcome: Outcome) {
        let indicator = match outcome {
            Outcome::Pass => Indicator::Activity,
            Outcome::Fail => Indicator::Error,
        };
        self.driver.with_panel(|panel| panel.set(indicator, true));
    }

    fn check_initialization(&self) -> bool {
        let stats = self.driver.statistics();
        stats.messages_transmitted == 0 && stats.messages_received == 0
    }

    async fn check_single_transmit(&mut self) -> bool {
        let before = self.driver.statistics().messages_transmitted;
        let tx_id = self.driver.config().tx_id();
        self.driver.send(tx_id, &TRANSMIT_PATTERN, TRANSMIT_PATTERN.len());
        self.time.delay_ms(self.timing.settle_ms).await;
        self.driver.statistics().messages_transmitted > before
    }

    async fn check_single_receive(&mut self) -> bool {
        let before = self.driver.statistics().messages_received;
        let Some(message) = self.await_message().await else {
            return false;
        };
        let after = self.driver.statistics().messages_received;
        after > before && (1..=8).contains(&message.dlc())
    }

    async fn check_data_integrity(&mut self) -> bool {
        let tx_id = self.driver.config().tx_id();
        self.driver.send(tx_id, &INTEGRITY_PATTERN, INTEGRITY_PATTERN.len());
        self.time.delay_ms(self.timing.settle_ms).await;

        match self.await_message().await {
            Some(message) => message.dlc() == 8 && message.payload() == INTEGRITY_PATTERN,
            None => false,
        }
    }

    async fn check_sequential_burst(&mut self) -> bool {
        let before = self.driver.statistics().messages_transmitted;
        let tx_id = self.driver.config().tx_id();

        for seq in 0..BURST_LEN {
            let mut data = [0u8; 8];
            data[..2].copy_from_slice(&(seq as u16).to_le_bytes());
            data[2..].copy_from_slice(&BURST_FILL);
            self.driver.send(tx_id, &data, data.len());
            self.time.delay_ms(self.timing.burst_spacing_ms).await;
        }
        self.time.delay_ms(self.timing.settle_ms).await;

        let after = self.driver.statistics().messages_transmitted;
        after.saturating_sub(before) >= BURST_LEN
    }

    fn check_error_free(&self) -> bool {
        self.driver.statistics().error_count == 0
    }

    async fn await_message(&mut self) -> Option<crate::core::Message> {
        let driver = self.driver;
        poll_until(
            &mut self.time,
            self.timing.receive_timeout_ms,
            self.timing.poll_ms,
            || driver.receive(),
        )
        .await
    }
}

//! Node entry point: the normal send/receive loop and the mode dispatch.
use embassy_time::Duration;

use crate::config::Mode;
use crate::core::Message;
use crate::driver::traits::{
    peripheral::CanPeripheral,
    status_panel::{Indicator, StatusPanel},
    timebase::Timebase,
};
use crate::driver::CanDriver;
use crate::error::DriverError;
use crate::infra::deadline::Deadline;
use crate::selftest::SelfTest;

/// Payload sent periodically in normal mode.
pub const HEARTBEAT: [u8; 8] = [0xAA, 0xBB, 0xCC, 0xDD, 0x11, 0x22, 0x33, 0x44];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppTiming {
    /// Period of the heartbeat frame.
    pub tx_period_ms: u32,
    /// Interval between two polls of the receive slot.
    pub poll_ms: u32,
}

impl Default for AppTiming {
    fn default() -> Self {
        Self {
            tx_period_ms: 1000,
            poll_ms: 1,
        }
    }
}

/// What one service pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceReport {
    pub sent: bool,
    pub received: u32,
}

/// Normal-mode loop: heartbeat on the transmit identifier, activity
/// indicator toggled for every frame sent or received.
pub struct Application<'a, P, S, T>
where
    P: CanPeripheral,
    S: StatusPanel,
    T: Timebase,
{
    driver: &'a CanDriver<P, S>,
    time: T,
    timing: AppTiming,
    heartbeat: Message,
    next_tx: Deadline,
}

impl<'a, P, S, T> Application<'a, P, S, T>
where
    P: CanPeripheral,
    S: StatusPanel,
    T: Timebase,
{
    /// The first heartbeat goes out on the first service pass.
    pub fn new(driver: &'a CanDriver<P, S>, time: T) -> Self {
        let next_tx = Deadline::after(time.now(), Duration::from_ticks(0));
        let heartbeat = Message::from_array(driver.config().tx_id(), HEARTBEAT);
        Self {
            driver,
            time,
            timing: AppTiming::default(),
            heartbeat,
            next_tx,
        }
    }

    pub fn with_timing(mut self, timing: AppTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Send the heartbeat when due, then drain the receive slot.
    pub fn service_once(&mut self) -> ServiceReport {
        let mut report = ServiceReport::default();
        let now = self.time.now();

        if self.next_tx.is_expired(now) {
            self.driver.send_message(&self.heartbeat);
            self.driver.with_panel(|panel| panel.toggle(Indicator::Activity));
            let period = Duration::from_millis(self.timing.tx_period_ms as u64);
            self.next_tx = Deadline::after(now, period);
            report.sent = true;
        }

        while let Some(_message) = self.driver.receive() {
            #[cfg(feature = "defmt")]
            defmt::debug!("Received {}", _message);
            self.driver.with_panel(|panel| panel.toggle(Indicator::Activity));
            report.received += 1;
        }

        report
    }

    /// Service forever. Never returns.
    pub async fn run(mut self) {
        loop {
            self.service_once();
            self.time.delay_ms(self.timing.poll_ms).await;
        }
    }
}

/// Initialize the driver, then run the self-test harness or the normal loop
/// depending on the configured mode. Only returns on initialization failure.
pub async fn run_node<P, S, T>(
    driver: &CanDriver<P, S>,
    time: T,
) -> Result<(), DriverError<P::Error>>
where
    P: CanPeripheral,
    S: StatusPanel,
    T: Timebase,
{
    driver.initialize()?;

    match driver.config().mode() {
        Mode::SelfTest => {
            #[cfg(feature = "defmt")]
            defmt::info!("Starting self-test");
            SelfTest::new(driver, time).run().await
        }
        Mode::Normal => {
            #[cfg(feature = "defmt")]
            defmt::info!("Starting normal operation");
            Application::new(driver, time).run().await
        }
    }

    Ok(())
}

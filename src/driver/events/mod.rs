//! Registration point between the controller's interrupt side and the driver.
//!
//! The interrupt handler owns an [`EventSink`] and posts events without
//! blocking. An [`EventRunner`] drains the channel and applies every event to
//! the driver. Firmware provides the channel, usually from a `StaticCell`;
//! the library allocates nothing.
//!
//! Firmware without an executor can call [`EventRunner::drain`] from its main
//! loop, or skip the channel and call
//! [`CanDriver::handle_event`] straight from the interrupt.
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver, Sender},
};

use crate::core::Message;
use crate::driver::error_handler::ErrorStatus;
use crate::driver::traits::{peripheral::CanPeripheral, status_panel::StatusPanel};
use crate::driver::CanDriver;

/// Notification raised by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// A frame completed reception, timestamped by the interrupt side.
    FrameReceived(Message),
    /// The controller reported a non-clear error status.
    ErrorStatus(ErrorStatus),
    /// The controller finished sending the frame queued in `slot`.
    TransmitComplete { slot: u8 },
}

/// Channel carrying [`BusEvent`]s from interrupt context to the runner.
pub type EventChannel<const N: usize> = Channel<CriticalSectionRawMutex, BusEvent, N>;

/// Interrupt-side handle. Posting never blocks.
pub struct EventSink<'a, const N: usize> {
    sender: Sender<'a, CriticalSectionRawMutex, BusEvent, N>,
}

impl<'a, const N: usize> EventSink<'a, N> {
    pub fn new(channel: &'a EventChannel<N>) -> Self {
        Self {
            sender: channel.sender(),
        }
    }

    /// Queue an event. Returns `false` when the channel is full and the event
    /// was dropped.
    pub fn post(&self, event: BusEvent) -> bool {
        let accepted = self.sender.try_send(event).is_ok();
        if !accepted {
            #[cfg(feature = "defmt")]
            defmt::warn!("Event channel full, dropped {}", event);
        }
        accepted
    }

    /// `message` should already carry the reception instant.
    pub fn frame_received(&self, message: Message) -> bool {
        self.post(BusEvent::FrameReceived(message))
    }

    pub fn error_status(&self, status: ErrorStatus) -> bool {
        self.post(BusEvent::ErrorStatus(status))
    }

    pub fn transmit_complete(&self, slot: u8) -> bool {
        self.post(BusEvent::TransmitComplete { slot })
    }
}

impl<const N: usize> Clone for EventSink<'_, N> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Task-side loop applying queued events to a driver.
pub struct EventRunner<'a, P, S, const N: usize>
where
    P: CanPeripheral,
    S: StatusPanel,
{
    driver: &'a CanDriver<P, S>,
    receiver: Receiver<'a, CriticalSectionRawMutex, BusEvent, N>,
}

impl<'a, P, S, const N: usize> EventRunner<'a, P, S, N>
where
    P: CanPeripheral,
    S: StatusPanel,
{
    pub fn new(driver: &'a CanDriver<P, S>, channel: &'a EventChannel<N>) -> Self {
        Self {
            driver,
            receiver: channel.receiver(),
        }
    }

    /// Apply events as they arrive. Never returns.
    pub async fn drive(&self) {
        loop {
            let event = self.receiver.receive().await;
            self.driver.handle_event(event);
        }
    }

    /// Apply every event already queued, without waiting. Returns how many
    /// were applied.
    pub fn drain(&self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_receive() {
            self.driver.handle_event(event);
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests;

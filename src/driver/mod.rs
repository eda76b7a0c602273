//! CAN driver: one transmit object, one receive object, a single-slot receive
//! buffer, statistics, and the echo / bus-off recovery behavior.
//!
//! Everything the interrupt path can touch sits behind one critical-section
//! mutex, so [`CanDriver`] is shared by reference between the application
//! (send, receive, statistics) and the event path (reception, errors). No
//! lock is held between calls.
pub mod error_handler;
pub mod events;
pub mod message_object;
pub mod state;
pub mod traits;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embedded_can::StandardId;

use crate::config::DriverConfig;
use crate::core::{Message, Statistics, MAX_DLC};
use crate::error::DriverError;
use error_handler::{ErrorAction, ErrorStatus};
use events::BusEvent;
use message_object::{ObjectState, Role};
use state::{DriverState, Reaction};
use traits::{
    peripheral::CanPeripheral,
    status_panel::{Indicator, StatusPanel},
};

/// Driver for one CAN controller.
pub struct CanDriver<P: CanPeripheral, S: StatusPanel> {
    config: DriverConfig,
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<P, S>>>,
}

struct Inner<P, S> {
    peripheral: P,
    panel: S,
    state: DriverState,
}

impl<P: CanPeripheral, S: StatusPanel> CanDriver<P, S> {
    /// Wrap a peripheral. Nothing is configured until [`CanDriver::initialize`].
    pub fn new(config: DriverConfig, peripheral: P, panel: S) -> Self {
        Self {
            config,
            inner: Mutex::new(RefCell::new(Inner {
                peripheral,
                panel,
                state: DriverState::new(config),
            })),
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner<P, S>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Configure bit rate and message objects, then enable the controller and
    /// its interrupts.
    ///
    /// Rebuilds everything from scratch on every call: both objects go back to
    /// `Unconfigured` and any undrained frame is discarded. Statistics are
    /// kept.
    pub fn initialize(&self) -> Result<(), DriverError<P::Error>> {
        self.with_inner(|inner| inner.initialize())
    }

    /// Submit a frame through the transmit object.
    ///
    /// `len` is clamped to 8 and the buffer handed to the controller is zero
    /// padded to eight bytes. Fire-and-forget: the transmitted counter grows on
    /// every submission, bus-level failures show up as error statuses.
    pub fn send(&self, id: StandardId, data: &[u8], len: usize) {
        self.with_inner(|inner| inner.submit(id, data, len))
    }

    /// [`CanDriver::send`] for an already built message.
    pub fn send_message(&self, message: &Message) {
        self.send(message.id(), message.payload(), message.dlc() as usize)
    }

    /// Non-blocking poll of the receive slot.
    ///
    /// Returns `None` without touching any state when no frame arrived since
    /// the last successful call.
    pub fn receive(&self) -> Option<Message> {
        self.with_inner(|inner| inner.state.take_pending())
    }

    /// Reception notification from the controller.
    ///
    /// The driver stores `message` as is, timestamp included. The interrupt
    /// side stamps it with the reception instant, usually through
    /// [`Message::received`] or [`Message::with_timestamp`].
    pub fn on_message_received(&self, message: Message) -> Reaction {
        self.handle_event(BusEvent::FrameReceived(message))
    }

    /// Error notification from the controller.
    pub fn on_error_status(&self, status: ErrorStatus) -> Reaction {
        self.handle_event(BusEvent::ErrorStatus(status))
    }

    /// Apply a controller notification and carry out its side effects.
    pub fn handle_event(&self, event: BusEvent) -> Reaction {
        self.with_inner(|inner| {
            let reaction = inner.state.apply(&event);
            inner.react(reaction);
            reaction
        })
    }

    /// Query the controller error status and handle it when not clear.
    /// For controllers whose error interrupt is not wired.
    pub fn poll_error_status(&self) -> Option<ErrorStatus> {
        self.with_inner(|inner| {
            let status = inner.peripheral.error_status();
            if status.is_clear() {
                return None;
            }
            let reaction = inner.state.apply(&BusEvent::ErrorStatus(status));
            inner.react(reaction);
            Some(status)
        })
    }

    pub fn statistics(&self) -> Statistics {
        self.with_inner(|inner| inner.state.statistics())
    }

    pub fn reset_statistics(&self) {
        self.with_inner(|inner| inner.state.reset_statistics())
    }

    pub fn has_pending(&self) -> bool {
        self.with_inner(|inner| inner.state.has_pending())
    }

    pub fn object_state(&self, role: Role) -> ObjectState {
        self.with_inner(|inner| inner.state.object(role).state())
    }

    /// Run `f` on the status panel inside the critical section.
    pub fn with_panel<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.with_inner(|inner| f(&mut inner.panel))
    }

    /// Run `f` on the peripheral inside the critical section, for
    /// board-specific access the driver does not model.
    pub fn with_peripheral<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        self.with_inner(|inner| f(&mut inner.peripheral))
    }
}

impl<P: CanPeripheral, S: StatusPanel> Inner<P, S> {
    fn initialize(&mut self) -> Result<(), DriverError<P::Error>> {
        let config = *self.state.config();
        let Inner { peripheral, state, .. } = self;

        state.clear_slot();
        for object in state.objects_mut() {
            object.reset();
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Initializing CAN at {} kbps", config.bit_rate().kbps());

        peripheral
            .set_bit_rate(config.bit_rate())
            .map_err(DriverError::BitRate)?;

        for object in state.objects_mut() {
            peripheral
                .setup_object(object)
                .map_err(|cause| DriverError::ObjectSetup {
                    slot: object.slot(),
                    cause,
                })?;
            object.mark_configured()?;
        }

        peripheral
            .enable(config.loopback())
            .map_err(DriverError::Enable)?;
        peripheral
            .enable_interrupts()
            .map_err(DriverError::Interrupts)?;

        for object in state.objects_mut() {
            object.mark_enabled()?;
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "CAN ready: tx {=u16:#x} rx {=u16:#x} loopback {}",
            config.tx_id().as_raw(),
            config.rx_id().as_raw(),
            config.loopback()
        );

        Ok(())
    }

    fn submit(&mut self, id: StandardId, data: &[u8], len: usize) {
        let tx_object = *self.state.object(Role::Transmit);
        if !tx_object.is_enabled() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Transmit object not enabled, frame dropped");
            return;
        }

        let dlc = len.min(MAX_DLC);
        let copied = dlc.min(data.len());
        let mut buffer = [0u8; MAX_DLC];
        buffer[..copied].copy_from_slice(&data[..copied]);

        let stats = self.state.statistics_mut();
        if let Err(_err) = self
            .peripheral
            .transmit(tx_object.slot(), id, dlc as u8, &buffer)
        {
            #[cfg(feature = "defmt")]
            defmt::error!("Controller refused frame {=u16:#x}", id.as_raw());
            stats.record_submit_failure();
        }
        stats.record_transmit();
    }

    fn react(&mut self, reaction: Reaction) {
        match reaction {
            Reaction::Echo(message) => {
                let echo_id = self.state.config().echo_id();
                #[cfg(feature = "defmt")]
                defmt::debug!("Echoing {} as {=u16:#x}", message, echo_id.as_raw());
                self.submit(echo_id, message.payload(), message.dlc() as usize);
            }
            Reaction::Error(action) => {
                self.panel.set(Indicator::Error, true);
                if action == ErrorAction::Reinitialize {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Bus-off, re-initializing");
                    if let Err(_err) = self.initialize() {
                        #[cfg(feature = "defmt")]
                        defmt::error!("Re-initialization failed");
                    }
                }
            }
            Reaction::Ignored | Reaction::Stored | Reaction::Confirmed => {}
        }
    }
}

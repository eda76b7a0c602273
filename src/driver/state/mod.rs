//! Driver state shared between the call path and the interrupt path, and the
//! pure event handlers operating on it.
//!
//! [`DriverState::apply`] is a function of (state, event) that returns a
//! [`Reaction`]; it never touches the peripheral. The driver applies the
//! reaction afterwards, inside the same critical section.
use crate::config::DriverConfig;
use crate::core::{Message, Statistics};
use crate::driver::error_handler::{handle_error, ErrorAction, ErrorStatus};
use crate::driver::events::BusEvent;
use crate::driver::message_object::{MessageObject, Role};

/// Side effect requested by an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reaction {
    /// Frame not accepted by the receive object (or receive path disabled).
    Ignored,
    /// Frame stored in the receive slot.
    Stored,
    /// Frame stored; re-send its payload under the echo identifier.
    Echo(Message),
    /// Error recorded; raise the error indicator and apply the action.
    Error(ErrorAction),
    /// Transmit completion counted.
    Confirmed,
}

/// Message objects, single-slot receive buffer and statistics.
#[derive(Clone, Debug)]
pub struct DriverState {
    config: DriverConfig,
    tx_object: MessageObject,
    rx_object: MessageObject,
    /// Last received frame not yet drained. `Some` is the pending flag.
    slot: Option<Message>,
    stats: Statistics,
}

impl DriverState {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            tx_object: MessageObject::new(Role::Transmit, config.tx_id(), config.tx_slot()),
            rx_object: MessageObject::new(Role::Receive, config.rx_id(), config.rx_slot()),
            slot: None,
            stats: Statistics::default(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn object(&self, role: Role) -> &MessageObject {
        match role {
            Role::Transmit => &self.tx_object,
            Role::Receive => &self.rx_object,
        }
    }

    pub(crate) fn objects_mut(&mut self) -> [&mut MessageObject; 2] {
        [&mut self.tx_object, &mut self.rx_object]
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.stats
    }

    pub fn reset_statistics(&mut self) {
        self.stats = Statistics::default();
    }

    pub fn has_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Drop any buffered frame. Part of every initialization.
    pub(crate) fn clear_slot(&mut self) {
        self.slot = None;
    }

    /// Drain the receive slot. Counts a reception only when a frame was pending.
    pub fn take_pending(&mut self) -> Option<Message> {
        let message = self.slot.take()?;
        self.stats.record_receive();
        Some(message)
    }

    /// Apply one notification from the controller.
    pub fn apply(&mut self, event: &BusEvent) -> Reaction {
        match event {
            BusEvent::FrameReceived(message) => self.on_frame(*message),
            BusEvent::ErrorStatus(status) => self.on_error(*status),
            BusEvent::TransmitComplete { slot } => {
                if *slot == self.tx_object.slot() {
                    self.stats.record_confirmation();
                    Reaction::Confirmed
                } else {
                    Reaction::Ignored
                }
            }
        }
    }

    fn on_frame(&mut self, message: Message) -> Reaction {
        if !self.rx_object.is_enabled() || !self.config.accepts(message.id()) {
            return Reaction::Ignored;
        }

        // Single slot: an undrained frame is overwritten.
        self.slot = Some(message);

        if message.id() == self.config.rx_id() && self.config.echo_enabled() {
            Reaction::Echo(message)
        } else {
            Reaction::Stored
        }
    }

    fn on_error(&mut self, status: ErrorStatus) -> Reaction {
        Reaction::Error(handle_error(&mut self.stats, status))
    }
}

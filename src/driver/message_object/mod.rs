//! Message objects: the fixed binding of a role, an identifier and a data
//! length to a controller slot, plus their `Unconfigured → Configured →
//! Enabled` lifecycle.
use embedded_can::StandardId;

use crate::core::MAX_DLC;
use crate::error::ObjectError;

/// Direction served by a message object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Transmit,
    Receive,
}

/// Lifecycle of a message object. `Enabled` is only reachable through
/// `Configured`; any state may go back to `Unconfigured`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ObjectState {
    Unconfigured,
    Configured,
    Enabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// One controller slot bound to a role and an exact identifier.
pub struct MessageObject {
    role: Role,
    id: StandardId,
    slot: u8,
    dlc: u8,
    state: ObjectState,
}

impl MessageObject {
    /// New, unconfigured object carrying full eight-byte frames.
    pub fn new(role: Role, id: StandardId, slot: u8) -> Self {
        Self {
            role,
            id,
            slot,
            dlc: MAX_DLC as u8,
            state: ObjectState::Unconfigured,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn id(&self) -> StandardId {
        self.id
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == ObjectState::Enabled
    }

    /// Back to `Unconfigured`. Used at the start of every initialization.
    pub fn reset(&mut self) {
        self.state = ObjectState::Unconfigured;
    }

    /// `Unconfigured → Configured`, once the controller accepted the setup.
    pub fn mark_configured(&mut self) -> Result<(), ObjectError> {
        self.transition(ObjectState::Unconfigured, ObjectState::Configured)
    }

    /// `Configured → Enabled`, once the controller is running.
    pub fn mark_enabled(&mut self) -> Result<(), ObjectError> {
        self.transition(ObjectState::Configured, ObjectState::Enabled)
    }

    fn transition(&mut self, from: ObjectState, to: ObjectState) -> Result<(), ObjectError> {
        if self.state != from {
            return Err(ObjectError::InvalidTransition {
                role: self.role,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

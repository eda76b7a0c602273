//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (configuration validation,
//! message construction, message-object lifecycle, peripheral setup).
//!
//! Runtime bus faults are not represented here: they are recorded in the
//! driver statistics by the error handler.
use thiserror_no_std::Error;

use crate::driver::message_object::{ObjectState, Role};

#[derive(Error, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while validating a [`DriverConfig`](crate::config::DriverConfig).
pub enum ConfigError {
    /// Identifier does not fit in 11 bits.
    #[error("Invalid standard identifier: {raw:#x}")]
    InvalidIdentifier { raw: u16 },
    /// Two roles (transmit, receive, echo) share the same identifier.
    #[error("Identifier {raw:#x} is assigned to more than one role")]
    DuplicateIdentifier { raw: u16 },
    /// Message-object slot outside the controller range.
    #[error("Invalid message object slot: {slot}")]
    InvalidSlot { slot: u8 },
    /// Transmit and receive objects mapped onto the same slot.
    #[error("Message object slot {slot} is assigned twice")]
    DuplicateSlot { slot: u8 },
    /// Bit rate other than 250, 500 or 1000 kbps.
    #[error("Unsupported bit rate: {kbps} kbps")]
    UnsupportedBitRate { kbps: u32 },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures while building a [`Message`](crate::core::Message).
pub enum MessageError {
    /// Classic CAN carries at most eight bytes.
    #[error("Payload too long: {len} bytes")]
    PayloadTooLong { len: usize },
    /// Only 11-bit identifiers are supported.
    #[error("Extended identifiers are not supported")]
    ExtendedIdentifier,
    /// Identifier does not fit in 11 bits.
    #[error("Invalid standard identifier: {raw:#x}")]
    InvalidIdentifier { raw: u16 },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Illegal message-object lifecycle transition.
pub enum ObjectError {
    #[error("{role:?} object cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        role: Role,
        from: ObjectState,
        to: ObjectState,
    },
}

#[derive(Error, Debug)]
/// Errors returned by [`CanDriver::initialize`](crate::driver::CanDriver::initialize).
///
/// Each peripheral variant names the initialization step that failed.
pub enum DriverError<E: core::fmt::Debug> {
    /// Controller rejected the bit-rate configuration.
    #[error("Bit rate configuration failed: {0:?}")]
    BitRate(E),
    /// Controller rejected a message-object setup.
    #[error("Message object setup failed on slot {slot}: {cause:?}")]
    ObjectSetup { slot: u8, cause: E },
    /// Controller could not be enabled.
    #[error("Controller enable failed: {0:?}")]
    Enable(E),
    /// Interrupt sources could not be enabled.
    #[error("Interrupt enable failed: {0:?}")]
    Interrupts(E),
    /// Message-object state machine refused a transition.
    #[error(transparent)]
    Object(#[from] ObjectError),
}

//! Minimal abstraction of a single CAN controller instance. Lets the driver
//! plug into a vendor HAL, a register-level implementation, or a test double.
//!
//! Implementations only touch the hardware. Reception, error and
//! transmit-complete notifications travel the other way, through the
//! [`EventSink`](crate::driver::events::EventSink) handed to the interrupt
//! handler.
use embedded_can::StandardId;

use crate::config::BitRate;
use crate::core::MAX_DLC;
use crate::driver::error_handler::ErrorStatus;
use crate::driver::message_object::MessageObject;

/// Contract between the driver and one CAN controller.
pub trait CanPeripheral {
    type Error: core::fmt::Debug;

    /// Program the bit timing for `bit_rate`. Called first on every initialization.
    fn set_bit_rate(&mut self, bit_rate: BitRate) -> Result<(), Self::Error>;

    /// Bind a message object to its slot: role, identifier, data length.
    /// Acceptance is an exact identifier match (no masking).
    fn setup_object(&mut self, object: &MessageObject) -> Result<(), Self::Error>;

    /// Leave init mode. With `loopback` the controller routes its own frames
    /// to its receiver instead of the bus.
    fn enable(&mut self, loopback: bool) -> Result<(), Self::Error>;

    /// Enable reception, error and status interrupt sources.
    fn enable_interrupts(&mut self) -> Result<(), Self::Error>;

    /// Queue a frame in the transmit slot. `data` is always fully populated,
    /// the wire frame carries `dlc` bytes.
    fn transmit(
        &mut self,
        slot: u8,
        id: StandardId,
        dlc: u8,
        data: &[u8; MAX_DLC],
    ) -> Result<(), Self::Error>;

    /// Current controller error status.
    fn error_status(&mut self) -> ErrorStatus;
}

//! Controller error status: bit layout, severity classification, and the
//! handler that turns a status into statistics and a corrective action.
//!
//! ## Status layout
//!
//! | bits | meaning |
//! |------|---------|
//! | 0-2  | last error code (LEC) |
//! | 3    | transmit warning |
//! | 4    | receive warning |
//! | 5    | transmit error passive |
//! | 6    | receive error passive |
//! | 7    | bus-off |
//!
//! Only bus-off calls for action: the controller cannot leave it on its own,
//! so the driver re-initializes. Everything else is counted and left to the
//! self-test harness to judge.
use embedded_can::ErrorKind;

use crate::core::Statistics;

//==================================================================================ERROR_STATUS
/// Raw controller error status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorStatus(pub u32);

impl ErrorStatus {
    /// Last error code field.
    pub const LEC_MASK: u32 = 0x07;
    pub const TX_WARNING: u32 = 1 << 3;
    pub const RX_WARNING: u32 = 1 << 4;
    pub const TX_ERROR_PASSIVE: u32 = 1 << 5;
    pub const RX_ERROR_PASSIVE: u32 = 1 << 6;
    pub const BUS_OFF: u32 = 1 << 7;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True when every bit of `flag` is set.
    pub const fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    const FLAGS: u32 = Self::TX_WARNING
        | Self::RX_WARNING
        | Self::TX_ERROR_PASSIVE
        | Self::RX_ERROR_PASSIVE
        | Self::BUS_OFF;

    /// No flag set and no fresh error code (0 or 7 "unchanged").
    pub const fn is_clear(&self) -> bool {
        self.0 & Self::FLAGS == 0 && matches!(self.lec(), 0 | 7)
    }

    /// Raw last error code (0 to 7).
    pub const fn lec(&self) -> u8 {
        (self.0 & Self::LEC_MASK) as u8
    }

    /// Protocol error behind the last error code, if any.
    ///
    /// Codes: 1 stuff, 2 form, 3 acknowledge, 4 recessive bit, 5 dominant bit,
    /// 6 CRC. 0 (no error) and 7 (unchanged since last read) yield `None`.
    pub fn last_error_kind(&self) -> Option<ErrorKind> {
        match self.lec() {
            1 => Some(ErrorKind::Stuff),
            2 => Some(ErrorKind::Form),
            3 => Some(ErrorKind::Acknowledge),
            4 | 5 => Some(ErrorKind::Bit),
            6 => Some(ErrorKind::Crc),
            _ => None,
        }
    }

    /// Most severe condition present in the status.
    pub fn severity(&self) -> Severity {
        if self.contains(Self::BUS_OFF) {
            Severity::BusOff
        } else if self.contains(Self::TX_ERROR_PASSIVE) || self.contains(Self::RX_ERROR_PASSIVE) {
            Severity::ErrorPassive
        } else if self.contains(Self::TX_WARNING) || self.contains(Self::RX_WARNING) {
            Severity::Warning
        } else if self.last_error_kind().is_some() {
            Severity::Protocol
        } else {
            Severity::None
        }
    }
}

impl From<u32> for ErrorStatus {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

/// Severity ladder, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    None,
    /// Only a last error code is set.
    Protocol,
    /// Transmit or receive error counter above the warning level.
    Warning,
    /// Transmit or receive error counter above the error-passive level.
    ErrorPassive,
    /// Node is off the bus.
    BusOff,
}

//==================================================================================HANDLER
/// What the driver must do after an error status was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorAction {
    /// Counted only.
    Record,
    /// Full driver re-initialization.
    Reinitialize,
}

/// Record `status` into `stats` and decide the corrective action.
///
/// Every call counts as one error and overwrites the last error code,
/// whatever the flags.
pub fn handle_error(stats: &mut Statistics, status: ErrorStatus) -> ErrorAction {
    stats.record_error(status.bits());

    #[cfg(feature = "defmt")]
    defmt::warn!(
        "CAN error status {=u32:#x} ({})",
        status.bits(),
        status.severity()
    );

    if status.contains(ErrorStatus::BUS_OFF) {
        stats.record_recovery();
        ErrorAction::Reinitialize
    } else {
        ErrorAction::Record
    }
}

//! Data model shared by the driver, the error handler and the self-test
//! harness: the classic CAN [`Message`] and the [`Statistics`] snapshot.

use embassy_time::Instant;
use embedded_can::{Frame, Id, StandardId};

use crate::error::MessageError;

/// Maximum payload of a classic CAN frame.
pub const MAX_DLC: usize = 8;

//==================================================================================MESSAGE
/// Classic CAN data frame with a standard identifier.
///
/// The payload buffer is always fully populated: bytes past the DLC are zero.
/// Fields are private so a message cannot change once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    id: StandardId,
    dlc: u8,
    data: [u8; MAX_DLC],
    timestamp: Instant,
}

impl Message {
    /// Build an outgoing message. Fails when `payload` exceeds eight bytes.
    pub fn new(id: StandardId, payload: &[u8]) -> Result<Self, MessageError> {
        if payload.len() > MAX_DLC {
            return Err(MessageError::PayloadTooLong { len: payload.len() });
        }
        let mut data = [0u8; MAX_DLC];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            dlc: payload.len() as u8,
            data,
            timestamp: Instant::from_ticks(0),
        })
    }

    /// Eight-byte outgoing message. Cannot fail.
    pub const fn from_array(id: StandardId, data: [u8; MAX_DLC]) -> Self {
        Self {
            id,
            dlc: MAX_DLC as u8,
            data,
            timestamp: Instant::from_ticks(0),
        }
    }

    /// Same as [`Message::new`] for any identifier; extended ones are refused.
    pub fn from_id(id: impl Into<Id>, payload: &[u8]) -> Result<Self, MessageError> {
        match id.into() {
            Id::Standard(id) => Self::new(id, payload),
            Id::Extended(_) => Err(MessageError::ExtendedIdentifier),
        }
    }

    /// Same as [`Message::new`] from a raw 11-bit identifier.
    pub fn from_raw(raw_id: u16, payload: &[u8]) -> Result<Self, MessageError> {
        let id = StandardId::new(raw_id).ok_or(MessageError::InvalidIdentifier { raw: raw_id })?;
        Self::new(id, payload)
    }

    /// Build a message as delivered by the controller: `len` is clamped to 8
    /// and the reception instant is recorded.
    pub fn received(id: StandardId, data: [u8; MAX_DLC], len: usize, timestamp: Instant) -> Self {
        let dlc = len.min(MAX_DLC);
        let mut padded = [0u8; MAX_DLC];
        padded[..dlc].copy_from_slice(&data[..dlc]);
        Self {
            id,
            dlc: dlc as u8,
            data: padded,
            timestamp,
        }
    }

    /// Copy of this message stamped with a new reception instant.
    pub fn with_timestamp(self, timestamp: Instant) -> Self {
        Self { timestamp, ..self }
    }

    pub fn id(&self) -> StandardId {
        self.id
    }

    /// Data Length Code (0 to 8).
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Populated payload bytes (`dlc` long).
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.dlc as usize]
    }

    /// Full eight-byte buffer, zero padded past the DLC.
    pub fn raw_data(&self) -> &[u8; MAX_DLC] {
        &self.data
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}

impl Frame for Message {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Message::from_id(id, data).ok()
    }

    /// Remote frames are not part of the echo protocol.
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        Id::Standard(self.id)
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Message {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Message {{ id: {=u16:#x}, dlc: {}, data: {=[u8]:x} }}",
            self.id.as_raw(),
            self.dlc,
            self.payload()
        )
    }
}

//==================================================================================STATISTICS
/// Snapshot of the driver counters.
///
/// Counters only grow (saturating) between two resets. A reset happens at
/// self-test start through [`CanDriver::reset_statistics`](crate::driver::CanDriver::reset_statistics).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    /// Frames handed to the controller (submitted, not acknowledged).
    pub messages_transmitted: u32,
    /// Frames drained by `receive`.
    pub messages_received: u32,
    /// Error statuses delivered by the controller.
    pub error_count: u32,
    /// Raw value of the most recent error status.
    pub last_error_code: u32,
    /// Transmit-complete events reported by the controller.
    pub transmissions_confirmed: u32,
    /// Submissions refused synchronously by the peripheral.
    pub submit_failures: u32,
    /// Re-initializations triggered by bus-off.
    pub bus_off_recoveries: u32,
}

impl Statistics {
    pub(crate) fn record_transmit(&mut self) {
        self.messages_transmitted = self.messages_transmitted.saturating_add(1);
    }

    pub(crate) fn record_receive(&mut self) {
        self.messages_received = self.messages_received.saturating_add(1);
    }

    pub(crate) fn record_error(&mut self, raw_status: u32) {
        self.error_count = self.error_count.saturating_add(1);
        self.last_error_code = raw_status;
    }

    pub(crate) fn record_confirmation(&mut self) {
        self.transmissions_confirmed = self.transmissions_confirmed.saturating_add(1);
    }

    pub(crate) fn record_submit_failure(&mut self) {
        self.submit_failures = self.submit_failures.saturating_add(1);
    }

    pub(crate) fn record_recovery(&mut self) {
        self.bus_off_recoveries = self.bus_off_recoveries.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u16) -> StandardId {
        StandardId::new(raw).unwrap()
    }

    #[test]
    fn new_zero_pads_past_dlc() {
        let msg = Message::new(id(0x123), &[1, 2, 3]).unwrap();
        assert_eq!(msg.dlc(), 3);
        assert_eq!(msg.payload(), &[1, 2, 3]);
        assert_eq!(msg.raw_data(), &[1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn new_rejects_nine_bytes() {
        let err = Message::new(id(0x123), &[0; 9]).unwrap_err();
        assert_eq!(err, MessageError::PayloadTooLong { len: 9 });
    }

    #[test]
    fn from_raw_rejects_12_bit_identifier() {
        let err = Message::from_raw(0x800, &[]).unwrap_err();
        assert_eq!(err, MessageError::InvalidIdentifier { raw: 0x800 });
    }

    #[test]
    fn from_id_refuses_extended_identifier() {
        let ext = embedded_can::ExtendedId::new(0x1234).unwrap();
        assert_eq!(
            Message::from_id(ext, &[1]).unwrap_err(),
            MessageError::ExtendedIdentifier
        );
        assert_eq!(Message::from_id(id(0x42), &[1]).unwrap().dlc(), 1);
    }

    #[test]
    fn from_array_is_full_length() {
        let msg = Message::from_array(id(0x123), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(msg.dlc(), 8);
        assert_eq!(msg.payload(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn received_clamps_length_and_masks_stale_bytes() {
        let msg = Message::received(id(0x456), [9; 8], 12, Instant::from_millis(5));
        assert_eq!(msg.dlc(), 8);
        assert_eq!(msg.timestamp(), Instant::from_millis(5));

        let short = Message::received(id(0x456), [9; 8], 2, Instant::from_millis(5));
        assert_eq!(short.raw_data(), &[9, 9, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn frame_trait_rejects_extended_and_remote() {
        let ext = embedded_can::ExtendedId::new(0x1234).unwrap();
        assert!(<Message as Frame>::new(ext, &[1]).is_none());
        assert!(<Message as Frame>::new_remote(id(0x10), 0).is_none());

        let std_frame = <Message as Frame>::new(id(0x10), &[1, 2]).unwrap();
        assert!(std_frame.is_standard());
        assert!(std_frame.is_data_frame());
        assert_eq!(Frame::dlc(&std_frame), 2);
    }

    #[test]
    fn counters_saturate() {
        let mut stats = Statistics {
            messages_transmitted: u32::MAX,
            ..Default::default()
        };
        stats.record_transmit();
        assert_eq!(stats.messages_transmitted, u32::MAX);

        stats.record_error(0x80);
        stats.record_error(0x08);
        assert_eq!(stats.error_count, 2);
        assert_eq!(stats.last_error_code, 0x08);
    }
}

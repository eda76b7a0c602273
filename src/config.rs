//! Node configuration: bit rate, message identifiers, message-object slots,
//! loopback, operating mode and echo policy.
//!
//! Both nodes of the echo topology must agree on the bit rate, and the
//! transmit identifier of one node is the receive identifier of the other.
//! [`DriverConfig::peer`] derives the mirrored configuration.
use embedded_can::StandardId;

use crate::error::ConfigError;

/// Default transmit identifier.
pub const DEFAULT_TX_ID: u16 = 0x123;
/// Default receive identifier.
pub const DEFAULT_RX_ID: u16 = 0x456;
/// Identifier reserved for echo responses.
pub const DEFAULT_ECHO_ID: u16 = 0x789;
/// Default message-object slot used for transmission.
pub const DEFAULT_TX_SLOT: u8 = 1;
/// Default message-object slot used for reception.
pub const DEFAULT_RX_SLOT: u8 = 2;
/// Highest message-object slot addressable on the controller (slot 0 is invalid).
pub const MAX_SLOT: u8 = 32;

const fn const_id(raw: u16) -> StandardId {
    match StandardId::new(raw) {
        Some(id) => id,
        None => panic!("default identifier must fit in 11 bits"),
    }
}

//==================================================================================BIT_RATE
/// Nominal bus bit rate. One fixed value per node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitRate {
    Kbps250,
    Kbps500,
    Kbps1000,
}

impl BitRate {
    pub const fn kbps(self) -> u32 {
        match self {
            BitRate::Kbps250 => 250,
            BitRate::Kbps500 => 500,
            BitRate::Kbps1000 => 1000,
        }
    }

    /// Bit rate in bits per second, as expected by controller timing calculators.
    pub const fn bits_per_second(self) -> u32 {
        self.kbps() * 1000
    }
}

impl TryFrom<u32> for BitRate {
    type Error = ConfigError;

    /// Convert from kbps.
    fn try_from(kbps: u32) -> Result<Self, Self::Error> {
        match kbps {
            250 => Ok(BitRate::Kbps250),
            500 => Ok(BitRate::Kbps500),
            1000 => Ok(BitRate::Kbps1000),
            other => Err(ConfigError::UnsupportedBitRate { kbps: other }),
        }
    }
}

//==================================================================================MODE
/// What the node does once the driver is up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Periodic send / receive application loop.
    Normal,
    /// Run the self-test battery then report results forever.
    SelfTest,
}

/// Whether frames on the receive identifier are re-sent under the echo identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EchoPolicy {
    /// Echo only when running in [`Mode::SelfTest`].
    SelfTestOnly,
    Always,
    Never,
}

//==================================================================================DRIVER_CONFIG
/// Validated node configuration. Built through [`DriverConfig::builder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    bit_rate: BitRate,
    tx_id: StandardId,
    rx_id: StandardId,
    echo_id: StandardId,
    tx_slot: u8,
    rx_slot: u8,
    loopback: bool,
    mode: Mode,
    echo: EchoPolicy,
}

impl Default for DriverConfig {
    /// 500 kbps, 0x123 / 0x456 / 0x789, slots 1 and 2, normal mode, no loopback.
    fn default() -> Self {
        Self {
            bit_rate: BitRate::Kbps500,
            tx_id: const_id(DEFAULT_TX_ID),
            rx_id: const_id(DEFAULT_RX_ID),
            echo_id: const_id(DEFAULT_ECHO_ID),
            tx_slot: DEFAULT_TX_SLOT,
            rx_slot: DEFAULT_RX_SLOT,
            loopback: false,
            mode: Mode::Normal,
            echo: EchoPolicy::SelfTestOnly,
        }
    }
}

impl DriverConfig {
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::new()
    }

    /// Defaults adjusted by the `loopback` and `self-test` cargo features.
    pub fn build_profile() -> Self {
        let mut config = Self::default();
        config.loopback = cfg!(feature = "loopback");
        if cfg!(feature = "self-test") {
            config.mode = Mode::SelfTest;
        }
        config
    }

    /// Configuration of the other node of the echo topology: transmit and
    /// receive identifiers swapped, everything else identical.
    pub fn peer(&self) -> Self {
        Self {
            tx_id: self.rx_id,
            rx_id: self.tx_id,
            ..*self
        }
    }

    pub fn bit_rate(&self) -> BitRate {
        self.bit_rate
    }

    pub fn tx_id(&self) -> StandardId {
        self.tx_id
    }

    pub fn rx_id(&self) -> StandardId {
        self.rx_id
    }

    pub fn echo_id(&self) -> StandardId {
        self.echo_id
    }

    pub fn tx_slot(&self) -> u8 {
        self.tx_slot
    }

    pub fn rx_slot(&self) -> u8 {
        self.rx_slot
    }

    pub fn loopback(&self) -> bool {
        self.loopback
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Resolve the echo policy against the operating mode.
    pub fn echo_enabled(&self) -> bool {
        match self.echo {
            EchoPolicy::Always => true,
            EchoPolicy::Never => false,
            EchoPolicy::SelfTestOnly => self.mode == Mode::SelfTest,
        }
    }

    /// Identifiers the receive path keeps: the receive identifier, the echo
    /// identifier, and the node's own transmit identifier in loopback.
    pub fn accepts(&self, id: StandardId) -> bool {
        id == self.rx_id || id == self.echo_id || (self.loopback && id == self.tx_id)
    }
}

//==================================================================================DRIVER_CONFIG_BUILDER
/// Fluent builder enforcing the identifier and slot rules.
#[derive(Debug)]
pub struct DriverConfigBuilder {
    pub bit_rate: BitRate,
    pub tx_id: u16,
    pub rx_id: u16,
    pub echo_id: u16,
    pub tx_slot: u8,
    pub rx_slot: u8,
    pub loopback: bool,
    pub mode: Mode,
    pub echo: EchoPolicy,
}

impl Default for DriverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverConfigBuilder {
    pub fn new() -> Self {
        Self {
            bit_rate: BitRate::Kbps500,
            tx_id: DEFAULT_TX_ID,
            rx_id: DEFAULT_RX_ID,
            echo_id: DEFAULT_ECHO_ID,
            tx_slot: DEFAULT_TX_SLOT,
            rx_slot: DEFAULT_RX_SLOT,
            loopback: false,
            mode: Mode::Normal,
            echo: EchoPolicy::SelfTestOnly,
        }
    }

    pub fn with_bit_rate(mut self, bit_rate: BitRate) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    pub fn with_tx_id(mut self, raw: u16) -> Self {
        self.tx_id = raw;
        self
    }

    pub fn with_rx_id(mut self, raw: u16) -> Self {
        self.rx_id = raw;
        self
    }

    pub fn with_echo_id(mut self, raw: u16) -> Self {
        self.echo_id = raw;
        self
    }

    pub fn with_slots(mut self, tx_slot: u8, rx_slot: u8) -> Self {
        self.tx_slot = tx_slot;
        self.rx_slot = rx_slot;
        self
    }

    pub fn with_loopback(mut self, enabled: bool) -> Self {
        self.loopback = enabled;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_echo(mut self, echo: EchoPolicy) -> Self {
        self.echo = echo;
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<DriverConfig, ConfigError> {
        let tx_id = standard_id(self.tx_id)?;
        let rx_id = standard_id(self.rx_id)?;
        let echo_id = standard_id(self.echo_id)?;

        // The three roles must stay distinguishable on the wire.
        if self.tx_id == self.rx_id || self.tx_id == self.echo_id {
            return Err(ConfigError::DuplicateIdentifier { raw: self.tx_id });
        }
        if self.rx_id == self.echo_id {
            return Err(ConfigError::DuplicateIdentifier { raw: self.rx_id });
        }

        for slot in [self.tx_slot, self.rx_slot] {
            if slot == 0 || slot > MAX_SLOT {
                return Err(ConfigError::InvalidSlot { slot });
            }
        }
        if self.tx_slot == self.rx_slot {
            return Err(ConfigError::DuplicateSlot { slot: self.tx_slot });
        }

        Ok(DriverConfig {
            bit_rate: self.bit_rate,
            tx_id,
            rx_id,
            echo_id,
            tx_slot: self.tx_slot,
            rx_slot: self.rx_slot,
            loopback: self.loopback,
            mode: self.mode,
            echo: self.echo,
        })
    }
}

fn standard_id(raw: u16) -> Result<StandardId, ConfigError> {
    StandardId::new(raw).ok_or(ConfigError::InvalidIdentifier { raw })
}

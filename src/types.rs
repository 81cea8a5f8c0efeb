//! Types shared across the transport, radio, and link layers.

use core::fmt::{Display, Formatter, Result};

use bitfield_struct::bitfield;

/// Power Amplifier level in dBm (decibel-milliwatts).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaLevel {
    /// -18 dBm
    Min,
    /// -12 dBm
    Low,
    /// -6 dBm
    High,
    /// 0 dBm
    Max,
}

impl PaLevel {
    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            PaLevel::Min => 0,
            PaLevel::Low => 2,
            PaLevel::High => 4,
            PaLevel::Max => 6,
        }
    }
}

impl Display for PaLevel {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            PaLevel::Min => write!(f, "Min"),
            PaLevel::Low => write!(f, "Low"),
            PaLevel::High => write!(f, "High"),
            PaLevel::Max => write!(f, "Max"),
        }
    }
}

/// How fast data moves over the air, in bits per second.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    /// represents 1 Mbps
    Mbps1,
    /// represents 2 Mbps
    Mbps2,
    /// represents 250 Kbps
    Kbps250,
}

impl DataRate {
    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => 0x8,
            DataRate::Kbps250 => 0x20,
        }
    }
}

impl Display for DataRate {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DataRate::Mbps1 => write!(f, "1 Mbps"),
            DataRate::Mbps2 => write!(f, "2 Mbps"),
            DataRate::Kbps250 => write!(f, "250 Kbps"),
        }
    }
}

/// Which end of the packet link a transceiver serves.
///
/// Each role owns exactly one transceiver, one CE/CSN line pair, and one
/// register bus. Instances are never shared between roles.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkRole {
    /// Primary transmitter (PTX).
    Transmitter,
    /// Primary receiver (PRX).
    Receiver,
}

/// Diagnostic codes reported through [`Diagnostics::fatal`](crate::diag::Diagnostics::fatal).
///
/// The numeric values are stable; an external display can render the raw code.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FaultCode {
    /// Auto-ack read-back mismatch while bringing up the transmitter link.
    TxConfigVerify = 1,
    /// Auto-ack read-back mismatch while bringing up the receiver link.
    RxConfigVerify = 2,
    /// An ACK payload arrived with a width other than the configured one.
    AckPayloadWidth = 10,
    /// An ACK payload arrived on a pipe other than pipe 0.
    AckPayloadPipe = 11,
    /// An inbound packet's width differs from the configured payload width.
    RxPayloadWidth = 12,
}

impl FaultCode {
    /// The raw checkpoint value for display hardware.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// The STATUS register image returned with every SPI command.
#[bitfield(u8, new = false, order = Msb)]
#[derive(PartialEq)]
pub struct StatusFlags {
    #[bits(1)]
    _padding: u8,

    /// RX Data Ready: a payload is waiting in the RX FIFO.
    #[bits(1, access = RO)]
    pub rx_dr: bool,

    /// TX Data Sent (with auto-ack enabled, set only once the ACK arrived).
    #[bits(1, access = RO)]
    pub tx_ds: bool,

    /// Maximum retransmit count reached; must be cleared to resume traffic.
    #[bits(1, access = RO)]
    pub tx_df: bool,

    /// Pipe number of the payload at the head of the RX FIFO (7 = empty).
    #[bits(3, access = RO)]
    pub rx_pipe: u8,

    /// TX FIFO full.
    #[bits(1, access = RO)]
    pub tx_full: bool,
}

impl StatusFlags {
    /// A mask isolating the three event flags (for STATUS writes).
    pub(crate) const IRQ_MASK: u8 = 0x70;
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "StatusFlags rx_dr: {}, tx_ds: {}, tx_df: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.tx_df()
        )
    }
}

impl Display for StatusFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "StatusFlags rx_dr: {}, tx_ds: {}, tx_df: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.tx_df()
        )
    }
}

/// The FIFO_STATUS register image.
#[bitfield(u8, new = false, order = Msb)]
#[derive(PartialEq)]
pub struct FifoStatus {
    #[bits(1)]
    _padding: u8,

    /// The last transmitted payload is flagged for re-use.
    #[bits(1, access = RO)]
    pub tx_reuse: bool,

    /// TX FIFO holds three payloads.
    #[bits(1, access = RO)]
    pub tx_full: bool,

    /// TX FIFO holds no payloads.
    #[bits(1, access = RO)]
    pub tx_empty: bool,

    #[bits(2)]
    _reserved: u8,

    /// RX FIFO holds three payloads.
    #[bits(1, access = RO)]
    pub rx_full: bool,

    /// RX FIFO holds no payloads.
    #[bits(1, access = RO)]
    pub rx_empty: bool,
}

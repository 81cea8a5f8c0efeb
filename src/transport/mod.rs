//! The byte-level transport that carries the register protocol.
//!
//! One trait, two implementations: [`SpiTransport`] drives a hardware SPI
//! peripheral through [`embedded_hal::spi::SpiBus`], and [`SoftSpiTransport`]
//! bit-bangs the same wire protocol over four GPIO pins. Higher layers are
//! generic over [`ByteTransport`] and cannot tell the two apart.

mod soft;
mod spi;

pub use soft::{SampleEdge, SoftSpiTransport};
pub use spi::SpiTransport;

/// A half-duplex byte exchange plus chip-select control for one device.
///
/// Every operation is synchronous: the caller blocks for the full transfer.
/// A stuck transfer is indistinguishable from a slow one at this layer; only
/// the link-level keep-alive timers can tell them apart.
pub trait ByteTransport {
    type Error;

    /// Drive the device's chip-select line active (low).
    fn select(&mut self) -> Result<(), Self::Error>;

    /// Release the device's chip-select line (high), completing any buffered
    /// transfer first.
    fn deselect(&mut self) -> Result<(), Self::Error>;

    /// Clock `byte` out while clocking one byte in, and return the byte read.
    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error>;
}

/// Errors raised by a transport backed by distinct bus and pin resources.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<BUS, PIN> {
    /// The serial peripheral failed.
    Bus(BUS),
    /// A control pin failed.
    Pin(PIN),
}

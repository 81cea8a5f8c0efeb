use embedded_hal::digital::{InputPin, OutputPin};

use super::ByteTransport;

/// Which clock edge the input line is sampled on.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleEdge {
    /// Sample while the clock is high (nRF24L01 mode-0 wiring).
    Rising,
    /// Sample after the clock returns low.
    Falling,
}

/// [`ByteTransport`] bit-banged over plain GPIO pins.
///
/// Bits are shifted out MSB first, the output line latched before the rising
/// clock edge and the input line sampled on the edge selected at construction.
/// A board with the data lines cross-wired is handled by passing the swapped
/// pins to [`SoftSpiTransport::new`]; bit order and timing are unaffected.
pub struct SoftSpiTransport<SCK, MOSI, MISO, CSN> {
    sck: SCK,
    mosi: MOSI,
    miso: MISO,
    csn: CSN,
    edge: SampleEdge,
}

impl<E, SCK, MOSI, MISO, CSN> SoftSpiTransport<SCK, MOSI, MISO, CSN>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
    CSN: OutputPin<Error = E>,
{
    /// Take ownership of the four wires and park them idle
    /// (clock low, chip-select released).
    pub fn new(
        mut sck: SCK,
        mosi: MOSI,
        miso: MISO,
        mut csn: CSN,
        edge: SampleEdge,
    ) -> Result<Self, E> {
        csn.set_high()?;
        sck.set_low()?;
        Ok(Self {
            sck,
            mosi,
            miso,
            csn,
            edge,
        })
    }
}

impl<E, SCK, MOSI, MISO, CSN> ByteTransport for SoftSpiTransport<SCK, MOSI, MISO, CSN>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
    CSN: OutputPin<Error = E>,
{
    type Error = E;

    fn select(&mut self) -> Result<(), Self::Error> {
        self.csn.set_low()
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        self.csn.set_high()
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error> {
        let mut out = byte;
        let mut read = 0u8;
        for _ in 0..8 {
            if out & 0x80 != 0 {
                self.mosi.set_high()?;
            } else {
                self.mosi.set_low()?;
            }
            out <<= 1;
            read <<= 1;
            self.sck.set_high()?;
            if self.edge == SampleEdge::Rising && self.miso.is_high()? {
                read |= 1;
            }
            self.sck.set_low()?;
            if self.edge == SampleEdge::Falling && self.miso.is_high()? {
                read |= 1;
            }
        }
        Ok(read)
    }
}

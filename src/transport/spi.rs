use embedded_hal::{digital::OutputPin, spi::SpiBus};

use super::{ByteTransport, TransportError};

/// [`ByteTransport`] over a hardware SPI peripheral.
///
/// The peripheral must be configured as clock master (mode 0, MSB first,
/// the nRF24L01's native framing). The CSN pin is driven here rather than by
/// the HAL so that one bus instance could serve the chip-select discipline
/// required by the register protocol.
pub struct SpiTransport<SPI, CSN> {
    spi: SPI,
    csn: CSN,
}

impl<SPI, CSN> SpiTransport<SPI, CSN>
where
    SPI: SpiBus<u8>,
    CSN: OutputPin,
{
    /// Wrap a configured SPI bus and the device's chip-select pin.
    ///
    /// The pin is released (driven high) on construction so the device cannot
    /// observe a half-open frame.
    pub fn new(spi: SPI, mut csn: CSN) -> Result<Self, TransportError<SPI::Error, CSN::Error>> {
        csn.set_high().map_err(TransportError::Pin)?;
        Ok(Self { spi, csn })
    }
}

impl<SPI, CSN> ByteTransport for SpiTransport<SPI, CSN>
where
    SPI: SpiBus<u8>,
    CSN: OutputPin,
{
    type Error = TransportError<SPI::Error, CSN::Error>;

    fn select(&mut self) -> Result<(), Self::Error> {
        self.csn.set_low().map_err(TransportError::Pin)
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        // the bus may buffer; the frame must be on the wire before CSN rises
        self.spi.flush().map_err(TransportError::Bus)?;
        self.csn.set_high().map_err(TransportError::Pin)
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error> {
        let mut buf = [byte];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(TransportError::Bus)?;
        Ok(buf[0])
    }
}

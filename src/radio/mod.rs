//! The nRF24L01 chip driver: register protocol, packet operations, bring-up.

mod bit_fields;
mod bus;
mod config;
mod constants;
mod init;
mod ops;

pub use config::{PipeAddresses, RadioConfig};
pub use constants::{commands, mnemonics, registers};
pub use ops::Inbound;

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::transport::ByteTransport;
use crate::types::StatusFlags;
use bit_fields::Config;
use bus::RegisterBus;

/// Hardware access errors, split by the resource that failed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError<BUS, PIN> {
    /// The byte transport failed.
    Bus(BUS),
    /// The CE line failed.
    Gpo(PIN),
}

/// One nRF24L01 transceiver on a [`ByteTransport`] with its own CE line.
///
/// Two of these back a transmit/receive link pair; each instance is owned by
/// exactly one link controller and never shared.
pub struct Rf24<T, CE, DELAY> {
    bus: RegisterBus<T>,
    ce_pin: CE,
    delay_impl: DELAY,
    status: StatusFlags,
    config_reg: Config,
}

impl<T, CE, DELAY> Rf24<T, CE, DELAY>
where
    T: ByteTransport,
    CE: OutputPin,
    DELAY: DelayNs,
{
    /// Wrap a transport and CE pin.
    ///
    /// The device is untouched until [`Rf24::with_config()`] runs.
    pub fn new(port: T, ce_pin: CE, delay_impl: DELAY) -> Rf24<T, CE, DELAY> {
        Rf24 {
            bus: RegisterBus::new(port),
            ce_pin,
            delay_impl,
            status: StatusFlags::from_bits(0),
            config_reg: Config::new(),
        }
    }

    /// The STATUS image clocked out with the most recent command.
    pub fn status(&self) -> StatusFlags {
        self.status
    }

    fn note_status(&mut self, raw: u8) {
        self.status = StatusFlags::from_bits(raw);
    }

    /// Read one register, caching the status byte that rode along.
    pub fn read_register(&mut self, reg: u8) -> Result<u8, RadioError<T::Error, CE::Error>> {
        let (value, status) = self.bus.read_register(reg).map_err(RadioError::Bus)?;
        self.note_status(status);
        Ok(value)
    }

    pub(crate) fn write_register(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        let status = self.bus.write_register(reg, value).map_err(RadioError::Bus)?;
        self.note_status(status);
        Ok(())
    }

    pub(crate) fn command(&mut self, cmd: u8) -> Result<(), RadioError<T::Error, CE::Error>> {
        let status = self.bus.command(cmd).map_err(RadioError::Bus)?;
        self.note_status(status);
        Ok(())
    }

    pub(crate) fn read_buf(
        &mut self,
        cmd: u8,
        buf: &mut [u8],
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        let status = self.bus.read_buf(cmd, buf).map_err(RadioError::Bus)?;
        self.note_status(status);
        Ok(())
    }

    pub(crate) fn write_buf(
        &mut self,
        cmd: u8,
        buf: &[u8],
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        let status = self.bus.write_buf(cmd, buf).map_err(RadioError::Bus)?;
        self.note_status(status);
        Ok(())
    }

    fn ce_low(&mut self) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.ce_pin.set_low().map_err(RadioError::Gpo)
    }

    fn ce_high(&mut self) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.ce_pin.set_high().map_err(RadioError::Gpo)
    }
}

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::transport::ByteTransport;
use crate::types::{FifoStatus, StatusFlags};

use super::{commands, mnemonics, registers, RadioError, Rf24};

/// A payload pulled off the RX FIFO: which pipe it landed on and how wide the
/// device says it is.
///
/// The width is reported raw; whether it matches the link's expectation is the
/// link controller's judgment, not the driver's.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Inbound {
    pub pipe: u8,
    pub width: u8,
}

impl<T, CE, DELAY> Rf24<T, CE, DELAY>
where
    T: ByteTransport,
    CE: OutputPin,
    DELAY: DelayNs,
{
    /// Refresh the cached STATUS image with a NOP exchange.
    pub fn update(&mut self) -> Result<StatusFlags, RadioError<T::Error, CE::Error>> {
        self.command(commands::NOP)?;
        Ok(self.status())
    }

    /// Write-1-to-clear the given event bits in STATUS.
    pub fn clear_status(&mut self, mask: u8) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.write_register(registers::STATUS, mask & StatusFlags::IRQ_MASK)
    }

    /// Read the FIFO_STATUS register.
    pub fn fifo_status(&mut self) -> Result<FifoStatus, RadioError<T::Error, CE::Error>> {
        let raw = self.read_register(registers::FIFO_STATUS)?;
        Ok(FifoStatus::from_bits(raw))
    }

    /// Discard everything queued for transmission.
    pub fn flush_tx(&mut self) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.command(commands::FLUSH_TX)
    }

    /// Discard everything waiting in the RX FIFO.
    pub fn flush_rx(&mut self) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.command(commands::FLUSH_RX)
    }

    /// Queue one packet for `addr` and kick off transmission.
    ///
    /// With auto-ack on, pipe 0's RX address is mirrored to `addr` first: the
    /// hardware delivers the automatic acknowledgement on pipe 0 no matter
    /// which pipe the packet targeted, so pipe 0 must listen on the
    /// destination address.
    pub fn tx_packet(
        &mut self,
        addr: &[u8],
        payload: &[u8],
        auto_ack: bool,
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.ce_low()?;
        self.write_buf(registers::TX_ADDR, addr)?;
        if auto_ack {
            self.write_buf(registers::RX_ADDR_P0, addr)?;
        }
        self.write_buf(commands::W_TX_PAYLOAD, payload)?;
        let word = self.config_reg.with_power(true).with_prim_rx(false);
        self.config_reg = word;
        self.write_register(registers::CONFIG, word.into_bits())?;
        self.ce_high()
    }

    /// Pull the next payload off the RX FIFO, if one is waiting.
    ///
    /// Reads the top-of-FIFO width, copies that many bytes into `buf`
    /// (clamped to `buf`'s length on the wire side), and clears the RX_DR
    /// event. Returns the pipe and the *reported* width.
    pub fn rx_packet(
        &mut self,
        buf: &mut [u8],
    ) -> Result<Option<Inbound>, RadioError<T::Error, CE::Error>> {
        let status = self.update()?;
        if !status.rx_dr() {
            return Ok(None);
        }
        let mut width_buf = [0u8];
        self.read_buf(commands::R_RX_PL_WID, &mut width_buf)?;
        let width = width_buf[0];
        let take = (width as usize).min(buf.len());
        self.read_buf(commands::R_RX_PAYLOAD, &mut buf[..take])?;
        self.clear_status(mnemonics::MASK_RX_DR)?;
        Ok(Some(Inbound {
            pipe: status.rx_pipe(),
            width,
        }))
    }

    /// Pre-queue `payload` to ride the next automatic acknowledgement sent
    /// from `pipe`.
    pub fn write_ack_payload(
        &mut self,
        pipe: u8,
        payload: &[u8],
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.write_buf(commands::W_ACK_PAYLOAD | (pipe & 7), payload)
    }

    /// Enter active receive mode: CONFIG to PRX, CE high, wait out the RX
    /// settling time.
    pub fn start_listening(&mut self) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.ce_low()?;
        let word = self.config_reg.with_power(true).with_prim_rx(true);
        self.config_reg = word;
        self.write_register(registers::CONFIG, word.into_bits())?;
        self.ce_high()?;
        self.delay_impl.delay_us(130);
        Ok(())
    }
}

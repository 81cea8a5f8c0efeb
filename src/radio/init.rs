use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::transport::ByteTransport;
use crate::types::StatusFlags;

use super::{registers, RadioConfig, RadioError, Rf24};

impl<T, CE, DELAY> Rf24<T, CE, DELAY>
where
    T: ByteTransport,
    CE: OutputPin,
    DELAY: DelayNs,
{
    /// Reset the device and program the full configuration surface.
    ///
    /// The sequence is deterministic and idempotent regardless of prior
    /// register contents:
    ///
    /// 1. CE low and CSN released, so the device cannot engage the air or
    ///    see a half-open frame mid-programming; settle delay.
    /// 2. Power down, clear the RX_DR/TX_DS/MAX_RT events, drain both FIFOs.
    /// 3. Program address width, per-pipe addresses and static widths
    ///    (width programming is skipped entirely when dynamic payloads are
    ///    on), auto-ack mask, feature flags, DYNPD, retry policy, enabled
    ///    pipes, channel, and RF setup.
    ///
    /// The device is left powered down with CE low. Callers follow up with
    /// [`Rf24::power_up()`] and judge the auto-ack read-back themselves.
    pub fn with_config(
        &mut self,
        config: &RadioConfig,
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.ce_low()?;
        self.bus.release().map_err(RadioError::Bus)?;
        // Allow the radio time to settle, else configuration bits will not
        // necessarily stick after a power-on or brown-out.
        self.delay_impl.delay_ms(5);

        self.config_reg = config.config_word();
        self.write_register(registers::CONFIG, self.config_reg.into_bits())?;
        self.clear_status(StatusFlags::IRQ_MASK)?;
        self.flush_tx()?;
        self.flush_rx()?;

        self.write_register(registers::SETUP_AW, config.address_width() - 2)?;
        let width = config.address_width() as usize;
        for pipe in 0..6u8 {
            let addr = config.pipe_address(pipe);
            if pipe < 2 {
                self.write_buf(registers::RX_ADDR_P0 + pipe, &addr[..width])?;
            } else {
                // pipes 2-5 share pipe 1's upper bytes; only the lead byte is stored
                self.write_register(registers::RX_ADDR_P0 + pipe, addr[0])?;
            }
            if !config.dynamic_payloads() {
                self.write_register(registers::RX_PW_P0 + pipe, config.payload_width())?;
            }
        }

        self.write_register(registers::EN_AA, config.auto_ack())?;
        self.write_register(registers::FEATURE, config.feature_bits())?;
        self.write_register(registers::DYNPD, config.dynpd_bits())?;
        self.write_register(registers::SETUP_RETR, config.retry_bits())?;
        self.write_register(registers::EN_RXADDR, config.rx_pipes())?;
        self.write_register(registers::RF_CH, config.channel())?;
        self.write_register(registers::RF_SETUP, config.rf_setup())
    }

    /// Power the device up into its configured role.
    ///
    /// CE stays low: a transmitter idles in standby until the next packet,
    /// and a receiver goes active only via [`Rf24::start_listening()`].
    pub fn power_up(&mut self) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.config_reg = self.config_reg.with_power(true);
        self.write_register(registers::CONFIG, self.config_reg.into_bits())
    }

    /// Read back the auto-ack enable mask for bring-up validation.
    pub fn auto_ack_mask(&mut self) -> Result<u8, RadioError<T::Error, CE::Error>> {
        self.read_register(registers::EN_AA)
    }
}

use crate::radio::bit_fields::{Config, SetupRetry};
use crate::types::{DataRate, LinkRole, PaLevel};

/// The six RX pipe addresses of one transceiver.
///
/// Pipes 0 and 1 each store a full 5-byte address. Pipes 2-5 store one
/// distinguishing lead byte and borrow pipe 1's upper bytes, which is how the
/// hardware composes their on-air addresses.
#[derive(Debug, Clone, Copy)]
pub struct PipeAddresses {
    pipe0: [u8; 5],
    pipe1: [u8; 5],
    lead: [u8; 4],
}

impl Default for PipeAddresses {
    fn default() -> Self {
        Self {
            pipe0: *b"0ROOT",
            pipe1: *b"1NODE",
            lead: [b'2', b'3', b'4', b'5'],
        }
    }
}

impl PipeAddresses {
    /// The full 5-byte address a packet must target to land on `pipe`.
    pub fn address(&self, pipe: u8) -> [u8; 5] {
        match pipe {
            0 => self.pipe0,
            1 => self.pipe1,
            2..=5 => {
                let mut addr = self.pipe1;
                addr[0] = self.lead[pipe as usize - 2];
                addr
            }
            _ => self.pipe0,
        }
    }

    fn set(&mut self, pipe: u8, address: &[u8; 5]) {
        match pipe {
            0 => self.pipe0 = *address,
            1 => self.pipe1 = *address,
            2..=5 => self.lead[pipe as usize - 2] = address[0],
            _ => (),
        }
    }
}

/// Everything programmed into a transceiver at bring-up.
///
/// Fixed at build time and consumed once per bring-up; re-running bring-up
/// re-asserts the same values verbatim. Follows a builder pattern:
///
/// ```
/// use rf24_link::radio::RadioConfig;
/// let config = RadioConfig::ptx().with_channel(42);
/// ```
///
/// [`RadioConfig::ptx()`] and [`RadioConfig::prx()`] carry the stock
/// transmitter/receiver values: channel 112, 2 Mbps, max PA, 5-byte
/// addresses, auto-ack on all pipes with ACK payloads, one hardware retry
/// at the minimum delay.
#[derive(Debug, Clone, Copy)]
pub struct RadioConfig {
    role: LinkRole,
    channel: u8,
    data_rate: DataRate,
    pa_level: PaLevel,
    lna_enable: bool,
    address_width: u8,
    auto_retries: SetupRetry,
    auto_ack: u8,
    rx_pipes: u8,
    dynamic_payloads: bool,
    ack_payloads: bool,
    irq_ready: bool,
    payload_width: u8,
    pipes: PipeAddresses,
}

impl RadioConfig {
    fn with_role(role: LinkRole, rx_pipes: u8) -> Self {
        Self {
            role,
            channel: 112,
            data_rate: DataRate::Mbps2,
            pa_level: PaLevel::Max,
            lna_enable: true,
            address_width: 5,
            auto_retries: SetupRetry::new(),
            auto_ack: 0x3F,
            rx_pipes,
            dynamic_payloads: true,
            ack_payloads: true,
            irq_ready: false,
            payload_width: 2,
            pipes: PipeAddresses::default(),
        }
    }

    /// Stock configuration for the transmitter role.
    ///
    /// Only pipe 0 is enabled for reception, where the hardware delivers
    /// automatic acknowledgements.
    pub fn ptx() -> Self {
        Self::with_role(LinkRole::Transmitter, 0x01)
    }

    /// Stock configuration for the receiver role, listening on all six pipes.
    pub fn prx() -> Self {
        Self::with_role(LinkRole::Receiver, 0x3F)
    }

    /// Returns the role fixed by the constructor.
    pub const fn role(&self) -> LinkRole {
        self.role
    }

    /// Returns the value set by [`RadioConfig::with_channel()`].
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Set the RF channel. Clamped to [0, 125]; frequency is 2400 + channel MHz.
    pub fn with_channel(self, value: u8) -> Self {
        Self {
            channel: if value > 125 { 125 } else { value },
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_data_rate()`].
    pub const fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    /// Set the over-the-air data rate.
    pub fn with_data_rate(self, data_rate: DataRate) -> Self {
        Self { data_rate, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_pa_level()`].
    pub const fn pa_level(&self) -> PaLevel {
        self.pa_level
    }

    /// Set the power amplifier level.
    pub fn with_pa_level(self, level: PaLevel) -> Self {
        Self {
            pa_level: level,
            ..self
        }
    }

    /// Enable or disable the low-noise amplifier bit in RF_SETUP.
    pub fn with_lna_enable(self, enable: bool) -> Self {
        Self {
            lna_enable: enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_address_width()`].
    pub const fn address_width(&self) -> u8 {
        self.address_width
    }

    /// Set the address width for the whole device. Clamped to [3, 5].
    pub fn with_address_width(self, value: u8) -> Self {
        Self {
            address_width: value.clamp(3, 5),
            ..self
        }
    }

    /// The auto-retry delay (250 us units above 250 us) and attempt count.
    pub fn with_auto_retries(self, delay: u8, count: u8) -> Self {
        Self {
            auto_retries: SetupRetry::new()
                .with_ard(delay.min(15))
                .with_arc(count.min(15)),
            ..self
        }
    }

    /// Returns the mask set by [`RadioConfig::with_auto_ack()`].
    pub const fn auto_ack(&self) -> u8 {
        self.auto_ack
    }

    /// Per-pipe auto-acknowledgement enable mask (bit n = pipe n).
    ///
    /// When any pipe uses the feature, pipe 0 should too: automatic ACK
    /// packets always come back on pipe 0.
    pub fn with_auto_ack(self, mask: u8) -> Self {
        Self {
            auto_ack: mask & 0x3F,
            ..self
        }
    }

    /// Returns the mask set by [`RadioConfig::with_rx_pipes()`].
    pub const fn rx_pipes(&self) -> u8 {
        self.rx_pipes
    }

    /// Per-pipe reception enable mask (bit n = pipe n).
    pub fn with_rx_pipes(self, mask: u8) -> Self {
        Self {
            rx_pipes: mask & 0x3F,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_dynamic_payloads()`].
    pub const fn dynamic_payloads(&self) -> bool {
        self.dynamic_payloads
    }

    /// Enable or disable dynamically sized payloads.
    ///
    /// Disabling them also disables ACK payloads, which cannot work without
    /// the feature.
    pub fn with_dynamic_payloads(self, enable: bool) -> Self {
        Self {
            dynamic_payloads: enable,
            ack_payloads: self.ack_payloads && enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_ack_payloads()`].
    pub const fn ack_payloads(&self) -> bool {
        self.ack_payloads
    }

    /// Enable or disable data riding on automatic acknowledgements.
    ///
    /// Enabling this also enables dynamic payloads, which the feature
    /// requires.
    pub fn with_ack_payloads(self, enable: bool) -> Self {
        Self {
            ack_payloads: enable,
            dynamic_payloads: self.dynamic_payloads || enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_irq_ready()`].
    pub const fn irq_ready(&self) -> bool {
        self.irq_ready
    }

    /// Route the RX_DR event to the IRQ pin (for [`ReadyFlag`] driven
    /// operation) instead of leaving all events masked for polling.
    ///
    /// [`ReadyFlag`]: crate::irq::ReadyFlag
    pub fn with_irq_ready(self, enable: bool) -> Self {
        Self {
            irq_ready: enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_payload_width()`].
    pub const fn payload_width(&self) -> u8 {
        self.payload_width
    }

    /// The fixed packet width in bytes, clamped to [1, 32].
    ///
    /// Programmed as the static width of every pipe when dynamic payloads
    /// are off; always the width the link controllers construct and expect.
    pub fn with_payload_width(self, value: u8) -> Self {
        Self {
            payload_width: value.clamp(1, 32),
            ..self
        }
    }

    /// The full address for a given pipe (see [`PipeAddresses::address()`]).
    pub fn pipe_address(&self, pipe: u8) -> [u8; 5] {
        self.pipes.address(pipe)
    }

    /// Set the address of one RX pipe. Pipes 2-5 keep only the lead byte.
    pub fn with_rx_address(self, pipe: u8, address: &[u8; 5]) -> Self {
        let mut pipes = self.pipes;
        pipes.set(pipe, address);
        Self { pipes, ..self }
    }

    /// The CONFIG image for this configuration, powered down.
    pub(crate) fn config_word(&self) -> Config {
        Config::new()
            .with_mask_rx_dr(!self.irq_ready)
            .with_prim_rx(matches!(self.role, LinkRole::Receiver))
    }

    /// The RF_SETUP register value: data rate, PA level, LNA.
    pub(crate) fn rf_setup(&self) -> u8 {
        self.data_rate.into_bits() | self.pa_level.into_bits() | self.lna_enable as u8
    }

    /// The FEATURE register value.
    pub(crate) fn feature_bits(&self) -> u8 {
        (self.dynamic_payloads as u8) << 2 | (self.ack_payloads as u8) << 1
    }

    /// The DYNPD register value: all pipes or none.
    pub(crate) fn dynpd_bits(&self) -> u8 {
        0x3F * self.dynamic_payloads as u8
    }

    /// The SETUP_RETR register value.
    pub(crate) fn retry_bits(&self) -> u8 {
        self.auto_retries.into_bits()
    }
}

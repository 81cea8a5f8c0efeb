use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::diag::Diagnostics;
use crate::irq::ReadyFlag;
use crate::radio::{mnemonics, RadioError, Rf24};
use crate::timer::{TimerService, TimerSlot};
use crate::transport::ByteTransport;
use crate::types::FaultCode;

use super::{rate::RateEstimator, LinkConfig};

/// Runtime state of the transmitter link.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    /// Construct and launch the next packet.
    Send,
    /// A transmission is in flight; poll for its outcome.
    Await,
    /// Harvest the ACK payload (if any) and close out the cycle.
    Collect,
}

/// The transmitter-role (PTX) link controller.
///
/// Owns one transceiver outright. Each [`TxLink::step()`] advances the
/// `Send -> Await -> Collect` machine by at most one transition; the main
/// loop interleaves it with the receiver link's steps.
pub struct TxLink<'a, T, CE, DELAY> {
    radio: Rf24<T, CE, DELAY>,
    cfg: LinkConfig,
    timers: &'a TimerService,
    ready: Option<&'a ReadyFlag>,
    state: TxState,
    template: [u8; 32],
    seq: u8,
    pipe_index: u8,
    retry_drops: u8,
    wedge_resets: u8,
    rate: RateEstimator,
}

impl<'a, T, CE, DELAY> TxLink<'a, T, CE, DELAY>
where
    T: ByteTransport,
    CE: OutputPin,
    DELAY: DelayNs,
{
    /// Assemble the link around its radio.
    ///
    /// `message` seeds the packet body following the sequence byte (truncated
    /// to fit). `ready` is the latch fed by this radio's IRQ line, or `None`
    /// when the status register is polled instead.
    pub fn new(
        radio: Rf24<T, CE, DELAY>,
        cfg: LinkConfig,
        timers: &'a TimerService,
        ready: Option<&'a ReadyFlag>,
        message: &[u8],
    ) -> Self {
        let mut template = [0u8; 32];
        let body = message.len().min(31);
        template[1..1 + body].copy_from_slice(&message[..body]);
        Self {
            radio,
            cfg,
            timers,
            ready,
            state: TxState::Send,
            template,
            seq: 0,
            pipe_index: 0,
            retry_drops: 0,
            wedge_resets: 0,
            rate: RateEstimator::new(),
        }
    }

    /// Reset and reprogram the transceiver, then validate the auto-ack mask.
    ///
    /// A read-back mismatch means the module is mis-wired or absent; that is
    /// fatal and reported, never retried. Runs once at startup and again
    /// whenever the keep-alive declares the link wedged.
    pub fn bring_up(
        &mut self,
        diag: &mut impl Diagnostics,
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.radio.with_config(&self.cfg.radio)?;
        self.radio.power_up()?;
        if self.radio.auto_ack_mask()? != self.cfg.radio.auto_ack() {
            diag.fatal(FaultCode::TxConfigVerify);
        }
        self.state = TxState::Send;
        Ok(())
    }

    /// Advance the state machine by one transition.
    pub fn step(
        &mut self,
        diag: &mut impl Diagnostics,
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.state = match self.state {
            TxState::Send => self.send()?,
            TxState::Await => self.await_outcome(diag)?,
            TxState::Collect => self.collect(diag)?,
        };
        Ok(())
    }

    fn send(&mut self) -> Result<TxState, RadioError<T::Error, CE::Error>> {
        if self.radio.update()?.rx_dr() {
            // an ACK payload from the previous cycle is still waiting
            return Ok(TxState::Collect);
        }

        let width = self.cfg.radio.payload_width() as usize;
        let mut packet = self.template;
        self.seq = self.seq.wrapping_add(1);
        packet[0] = self.seq;

        self.radio
            .clear_status(mnemonics::MASK_TX_DS | mnemonics::MASK_MAX_RT)?;

        let pipe = if self.cfg.round_robin {
            let pipe = self.pipe_index;
            self.pipe_index = (self.pipe_index + 1) % self.cfg.tx_pipes.clamp(1, 6);
            pipe
        } else {
            self.cfg.target_pipe
        };
        let addr = self.cfg.radio.pipe_address(pipe);
        let addr_width = self.cfg.radio.address_width() as usize;
        let auto_ack = self.cfg.radio.auto_ack() != 0;
        self.radio
            .tx_packet(&addr[..addr_width], &packet[..width], auto_ack)?;

        self.timers.reset(TimerSlot::TxKeepAlive);
        Ok(TxState::Await)
    }

    fn await_outcome(
        &mut self,
        diag: &mut impl Diagnostics,
    ) -> Result<TxState, RadioError<T::Error, CE::Error>> {
        let status = self.radio.update()?;
        if status.tx_ds() {
            self.radio.clear_status(mnemonics::MASK_TX_DS)?;
            Ok(TxState::Collect)
        } else if status.tx_df() {
            // the device's own retry budget is spent; drop the packet
            self.retry_drops = self.retry_drops.saturating_add(1);
            self.radio.flush_tx()?;
            self.radio.clear_status(mnemonics::MASK_MAX_RT)?;
            Ok(TxState::Send)
        } else if self.timers.elapsed(TimerSlot::TxKeepAlive) >= self.cfg.keep_alive {
            self.wedge_resets = self.wedge_resets.saturating_add(1);
            self.bring_up(diag)?;
            Ok(TxState::Send)
        } else {
            Ok(TxState::Await)
        }
    }

    fn collect(
        &mut self,
        diag: &mut impl Diagnostics,
    ) -> Result<TxState, RadioError<T::Error, CE::Error>> {
        if self.cfg.radio.auto_ack() != 0 {
            let gated_off = self.ready.is_some_and(|flag| !flag.take());
            if !gated_off {
                let mut buf = [0u8; 32];
                if let Some(inbound) = self.radio.rx_packet(&mut buf)? {
                    if inbound.width != self.cfg.ack_width {
                        diag.fatal(FaultCode::AckPayloadWidth);
                    }
                    // automatic acknowledgements only ever arrive on pipe 0
                    if inbound.pipe != 0 {
                        diag.fatal(FaultCode::AckPayloadPipe);
                    }
                }
            }
        }

        self.rate.record();
        if self.timers.elapsed(TimerSlot::TxRateWindow) >= self.cfg.rate_window {
            let rate = self.rate.roll_window();
            diag.progress(rate);
            self.timers.reset(TimerSlot::TxRateWindow);
        }
        Ok(TxState::Send)
    }

    /// The machine's current state.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Sends completed per second, as of the last window rollover.
    pub fn rate(&self) -> u8 {
        self.rate.rate()
    }

    /// Packets dropped after the hardware exhausted its retries (saturating).
    pub fn retry_drops(&self) -> u8 {
        self.retry_drops
    }

    /// Times the keep-alive declared this link wedged (saturating).
    pub fn wedge_resets(&self) -> u8 {
        self.wedge_resets
    }
}

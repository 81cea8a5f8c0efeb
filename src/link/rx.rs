use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::diag::Diagnostics;
use crate::irq::ReadyFlag;
use crate::radio::{RadioError, Rf24};
use crate::timer::{TimerService, TimerSlot};
use crate::transport::ByteTransport;
use crate::types::FaultCode;

use super::{rate::RateEstimator, LinkConfig, ACK_COUNTER_INDEX};

/// Runtime state of the receiver link.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Re-arm the keep-alive before the next listen cycle.
    Arm,
    /// Watch for inbound packets.
    Listen,
}

/// The receiver-role (PRX) link controller.
///
/// Owns one transceiver outright and runs the `Arm -> Listen` machine. Each
/// received packet is width-checked and counted into the rate window; when
/// ACK payloads are on and the TX FIFO has room, it is answered by queueing the
/// next ACK payload for the pipe it arrived on.
pub struct RxLink<'a, T, CE, DELAY> {
    radio: Rf24<T, CE, DELAY>,
    cfg: LinkConfig,
    timers: &'a TimerService,
    ready: Option<&'a ReadyFlag>,
    state: RxState,
    ack_template: [u8; 32],
    ack_seq: u8,
    last: [u8; 32],
    received: bool,
    timeouts: u8,
    rate: RateEstimator,
}

impl<'a, T, CE, DELAY> RxLink<'a, T, CE, DELAY>
where
    T: ByteTransport,
    CE: OutputPin,
    DELAY: DelayNs,
{
    /// Assemble the link around its radio.
    ///
    /// `ack_seed` fills the ACK payload template (truncated to fit); the byte
    /// at index 1 is replaced by a wrapping counter on every queue. `ready`
    /// is the latch fed by this radio's IRQ line, or `None` when polling.
    pub fn new(
        radio: Rf24<T, CE, DELAY>,
        cfg: LinkConfig,
        timers: &'a TimerService,
        ready: Option<&'a ReadyFlag>,
        ack_seed: &[u8],
    ) -> Self {
        let mut ack_template = [0u8; 32];
        let len = ack_seed.len().min(32);
        ack_template[..len].copy_from_slice(&ack_seed[..len]);
        Self {
            radio,
            cfg,
            timers,
            ready,
            state: RxState::Arm,
            ack_template,
            ack_seq: 0,
            last: [0u8; 32],
            received: false,
            timeouts: 0,
            rate: RateEstimator::new(),
        }
    }

    /// Reset and reprogram the transceiver, preload ACK payloads, validate
    /// the auto-ack mask, and go active in listen mode.
    ///
    /// The ACK preload happens before power-up so the very first inbound
    /// packet can carry a reply. A read-back mismatch is fatal and reported,
    /// never retried. Runs at startup and again on keep-alive recovery.
    pub fn bring_up(
        &mut self,
        diag: &mut impl Diagnostics,
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.radio.with_config(&self.cfg.radio)?;
        self.preload_ack()?;
        self.radio.power_up()?;
        if self.radio.auto_ack_mask()? != self.cfg.radio.auto_ack() {
            diag.fatal(FaultCode::RxConfigVerify);
        }
        self.radio.start_listening()?;
        self.state = RxState::Arm;
        Ok(())
    }

    /// Advance the state machine by one transition.
    pub fn step(
        &mut self,
        diag: &mut impl Diagnostics,
    ) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.state = match self.state {
            RxState::Arm => self.arm(),
            RxState::Listen => self.listen(diag)?,
        };
        Ok(())
    }

    fn arm(&mut self) -> RxState {
        self.timers.reset(TimerSlot::RxKeepAlive);
        RxState::Listen
    }

    fn listen(
        &mut self,
        diag: &mut impl Diagnostics,
    ) -> Result<RxState, RadioError<T::Error, CE::Error>> {
        let fifo = self.radio.fifo_status()?;
        let gated_off = self.ready.is_some_and(|flag| !flag.take());
        let inbound = if gated_off {
            None
        } else {
            self.radio.rx_packet(&mut self.last)?
        };

        if let Some(inbound) = inbound {
            if inbound.width != self.cfg.radio.payload_width() {
                diag.fatal(FaultCode::RxPayloadWidth);
            }
            self.received = true;
            if self.cfg.radio.ack_payloads() && !self.radio.update()?.tx_full() {
                // the previous ACK payload drained; stage the next reply
                self.queue_ack(inbound.pipe)?;
            }
            self.rate.record();
            if self.timers.elapsed(TimerSlot::RxRateWindow) >= self.cfg.rate_window {
                let rate = self.rate.roll_window();
                diag.progress(rate);
                self.timers.reset(TimerSlot::RxRateWindow);
            }
            Ok(RxState::Arm)
        } else if self.cfg.radio.auto_ack() != 0 && fifo.tx_empty() {
            // an ACK payload went out with nothing new behind it
            Ok(RxState::Arm)
        } else if self.timers.elapsed(TimerSlot::RxKeepAlive) >= self.cfg.keep_alive {
            self.timeouts = self.timeouts.saturating_add(1);
            if fifo.rx_empty() {
                // nothing unread is at stake, safe to reset the device
                self.bring_up(diag)?;
            }
            Ok(RxState::Arm)
        } else {
            Ok(RxState::Listen)
        }
    }

    /// Stage ACK payloads so the first packets after bring-up get replies:
    /// one slot per targeted pipe under round-robin (the TX FIFO holds
    /// three), else one for the fixed target pipe.
    fn preload_ack(&mut self) -> Result<(), RadioError<T::Error, CE::Error>> {
        if !self.cfg.radio.ack_payloads() {
            return Ok(());
        }
        if self.cfg.round_robin {
            for pipe in [0u8, 2, 4] {
                self.queue_ack(pipe)?;
            }
        } else {
            self.queue_ack(self.cfg.target_pipe)?;
        }
        Ok(())
    }

    fn queue_ack(&mut self, pipe: u8) -> Result<(), RadioError<T::Error, CE::Error>> {
        self.ack_seq = self.ack_seq.wrapping_add(1);
        let width = (self.cfg.ack_width as usize).clamp(1, 32);
        let mut payload = self.ack_template;
        if width > ACK_COUNTER_INDEX {
            payload[ACK_COUNTER_INDEX] = self.ack_seq;
        }
        self.radio.write_ack_payload(pipe, &payload[..width])
    }

    /// The machine's current state.
    pub fn state(&self) -> RxState {
        self.state
    }

    /// The most recently received packet.
    pub fn last_packet(&self) -> &[u8] {
        &self.last[..self.cfg.radio.payload_width() as usize]
    }

    /// Whether any packet has arrived since construction.
    pub fn has_received(&self) -> bool {
        self.received
    }

    /// Receives completed per second, as of the last window rollover.
    pub fn rate(&self) -> u8 {
        self.rate.rate()
    }

    /// Times the keep-alive expired without progress (saturating).
    pub fn timeouts(&self) -> u8 {
        self.timeouts
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::{RxLink, RxState};
    use crate::irq::ReadyFlag;
    use crate::link::LinkConfig;
    use crate::radio::Rf24;
    use crate::sim::{SimBus, SimPin};
    use crate::test::PanicDiag;
    use crate::timer::TimerService;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn mk_link<'a>(
        bus: &SimBus,
        timers: &'a TimerService,
        ready: Option<&'a ReadyFlag>,
        cfg: LinkConfig,
    ) -> RxLink<'a, SimBus, SimPin, NoopDelay> {
        let radio = Rf24::new(bus.clone(), SimPin::new(), NoopDelay);
        let mut link = RxLink::new(radio, cfg, timers, ready, b"AX");
        link.bring_up(&mut PanicDiag::default()).unwrap();
        link
    }

    fn single_pipe() -> LinkConfig {
        let mut cfg = LinkConfig::prx();
        cfg.round_robin = false;
        cfg.target_pipe = 5;
        cfg
    }

    #[test]
    fn bring_up_preloads_acks_and_listens() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let link = mk_link(&bus, &timers, None, LinkConfig::prx());
        assert_eq!(link.state(), RxState::Arm);
        bus.with(|state| {
            // one slot per targeted pipe, counters 1..=3 at index 1
            assert_eq!(state.ack_log.len(), 3);
            assert_eq!(state.ack_log[0].0, 0);
            assert_eq!(state.ack_log[1].0, 2);
            assert_eq!(state.ack_log[2].0, 4);
            assert_eq!(state.ack_log[0].1, [b'A', 1, 0, 0, 0]);
            assert_eq!(state.ack_log[2].1, [b'A', 3, 0, 0, 0]);
            assert_eq!(state.tx_fifo, 3);
        });
    }

    #[test]
    fn bring_up_single_slot_without_round_robin() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        mk_link(&bus, &timers, None, single_pipe());
        bus.with(|state| {
            assert_eq!(state.ack_log.len(), 1);
            assert_eq!(state.ack_log[0].0, 5);
        });
    }

    #[test]
    #[should_panic(expected = "fatal fault code 2")]
    fn bring_up_read_back_mismatch_is_fatal() {
        let bus = SimBus::new();
        bus.with(|state| state.drop_en_aa_writes = true);
        let timers = TimerService::new();
        mk_link(&bus, &timers, None, LinkConfig::prx());
    }

    #[test]
    fn receives_and_requeues_ack_when_fifo_has_room() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let mut link = mk_link(&bus, &timers, None, single_pipe());
        let mut diag = PanicDiag::default();
        link.step(&mut diag).unwrap();
        assert_eq!(link.state(), RxState::Listen);

        // the preloaded ACK drained with the reply
        bus.with(|state| state.tx_fifo = 0);
        bus.push_rx(5, &[9, b'T']);
        link.step(&mut diag).unwrap();
        assert_eq!(link.state(), RxState::Arm);
        assert!(link.has_received());
        assert_eq!(link.last_packet(), &[9, b'T']);
        bus.with(|state| {
            assert_eq!(state.ack_log.len(), 2);
            // requeued for the pipe that just received
            assert_eq!(state.ack_log[1].0, 5);
            assert_eq!(state.ack_log[1].1, [b'A', 2, 0, 0, 0]);
        });
    }

    #[test]
    fn no_ack_requeue_while_tx_fifo_full() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let mut link = mk_link(&bus, &timers, None, single_pipe());
        let mut diag = PanicDiag::default();
        link.step(&mut diag).unwrap();

        bus.with(|state| state.force_tx_full = true);
        bus.push_rx(5, &[1, 2]);
        link.step(&mut diag).unwrap();
        assert_eq!(link.state(), RxState::Arm);
        // received, but nothing staged this cycle
        assert!(link.has_received());
        assert_eq!(bus.with(|state| state.ack_log.len()), 1);
    }

    #[test]
    #[should_panic(expected = "fatal fault code 12")]
    fn inbound_width_mismatch_is_fatal() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let mut link = mk_link(&bus, &timers, None, single_pipe());
        let mut diag = PanicDiag::default();
        link.step(&mut diag).unwrap();
        // 3 bytes against the configured 2-byte payload width
        bus.push_rx(5, &[1, 2, 3]);
        link.step(&mut diag).unwrap();
    }

    #[test]
    fn rearms_when_ack_payload_drains() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let mut link = mk_link(&bus, &timers, None, single_pipe());
        let mut diag = PanicDiag::default();
        link.step(&mut diag).unwrap();
        assert_eq!(link.state(), RxState::Listen);
        // nothing inbound, but the TX FIFO drained: cycle back to Arm
        bus.with(|state| state.tx_fifo = 0);
        link.step(&mut diag).unwrap();
        assert_eq!(link.state(), RxState::Arm);
        assert_eq!(link.timeouts(), 0);
    }

    #[test]
    fn timeout_with_empty_rx_fifo_reruns_bring_up() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let mut link = mk_link(&bus, &timers, None, single_pipe());
        let mut diag = PanicDiag::default();
        link.step(&mut diag).unwrap();
        assert_eq!(bus.with(|state| state.flush_rx_count), 1);
        for _ in 0..single_pipe().keep_alive {
            timers.tick();
        }
        link.step(&mut diag).unwrap();
        assert_eq!(link.state(), RxState::Arm);
        assert_eq!(link.timeouts(), 1);
        bus.with(|state| {
            // bring-up ran again and went back to listening
            assert_eq!(state.flush_rx_count, 2);
            assert_eq!(state.ack_log.len(), 2);
        });
    }

    #[test]
    fn timeout_never_resets_over_unread_data() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let ready = ReadyFlag::new();
        let mut cfg = single_pipe();
        cfg.radio = cfg.radio.with_irq_ready(true);
        let mut link = mk_link(&bus, &timers, Some(&ready), cfg);
        let mut diag = PanicDiag::default();
        link.step(&mut diag).unwrap();

        // data queued but the ready latch never fired; keep-alive expires
        bus.push_rx(5, &[3, 4]);
        for _ in 0..cfg.keep_alive {
            timers.tick();
        }
        link.step(&mut diag).unwrap();
        assert_eq!(link.state(), RxState::Arm);
        assert_eq!(link.timeouts(), 1);
        // no re-init while unread data remains queued
        assert_eq!(bus.with(|state| state.flush_rx_count), 1);
        assert_eq!(bus.with(|state| state.rx_fifo.len()), 1);
    }

    #[test]
    fn ready_latch_gates_the_read_attempt() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let ready = ReadyFlag::new();
        let mut cfg = single_pipe();
        cfg.radio = cfg.radio.with_irq_ready(true);
        let mut link = mk_link(&bus, &timers, Some(&ready), cfg);
        let mut diag = PanicDiag::default();
        link.step(&mut diag).unwrap();

        bus.push_rx(5, &[7, 8]);
        link.step(&mut diag).unwrap();
        // latch down: the payload stays queued
        assert!(!link.has_received());
        assert_eq!(link.state(), RxState::Listen);

        ready.raise();
        link.step(&mut diag).unwrap();
        assert!(link.has_received());
        assert_eq!(link.last_packet(), &[7, 8]);
        assert_eq!(link.state(), RxState::Arm);
    }

    #[test]
    fn rate_published_on_window_rollover() {
        let bus = SimBus::new();
        let timers = TimerService::new();
        let mut link = mk_link(&bus, &timers, None, single_pipe());
        let mut diag = PanicDiag::default();
        for n in 0..300u16 {
            link.step(&mut diag).unwrap(); // Arm
            bus.push_rx(5, &[n as u8, 0]);
            link.step(&mut diag).unwrap(); // Listen -> Arm
        }
        assert_eq!(link.rate(), 0);
        for _ in 0..single_pipe().rate_window {
            timers.tick();
        }
        link.step(&mut diag).unwrap();
        bus.push_rx(5, &[0, 0]);
        link.step(&mut diag).unwrap();
        // 301 completions clamp to a one-byte rate
        assert_eq!(link.rate(), 255);
        assert_eq!(diag.shown, [255]);
    }
}

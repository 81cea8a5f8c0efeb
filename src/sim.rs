//! A register-level nRF24L01 model for exercising everything above the
//! transport without hardware.
//!
//! [`SimBus`] implements [`ByteTransport`] over a modelled register file and
//! FIFO pair. Handles are clones sharing one state, so a test keeps one while
//! the driver owns another, the same shape the `embedded-hal-mock` doubles
//! use. Tests poke latched events (`tx_ds`, `max_rt`), queue inbound
//! payloads, and inspect the write history.

extern crate std;

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::OutputPin;

use crate::radio::{commands, registers};
use crate::transport::ByteTransport;

/// An infallible CE/CSN stand-in recording every level written.
#[derive(Clone, Default)]
pub struct SimPin {
    levels: Rc<RefCell<Vec<bool>>>,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every level ever driven, oldest first.
    pub fn history(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }

    /// The current level (low before anything was driven).
    pub fn level(&self) -> bool {
        self.levels.borrow().last().copied().unwrap_or(false)
    }
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

/// The modelled device state behind a [`SimBus`].
#[derive(Default)]
pub struct SimState {
    pub regs: [u8; 0x20],
    pub rx_addr: [[u8; 5]; 6],
    pub tx_addr: [u8; 5],
    /// Inbound payloads as `(pipe, bytes)`, head first.
    pub rx_fifo: VecDeque<(u8, Vec<u8>)>,
    /// Payloads queued for transmission (TX and ACK slots alike).
    pub tx_fifo: usize,
    /// Latched "data sent" event; tests set it to complete a transmission.
    pub tx_ds: bool,
    /// Latched "retries exhausted" event.
    pub max_rt: bool,
    /// Report the TX FIFO full regardless of occupancy.
    pub force_tx_full: bool,
    /// Swallow EN_AA writes, emulating a mis-wired module.
    pub drop_en_aa_writes: bool,
    /// Every transmitted payload with the TX address at launch time.
    pub tx_log: Vec<([u8; 5], Vec<u8>)>,
    /// Every queued ACK payload as `(pipe, bytes)`.
    pub ack_log: Vec<(u8, Vec<u8>)>,
    pub flush_tx_count: usize,
    pub flush_rx_count: usize,
    /// Every value written to CONFIG, in order.
    pub config_writes: Vec<u8>,
    selected: bool,
    frame: Vec<u8>,
    reply: VecDeque<u8>,
}

impl SimState {
    fn tx_full(&self) -> bool {
        self.force_tx_full || self.tx_fifo >= 3
    }

    fn status_byte(&self) -> u8 {
        let pipe = self.rx_fifo.front().map(|(pipe, _)| *pipe).unwrap_or(7);
        (!self.rx_fifo.is_empty() as u8) << 6
            | (self.tx_ds as u8) << 5
            | (self.max_rt as u8) << 4
            | (pipe & 7) << 1
            | self.tx_full() as u8
    }

    fn fifo_byte(&self) -> u8 {
        (self.tx_full() as u8) << 5
            | ((self.tx_fifo == 0 && !self.force_tx_full) as u8) << 4
            | ((self.rx_fifo.len() >= 3) as u8) << 1
            | self.rx_fifo.is_empty() as u8
    }

    fn read_register(&self, addr: u8) -> u8 {
        match addr {
            registers::STATUS => self.status_byte(),
            registers::FIFO_STATUS => self.fifo_byte(),
            _ => self.regs[addr as usize & 0x1F],
        }
    }

    fn begin_frame(&mut self, cmd: u8) {
        self.reply.clear();
        match cmd {
            commands::R_RX_PL_WID => {
                let width = self.rx_fifo.front().map(|(_, p)| p.len()).unwrap_or(0);
                self.reply.push_back(width as u8);
            }
            commands::R_RX_PAYLOAD => {
                if let Some((_, payload)) = self.rx_fifo.front() {
                    self.reply.extend(payload.iter().copied());
                }
            }
            cmd if cmd & 0xE0 == 0 => {
                self.reply.push_back(self.read_register(cmd & 0x1F));
            }
            _ => (),
        }
    }

    fn end_frame(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        let Some((&cmd, operands)) = frame.split_first() else {
            return;
        };
        match cmd {
            commands::W_TX_PAYLOAD => {
                self.tx_log.push((self.tx_addr, operands.to_vec()));
                self.tx_fifo = (self.tx_fifo + 1).min(3);
            }
            commands::FLUSH_TX => {
                self.tx_fifo = 0;
                self.flush_tx_count += 1;
            }
            commands::FLUSH_RX => {
                self.rx_fifo.clear();
                self.flush_rx_count += 1;
            }
            commands::R_RX_PAYLOAD => {
                self.rx_fifo.pop_front();
            }
            cmd if cmd & 0xF8 == commands::W_ACK_PAYLOAD => {
                self.ack_log.push((cmd & 7, operands.to_vec()));
                self.tx_fifo = (self.tx_fifo + 1).min(3);
            }
            cmd if cmd & 0xE0 == commands::W_REGISTER => {
                self.write_register(cmd & 0x1F, operands);
            }
            _ => (),
        }
    }

    fn write_register(&mut self, addr: u8, operands: &[u8]) {
        let Some(&value) = operands.first() else {
            return;
        };
        match addr {
            registers::STATUS => {
                if value & 0x20 != 0 {
                    self.tx_ds = false;
                }
                if value & 0x10 != 0 {
                    self.max_rt = false;
                }
            }
            registers::TX_ADDR => {
                self.tx_addr[..operands.len().min(5)]
                    .copy_from_slice(&operands[..operands.len().min(5)]);
            }
            addr if (registers::RX_ADDR_P0..registers::RX_ADDR_P0 + 6).contains(&addr) => {
                let pipe = (addr - registers::RX_ADDR_P0) as usize;
                let len = operands.len().min(5);
                self.rx_addr[pipe][..len].copy_from_slice(&operands[..len]);
            }
            registers::EN_AA if self.drop_en_aa_writes => (),
            _ => {
                if addr == registers::CONFIG {
                    self.config_writes.push(value);
                }
                self.regs[addr as usize & 0x1F] = value;
            }
        }
    }
}

/// A cloneable [`ByteTransport`] handle onto a [`SimState`].
#[derive(Clone, Default)]
pub struct SimBus {
    state: Rc<RefCell<SimState>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect or mutate the modelled device.
    pub fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    /// Queue an inbound payload on `pipe`.
    pub fn push_rx(&self, pipe: u8, payload: &[u8]) {
        self.with(|state| state.rx_fifo.push_back((pipe, payload.to_vec())));
    }

    /// The programmable surface (register file and address set), for
    /// idempotence comparisons.
    pub fn snapshot(&self) -> ([u8; 0x20], [[u8; 5]; 6], [u8; 5]) {
        self.with(|state| (state.regs, state.rx_addr, state.tx_addr))
    }
}

impl ByteTransport for SimBus {
    type Error = Infallible;

    fn select(&mut self) -> Result<(), Infallible> {
        self.with(|state| {
            state.selected = true;
            state.frame.clear();
        });
        Ok(())
    }

    fn deselect(&mut self) -> Result<(), Infallible> {
        self.with(|state| {
            if state.selected {
                state.end_frame();
            }
            state.selected = false;
        });
        Ok(())
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, Infallible> {
        Ok(self.with(|state| {
            if !state.selected {
                return 0;
            }
            if state.frame.is_empty() {
                let status = state.status_byte();
                state.begin_frame(byte);
                state.frame.push(byte);
                status
            } else {
                state.frame.push(byte);
                state.reply.pop_front().unwrap_or(0)
            }
        }))
    }
}

#[cfg(test)]
mod test {
    use super::SimBus;
    use crate::radio::{commands, registers};
    use crate::transport::ByteTransport;

    #[test]
    fn register_round_trip() {
        let mut bus = SimBus::new();
        bus.select().unwrap();
        bus.exchange(registers::RF_CH | commands::W_REGISTER).unwrap();
        bus.exchange(42).unwrap();
        bus.deselect().unwrap();

        bus.select().unwrap();
        let status = bus.exchange(registers::RF_CH).unwrap();
        let value = bus.exchange(commands::NOP).unwrap();
        bus.deselect().unwrap();
        // empty RX FIFO reports pipe 7
        assert_eq!(status, 0x0E);
        assert_eq!(value, 42);
    }

    #[test]
    fn rx_fifo_pops_after_payload_read() {
        let mut bus = SimBus::new();
        bus.push_rx(3, &[0xAA, 0x55]);
        bus.select().unwrap();
        let status = bus.exchange(commands::NOP).unwrap();
        bus.deselect().unwrap();
        assert_eq!(status & 0x40, 0x40);
        assert_eq!(status >> 1 & 7, 3);

        bus.select().unwrap();
        bus.exchange(commands::R_RX_PAYLOAD).unwrap();
        assert_eq!(bus.exchange(0).unwrap(), 0xAA);
        assert_eq!(bus.exchange(0).unwrap(), 0x55);
        bus.deselect().unwrap();

        bus.select().unwrap();
        assert_eq!(bus.exchange(commands::NOP).unwrap() & 0x40, 0);
        bus.deselect().unwrap();
    }
}

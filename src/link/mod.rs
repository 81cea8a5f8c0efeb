//! The per-link packet state machines.
//!
//! One [`TxLink`] and one [`RxLink`] each own a transceiver and run as
//! cooperative state machines: the main loop calls `step()` on the receiver,
//! then the transmitter, forever. A step performs zero or more register
//! transactions, guarded by the keep-alive timers, and returns the next state
//! by value, so every transition is explicit.
//!
//! Fault policy lives here and only here: the transport and register layers
//! report raw outcomes, and each link decides what is fatal
//! (width/pipe violations, bring-up read-back mismatch) versus recoverable
//! (spent hardware retries, keep-alive wedges).

mod rate;
mod rx;
mod tx;

pub use rx::{RxLink, RxState};
pub use tx::{TxLink, TxState};

use crate::radio::RadioConfig;

/// Where the wrapping counter sits inside an ACK payload; byte 0 keeps the
/// template value.
pub(crate) const ACK_COUNTER_INDEX: usize = 1;

/// Link-level knobs layered over the radio configuration.
///
/// Thresholds are in ticks of the board's
/// [`TimerService`](crate::timer::TimerService); with a 1 ms tick the
/// defaults give a 200 ms keep-alive and a one second sampling window.
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig {
    /// The transceiver configuration asserted at every bring-up.
    pub radio: RadioConfig,
    /// Width of ACK payloads, both queued and expected back (1-32).
    pub ack_width: u8,
    /// Ticks without progress before the link is declared wedged.
    pub keep_alive: u32,
    /// Ticks per throughput sampling window.
    pub rate_window: u32,
    /// Cycle transmissions over `tx_pipes` destinations instead of one.
    pub round_robin: bool,
    /// How many destination pipes round-robin cycles through (1-6).
    pub tx_pipes: u8,
    /// The fixed destination (and ACK preload) pipe when round-robin is off.
    pub target_pipe: u8,
}

impl LinkConfig {
    /// Stock transmitter link: round-robin over all six pipes.
    pub fn ptx() -> Self {
        Self {
            radio: RadioConfig::ptx(),
            ack_width: 5,
            keep_alive: 200,
            rate_window: 1000,
            round_robin: true,
            tx_pipes: 6,
            target_pipe: 5,
        }
    }

    /// Stock receiver link.
    pub fn prx() -> Self {
        Self {
            radio: RadioConfig::prx(),
            ..Self::ptx()
        }
    }
}

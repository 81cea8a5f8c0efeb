//! Interrupt-to-main-flow signalling for IRQ-pin driven reception.

use core::cell::Cell;

use critical_section::Mutex;

/// A latched "data ready" signal, one per link.
///
/// The edge interrupt on a radio's IRQ line calls [`ReadyFlag::raise()`]; this
/// is the only write that happens in interrupt context. The link controller
/// polls with [`ReadyFlag::take()`], which consumes the latch. When the flag
/// is not raised, `take` touches nothing, so an interrupt landing between the
/// check and the return cannot be lost.
///
/// ```rust,ignore
/// static RX_READY: ReadyFlag = ReadyFlag::new();
///
/// #[interrupt]
/// fn EXTI4() {
///     RX_READY.raise();
/// }
/// ```
pub struct ReadyFlag {
    raised: Mutex<Cell<bool>>,
}

impl ReadyFlag {
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(Cell::new(false)),
        }
    }

    /// Latch the signal. Call from the IRQ line's interrupt handler.
    pub fn raise(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(true));
    }

    /// Consume the latch, returning whether it was raised.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| self.raised.borrow(cs).replace(false))
    }
}

impl Default for ReadyFlag {
    fn default() -> Self {
        Self::new()
    }
}

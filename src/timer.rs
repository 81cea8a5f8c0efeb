//! The tick-based timer service behind every delay, timeout, keep-alive, and
//! sampling window in the link engine.
//!
//! A board-owned periodic timer interrupt calls [`TimerService::tick()`];
//! that is the only write that happens in interrupt context. Main-flow resets
//! run their read-modify-write inside a critical section so a tick can
//! neither be lost nor doubled.
//!
//! Counters are plain tick counts; thresholds live wherever the comparison
//! happens (see [`LinkConfig`](crate::link::LinkConfig)).

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

/// Number of counters in the bank.
pub const SLOT_COUNT: usize = 5;

/// Named counters in the [`TimerService`] bank.
///
/// Each slot is reset only by its owning controller (or the blocking delay,
/// for [`TimerSlot::System`]) and incremented only by the tick interrupt.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerSlot {
    /// Blocking delays.
    System = 0,
    /// Transmit link keep-alive.
    TxKeepAlive = 1,
    /// Receive link keep-alive.
    RxKeepAlive = 2,
    /// Transmit throughput sampling window.
    TxRateWindow = 3,
    /// Receive throughput sampling window.
    RxRateWindow = 4,
}

/// A bank of independently resettable tick counters.
///
/// Designed to live in a `static` so the timer ISR can reach it:
///
/// ```rust,ignore
/// static TIMERS: TimerService = TimerService::new();
///
/// #[interrupt]
/// fn TIM2() {
///     TIMERS.tick();
/// }
/// ```
pub struct TimerService {
    slots: Mutex<RefCell<[u32; SLOT_COUNT]>>,
}

impl TimerService {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([0; SLOT_COUNT])),
        }
    }

    /// Advance every counter by one tick. Call from the periodic timer ISR.
    pub fn tick(&self) {
        critical_section::with(|cs| {
            for counter in self.slots.borrow_ref_mut(cs).iter_mut() {
                *counter = counter.wrapping_add(1);
            }
        });
    }

    /// Zero one counter.
    pub fn reset(&self, slot: TimerSlot) {
        critical_section::with(|cs| {
            self.slots.borrow_ref_mut(cs)[slot as usize] = 0;
        });
    }

    /// Ticks accumulated in `slot` since its last reset.
    pub fn elapsed(&self, slot: TimerSlot) -> u32 {
        critical_section::with(|cs| self.slots.borrow_ref(cs)[slot as usize])
    }

    /// Busy-wait until `ticks` have elapsed on the [`TimerSlot::System`]
    /// counter.
    pub fn delay(&self, ticks: u32) {
        self.reset(TimerSlot::System);
        while self.elapsed(TimerSlot::System) < ticks {
            core::hint::spin_loop();
        }
    }
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts a [`TimerService`] to [`DelayNs`] so the radio's settle delays ride
/// the same tick source as everything else.
///
/// Delays shorter than one tick round up to one.
pub struct TickDelay<'a> {
    timers: &'a TimerService,
    ns_per_tick: u32,
}

impl<'a> TickDelay<'a> {
    /// `ns_per_tick` is the period of the board's tick interrupt, e.g.
    /// 1_000_000 for a 1 ms tick.
    pub fn new(timers: &'a TimerService, ns_per_tick: u32) -> Self {
        Self {
            timers,
            ns_per_tick,
        }
    }
}

impl DelayNs for TickDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let ticks = ns.div_ceil(self.ns_per_tick).max(1);
        self.timers.delay(ticks);
    }
}

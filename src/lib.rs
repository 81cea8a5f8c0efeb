#![doc = include_str!("../README.md")]
//!
//! ## Layer map
//!
//! - [`transport`]: one byte in, one byte out, chip-select control
//! - [`radio`]: register protocol, packet operations, bring-up
//! - [`link`]: the per-role state machines and their configuration
//! - [`timer`] / [`irq`]: the interrupt-fed tick bank and ready latch
//! - [`diag`]: what the engine needs from the surrounding board support
//!
#![no_std]

pub mod diag;
pub mod irq;
pub mod link;
pub mod radio;
pub mod timer;
pub mod transport;
mod types;

pub use types::{DataRate, FaultCode, FifoStatus, LinkRole, PaLevel, StatusFlags};

#[cfg(test)]
mod sim;

#[cfg(test)]
mod test {
    extern crate std;

    use crate::diag::Diagnostics;
    use crate::types::FaultCode;

    /// A [`Diagnostics`] double for link tests: fatal paths become panics so
    /// `#[should_panic]` can pin the exact code, and published rates are
    /// recorded.
    #[derive(Default)]
    pub struct PanicDiag {
        pub shown: std::vec::Vec<u8>,
    }

    impl Diagnostics for PanicDiag {
        fn fatal(&mut self, code: FaultCode) -> ! {
            panic!("fatal fault code {}", code.code());
        }

        fn progress(&mut self, value: u8) {
            self.shown.push(value);
        }
    }
}

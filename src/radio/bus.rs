use crate::transport::ByteTransport;

use super::commands;

/// The register command protocol, framed on a [`ByteTransport`].
///
/// Every operation is one chip-select bracket: select, exchange the command
/// byte (the device clocks its STATUS register out underneath it), exchange
/// any operand bytes, deselect. The status byte is handed back raw; nothing
/// here retries or interprets: a wrong answer at this layer means a wiring
/// fault or a device that has not been brought up, and that judgment belongs
/// to the caller.
///
/// Operations must not interleave: a second call on the same device before
/// the first returns would corrupt the frame.
pub(crate) struct RegisterBus<T> {
    port: T,
}

impl<T: ByteTransport> RegisterBus<T> {
    pub fn new(port: T) -> Self {
        Self { port }
    }

    /// Run `f` inside one select/deselect bracket.
    ///
    /// Deselect is attempted even when an exchange fails, so a faulted frame
    /// does not leave the device half-selected.
    fn framed<R>(
        &mut self,
        f: impl FnOnce(&mut T) -> Result<R, T::Error>,
    ) -> Result<R, T::Error> {
        self.port.select()?;
        let result = f(&mut self.port);
        let released = self.port.deselect();
        let value = result?;
        released?;
        Ok(value)
    }

    /// Read one register, returning `(value, status)`.
    pub fn read_register(&mut self, reg: u8) -> Result<(u8, u8), T::Error> {
        self.framed(|port| {
            let status = port.exchange(reg)?;
            let value = port.exchange(commands::NOP)?;
            Ok((value, status))
        })
    }

    /// Issue a one-byte command (FLUSH_TX, FLUSH_RX, NOP, ...), returning the
    /// status byte.
    pub fn command(&mut self, cmd: u8) -> Result<u8, T::Error> {
        self.framed(|port| port.exchange(cmd))
    }

    /// Write one register, returning the status byte.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<u8, T::Error> {
        self.framed(|port| {
            let status = port.exchange(reg | commands::W_REGISTER)?;
            port.exchange(value)?;
            Ok(status)
        })
    }

    /// Read `buf.len()` bytes under `cmd` (payloads, addresses), returning the
    /// status byte.
    pub fn read_buf(&mut self, cmd: u8, buf: &mut [u8]) -> Result<u8, T::Error> {
        self.framed(|port| {
            let status = port.exchange(cmd)?;
            for slot in buf.iter_mut() {
                *slot = port.exchange(0)?;
            }
            Ok(status)
        })
    }

    /// Write `buf` under `cmd`, returning the status byte.
    ///
    /// `W_REGISTER` is folded into the command, which leaves payload commands
    /// (`W_TX_PAYLOAD`, `W_ACK_PAYLOAD`) unchanged since they already carry
    /// that bit.
    pub fn write_buf(&mut self, cmd: u8, buf: &[u8]) -> Result<u8, T::Error> {
        self.framed(|port| {
            let status = port.exchange(cmd | commands::W_REGISTER)?;
            for byte in buf {
                port.exchange(*byte)?;
            }
            Ok(status)
        })
    }

    /// Force the chip-select line released, with no frame.
    pub fn release(&mut self) -> Result<(), T::Error> {
        self.port.deselect()
    }
}

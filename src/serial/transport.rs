//! Serial port abstraction.
//!
//! Reads never block: the poll loop takes whatever bytes the UART has and
//! comes back later for the rest. Writes send a whole frame.

use crate::error::Result;

/// Byte-oriented, non-blocking serial port.
///
/// # Examples
///
/// ## Implementing for a custom UART
///
/// ```rust,no_run
/// use lgap_bus::serial::SerialPort;
/// use lgap_bus::Result;
///
/// struct Uart { /* registers */ }
///
/// impl SerialPort for Uart {
///     fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
///         // Copy out whatever sits in the RX FIFO, possibly nothing
///         Ok(0)
///     }
///
///     fn write_all(&mut self, data: &[u8]) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait SerialPort {
    /// Copy out bytes that have already arrived, up to `buf.len()`.
    ///
    /// Returns `Ok(0)` when nothing is waiting. Must not block.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the UART reports a receive fault.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Send every byte of `data`.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the write fails part-way.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Wait until written bytes have left the transmitter.
    ///
    /// Default implementation does nothing. Override when the flow-control
    /// pin must stay asserted until the last bit is on the wire.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: SerialPort + ?Sized> SerialPort for &mut S {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_available(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

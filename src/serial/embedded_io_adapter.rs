//! `embedded-io` adapter for [`SerialPort`].
//!
//! Wraps any UART driver implementing `embedded_io::{Read, ReadReady, Write}`
//! so it can drive the bus directly.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lgap_bus::serial::EmbeddedIoSerial;
//!
//! let uart = hal::uart::Uart::new(p.UART0, p.PIN_0, p.PIN_1, config);
//! let serial = EmbeddedIoSerial::new(uart);
//! ```

use embedded_io::{Read, ReadReady, Write};

use crate::error::{LgapError, Result};
use crate::serial::transport::SerialPort;

/// Adapter from an `embedded-io` device to [`SerialPort`].
#[derive(Debug)]
pub struct EmbeddedIoSerial<T> {
    inner: T,
}

impl<T> EmbeddedIoSerial<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped device.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the wrapped device.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the device.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + ReadReady + Write> SerialPort for EmbeddedIoSerial<T> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let ready = self.inner.read_ready().map_err(|_| LgapError::read_failed())?;
        if !ready {
            return Ok(0);
        }
        self.inner.read(buf).map_err(|_| LgapError::read_failed())
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner
            .write_all(data)
            .map_err(|_| LgapError::write_failed())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|_| LgapError::write_failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::vec::Vec;

    /// Loopback device: bytes written become readable.
    #[derive(Default)]
    struct Loopback {
        data: Vec<u8>,
        flushed: bool,
    }

    impl embedded_io::ErrorType for Loopback {
        type Error = Infallible;
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Infallible> {
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data.drain(..n);
            Ok(n)
        }
    }

    impl ReadReady for Loopback {
        fn read_ready(&mut self) -> core::result::Result<bool, Infallible> {
            Ok(!self.data.is_empty())
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Infallible> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> core::result::Result<(), Infallible> {
            self.flushed = true;
            Ok(())
        }
    }

    #[test]
    fn test_not_ready_reads_nothing() {
        let mut serial = EmbeddedIoSerial::new(Loopback::default());
        let mut buf = [0u8; 8];
        assert_eq!(serial.read_available(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_write_then_read() {
        let mut serial = EmbeddedIoSerial::new(Loopback::default());
        serial.write_all(&[0x10, 0x20, 0x30]).unwrap();
        serial.flush().unwrap();
        assert!(serial.inner().flushed);

        let mut buf = [0u8; 2];
        assert_eq!(serial.read_available(&mut buf).unwrap(), 2);
        assert_eq!(buf, [0x10, 0x20]);
        assert_eq!(serial.read_available(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0x30);
    }
}

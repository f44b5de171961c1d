//! In-memory serial port and flow-control pin for tests.
//!
//! ## Example
//!
//! ```rust
//! use lgap_bus::serial::{MockSerial, SerialPort};
//!
//! let mut mock = MockSerial::new();
//! mock.push_rx(&[0x10, 0x00]);
//!
//! let mut buf = [0u8; 8];
//! assert_eq!(mock.read_available(&mut buf).unwrap(), 2);
//!
//! mock.write_all(&[0x80]).unwrap();
//! assert_eq!(mock.written(), &[0x80]);
//! ```

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use crate::error::{LgapError, Result};
use crate::serial::transport::SerialPort;

/// Mock serial port.
///
/// Queued RX bytes are handed out by `read_available()`, optionally in
/// chunks no larger than `max_read` to simulate a slow UART. Everything
/// written is kept for inspection.
#[derive(Debug, Default)]
pub struct MockSerial {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    writes: usize,
    max_read: Option<usize>,
    fail_writes: bool,
    fail_reads: bool,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next reads.
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Limit how many bytes a single read returns.
    pub fn set_max_read(&mut self, max: Option<usize>) {
        self.max_read = max;
    }

    /// Make every following write fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make every following read fail.
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Everything successfully written so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Number of successful `write_all()` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Bytes still waiting to be read.
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    /// Forget written bytes.
    pub fn clear_written(&mut self) {
        self.tx.clear();
        self.writes = 0;
    }
}

impl SerialPort for MockSerial {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.fail_reads {
            return Err(LgapError::read_failed());
        }
        let limit = self.max_read.unwrap_or(usize::MAX).min(buf.len());
        let mut n = 0;
        while n < limit {
            match self.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(LgapError::write_failed());
        }
        self.tx.extend_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}

/// Mock flow-control pin recording every level it is driven to.
#[derive(Debug, Default)]
pub struct MockFlowPin {
    high: bool,
    transitions: Vec<bool>,
    fail: bool,
}

impl MockFlowPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level.
    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Levels driven so far, `true` for high.
    pub fn transitions(&self) -> &[bool] {
        &self.transitions
    }

    /// Make the pin refuse to change level.
    pub fn fail(&mut self, fail: bool) {
        self.fail = fail;
    }
}

impl ErrorType for MockFlowPin {
    type Error = ErrorKind;
}

impl OutputPin for MockFlowPin {
    fn set_low(&mut self) -> core::result::Result<(), ErrorKind> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        self.high = false;
        self.transitions.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), ErrorKind> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        self.high = true;
        self.transitions.push(true);
        Ok(())
    }
}

//! RS-485 driver-enable handling.
//!
//! Half-duplex transceivers need their driver enabled for exactly the
//! duration of a transmit. [`TransmitGuard`] raises the pin on creation and
//! lowers it on drop, so an early return from a failed write still releases
//! the bus.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::error::{LgapError, Result};
use crate::serial::transport::SerialPort;

/// Keeps the flow-control pin asserted while alive.
#[derive(Debug)]
pub struct TransmitGuard<'a, P: OutputPin> {
    pin: &'a mut P,
}

impl<'a, P: OutputPin> TransmitGuard<'a, P> {
    /// Assert the pin.
    ///
    /// # Errors
    ///
    /// `Transport` if the pin cannot be driven; nothing is left asserted.
    pub fn assert(pin: &'a mut P) -> Result<Self> {
        pin.set_high().map_err(|_| LgapError::flow_control_failed())?;
        Ok(Self { pin })
    }
}

impl<P: OutputPin> Drop for TransmitGuard<'_, P> {
    fn drop(&mut self) {
        if self.pin.set_low().is_err() {
            lgap_log!(error, "Failed to release flow-control pin");
        }
    }
}

/// Write one frame with the flow-control pin asserted around it.
///
/// The pin is released on every path, including a failed write.
pub fn transmit<S, P>(serial: &mut S, pin: &mut P, data: &[u8]) -> Result<()>
where
    S: SerialPort + ?Sized,
    P: OutputPin,
{
    let _guard = TransmitGuard::assert(pin)?;
    serial.write_all(data)?;
    serial.flush()
}

/// Stand-in pin for buses without a flow-control line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFlowControl;

impl ErrorType for NoFlowControl {
    type Error = Infallible;
}

impl OutputPin for NoFlowControl {
    fn set_low(&mut self) -> core::result::Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Infallible> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::mock_transport::{MockFlowPin, MockSerial};

    #[test]
    fn test_pin_brackets_write() {
        let mut serial = MockSerial::new();
        let mut pin = MockFlowPin::new();

        transmit(&mut serial, &mut pin, &[1, 2, 3]).unwrap();

        assert_eq!(serial.written(), &[1, 2, 3]);
        assert_eq!(pin.transitions(), &[true, false]);
        assert!(!pin.is_high());
    }

    #[test]
    fn test_pin_released_on_write_failure() {
        let mut serial = MockSerial::new();
        serial.fail_writes(true);
        let mut pin = MockFlowPin::new();

        let err = transmit(&mut serial, &mut pin, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, LgapError::Transport(ref e) if e.is_write_failed()));
        assert!(!pin.is_high());
        assert_eq!(pin.transitions(), &[true, false]);
    }

    #[test]
    fn test_pin_failure_skips_write() {
        let mut serial = MockSerial::new();
        let mut pin = MockFlowPin::new();
        pin.fail(true);

        let err = transmit(&mut serial, &mut pin, &[9]).unwrap_err();
        assert!(matches!(err, LgapError::Transport(ref e) if e.is_flow_control_failed()));
        assert!(serial.written().is_empty());
    }

    #[test]
    fn test_no_flow_control() {
        let mut serial = MockSerial::new();
        transmit(&mut serial, &mut NoFlowControl, &[7]).unwrap();
        assert_eq!(serial.written(), &[7]);
    }
}

//! Serial link plumbing.
//!
//! The bus reads and writes through the [`SerialPort`](transport::SerialPort)
//! trait so the coordinator can run against a real UART, any `embedded-io`
//! device, or the in-memory mock used by the tests.
//!
//! ```text
//!                 ┌──────────────────┐
//!  Coordinator ──►│   SerialPort     │◄── EmbeddedIoSerial<T: embedded-io>
//!                 └──────────────────┘◄── MockSerial (tests)
//!                 ┌──────────────────┐
//!  transmit()  ──►│ TransmitGuard<P> │◄── P: embedded_hal::digital::OutputPin
//!                 └──────────────────┘
//! ```

pub mod embedded_io_adapter;
pub mod flow_control;
pub mod mock_transport;
pub mod transport;

pub use embedded_io_adapter::EmbeddedIoSerial;
pub use flow_control::{transmit, NoFlowControl, TransmitGuard};
pub use mock_transport::{MockFlowPin, MockSerial};
pub use transport::SerialPort;

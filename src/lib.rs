//! A vendor-specific USB device class driver
//!
//! `usbd-vendor` claims one vendor-specific interface (class `0xFF`) with a
//! bulk OUT and a bulk IN endpoint. It's written against a callback-driven
//! USB device stack: the stack enumerates the device, offers the driver its
//! interface, schedules transfers, and reports completions. The driver
//!
//! - validates the interface descriptor, and binds the two bulk endpoints,
//! - keeps exactly one receive scheduled on the OUT endpoint, handing every
//!   received packet (including zero-length packets) to your handler,
//! - lets your application send to the host, one transfer at a time,
//! - answers the interface GET_STATUS request.
//!
//! To use the driver, implement [`DeviceStack`] for your USB stack, and call
//! the [`UsbClassDriver`] entry points from the stack's class driver hooks.
//! Allocate a `static` [`DriverState`] for the driver.
//!
//! # Example
//!
//! A stack that drops everything, just to show the wiring.
//!
//! ```
//! use usbd_vendor::{
//!     DeviceStack, DriverState, EndpointDescriptor, Transfer, UsbClassDriver, VendorDriver,
//! };
//! use usb_device::{control::Request, endpoint::EndpointAddress};
//!
//! struct Stack;
//!
//! impl DeviceStack for Stack {
//!     fn open_endpoint(&mut self, _: u8, _: &EndpointDescriptor) -> usb_device::Result<()> {
//!         Ok(())
//!     }
//!     fn close_endpoint(&mut self, _: u8, _: EndpointAddress) {}
//!     fn submit(&mut self, _: u8, _: EndpointAddress, _: Transfer) -> usb_device::Result<()> {
//!         Ok(())
//!     }
//!     fn control_transfer(&mut self, _: u8, _: &Request, _: Transfer) -> usb_device::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! static STATE: DriverState = DriverState::new();
//! static REPLY: [u8; 64] = [0; 64];
//!
//! let mut driver = VendorDriver::new(&STATE);
//! let sender = driver.sender();
//! let mut stack = Stack;
//!
//! // Offered by the stack during enumeration
//! let offer = [
//!     9, 4, 0, 0, 2, 0xFF, 0, 0, 0, // Interface 0, vendor specific, two endpoints
//!     7, 5, 0x01, 0x02, 64, 0, 0,   // EP1 OUT, bulk
//!     7, 5, 0x81, 0x02, 64, 0, 0,   // EP1 IN, bulk
//! ];
//! assert_eq!(driver.open(&mut stack, 0, &offer), Ok(23));
//! assert!(sender.try_send(&mut stack, &REPLY));
//! assert!(!sender.try_send(&mut stack, &REPLY));
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

mod buffer;
mod descriptor;
mod driver;
mod error;
mod sender;
mod stack;
mod state;

pub use descriptor::{descriptor_type, DescriptorError, EndpointDescriptor, InterfaceDescriptor};
pub use driver::{app_drivers, UsbClassDriver, VendorDriver};
pub use error::{Error, Result};
pub use sender::Sender;
pub use stack::{ControlStage, DeviceStack, Transfer, TransferResult};
pub use state::{DriverState, TransferState};

/// Interface class code claimed by this driver
pub const CLASS_VENDOR_SPECIFIC: u8 = 0xFF;

/// Bulk endpoint max packet size
///
/// Every send must be a whole number of packets.
pub const MAX_PACKET_SIZE: usize = 64;

/// Capacity of the bulk OUT receive buffer
pub const RECEIVE_CAPACITY: usize = 64;

/// Capacity of the control response scratch buffer
pub const CONTROL_CAPACITY: usize = 256;

//! Driver errors

use core::fmt;

use usb_device::{endpoint::EndpointAddress, UsbError};

use crate::{descriptor::DescriptorError, stack::TransferResult};

/// Errors the driver surfaces to the USB stack
///
/// Declines aren't errors; a driver that doesn't claim an interface
/// returns a zero length from `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The endpoint descriptors that follow a claimed interface can't be bound.
    Descriptor(DescriptorError),
    /// The stack refused to open an endpoint, or to schedule a transfer.
    Stack(UsbError),
    /// The stack completed a transfer with a non-success result.
    Transfer(TransferResult),
    /// A transfer completed on an endpoint this driver doesn't own.
    UnknownEndpoint(EndpointAddress),
}

/// Result type used throughout the driver
pub type Result<T> = core::result::Result<T, Error>;

impl From<UsbError> for Error {
    fn from(err: UsbError) -> Self {
        Error::Stack(err)
    }
}

impl From<DescriptorError> for Error {
    fn from(err: DescriptorError) -> Self {
        Error::Descriptor(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Descriptor(err) => write!(f, "unusable endpoint descriptor: {:?}", err),
            Error::Stack(err) => write!(f, "USB stack error: {:?}", err),
            Error::Transfer(result) => write!(f, "transfer failed: {:?}", result),
            Error::UnknownEndpoint(addr) => write!(
                f,
                "transfer on unknown endpoint {} {:?}",
                addr.index(),
                addr.direction()
            ),
        }
    }
}

//! The boundary with the USB device stack
//!
//! The stack owns enumeration, the control pipe, and endpoint scheduling.
//! It calls into the driver through [`UsbClassDriver`](crate::UsbClassDriver),
//! and the driver calls back into the stack through [`DeviceStack`].

use core::ptr::NonNull;

use usb_device::{control::Request, endpoint::EndpointAddress};

use crate::descriptor::EndpointDescriptor;

/// The outcome of a transfer, as reported by the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    Success,
    Failed,
    Stalled,
    Timeout,
    Invalid,
}

/// The phase of a control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStage {
    /// The request header was received
    Setup,
    /// The data phase completed
    Data,
    /// The status phase completed
    Ack,
}

/// A region of driver or application memory to move over an endpoint
///
/// A `Transfer` is a raw descriptor: it doesn't borrow the memory it
/// describes. The memory stays valid, and stays untouched by the driver,
/// until the stack reports the transfer's completion, or until the endpoint
/// is closed.
#[derive(Debug)]
pub struct Transfer {
    ptr: NonNull<u8>,
    len: usize,
}

impl Transfer {
    pub(crate) fn new(ptr: NonNull<u8>, len: usize) -> Self {
        Transfer { ptr, len }
    }

    /// Describe application memory that lives for the rest of the program
    pub(crate) fn from_static(data: &'static [u8]) -> Self {
        Transfer::new(NonNull::from(data).cast(), data.len())
    }

    /// Returns the start of the transfer memory
    ///
    /// Use this to program DMA.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Returns the number of bytes to move
    pub fn len(&self) -> usize {
        self.len
    }

    /// Indicates if this is a zero-length transfer
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View the transfer memory
    ///
    /// # Safety
    ///
    /// Only the stack may call this, and only before it reports completion
    /// for this transfer.
    pub unsafe fn as_slice<'t>(&self) -> &'t [u8] {
        core::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }

    /// Mutably view the transfer memory, for receiving data
    ///
    /// # Safety
    ///
    /// Only the stack may call this, only for OUT transfers, and only before
    /// it reports completion for this transfer.
    pub unsafe fn as_mut_slice<'t>(&mut self) -> &'t mut [u8] {
        core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len)
    }
}

/// Services the driver needs from the USB device stack
///
/// Every call is made from a stack callback, except [`submit`](DeviceStack::submit)
/// on the bulk IN endpoint, which comes from [`Sender::try_send`](crate::Sender::try_send).
/// Transfers are fire-and-forget; completion is reported later through
/// [`UsbClassDriver::on_transfer_complete`](crate::UsbClassDriver::on_transfer_complete).
pub trait DeviceStack {
    /// Open, and take ownership of, the endpoint described by `descriptor`
    fn open_endpoint(
        &mut self,
        port: u8,
        descriptor: &EndpointDescriptor,
    ) -> usb_device::Result<()>;

    /// Close an endpoint, aborting any scheduled transfer
    fn close_endpoint(&mut self, port: u8, address: EndpointAddress);

    /// Schedule a transfer on an opened endpoint
    ///
    /// For an IN endpoint, the stack sends the transfer memory. For an OUT
    /// endpoint, the stack receives up to `transfer.len()` bytes into it.
    fn submit(
        &mut self,
        port: u8,
        address: EndpointAddress,
        transfer: Transfer,
    ) -> usb_device::Result<()>;

    /// Respond to a control request with the transfer's data
    fn control_transfer(
        &mut self,
        port: u8,
        request: &Request,
        transfer: Transfer,
    ) -> usb_device::Result<()>;
}

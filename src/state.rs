//! Driver state that's shared between the stack callbacks and the application
//!
//! The stack calls the driver from its own (interrupt) context, while the
//! application sends from thread context. Everything the two sides share,
//! the transfer flags and the endpoint binding, is atomic. The buffers are
//! only touched from stack callbacks, or by the stack itself.

use core::sync::atomic::{AtomicU8, Ordering};

use usb_device::endpoint::EndpointAddress;

use crate::{buffer::Buffer, CONTROL_CAPACITY, RECEIVE_CAPACITY};

bitflags::bitflags! {
    /// Bulk transfer flags
    ///
    /// `BUSY` is only ever set alongside `OPENED`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransferState: u8 {
        /// The endpoints are bound, and the OUT endpoint is armed.
        const OPENED = 1 << 0;
        /// A bulk IN transfer is in flight.
        const BUSY = 1 << 1;
    }
}

/// Set in the flags byte when a driver claims the state. Never part of a
/// `TransferState`.
const DRIVER_TAKEN: u8 = 1 << 7;

/// Raw endpoint address that marks an unbound endpoint
///
/// EP0 OUT is the control endpoint, so it's never a bulk endpoint.
const UNBOUND: u8 = 0;

/// Driver state: endpoint binding, transfer flags, and buffers
///
/// Allocate one `static` object, and supply it to
/// [`VendorDriver::new`](crate::VendorDriver::new). A state can only be
/// claimed by one driver.
///
/// ```
/// use usbd_vendor::DriverState;
///
/// static STATE: DriverState = DriverState::new();
/// assert!(!STATE.transfer_state().contains(usbd_vendor::TransferState::OPENED));
/// ```
pub struct DriverState {
    flags: AtomicU8,
    port: AtomicU8,
    bulk_in: AtomicU8,
    bulk_out: AtomicU8,
    pub(crate) receive: Buffer<RECEIVE_CAPACITY>,
    pub(crate) control: Buffer<CONTROL_CAPACITY>,
}

// Safety: the atomics are Sync. The buffers are only accessed by the one
// driver that claimed this state, or by the stack while that driver has a
// transfer scheduled.
unsafe impl Sync for DriverState {}

impl DriverState {
    /// Allocate unbound, idle driver state
    pub const fn new() -> Self {
        DriverState {
            flags: AtomicU8::new(0),
            port: AtomicU8::new(0),
            bulk_in: AtomicU8::new(UNBOUND),
            bulk_out: AtomicU8::new(UNBOUND),
            receive: Buffer::new(),
            control: Buffer::new(),
        }
    }

    /// Claim the state for a driver
    ///
    /// Returns `false` if the state was already claimed.
    pub(crate) fn claim(&self) -> bool {
        self.flags.fetch_or(DRIVER_TAKEN, Ordering::SeqCst) & DRIVER_TAKEN == 0
    }

    /// Returns the current transfer flags
    pub fn transfer_state(&self) -> TransferState {
        TransferState::from_bits_truncate(self.flags.load(Ordering::SeqCst))
    }

    /// Mark the endpoints as bound and armed
    pub(crate) fn set_opened(&self, port: u8) {
        self.port.store(port, Ordering::SeqCst);
        self.flags
            .fetch_or(TransferState::OPENED.bits(), Ordering::SeqCst);
    }

    /// Return to the idle, closed state
    pub(crate) fn clear_flags(&self) {
        self.flags.fetch_and(DRIVER_TAKEN, Ordering::SeqCst);
    }

    /// Atomically move from `OPENED` to `OPENED | BUSY`
    ///
    /// Returns `false`, and leaves the flags untouched, if the driver is closed
    /// or if a transfer is already in flight.
    pub(crate) fn try_acquire(&self) -> bool {
        self.flags
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |flags| {
                let state = TransferState::from_bits_truncate(flags);
                (state == TransferState::OPENED).then_some(flags | TransferState::BUSY.bits())
            })
            .is_ok()
    }

    /// Clear `BUSY`, allowing the next send
    pub(crate) fn release(&self) {
        self.flags
            .fetch_and(!TransferState::BUSY.bits(), Ordering::SeqCst);
    }

    /// The port the endpoints were opened on
    pub(crate) fn port(&self) -> u8 {
        self.port.load(Ordering::SeqCst)
    }

    /// Returns the bound bulk IN endpoint
    pub fn bulk_in(&self) -> Option<EndpointAddress> {
        load_binding(&self.bulk_in)
    }

    /// Returns the bound bulk OUT endpoint
    pub fn bulk_out(&self) -> Option<EndpointAddress> {
        load_binding(&self.bulk_out)
    }

    pub(crate) fn bind_in(&self, address: EndpointAddress) {
        self.bulk_in.store(address.into(), Ordering::SeqCst);
    }

    pub(crate) fn bind_out(&self, address: EndpointAddress) {
        self.bulk_out.store(address.into(), Ordering::SeqCst);
    }

    /// Unbind the IN endpoint, returning the address that was bound
    pub(crate) fn unbind_in(&self) -> Option<EndpointAddress> {
        take_binding(&self.bulk_in)
    }

    /// Unbind the OUT endpoint, returning the address that was bound
    pub(crate) fn unbind_out(&self) -> Option<EndpointAddress> {
        take_binding(&self.bulk_out)
    }
}

impl Default for DriverState {
    fn default() -> Self {
        Self::new()
    }
}

fn load_binding(binding: &AtomicU8) -> Option<EndpointAddress> {
    let raw = binding.load(Ordering::SeqCst);
    (raw != UNBOUND).then(|| EndpointAddress::from(raw))
}

fn take_binding(binding: &AtomicU8) -> Option<EndpointAddress> {
    let raw = binding.swap(UNBOUND, Ordering::SeqCst);
    (raw != UNBOUND).then(|| EndpointAddress::from(raw))
}

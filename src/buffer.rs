//! Driver-owned transfer buffers
//!
//! The receive buffer and the control scratch buffer live inside the
//! [`DriverState`](crate::DriverState). They're handed to the stack as
//! raw [`Transfer`] descriptors, so the stack may write into them while
//! the driver holds no reference.

use core::{cell::UnsafeCell, ptr::NonNull};

use crate::stack::Transfer;

/// A fixed-capacity byte buffer used for endpoint I/O
///
/// Aligned to a 32 byte cache line, so that DMA maintenance on one buffer
/// never touches its neighbor.
#[repr(align(32))]
pub struct Buffer<const N: usize>(UnsafeCell<[u8; N]>);

impl<const N: usize> Buffer<N> {
    /// Create a zeroed buffer
    pub const fn new() -> Self {
        Buffer(UnsafeCell::new([0; N]))
    }

    /// Returns the buffer capacity, in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    fn as_ptr_mut(&self) -> NonNull<u8> {
        // Safety: UnsafeCell::get never returns null.
        unsafe { NonNull::new_unchecked(self.0.get().cast()) }
    }

    /// Describe the first `len` bytes of this buffer as a transfer
    ///
    /// `len` is constrained by the buffer capacity.
    pub fn transfer(&self, len: usize) -> Transfer {
        Transfer::new(self.as_ptr_mut(), len.min(N))
    }

    /// Returns the first `len` bytes of the buffer
    ///
    /// `len` is constrained by the buffer capacity.
    ///
    /// # Safety
    ///
    /// There must be no active transfer into this buffer, and no outstanding
    /// mutable slice from [`as_mut_slice`](Buffer::as_mut_slice).
    pub unsafe fn as_slice(&self, len: usize) -> &[u8] {
        let buffer = &*self.0.get();
        &buffer[..len.min(N)]
    }

    /// Returns the first `len` bytes of the buffer for writing
    ///
    /// `len` is constrained by the buffer capacity.
    ///
    /// # Safety
    ///
    /// There must be no active transfer that uses this buffer, and no other
    /// slice of this buffer may be alive.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice(&self, len: usize) -> &mut [u8] {
        let buffer = &mut *self.0.get();
        &mut buffer[..len.min(N)]
    }
}

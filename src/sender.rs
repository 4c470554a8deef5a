//! Application-side bulk IN sends

use crate::{stack::Transfer, DeviceStack, DriverState, TransferState, MAX_PACKET_SIZE};

/// Sends data to the host over the bulk IN endpoint
///
/// A `Sender` is a cheap handle to the [`DriverState`]. Use it from your
/// application while the stack owns the [`VendorDriver`](crate::VendorDriver).
///
/// There's only one transfer slot. A send is accepted when the endpoints are
/// opened and no other send is in flight. Otherwise it's rejected
/// immediately; the `Sender` never blocks, and never queues. Retry after the
/// previous transfer completes.
#[derive(Clone, Copy)]
pub struct Sender {
    state: &'static DriverState,
}

impl Sender {
    pub(crate) fn new(state: &'static DriverState) -> Self {
        Sender { state }
    }

    /// Try to send `data` to the host
    ///
    /// Returns `true` if the transfer was scheduled. `data` must stay
    /// untouched until the transfer completes, so it must be `'static`.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not a multiple of the bulk max packet size,
    /// [`MAX_PACKET_SIZE`].
    pub fn try_send<S: DeviceStack>(&self, stack: &mut S, data: &'static [u8]) -> bool {
        assert!(
            data.len() % MAX_PACKET_SIZE == 0,
            "bulk IN length {} isn't a multiple of {}",
            data.len(),
            MAX_PACKET_SIZE
        );

        if !self.state.try_acquire() {
            trace!("SEND rejected {:?}", self.state.transfer_state());
            return false;
        }

        // A reset may have unbound the endpoint after we acquired the slot.
        let Some(bulk_in) = self.state.bulk_in() else {
            self.state.release();
            return false;
        };

        match stack.submit(self.state.port(), bulk_in, Transfer::from_static(data)) {
            Ok(()) => true,
            Err(err) => {
                warn!("SEND EP{} refused {:?}", bulk_in.index(), err);
                self.state.release();
                false
            }
        }
    }

    /// Indicates if a call to [`try_send`](Sender::try_send) would be accepted
    pub fn is_ready(&self) -> bool {
        self.state.transfer_state() == TransferState::OPENED
    }
}

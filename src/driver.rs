//! The vendor class driver, and its dispatch interface
//!
//! The stack drives a [`UsbClassDriver`] from its own event dispatch. No two
//! driver calls run at the same time, and no call blocks.

use usb_device::{
    control::{Recipient, Request, RequestType},
    endpoint::EndpointAddress,
    UsbDirection,
};

use crate::{
    descriptor::{DescriptorError, EndpointDescriptor, InterfaceDescriptor},
    error::{Error, Result},
    sender::Sender,
    stack::{ControlStage, DeviceStack, TransferResult},
    state::{DriverState, TransferState},
    CLASS_VENDOR_SPECIFIC, RECEIVE_CAPACITY,
};

/// The number of bulk endpoints this driver binds
const ENDPOINT_COUNT: u8 = 2;

/// GET_STATUS replies with a two-byte status word
const STATUS_LEN: usize = 2;

/// The entry points a USB device stack calls on a class driver
///
/// The stack only depends on this interface. `open` must succeed before the
/// stack makes any transfer or control call for the interface.
pub trait UsbClassDriver<S: DeviceStack> {
    /// A short name for stack diagnostics
    fn name(&self) -> &'static str;

    /// Called once, when the stack initializes
    fn init(&mut self);

    /// Called on bus reset
    fn reset(&mut self, stack: &mut S, port: u8);

    /// Offer an interface to the driver
    ///
    /// `offer` starts at the interface descriptor; its length is the maximum
    /// number of configuration bytes the driver may consume. Returns the
    /// number of bytes consumed, or `0` if the driver doesn't claim the
    /// interface. An error means the driver claimed the interface, but
    /// couldn't bind it.
    fn open(&mut self, stack: &mut S, port: u8, offer: &[u8]) -> Result<u16>;

    /// Called for each stage of a control transfer
    ///
    /// Returns `false` if the driver didn't handle the request, so the stack
    /// may handle it.
    fn on_control_request(
        &mut self,
        stack: &mut S,
        port: u8,
        stage: ControlStage,
        request: &Request,
    ) -> bool;

    /// Called when a transfer on one of the driver's endpoints completes
    fn on_transfer_complete(
        &mut self,
        stack: &mut S,
        port: u8,
        address: EndpointAddress,
        result: TransferResult,
        length: u32,
    ) -> Result<()>;

    /// Called on start of frame
    fn sof(&mut self, _stack: &mut S, _port: u8, _frame: u16) {}
}

/// Append the vendor driver to a stack's application driver table
///
/// Increments `driver_count` by the number of drivers returned.
pub fn app_drivers<'d, 'h: 'd, S: DeviceStack + 'd>(
    driver: &'d mut VendorDriver<'h>,
    driver_count: &mut u8,
) -> [&'d mut dyn UsbClassDriver<S>; 1] {
    let drivers: [&'d mut dyn UsbClassDriver<S>; 1] = [driver];
    *driver_count += drivers.len() as u8;
    drivers
}

/// A vendor-specific class driver with one bulk IN and one bulk OUT endpoint
///
/// The driver claims the first vendor-specific interface it's offered. Once
/// opened, it keeps one receive transfer scheduled on the OUT endpoint, and
/// hands every received packet to the receive handler. Send data to the host
/// with the driver's [`Sender`].
///
/// ```
/// use usbd_vendor::{DriverState, VendorDriver};
///
/// static STATE: DriverState = DriverState::new();
///
/// let mut count = 0;
/// let mut on_receive = |data: &[u8]| count += data.len();
///
/// let mut driver = VendorDriver::new(&STATE);
/// let sender = driver.sender();
/// driver.register_receive_handler(&mut on_receive);
/// assert!(!sender.is_ready());
/// ```
pub struct VendorDriver<'h> {
    state: &'static DriverState,
    handler: Option<&'h mut dyn FnMut(&[u8])>,
}

impl<'h> VendorDriver<'h> {
    /// Create a driver that uses `state`
    ///
    /// # Panics
    ///
    /// Panics if another driver already uses `state`.
    pub fn new(state: &'static DriverState) -> Self {
        assert!(state.claim(), "Driver state is already in use");
        VendorDriver {
            state,
            handler: None,
        }
    }

    /// Returns a handle for sending data to the host
    pub fn sender(&self) -> Sender {
        Sender::new(self.state)
    }

    /// Set the handler that receives bulk OUT data
    ///
    /// The handler runs in the stack's callback context. It sees each packet
    /// exactly once, in order, including zero-length packets. The slice is
    /// only valid for the call; the buffer is rearmed as soon as the
    /// handler returns. Replaces any previous handler.
    pub fn register_receive_handler(&mut self, handler: &'h mut dyn FnMut(&[u8])) {
        self.handler = Some(handler);
    }

    /// Remove the receive handler; received data is dropped
    pub fn clear_receive_handler(&mut self) {
        self.handler = None;
    }

    /// Indicates if the endpoints are bound and armed
    pub fn is_opened(&self) -> bool {
        self.state.transfer_state().contains(TransferState::OPENED)
    }

    /// Indicates if a bulk IN transfer is in flight
    pub fn is_busy(&self) -> bool {
        self.state.transfer_state().contains(TransferState::BUSY)
    }

    /// Returns the bound bulk IN endpoint
    pub fn bulk_in(&self) -> Option<EndpointAddress> {
        self.state.bulk_in()
    }

    /// Returns the bound bulk OUT endpoint
    pub fn bulk_out(&self) -> Option<EndpointAddress> {
        self.state.bulk_out()
    }

    /// Close both endpoints, and return to the idle state
    ///
    /// Safe to call when nothing is bound.
    pub fn close<S: DeviceStack>(&mut self, stack: &mut S, port: u8) {
        if let Some(addr) = self.state.unbind_in() {
            debug!("CLOSE EP{} IN", addr.index());
            stack.close_endpoint(port, addr);
        }
        if let Some(addr) = self.state.unbind_out() {
            debug!("CLOSE EP{} OUT", addr.index());
            stack.close_endpoint(port, addr);
        }
        self.state.clear_flags();
    }

    /// Open the bulk endpoints described by `descriptors`, and bind them
    ///
    /// Each endpoint is bound as soon as the stack opens it, so a failure
    /// part way leaves only open endpoints in the binding.
    fn bind_endpoints<S: DeviceStack>(
        &mut self,
        stack: &mut S,
        port: u8,
        mut descriptors: &[u8],
    ) -> Result<EndpointAddress> {
        for _ in 0..ENDPOINT_COUNT {
            let (endpoint, rest) = EndpointDescriptor::parse(descriptors)?;
            descriptors = rest;

            if !endpoint.is_bulk() {
                return Err(DescriptorError::TransferType(endpoint.transfer_type()).into());
            }

            let direction = endpoint.address.direction();
            let bound = match direction {
                UsbDirection::In => self.state.bulk_in(),
                UsbDirection::Out => self.state.bulk_out(),
            };
            if bound.is_some() {
                return Err(DescriptorError::Direction(direction).into());
            }

            stack.open_endpoint(port, &endpoint)?;
            match direction {
                UsbDirection::In => self.state.bind_in(endpoint.address),
                UsbDirection::Out => self.state.bind_out(endpoint.address),
            }
            debug!(
                "BIND EP{} {:?} mps={}",
                endpoint.address.index(),
                direction,
                endpoint.max_packet_size
            );
        }

        // Both directions are bound; anything else returned early.
        self.state
            .bulk_out()
            .ok_or(Error::Descriptor(DescriptorError::Direction(UsbDirection::Out)))
    }

    /// Schedule the next receive into the full OUT buffer
    fn arm_receive<S: DeviceStack>(
        &mut self,
        stack: &mut S,
        port: u8,
        bulk_out: EndpointAddress,
    ) -> Result<()> {
        stack.submit(port, bulk_out, self.state.receive.transfer(RECEIVE_CAPACITY))?;
        Ok(())
    }

    /// Deliver a completed receive, and rearm the OUT endpoint
    fn on_receive<S: DeviceStack>(
        &mut self,
        stack: &mut S,
        port: u8,
        bulk_out: EndpointAddress,
        length: usize,
    ) -> Result<()> {
        let state = self.state;
        // Safety: the stack completed the receive, and there's no other
        // scheduled transfer into the buffer until we rearm below.
        let received = unsafe { state.receive.as_slice(length) };
        if let Some(handler) = self.handler.as_deref_mut() {
            handler(received);
        }
        self.arm_receive(stack, port, bulk_out)
    }

    /// Answer GET_STATUS for the interface
    fn get_status<S: DeviceStack>(&mut self, stack: &mut S, port: u8, request: &Request) -> bool {
        if request.request_type != RequestType::Standard
            || request.recipient != Recipient::Interface
            || request.direction != UsbDirection::In
        {
            return false;
        }

        // Safety: a new setup stage ends any previous control transfer, so the
        // stack is done with the scratch buffer.
        let status = unsafe { self.state.control.as_mut_slice(STATUS_LEN) };
        status.fill(0);

        let length = usize::from(request.length)
            .min(self.state.control.capacity())
            .min(STATUS_LEN);
        debug!("GET_STATUS interface={} length={}", request.index, length);

        match stack.control_transfer(port, request, self.state.control.transfer(length)) {
            Ok(()) => true,
            Err(err) => {
                warn!("GET_STATUS reply refused {:?}", err);
                false
            }
        }
    }
}

impl<S: DeviceStack> UsbClassDriver<S> for VendorDriver<'_> {
    fn name(&self) -> &'static str {
        "vendor"
    }

    fn init(&mut self) {
        debug!("INIT");
    }

    fn reset(&mut self, stack: &mut S, port: u8) {
        debug!("RESET port={}", port);
        self.close(stack, port);
    }

    fn open(&mut self, stack: &mut S, port: u8, offer: &[u8]) -> Result<u16> {
        let interface = match InterfaceDescriptor::parse(offer) {
            Ok(interface) => interface,
            Err(err) => {
                debug!("OPEN declined, bad interface descriptor {:?}", err);
                return Ok(0);
            }
        };
        debug!(
            "OPEN interface={} max_len={}",
            interface.interface_number,
            offer.len()
        );

        if interface.class != CLASS_VENDOR_SPECIFIC {
            debug!("OPEN declined, class {:#04x}", interface.class);
            return Ok(0);
        }
        if interface.num_endpoints != ENDPOINT_COUNT {
            debug!("OPEN declined, {} endpoints", interface.num_endpoints);
            return Ok(0);
        }

        let len = interface.required_length();
        if offer.len() < len {
            debug!("OPEN declined, need {} bytes", len);
            return Ok(0);
        }

        self.close(stack, port);
        let bulk_out = self.bind_endpoints(stack, port, &offer[InterfaceDescriptor::SIZE..len])?;
        self.arm_receive(stack, port, bulk_out)?;
        self.state.set_opened(port);

        Ok(len as u16)
    }

    fn on_control_request(
        &mut self,
        stack: &mut S,
        port: u8,
        stage: ControlStage,
        request: &Request,
    ) -> bool {
        debug!(
            "CONTROL request={:#04x} type={:?} {:?} length={} stage={:?}",
            request.request,
            request.request_type,
            request.direction,
            request.length,
            stage
        );

        if stage != ControlStage::Setup {
            return true;
        }

        match request.request {
            Request::GET_STATUS => self.get_status(stack, port, request),
            _ => {
                debug!("CONTROL request not recognized (stack might handle it)");
                false
            }
        }
    }

    fn on_transfer_complete(
        &mut self,
        stack: &mut S,
        port: u8,
        address: EndpointAddress,
        result: TransferResult,
        length: u32,
    ) -> Result<()> {
        trace!(
            "XFER EP{} {:?} result={:?} length={}",
            address.index(),
            address.direction(),
            result,
            length
        );

        if result != TransferResult::Success {
            warn!("XFER EP{} failed {:?}", address.index(), result);
            return Err(Error::Transfer(result));
        }
        if length == 0 {
            trace!("ZLP");
        }

        if Some(address) == self.state.bulk_out() {
            self.on_receive(stack, port, address, length as usize)
        } else if Some(address) == self.state.bulk_in() {
            self.state.release();
            Ok(())
        } else {
            Err(Error::UnknownEndpoint(address))
        }
    }
}

//! Interface and endpoint descriptors
//!
//! The stack offers the driver a slice of the active configuration
//! descriptor that starts at an interface descriptor. These types parse
//! the parts of that slice that the driver cares about.

use usb_device::{endpoint::EndpointAddress, UsbDirection};

/// Standard descriptor type codes
pub mod descriptor_type {
    /// Interface descriptor
    pub const INTERFACE: u8 = 4;
    /// Endpoint descriptor
    pub const ENDPOINT: u8 = 5;
}

/// `bmAttributes` transfer type for bulk endpoints
const TRANSFER_TYPE_BULK: u8 = 0b10;

/// A descriptor couldn't be used to bind an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorError {
    /// Fewer bytes than `bLength`, or a `bLength` too small for the
    /// descriptor type.
    Truncated,
    /// `bDescriptorType` isn't the expected descriptor type.
    DescriptorType(u8),
    /// The endpoint isn't a bulk endpoint.
    TransferType(u8),
    /// Both endpoints have the same direction.
    Direction(UsbDirection),
}

/// Split the next descriptor from `bytes`, using its `bLength`
///
/// Returns the descriptor and the bytes that follow it.
fn split_descriptor(bytes: &[u8]) -> Result<(&[u8], &[u8]), DescriptorError> {
    let len = usize::from(*bytes.first().ok_or(DescriptorError::Truncated)?);
    if len < 2 || len > bytes.len() {
        return Err(DescriptorError::Truncated);
    }
    Ok(bytes.split_at(len))
}

/// Interface Descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    /// Interface number
    pub interface_number: u8,
    /// Alternative setting
    pub alternate_setting: u8,
    /// Number of endpoints
    pub num_endpoints: u8,
    /// Interface class
    pub class: u8,
    /// Interface subclass
    pub sub_class: u8,
    /// Interface protocol
    pub protocol: u8,
    /// Interface string descriptor index
    pub string_index: u8,
}

impl InterfaceDescriptor {
    /// The size of this descriptor in bytes
    pub const SIZE: usize = 9;

    /// Parse the interface descriptor at the front of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let (desc, _) = split_descriptor(bytes)?;
        if desc.len() < Self::SIZE {
            return Err(DescriptorError::Truncated);
        }
        if desc[1] != descriptor_type::INTERFACE {
            return Err(DescriptorError::DescriptorType(desc[1]));
        }
        Ok(InterfaceDescriptor {
            interface_number: desc[2],
            alternate_setting: desc[3],
            num_endpoints: desc[4],
            class: desc[5],
            sub_class: desc[6],
            protocol: desc[7],
            string_index: desc[8],
        })
    }

    /// The number of configuration bytes this interface occupies
    ///
    /// That's the interface descriptor, followed by one fixed-size endpoint
    /// descriptor per declared endpoint.
    pub fn required_length(&self) -> usize {
        Self::SIZE + usize::from(self.num_endpoints) * EndpointDescriptor::SIZE
    }

    /// Returns the byte representation of this descriptor
    pub fn bytes(&self) -> [u8; Self::SIZE] {
        [
            Self::SIZE as u8,
            descriptor_type::INTERFACE,
            self.interface_number,
            self.alternate_setting,
            self.num_endpoints,
            self.class,
            self.sub_class,
            self.protocol,
            self.string_index,
        ]
    }
}

/// Endpoint Descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Endpoint address, including the direction bit
    pub address: EndpointAddress,
    /// `bmAttributes`; the low two bits are the transfer type
    pub attributes: u8,
    /// Maximum packet size
    pub max_packet_size: u16,
    /// Polling interval
    pub interval: u8,
}

impl EndpointDescriptor {
    /// The size of this descriptor in bytes
    pub const SIZE: usize = 7;

    /// Parse the endpoint descriptor at the front of `bytes`
    ///
    /// Returns the descriptor, and the bytes that follow it.
    pub fn parse(bytes: &[u8]) -> Result<(Self, &[u8]), DescriptorError> {
        let (desc, rest) = split_descriptor(bytes)?;
        if desc.len() < Self::SIZE {
            return Err(DescriptorError::Truncated);
        }
        if desc[1] != descriptor_type::ENDPOINT {
            return Err(DescriptorError::DescriptorType(desc[1]));
        }
        let endpoint = EndpointDescriptor {
            address: EndpointAddress::from(desc[2]),
            attributes: desc[3],
            max_packet_size: u16::from_le_bytes([desc[4], desc[5]]),
            interval: desc[6],
        };
        Ok((endpoint, rest))
    }

    /// Returns the transfer type bits of `bmAttributes`
    pub fn transfer_type(&self) -> u8 {
        self.attributes & 0b11
    }

    /// Indicates if this is a bulk endpoint
    pub fn is_bulk(&self) -> bool {
        self.transfer_type() == TRANSFER_TYPE_BULK
    }

    /// Returns the byte representation of this descriptor
    pub fn bytes(&self) -> [u8; Self::SIZE] {
        let [mps_lo, mps_hi] = self.max_packet_size.to_le_bytes();
        [
            Self::SIZE as u8,
            descriptor_type::ENDPOINT,
            self.address.into(),
            self.attributes,
            mps_lo,
            mps_hi,
            self.interval,
        ]
    }
}

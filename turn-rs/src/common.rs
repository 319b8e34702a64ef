use crate::error::{StunError, StunErrorType};
use crate::types::{MAGIC_COOKIE, TRANSACTION_ID_SIZE};
use crate::Encode;
use byteorder::{BigEndian, ByteOrder};
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_PADDING_VALUE: u8 = 0x00;

pub fn check_buffer_boundaries(buffer: &[u8], limit: usize) -> Result<(), StunError> {
    (buffer.len() >= limit).then_some(()).ok_or_else(|| {
        StunError::new(
            StunErrorType::SmallBuffer,
            format!("Required size: {}, buffer size: {}", limit, buffer.len()),
        )
    })
}

pub fn check_value_size(raw_value: &[u8], expected: usize) -> Result<(), StunError> {
    (raw_value.len() == expected).then_some(()).ok_or_else(|| {
        StunError::new(
            StunErrorType::InvalidParam,
            format!(
                "Value size {} does not match the expected size {}",
                raw_value.len(),
                expected
            ),
        )
    })
}

pub fn padding(value_size: usize) -> usize {
    (4 - (value_size & 3)) & 3
}

pub fn fill_padding_value(buffer: &mut [u8], size: usize, value: u8) -> Result<(), StunError> {
    check_buffer_boundaries(buffer, size)?;
    buffer[..size].fill(value);
    Ok(())
}

const U32_SIZE: usize = 4;
const U16_SIZE: usize = 2;

impl<'a> crate::Decode<'a> for u32 {
    fn decode(raw_value: &[u8]) -> Result<(Self, usize), StunError> {
        check_buffer_boundaries(raw_value, U32_SIZE)?;
        Ok((BigEndian::read_u32(&raw_value[..U32_SIZE]), U32_SIZE))
    }
}

impl Encode for u32 {
    fn encode(&self, raw_value: &mut [u8]) -> Result<usize, StunError> {
        check_buffer_boundaries(raw_value, U32_SIZE)?;
        BigEndian::write_u32(raw_value, *self);
        Ok(U32_SIZE)
    }
}

impl<'a> crate::Decode<'a> for u16 {
    fn decode(raw_value: &[u8]) -> Result<(Self, usize), StunError> {
        check_buffer_boundaries(raw_value, U16_SIZE)?;
        Ok((BigEndian::read_u16(&raw_value[..U16_SIZE]), U16_SIZE))
    }
}

impl Encode for u16 {
    fn encode(&self, raw_value: &mut [u8]) -> Result<usize, StunError> {
        check_buffer_boundaries(raw_value, U16_SIZE)?;
        BigEndian::write_u16(raw_value, *self);
        Ok(U16_SIZE)
    }
}

impl<'a> crate::Decode<'a> for &'a str {
    fn decode(raw_value: &'a [u8]) -> Result<(Self, usize), StunError> {
        let value = std::str::from_utf8(raw_value)?;
        Ok((value, value.len()))
    }
}

impl Encode for &str {
    fn encode(&self, raw_value: &mut [u8]) -> Result<usize, StunError> {
        let len = self.len();
        check_buffer_boundaries(raw_value, len)?;
        raw_value[..len].copy_from_slice(self.as_bytes());
        Ok(len)
    }
}

// Format of XOR-MAPPED-ADDRESS, XOR-RELAYED-ADDRESS and XOR-PEER-ADDRESS:
//      0                   1                   2                   3
//      0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |0 0 0 0 0 0 0 0|    Family     |         X-Port                |
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |                X-Address (Variable)
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
const ADDRESS_HEADER_SIZE: usize = 4;
const FAMILY_IPV4: u8 = 0x01;
const FAMILY_IPV6: u8 = 0x02;

pub(crate) fn socket_addr_xor(
    addr: &SocketAddr,
    transaction_id: &[u8; TRANSACTION_ID_SIZE],
) -> SocketAddr {
    let cookie = MAGIC_COOKIE.as_u32().to_be_bytes();
    let xor_port = addr.port() ^ (MAGIC_COOKIE.as_u32() >> 16) as u16;
    match addr.ip() {
        IpAddr::V4(ip) => {
            let mut octets = ip.octets();
            octets
                .iter_mut()
                .zip(cookie.iter())
                .for_each(|(b, c)| *b ^= c);
            SocketAddr::new(IpAddr::from(octets), xor_port)
        }
        IpAddr::V6(ip) => {
            let mut octets = ip.octets();
            octets
                .iter_mut()
                .zip(cookie.iter().chain(transaction_id.iter()))
                .for_each(|(b, c)| *b ^= c);
            SocketAddr::new(IpAddr::from(octets), xor_port)
        }
    }
}

pub(crate) fn xor_encode(
    transaction_id: &[u8; TRANSACTION_ID_SIZE],
    addr: &SocketAddr,
    buffer: &mut [u8],
) -> Result<usize, StunError> {
    let xor_addr = socket_addr_xor(addr, transaction_id);
    let size = match xor_addr.ip() {
        IpAddr::V4(_) => ADDRESS_HEADER_SIZE + 4,
        IpAddr::V6(_) => ADDRESS_HEADER_SIZE + 16,
    };
    check_buffer_boundaries(buffer, size)?;

    // The first 8 bits are set to zero for alignment
    buffer[0] = 0;
    BigEndian::write_u16(&mut buffer[2..4], xor_addr.port());
    match xor_addr.ip() {
        IpAddr::V4(ip) => {
            buffer[1] = FAMILY_IPV4;
            buffer[ADDRESS_HEADER_SIZE..size].copy_from_slice(&ip.octets());
        }
        IpAddr::V6(ip) => {
            buffer[1] = FAMILY_IPV6;
            buffer[ADDRESS_HEADER_SIZE..size].copy_from_slice(&ip.octets());
        }
    }

    Ok(size)
}

pub(crate) fn xor_decode(
    transaction_id: &[u8; TRANSACTION_ID_SIZE],
    raw_value: &[u8],
) -> Result<(SocketAddr, usize), StunError> {
    if raw_value.len() < ADDRESS_HEADER_SIZE {
        return Err(StunError::new(
            StunErrorType::MalformedAddress,
            format!("Address value too short: {} bytes", raw_value.len()),
        ));
    }

    let family = raw_value[1];
    let address_size = match family {
        FAMILY_IPV4 => 4,
        FAMILY_IPV6 => 16,
        _ => {
            return Err(StunError::new(
                StunErrorType::MalformedAddress,
                format!("Invalid address family: {:#04x}", family),
            ))
        }
    };

    let size = ADDRESS_HEADER_SIZE + address_size;
    if raw_value.len() != size {
        return Err(StunError::new(
            StunErrorType::MalformedAddress,
            format!(
                "Family {:#04x} requires {} bytes, got {}",
                family,
                size,
                raw_value.len()
            ),
        ));
    }

    let port = BigEndian::read_u16(&raw_value[2..4]);
    let ip = if family == FAMILY_IPV4 {
        let octets: [u8; 4] = raw_value[ADDRESS_HEADER_SIZE..size].try_into()?;
        IpAddr::from(octets)
    } else {
        let octets: [u8; 16] = raw_value[ADDRESS_HEADER_SIZE..size].try_into()?;
        IpAddr::from(octets)
    };

    let addr = socket_addr_xor(&SocketAddr::new(ip, port), transaction_id);
    Ok((addr, size))
}

// Creates a STUN attribute which carries a XOR'd `SocketAddr`.
macro_rules! xor_socket_addr_attribute {
    (
        $(#[$meta:meta])*
        $class_name:ident,
        $attr_type:ident,
    ) => (
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $class_name(std::net::SocketAddr);

        impl $class_name {
            /// Returns the [`SocketAddr`](std::net::SocketAddr) associated to this attribute.
            pub fn socket_address(&self) -> &std::net::SocketAddr {
                &self.0
            }

            /// Returns the address family of this attribute.
            pub fn family(&self) -> crate::AddressFamily {
                crate::AddressFamily::from(&self.0)
            }
        }

        impl From<std::net::SocketAddr> for $class_name {
            fn from(addr: std::net::SocketAddr) -> Self {
                Self(addr)
            }
        }

        impl AsRef<std::net::SocketAddr> for $class_name {
            fn as_ref(&self) -> &std::net::SocketAddr {
                &self.0
            }
        }

        impl crate::attributes::DecodeAttributeValue for $class_name {
            fn decode(ctx: crate::context::AttributeDecoderContext) -> Result<(Self, usize), crate::StunError> {
                let (addr, size) =
                    crate::common::xor_decode(ctx.transaction_id().as_bytes(), ctx.raw_value())?;
                Ok(($class_name::from(addr), size))
            }
        }

        impl crate::attributes::EncodeAttributeValue for $class_name {
            fn encode(&self, mut ctx: crate::context::AttributeEncoderContext) -> Result<usize, crate::StunError> {
                let transaction_id = ctx.transaction_id()?;
                crate::common::xor_encode(transaction_id.as_bytes(), &self.0, ctx.raw_value_mut())
            }
        }

        crate::attributes::stun_attribute!($class_name, $attr_type);
    )
}
pub(crate) use xor_socket_addr_attribute;

// Creates a STUN attribute which carries UTF-8 text with no other structure.
macro_rules! text_attribute {
    (
        $(#[$meta:meta])*
        $class_name:ident,
        $attr_type:ident,
    ) => (
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $class_name(String);

        impl $class_name {
            /// Creates a new attribute
            pub fn new<S>(value: S) -> Self
            where
                S: Into<String>,
            {
                Self(value.into())
            }

            /// Returns the text carried by this attribute
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<&str> for $class_name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $class_name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl PartialEq<str> for $class_name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $class_name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$class_name> for &str {
            fn eq(&self, other: &$class_name) -> bool {
                *self == other.0
            }
        }

        impl std::fmt::Display for $class_name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl crate::attributes::DecodeAttributeValue for $class_name {
            fn decode(ctx: crate::context::AttributeDecoderContext) -> Result<(Self, usize), crate::StunError> {
                use crate::Decode;
                let (value, size) = <&str>::decode(ctx.raw_value())?;
                Ok(($class_name::new(value), size))
            }
        }

        impl crate::attributes::EncodeAttributeValue for $class_name {
            fn encode(&self, mut ctx: crate::context::AttributeEncoderContext) -> Result<usize, crate::StunError> {
                use crate::Encode;
                self.as_str().encode(ctx.raw_value_mut())
            }
        }

        crate::attributes::stun_attribute!($class_name, $attr_type);
    )
}
pub(crate) use text_attribute;

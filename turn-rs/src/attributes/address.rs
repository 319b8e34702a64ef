use crate::common::xor_socket_addr_attribute;

const XOR_PEER_ADDRESS: u16 = 0x0012;
const XOR_RELAYED_ADDRESS: u16 = 0x0016;
const XOR_MAPPED_ADDRESS: u16 = 0x0020;

xor_socket_addr_attribute!(
    /// The [`XorMappedAddress`] attribute carries the server reflexive
    /// address of the client: the source transport address the server saw
    /// the request coming from.
    ///
    /// # Examples
    ///```rust
    /// # use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    /// # use turn_rs::AddressFamily;
    /// # use turn_rs::attributes::XorMappedAddress;
    /// let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), 5000);
    /// let attr = XorMappedAddress::from(addr);
    /// assert_eq!(attr.family(), AddressFamily::IPv4);
    /// assert_eq!(attr.socket_address().port(), 5000);
    ///```
    XorMappedAddress,
    XOR_MAPPED_ADDRESS,
);

xor_socket_addr_attribute!(
    /// The [`XorRelayedAddress`] attribute is present in Allocate
    /// responses. It carries the address and port the server allocated
    /// for the client.
    XorRelayedAddress,
    XOR_RELAYED_ADDRESS,
);

xor_socket_addr_attribute!(
    /// The [`XorPeerAddress`] attribute carries the address and port of
    /// the peer as seen from the TURN server.
    XorPeerAddress,
    XOR_PEER_ADDRESS,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{DecodeAttributeValue, EncodeAttributeValue, StunAttributeType};
    use crate::context::{AttributeDecoderContext, AttributeEncoderContext};
    use crate::error::StunErrorType;
    use crate::{AttributeType, TransactionId};
    use std::net::SocketAddr;
    use std::str::FromStr;

    const TRANSACTION_ID: [u8; 12] = [
        0xB7, 0xE7, 0xA7, 0x01, 0xBC, 0x34, 0xD6, 0x86, 0xFA, 0x87, 0xDF, 0xAE,
    ];

    #[test]
    fn attribute_types() {
        let addr = SocketAddr::from_str("1.2.3.4:5000").expect("Can not parse address");
        assert_eq!(
            XorMappedAddress::from(addr).attribute_type(),
            AttributeType::from(0x0020)
        );
        assert_eq!(XorRelayedAddress::get_type(), AttributeType::from(0x0016));
        assert_eq!(XorPeerAddress::get_type(), AttributeType::from(0x0012));
    }

    #[test]
    fn decode_xor_mapped_address() {
        let value = [0x00, 0x01, 0xA1, 0x47, 0xE1, 0x12, 0xA6, 0x43];
        let tid = TransactionId::from(TRANSACTION_ID);
        let ctx = AttributeDecoderContext::new(tid, &value);
        let (attr, size) = XorMappedAddress::decode(ctx).expect("Can not decode attribute");
        assert_eq!(size, 8);
        assert_eq!(attr.socket_address().to_string(), "192.0.2.1:32853");
    }

    #[test]
    fn decode_malformed_relayed_address() {
        // IPv6 family but IPv4 length
        let value = [0x00, 0x02, 0xA1, 0x47, 0xE1, 0x12, 0xA6, 0x43];
        let tid = TransactionId::from(TRANSACTION_ID);
        let ctx = AttributeDecoderContext::new(tid, &value);
        assert_eq!(
            XorRelayedAddress::decode(ctx).expect_err("Error expected"),
            StunErrorType::MalformedAddress
        );
    }

    #[test]
    fn encode_xor_peer_address() {
        // Header carrying the transaction id, the encoder reads it from there
        let mut header = [0u8; 20];
        header[8..20].copy_from_slice(&TRANSACTION_ID);
        let addr = SocketAddr::from_str("192.0.2.1:32853").expect("Can not parse address");
        let attr = XorPeerAddress::from(addr);

        let mut value = [0xffu8; 8];
        let ctx = AttributeEncoderContext::new(&header, &mut value);
        let size = attr.encode(ctx).expect("Can not encode attribute");
        assert_eq!(size, 8);
        assert_eq!(value, [0x00, 0x01, 0xA1, 0x47, 0xE1, 0x12, 0xA6, 0x43]);
    }
}

use crate::attributes::{stun_attribute, DecodeAttributeValue, EncodeAttributeValue};
use crate::common::{check_buffer_boundaries, check_value_size};
use crate::context::{AttributeDecoderContext, AttributeEncoderContext};
use crate::error::StunError;
use crate::protocols::{ProtocolNumber, UDP};
use crate::{Decode, Encode};

const REQUESTED_TRANSPORT: u16 = 0x0019;
const REQUESTED_TRANSPORT_SIZE: usize = 4;

// Format of REQUESTED-TRANSPORT:
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |    Protocol   |                    RFFU                       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

/// The [`RequestedTransport`] attribute is used by the client to request a
/// specific transport protocol for the allocated transport address.
///
/// # Examples
///```rust
/// # use turn_rs::attributes::RequestedTransport;
/// # use turn_rs::protocols::UDP;
/// let attr = RequestedTransport::default();
/// assert_eq!(attr.protocol(), UDP);
/// assert_eq!(attr.protocol().as_u8(), 17);
///```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedTransport(ProtocolNumber);

impl RequestedTransport {
    /// Creates a new [`RequestedTransport`] attribute
    pub fn new(protocol: ProtocolNumber) -> Self {
        Self(protocol)
    }

    /// Returns the requested protocol
    pub fn protocol(&self) -> ProtocolNumber {
        self.0
    }
}

impl From<ProtocolNumber> for RequestedTransport {
    fn from(value: ProtocolNumber) -> Self {
        RequestedTransport::new(value)
    }
}

impl Default for RequestedTransport {
    fn default() -> Self {
        RequestedTransport::new(UDP)
    }
}

impl DecodeAttributeValue for RequestedTransport {
    fn decode(ctx: AttributeDecoderContext) -> Result<(Self, usize), StunError> {
        let raw_value = ctx.raw_value();
        check_value_size(raw_value, REQUESTED_TRANSPORT_SIZE)?;
        // RFFU bytes are ignored
        let (protocol, _) = ProtocolNumber::decode(raw_value)?;
        Ok((RequestedTransport(protocol), REQUESTED_TRANSPORT_SIZE))
    }
}

impl EncodeAttributeValue for RequestedTransport {
    fn encode(&self, mut ctx: AttributeEncoderContext) -> Result<usize, StunError> {
        let raw_value = ctx.raw_value_mut();
        check_buffer_boundaries(raw_value, REQUESTED_TRANSPORT_SIZE)?;
        let size = self.0.encode(raw_value)?;
        raw_value[size..REQUESTED_TRANSPORT_SIZE].fill(0);
        Ok(REQUESTED_TRANSPORT_SIZE)
    }
}

stun_attribute!(RequestedTransport, REQUESTED_TRANSPORT);

use crate::attributes::{stun_attribute, DecodeAttributeValue, EncodeAttributeValue};
use crate::common::{check_buffer_boundaries, check_value_size};
use crate::context::{AttributeDecoderContext, AttributeEncoderContext};
use crate::error::{StunError, StunErrorType};
use crate::Decode;
use byteorder::{BigEndian, ByteOrder};

const FINGERPRINT: u16 = 0x8028;
const FINGERPRINT_SIZE: usize = 4;
const FINGERPRINT_XOR_VALUE: u32 = 0x5354_554e;

fn crc32(input: &[u8]) -> u32 {
    crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(input)
}

/// The [`Fingerprint`] attribute is the CRC-32 of the STUN message up to
/// (but excluding) the attribute itself, XOR'ed with `0x5354554e`. When
/// present, it is always the last attribute of the message.
///
/// # Examples
///```rust
/// # use turn_rs::attributes::{AttributeType, Fingerprint, StunAttributeType};
/// let attr = Fingerprint::default();
/// assert_eq!(attr.attribute_type(), AttributeType::from(0x8028));
///```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Fingerprint {
    /// The encodable [`Fingerprint`] attribute, computed when encoded.
    #[default]
    Encodable,
    /// The decoded CRC-32 value, already XOR'ed back.
    Decodable(u32),
}

impl Fingerprint {
    /// Validates the input value with the CRC-32 attribute value
    /// # Arguments:
    /// * `input`- the STUN message up to (but excluding) the FINGERPRINT
    ///   attribute, with the length adjusted to include it.
    /// # Returns:
    /// true if `input` matches the received CRC-32 value.
    pub fn validate(&self, input: &[u8]) -> bool {
        match self {
            Fingerprint::Decodable(value) => *value == crc32(input),
            Fingerprint::Encodable => false,
        }
    }
}

impl From<[u8; FINGERPRINT_SIZE]> for Fingerprint {
    fn from(val: [u8; FINGERPRINT_SIZE]) -> Self {
        Fingerprint::Decodable(BigEndian::read_u32(&val) ^ FINGERPRINT_XOR_VALUE)
    }
}

impl DecodeAttributeValue for Fingerprint {
    fn decode(ctx: AttributeDecoderContext) -> Result<(Self, usize), StunError> {
        let raw_value = ctx.raw_value();
        check_value_size(raw_value, FINGERPRINT_SIZE)?;
        let (value, size) = u32::decode(raw_value)?;
        Ok((Fingerprint::Decodable(value ^ FINGERPRINT_XOR_VALUE), size))
    }
}

impl EncodeAttributeValue for Fingerprint {
    fn encode(&self, mut ctx: AttributeEncoderContext) -> Result<usize, StunError> {
        match self {
            Fingerprint::Encodable => {
                let raw_value = ctx.raw_value_mut();
                check_buffer_boundaries(raw_value, FINGERPRINT_SIZE)?;
                raw_value[..FINGERPRINT_SIZE].fill(0);
                Ok(FINGERPRINT_SIZE)
            }
            Fingerprint::Decodable(_) => Err(StunError::new(
                StunErrorType::InvalidParam,
                "Not encodable attribute",
            )),
        }
    }

    fn post_encode(&self, mut ctx: AttributeEncoderContext) -> Result<(), StunError> {
        match self {
            Fingerprint::Encodable => {
                check_buffer_boundaries(ctx.raw_value_mut(), FINGERPRINT_SIZE)?;
                let value = crc32(ctx.encoded_message()) ^ FINGERPRINT_XOR_VALUE;
                BigEndian::write_u32(ctx.raw_value_mut(), value);
                Ok(())
            }
            Fingerprint::Decodable(_) => Err(StunError::new(
                StunErrorType::InvalidParam,
                "Not encodable attribute",
            )),
        }
    }
}

stun_attribute!(Fingerprint, FINGERPRINT);

use crate::attributes::{stun_attribute, DecodeAttributeValue, EncodeAttributeValue};
use crate::common::{check_buffer_boundaries, check_value_size};
use crate::context::{AttributeDecoderContext, AttributeEncoderContext};
use crate::credentials::HMACKey;
use crate::error::{StunError, StunErrorType};
use hmac_sha1::hmac_sha1;

const MESSAGE_INTEGRITY: u16 = 0x0008;
pub(crate) const MESSAGE_INTEGRITY_SIZE: usize = 20;

/// The [`MessageIntegrity`] attribute contains an `HMAC-SHA1`
/// [`RFC2104`](https://datatracker.ietf.org/doc/html/rfc2104) of the STUN
/// message. The text used as input is the message up to the attribute,
/// with the header length covering the attribute itself.
///
/// # Examples
///```rust
/// # use turn_rs::attributes::{AttributeType, MessageIntegrity, StunAttributeType};
/// # use turn_rs::HMACKey;
/// let key = HMACKey::new_long_term("user", "realm", "pass");
/// let attr = MessageIntegrity::new(key);
/// assert_eq!(attr.attribute_type(), AttributeType::from(0x0008));
///```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageIntegrity {
    /// Encodable version of this attribute, carrying the key the `HMAC`
    /// is computed with when the message is encoded.
    Encodable(HMACKey),
    /// Decodable version of this attribute, carrying the `HMAC` received
    /// from the network.
    Decodable([u8; MESSAGE_INTEGRITY_SIZE]),
}

impl MessageIntegrity {
    /// Creates a new attribute that will be computed with `key`.
    pub fn new(key: HMACKey) -> Self {
        MessageIntegrity::Encodable(key)
    }

    /// Returns the received `HMAC`, if this is a decoded attribute
    pub fn hmac(&self) -> Option<&[u8; MESSAGE_INTEGRITY_SIZE]> {
        match self {
            MessageIntegrity::Decodable(hmac) => Some(hmac),
            MessageIntegrity::Encodable(_) => None,
        }
    }

    /// Validates the message using the `HMAC` value generated from the key
    /// # Arguments:
    /// * `input`- the STUN message up to (but excluding) this attribute,
    ///   with the length adjusted to include it.
    /// * `key`- the [`HMACKey`]
    /// # Returns:
    /// true if the received value matches the computed one.
    pub fn validate(&self, input: &[u8], key: &HMACKey) -> bool {
        match self {
            MessageIntegrity::Decodable(hmac) => hmac_sha1(key.as_bytes(), input) == *hmac,
            MessageIntegrity::Encodable(_) => false,
        }
    }
}

impl From<[u8; MESSAGE_INTEGRITY_SIZE]> for MessageIntegrity {
    fn from(val: [u8; MESSAGE_INTEGRITY_SIZE]) -> Self {
        MessageIntegrity::Decodable(val)
    }
}

impl DecodeAttributeValue for MessageIntegrity {
    fn decode(ctx: AttributeDecoderContext) -> Result<(Self, usize), StunError> {
        let raw_value = ctx.raw_value();
        check_value_size(raw_value, MESSAGE_INTEGRITY_SIZE)?;
        let hmac: [u8; MESSAGE_INTEGRITY_SIZE] = raw_value.try_into()?;
        Ok((MessageIntegrity::Decodable(hmac), MESSAGE_INTEGRITY_SIZE))
    }
}

impl EncodeAttributeValue for MessageIntegrity {
    fn encode(&self, mut ctx: AttributeEncoderContext) -> Result<usize, StunError> {
        match self {
            MessageIntegrity::Encodable(_) => {
                let raw_value = ctx.raw_value_mut();
                check_buffer_boundaries(raw_value, MESSAGE_INTEGRITY_SIZE)?;
                // Computed in post_encode, once the length is known
                raw_value[..MESSAGE_INTEGRITY_SIZE].fill(0);
                Ok(MESSAGE_INTEGRITY_SIZE)
            }
            MessageIntegrity::Decodable(_) => Err(StunError::new(
                StunErrorType::InvalidParam,
                "Not encodable attribute",
            )),
        }
    }

    fn post_encode(&self, mut ctx: AttributeEncoderContext) -> Result<(), StunError> {
        match self {
            MessageIntegrity::Encodable(key) => {
                check_buffer_boundaries(ctx.raw_value_mut(), MESSAGE_INTEGRITY_SIZE)?;
                let hmac = hmac_sha1(key.as_bytes(), ctx.encoded_message());
                ctx.raw_value_mut()[..MESSAGE_INTEGRITY_SIZE].copy_from_slice(&hmac);
                Ok(())
            }
            MessageIntegrity::Decodable(_) => Err(StunError::new(
                StunErrorType::InvalidParam,
                "Not encodable attribute",
            )),
        }
    }
}

stun_attribute!(MessageIntegrity, MESSAGE_INTEGRITY);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransactionId;

    const SHORT_TERM_HMAC: [u8; 20] = [
        0x2b, 0x91, 0xf5, 0x99, 0xfd, 0x9e, 0x90, 0xc3, 0x8c, 0x74, 0x89, 0xf9, 0x2a, 0xf9, 0xba,
        0x53, 0xf0, 0x6b, 0xe7, 0xd7,
    ];

    fn short_term_input() -> Vec<u8> {
        let mut input = turn_vectors::SAMPLE_IPV4_RESPONSE[..48].to_vec();
        // Length covers the attributes up to the end of MESSAGE-INTEGRITY
        input[3] = 0x34;
        input
    }

    #[test]
    fn validate_short_term() {
        let key = HMACKey::new_short_term("VOkJxbRl1RmTxUk/WvJxBt");
        let attr = MessageIntegrity::from(SHORT_TERM_HMAC);
        assert!(attr.validate(&short_term_input(), &key));

        let wrong_key = HMACKey::new_short_term("VOkJxbRl1RmTxUk/WvJxBu");
        assert!(!attr.validate(&short_term_input(), &wrong_key));

        let mut tampered = short_term_input();
        tampered[30] ^= 0x01;
        assert!(!attr.validate(&tampered, &key));

        // Encodable attributes never validate
        assert!(!MessageIntegrity::new(key.clone()).validate(&short_term_input(), &key));
    }

    #[test]
    fn encode_message_integrity() {
        let key = HMACKey::new_short_term("VOkJxbRl1RmTxUk/WvJxBt");
        let attr = MessageIntegrity::new(key);
        let input = short_term_input();

        let mut value = [0xffu8; MESSAGE_INTEGRITY_SIZE];
        let ctx = AttributeEncoderContext::new(&input, &mut value);
        assert_eq!(attr.encode(ctx).expect("Can not encode"), 20);
        assert_eq!(value, [0u8; 20]);

        let ctx = AttributeEncoderContext::new(&input, &mut value);
        attr.post_encode(ctx).expect("Can not post-encode");
        assert_eq!(value, SHORT_TERM_HMAC);

        let mut value = [0xffu8; 19];
        let ctx = AttributeEncoderContext::new(&input, &mut value);
        assert_eq!(
            attr.encode(ctx).expect_err("Error expected"),
            StunErrorType::SmallBuffer
        );

        let mut value = [0xffu8; 20];
        let ctx = AttributeEncoderContext::new(&input, &mut value);
        assert_eq!(
            MessageIntegrity::from(SHORT_TERM_HMAC)
                .encode(ctx)
                .expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }

    #[test]
    fn decode_message_integrity() {
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &SHORT_TERM_HMAC);
        let (attr, size) = MessageIntegrity::decode(ctx).expect("Can not decode");
        assert_eq!(size, 20);
        assert_eq!(attr.hmac(), Some(&SHORT_TERM_HMAC));

        let ctx = AttributeDecoderContext::new(TransactionId::default(), &SHORT_TERM_HMAC[..19]);
        assert_eq!(
            MessageIntegrity::decode(ctx).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }
}

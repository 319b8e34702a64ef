use crate::attributes::{
    EncodeAttributeValue, Fingerprint, MessageIntegrity, Nonce, Realm, Unknown, UserName,
};
use crate::common::{check_buffer_boundaries, fill_padding_value, padding, DEFAULT_PADDING_VALUE};
use crate::credentials::{Credentials, HMACKey};
use crate::error::{StunDecodeError, StunEncodeError, StunError, StunErrorLevel, StunErrorType};
use crate::raw::{
    get_input_text, RawAttributes, RawMessage, ATTRIBUTE_HEADER_SIZE, MESSAGE_HEADER_SIZE,
};
use crate::registry::get_handler;
use crate::types::{MAGIC_COOKIE, TRANSACTION_ID_SIZE};
use crate::{
    AttributeType, Decode, Encode, MessageType, StunAttribute, StunAttributeType, StunMessage,
    StunMessageBuilder, TransactionId,
};
use byteorder::{BigEndian, ByteOrder};
use fallible_iterator::{FallibleIterator, IntoFallibleIterator};
use log::debug;
use std::convert::TryFrom;

/// Builder class used to construct [`DecoderContext`] objects
#[derive(Debug, Default)]
pub struct DecoderContextBuilder(DecoderContext);

impl DecoderContextBuilder {
    /// Configure the builder to use a key to validate MESSAGE-INTEGRITY
    pub fn with_key(mut self, key: HMACKey) -> Self {
        self.0.key = Some(key);
        self
    }

    /// Configure the builder to validate MESSAGE-INTEGRITY with the
    /// long-term key of `credentials`. Without a password or a realm the
    /// context is left without a key and nothing is verified.
    pub fn with_credentials(mut self, credentials: &Credentials) -> Self {
        self.0.key = credentials.verification_key();
        self
    }

    /// Builds a [`DecoderContext`]
    pub fn build(self) -> DecoderContext {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct AttributeDecoderContext<'a> {
    transaction_id: TransactionId,
    raw_value: &'a [u8],
}

impl<'a> AttributeDecoderContext<'a> {
    pub(crate) fn new(transaction_id: TransactionId, raw_value: &'a [u8]) -> Self {
        Self {
            transaction_id,
            raw_value,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn raw_value(&self) -> &'a [u8] {
        self.raw_value
    }
}

/// Context used to decode STUN messages
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct DecoderContext {
    key: Option<HMACKey>,
}

impl DecoderContext {
    /// Key used for integrity hashes
    pub fn key(&self) -> Option<&HMACKey> {
        self.key.as_ref()
    }
}

/// Builder class used to create a stun [`MessageDecoder`]
#[derive(Debug, Default)]
pub struct MessageDecoderBuilder(MessageDecoder);

impl MessageDecoderBuilder {
    /// Adds a context to the builder
    pub fn with_context(mut self, ctx: DecoderContext) -> Self {
        self.0.ctx = ctx;
        self
    }

    /// Builds a [`MessageDecoder`]
    pub fn build(self) -> MessageDecoder {
        self.0
    }
}

/// Class used to decode STUN messages
#[derive(Debug, Default, Clone)]
pub struct MessageDecoder {
    ctx: DecoderContext,
}

// Tracks the attributes that close the integrity-protected part of a message.
#[derive(Debug, Default)]
struct AttributeFilter {
    message_integrity: bool,
    fingerprint: bool,
}

fn ignore_attribute(f: &mut AttributeFilter, attr_type: AttributeType) -> bool {
    if f.fingerprint {
        // Nothing follows FINGERPRINT
        return true;
    }

    if attr_type == Fingerprint::get_type() {
        f.fingerprint = true;
        return false;
    }

    if attr_type == MessageIntegrity::get_type() {
        if f.message_integrity {
            return true;
        }
        f.message_integrity = true;
        return false;
    }

    f.message_integrity
}

fn attribute_error(attr_type: Option<AttributeType>, position: usize, error: StunError) -> StunDecodeError {
    StunDecodeError(StunErrorLevel::attribute(attr_type, position, error))
}

fn verify_attribute(
    attr: &StunAttribute,
    ctx: &DecoderContext,
    buffer: &[u8],
) -> Result<(), StunError> {
    match attr {
        StunAttribute::MessageIntegrity(integrity) => match ctx.key() {
            Some(key) => {
                let input = get_input_text(buffer, MessageIntegrity::get_type().as_u16())?;
                integrity.validate(&input, key).then_some(()).ok_or_else(|| {
                    StunError::new(
                        StunErrorType::IntegrityCheckFailed,
                        "MESSAGE-INTEGRITY does not match",
                    )
                })
            }
            // Nothing to check against
            None => Ok(()),
        },
        StunAttribute::Fingerprint(fingerprint) => {
            let input = get_input_text(buffer, Fingerprint::get_type().as_u16())?;
            fingerprint.validate(&input).then_some(()).ok_or_else(|| {
                StunError::new(
                    StunErrorType::FingerprintMismatch,
                    "FINGERPRINT does not match",
                )
            })
        }
        _ => Ok(()),
    }
}

impl MessageDecoder {
    /// Decodes the STUN raw buffer
    /// # Arguments:
    /// - `buffer` - Raw buffer containing exactly one STUN message
    /// # Returns:
    /// A tuple with [`StunMessage`] itself and the size consumed to decode the message,
    /// or an error describing the problem if the message could not be decoded.
    pub fn decode(&self, buffer: &[u8]) -> Result<(StunMessage, usize), StunDecodeError> {
        let (raw_msg, size) = RawMessage::decode(buffer)
            .map_err(|error| StunDecodeError(StunErrorLevel::message(error)))?;
        let msg_type = MessageType::from(raw_msg.header.msg_type);
        let transaction_id = TransactionId::from(raw_msg.header.transaction_id);
        let mut builder = StunMessageBuilder::new(msg_type.method(), msg_type.class())
            .with_transaction_id(transaction_id);

        let attributes = RawAttributes::from(raw_msg.attributes);
        let mut iter = attributes.into_fallible_iter();
        let mut position = 0;
        let mut filter = AttributeFilter::default();

        while let Some(raw_attr) = iter
            .next()
            .map_err(|error| attribute_error(None, position, error))?
        {
            let attr_type: AttributeType = raw_attr.attr_type.into();

            if ignore_attribute(&mut filter, attr_type) {
                debug!(
                    "Ignoring {} at position {}, it follows the integrity attributes",
                    attr_type, position
                );
                position += 1;
                continue;
            }

            let ctx = AttributeDecoderContext::new(transaction_id, raw_attr.value);
            let attr = match get_handler(attr_type) {
                Some(handler) => {
                    handler(ctx)
                        .map_err(|error| attribute_error(Some(attr_type), position, error))?
                        .0
                }
                None => Unknown::new(attr_type, raw_attr.value).into(),
            };

            verify_attribute(&attr, &self.ctx, buffer)
                .map_err(|error| attribute_error(Some(attr_type), position, error))?;

            builder = builder.with_attribute(attr);
            position += 1;
        }

        Ok((builder.build(), size))
    }

    /// Gets the context associated to this decoder
    pub fn get_context(&self) -> &DecoderContext {
        &self.ctx
    }
}

/// Builder class used to construct [`EncoderContext`] objects
#[derive(Debug, Default)]
pub struct EncoderContextBuilder(EncoderContext);

impl EncoderContextBuilder {
    /// Append a FINGERPRINT attribute at the end of every encoded message
    pub fn with_fingerprint(mut self) -> Self {
        self.0.fingerprint = true;
        self
    }

    /// Builds a [`EncoderContext`]
    pub fn build(self) -> EncoderContext {
        self.0
    }
}

/// Context used to encode STUN messages
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct EncoderContext {
    fingerprint: bool,
}

impl EncoderContext {
    /// Whether a FINGERPRINT attribute is appended to encoded messages
    pub fn fingerprint(&self) -> bool {
        self.fingerprint
    }
}

/// Builder class used to create a stun [`MessageEncoder`]
#[derive(Debug, Default)]
pub struct MessageEncoderBuilder(MessageEncoder);

impl MessageEncoderBuilder {
    /// Adds a context to the builder
    pub fn with_context(mut self, ctx: EncoderContext) -> Self {
        self.0.ctx = ctx;
        self
    }

    /// Builds a [`MessageEncoder`]
    pub fn build(self) -> MessageEncoder {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct AttributeEncoderContext<'a> {
    encoded_msg: &'a [u8],
    raw_value: &'a mut [u8],
}

impl<'a> AttributeEncoderContext<'a> {
    pub(crate) fn new(encoded_msg: &'a [u8], raw_value: &'a mut [u8]) -> Self {
        Self {
            encoded_msg,
            raw_value,
        }
    }

    pub fn encoded_message(&self) -> &'a [u8] {
        self.encoded_msg
    }

    pub fn raw_value_mut(&mut self) -> &mut [u8] {
        self.raw_value
    }

    /// Reads the transaction id from the header already written
    pub fn transaction_id(&self) -> Result<TransactionId, StunError> {
        check_buffer_boundaries(self.encoded_msg, MESSAGE_HEADER_SIZE)?;
        let id = <[u8; TRANSACTION_ID_SIZE]>::try_from(&self.encoded_msg[8..MESSAGE_HEADER_SIZE])?;
        Ok(TransactionId::from(id))
    }
}

/// Class used to encode STUN messages
#[derive(Debug, Default, Clone)]
pub struct MessageEncoder {
    ctx: EncoderContext,
}

const INITIAL_BUFFER_SIZE: usize = 512;
const MAX_MESSAGE_SIZE: usize = MESSAGE_HEADER_SIZE + u16::MAX as usize;

fn message_error(error: StunError) -> StunEncodeError {
    StunEncodeError(StunErrorLevel::message(error))
}

fn encode_attribute_error(attr: &StunAttribute, position: usize, error: StunError) -> StunEncodeError {
    StunEncodeError(StunErrorLevel::attribute(
        Some(attr.attribute_type()),
        position,
        error,
    ))
}

impl MessageEncoder {
    // Attributes appended by the encoder itself, after the explicit ones
    fn trailing_attributes(&self, msg: &StunMessage) -> Result<Vec<StunAttribute>, StunError> {
        let explicit = |attr_type: AttributeType| {
            msg.attributes()
                .iter()
                .any(|attr| attr.attribute_type() == attr_type)
        };
        let mut attributes = Vec::new();

        if let Some(credentials) = msg.credentials() {
            if let Some(key) = credentials.key() {
                if explicit(MessageIntegrity::get_type()) {
                    return Err(StunError::new(
                        StunErrorType::InvalidParam,
                        "MESSAGE-INTEGRITY is added by the encoder when credentials are attached",
                    ));
                }
                attributes.push(UserName::new(credentials.username()).into());
                if let Some(realm) = credentials.realm() {
                    attributes.push(Realm::new(realm).into());
                }
                if let Some(nonce) = credentials.nonce() {
                    attributes.push(Nonce::new(nonce).into());
                }
                attributes.push(MessageIntegrity::new(key).into());
            }
        }

        if self.ctx.fingerprint() {
            if explicit(Fingerprint::get_type()) {
                return Err(StunError::new(
                    StunErrorType::InvalidParam,
                    "FINGERPRINT is added by the encoder",
                ));
            }
            attributes.push(Fingerprint::default().into());
        }

        Ok(attributes)
    }

    /// Encodes a STUN message.
    /// # Arguments:
    /// - `buffer` - Output buffer
    /// - `msg` - The STUN message.
    /// # Returns:
    /// The size in bytes taken to encode the `msg` or a [`StunEncodeError`] describing
    /// the error if the message could not be encoded.
    pub fn encode(&self, buffer: &mut [u8], msg: &StunMessage) -> Result<usize, StunEncodeError> {
        check_buffer_boundaries(buffer, MESSAGE_HEADER_SIZE).map_err(message_error)?;
        let trailing = self.trailing_attributes(msg).map_err(message_error)?;

        MessageType::new(msg.method(), msg.class())
            .encode(buffer)
            .map_err(message_error)?;

        let mut length: usize = 0;
        BigEndian::write_u16(&mut buffer[2..4], 0);
        BigEndian::write_u32(&mut buffer[4..8], MAGIC_COOKIE.as_u32());
        buffer[8..20].copy_from_slice(msg.transaction_id().as_bytes());

        for (position, attr) in msg.attributes().iter().chain(trailing.iter()).enumerate() {
            let (raw_msg, attributes) = buffer.split_at_mut(MESSAGE_HEADER_SIZE + length);

            // Room for attribute type and length
            check_buffer_boundaries(attributes, ATTRIBUTE_HEADER_SIZE)
                .map_err(|error| encode_attribute_error(attr, position, error))?;

            let attr_ctx = AttributeEncoderContext::new(raw_msg, &mut attributes[ATTRIBUTE_HEADER_SIZE..]);
            let value_size = attr
                .encode(attr_ctx)
                .map_err(|error| encode_attribute_error(attr, position, error))?;

            BigEndian::write_u16(&mut attributes[..2], attr.attribute_type().into());
            let value_length = u16::try_from(value_size)
                .map_err(|error| encode_attribute_error(attr, position, error.into()))?;
            BigEndian::write_u16(&mut attributes[2..4], value_length);

            let attr_size = ATTRIBUTE_HEADER_SIZE + value_size;
            let padding_size = padding(value_size);
            fill_padding_value(&mut attributes[attr_size..], padding_size, DEFAULT_PADDING_VALUE)
                .map_err(|error| encode_attribute_error(attr, position, error))?;

            // The length always reflects the attributes written so far
            length += attr_size + padding_size;
            let msg_length = u16::try_from(length)
                .map_err(|error| encode_attribute_error(attr, position, error.into()))?;
            BigEndian::write_u16(&mut raw_msg[2..4], msg_length);

            // Post process (only attribute value)
            let coded_value = &mut attributes[ATTRIBUTE_HEADER_SIZE..attr_size];
            let ctx = AttributeEncoderContext::new(raw_msg, coded_value);
            attr.post_encode(ctx)
                .map_err(|error| encode_attribute_error(attr, position, error))?;
        }

        Ok(MESSAGE_HEADER_SIZE + length)
    }

    /// Encodes a STUN message into a newly allocated vector sized to fit.
    pub fn encode_to_vec(&self, msg: &StunMessage) -> Result<Vec<u8>, StunEncodeError> {
        let mut capacity = INITIAL_BUFFER_SIZE;
        loop {
            let mut buffer = vec![0u8; capacity];
            match self.encode(&mut buffer, msg) {
                Ok(size) => {
                    buffer.truncate(size);
                    return Ok(buffer);
                }
                Err(e) if e.error_type() == StunErrorType::SmallBuffer && capacity < MAX_MESSAGE_SIZE => {
                    capacity = (capacity * 2).min(MAX_MESSAGE_SIZE);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Gets the context associated to this encoder
    pub fn get_context(&self) -> &EncoderContext {
        &self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{LifeTime, RequestedTransport, XorMappedAddress};
    use crate::methods::{ALLOCATE, BINDING};
    use crate::MessageClass;
    use std::net::SocketAddr;
    use std::str::FromStr;

    #[test]
    fn test_ignore_attribute() {
        let mut filter = AttributeFilter::default();
        assert!(!ignore_attribute(&mut filter, XorMappedAddress::get_type()));
        assert!(!ignore_attribute(&mut filter, MessageIntegrity::get_type()));
        assert!(ignore_attribute(&mut filter, UserName::get_type()));
        assert!(ignore_attribute(&mut filter, MessageIntegrity::get_type()));
        assert!(!ignore_attribute(&mut filter, Fingerprint::get_type()));
        assert!(ignore_attribute(&mut filter, UserName::get_type()));
        assert!(ignore_attribute(&mut filter, Fingerprint::get_type()));

        let mut filter = AttributeFilter::default();
        assert!(!ignore_attribute(&mut filter, Realm::get_type()));
        assert!(!ignore_attribute(&mut filter, Fingerprint::get_type()));
        assert!(ignore_attribute(&mut filter, MessageIntegrity::get_type()));
        assert!(ignore_attribute(&mut filter, Realm::get_type()));
    }

    #[test]
    fn encode_header_only() {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_transaction_id(TransactionId::from([0x01; 12]))
            .build();
        let mut buffer = [0xffu8; 20];
        let size = MessageEncoder::default()
            .encode(&mut buffer, &msg)
            .expect("Can not encode");
        assert_eq!(size, 20);
        assert_eq!(
            buffer[..8],
            [0x00, 0x01, 0x00, 0x00, 0x21, 0x12, 0xA4, 0x42]
        );
        assert_eq!(buffer[8..], [0x01; 12]);
    }

    #[test]
    fn encode_small_buffer() {
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
            .with_attribute(RequestedTransport::default())
            .build();

        let mut buffer = [0u8; 19];
        let error = MessageEncoder::default()
            .encode(&mut buffer, &msg)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::SmallBuffer);
        assert!(matches!(error.0, StunErrorLevel::Message(_)));

        let mut buffer = [0u8; 26];
        let error = MessageEncoder::default()
            .encode(&mut buffer, &msg)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::SmallBuffer);
        assert!(matches!(error.0, StunErrorLevel::Attribute(_)));
    }

    #[test]
    fn encode_value_too_long() {
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
            .with_attribute(Nonce::new("x".repeat(70000)))
            .build();
        let error = MessageEncoder::default()
            .encode_to_vec(&msg)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::SmallBuffer);

        let mut buffer = vec![0u8; 80000];
        let error = MessageEncoder::default()
            .encode(&mut buffer, &msg)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::ValueTooLong);
    }

    #[test]
    fn encode_padding_and_length() {
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
            .with_attribute(Realm::new("example.org"))
            .with_attribute(LifeTime::new(600))
            .build();
        let buffer = MessageEncoder::default()
            .encode_to_vec(&msg)
            .expect("Can not encode");
        assert_eq!(buffer.len(), 20 + 16 + 8);
        assert_eq!(buffer[2..4], [0x00, 0x18]);
        // Padding byte after the 11 bytes realm
        assert_eq!(buffer[35], 0x00);
    }

    #[test]
    fn encode_with_credentials() {
        let credentials = Credentials::new("user", "pass")
            .with_realm("example.org")
            .with_nonce("abc123");
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
            .with_attribute(RequestedTransport::default())
            .with_credentials(credentials.clone())
            .build();
        let encoder = MessageEncoderBuilder::default()
            .with_context(EncoderContextBuilder::default().with_fingerprint().build())
            .build();
        let buffer = encoder.encode_to_vec(&msg).expect("Can not encode");

        let ctx = DecoderContextBuilder::default()
            .with_credentials(&credentials)
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let (decoded, size) = decoder.decode(&buffer).expect("Can not decode");
        assert_eq!(size, buffer.len());

        let types: Vec<u16> = decoded
            .attributes()
            .iter()
            .map(|attr| attr.attribute_type().as_u16())
            .collect();
        assert_eq!(
            types,
            [0x0019, 0x0006, 0x0014, 0x0015, 0x0008, 0x8028]
        );
    }

    #[test]
    fn encode_explicit_integrity_with_credentials() {
        let credentials = Credentials::new("user", "pass").with_realm("example.org");
        let key = credentials.key().expect("No key");
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
            .with_attribute(MessageIntegrity::new(key))
            .with_credentials(credentials)
            .build();
        let error = MessageEncoder::default()
            .encode_to_vec(&msg)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::InvalidParam);

        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
            .with_attribute(Fingerprint::default())
            .build();
        let encoder = MessageEncoderBuilder::default()
            .with_context(EncoderContextBuilder::default().with_fingerprint().build())
            .build();
        assert_eq!(
            encoder.encode_to_vec(&msg).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }

    #[test]
    fn encode_credentials_without_realm() {
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
            .with_attribute(RequestedTransport::default())
            .with_credentials(Credentials::new("user", "pass"))
            .build();
        let buffer = MessageEncoder::default()
            .encode_to_vec(&msg)
            .expect("Can not encode");
        // Only REQUESTED-TRANSPORT
        assert_eq!(buffer.len(), 28);
    }

    #[test]
    fn decode_integrity_failure() {
        let credentials = Credentials::new("user", "pass")
            .with_realm("example.org")
            .with_nonce("abc123");
        let addr = SocketAddr::from_str("1.2.3.4:5000").expect("Can not parse address");
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::SuccessResponse)
            .with_attribute(XorMappedAddress::from(addr))
            .with_credentials(credentials.clone())
            .build();
        let mut buffer = MessageEncoder::default()
            .encode_to_vec(&msg)
            .expect("Can not encode");

        // Wrong password
        let ctx = DecoderContextBuilder::default()
            .with_credentials(&Credentials::new("user", "wrong").with_realm("example.org"))
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let error = decoder.decode(&buffer).expect_err("Error expected");
        assert_eq!(error, StunErrorType::IntegrityCheckFailed);

        // No key, no check
        let (decoded, _) = MessageDecoder::default()
            .decode(&buffer)
            .expect("Can not decode");
        assert!(decoded.get::<MessageIntegrity>().is_some());

        // Tampered address
        buffer[27] ^= 0x01;
        let ctx = DecoderContextBuilder::default()
            .with_credentials(&credentials)
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let error = decoder.decode(&buffer).expect_err("Error expected");
        assert_eq!(error, StunErrorType::IntegrityCheckFailed);
        match error.0 {
            StunErrorLevel::Attribute(e) => {
                assert_eq!(e.attr_type, Some(MessageIntegrity::get_type()));
                assert_eq!(e.position, 4);
            }
            StunErrorLevel::Message(_) => panic!("Attribute level error expected"),
        }
    }

    #[test]
    fn decode_integrity_requires_password() {
        let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::SuccessResponse)
            .with_attribute(Realm::new("example.org"))
            .with_attribute(MessageIntegrity::new(HMACKey::new_long_term(
                "",
                "example.org",
                "pass",
            )))
            .build();
        let buffer = MessageEncoder::default()
            .encode_to_vec(&msg)
            .expect("Can not encode");

        // Verified even without a user name
        let ctx = DecoderContextBuilder::default()
            .with_credentials(&Credentials::new("", "pass").with_realm("example.org"))
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        assert!(decoder.decode(&buffer).is_ok());

        let ctx = DecoderContextBuilder::default()
            .with_credentials(&Credentials::new("", "other").with_realm("example.org"))
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let error = decoder.decode(&buffer).expect_err("Error expected");
        assert_eq!(error, StunErrorType::IntegrityCheckFailed);

        // Empty password, nothing is verified
        let ctx = DecoderContextBuilder::default()
            .with_credentials(&Credentials::new("user", "").with_realm("example.org"))
            .build();
        assert!(ctx.key().is_none());
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let (decoded, _) = decoder.decode(&buffer).expect("Can not decode");
        assert!(decoded.get::<MessageIntegrity>().is_some());
    }

    #[test]
    fn decode_fingerprint_mismatch() {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_attribute(Realm::new("example.org"))
            .build();
        let encoder = MessageEncoderBuilder::default()
            .with_context(EncoderContextBuilder::default().with_fingerprint().build())
            .build();
        let mut buffer = encoder.encode_to_vec(&msg).expect("Can not encode");
        assert!(MessageDecoder::default().decode(&buffer).is_ok());

        let last = buffer.len() - 1;
        buffer[last] ^= 0xff;
        assert_eq!(
            MessageDecoder::default()
                .decode(&buffer)
                .expect_err("Error expected"),
            StunErrorType::FingerprintMismatch
        );
    }

    #[test]
    fn decode_ignores_attributes_after_integrity() {
        let buffer = [
            0x01, 0x03, 0x00, 0x24, // Allocate success response, 36 bytes
            0x21, 0x12, 0xA4, 0x42, // Magic cookie
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x07, 0x08, // } Transaction ID
            0x09, 0x0A, 0x0B, 0x0C, // }
            0x00, 0x08, 0x00, 0x14, // MESSAGE-INTEGRITY attribute header
            0x00, 0x00, 0x00, 0x00, // }
            0x00, 0x00, 0x00, 0x00, // }
            0x00, 0x00, 0x00, 0x00, // }  HMAC-SHA1 (never verified, no key)
            0x00, 0x00, 0x00, 0x00, // }
            0x00, 0x00, 0x00, 0x00, // }
            0x00, 0x20, 0x00, 0x08, // XOR-MAPPED-ADDRESS with a bad family
            0x00, 0x07, 0x00, 0x00, // }
            0x00, 0x00, 0x00, 0x00, // }
        ];
        let (msg, size) = MessageDecoder::default()
            .decode(&buffer)
            .expect("Can not decode");
        assert_eq!(size, buffer.len());
        assert_eq!(msg.attributes().len(), 1);
        assert!(msg.get::<XorMappedAddress>().is_none());
    }

    #[test]
    fn decode_attribute_errors() {
        let buffer = [
            0x01, 0x03, 0x00, 0x0C, // Allocate success response, 12 bytes
            0x21, 0x12, 0xA4, 0x42, // Magic cookie
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x07, 0x08, // } Transaction ID
            0x09, 0x0A, 0x0B, 0x0C, // }
            0x00, 0x16, 0x00, 0x08, // XOR-RELAYED-ADDRESS with IPv6 family
            0x00, 0x02, 0x00, 0x00, // }
            0x00, 0x00, 0x00, 0x00, // }
        ];
        let error = MessageDecoder::default()
            .decode(&buffer)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::MalformedAddress);

        let buffer = [
            0x01, 0x03, 0x00, 0x08, // Allocate success response, 8 bytes
            0x21, 0x12, 0xA4, 0x42, // Magic cookie
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x07, 0x08, // } Transaction ID
            0x09, 0x0A, 0x0B, 0x0C, // }
            0x00, 0x16, 0x00, 0x08, // XOR-RELAYED-ADDRESS running past the message
            0x00, 0x01, 0x00, 0x00, // }
        ];
        let error = MessageDecoder::default()
            .decode(&buffer)
            .expect_err("Error expected");
        assert_eq!(error, StunErrorType::TruncatedMessage);
    }
}

use crate::common::{check_buffer_boundaries, padding};
use crate::error::{StunError, StunErrorType};
use crate::types::{MAGIC_COOKIE, MAGIC_COOKIE_SIZE, TRANSACTION_ID_SIZE};
use crate::Decode;
use byteorder::{BigEndian, ByteOrder};
use fallible_iterator::{FallibleIterator, IntoFallibleIterator};
use std::convert::{TryFrom, TryInto};

// Stun message format
//       0                   1                   2                   3
//       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//      |0 0|     STUN Message Type     |         Message Length        |
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//      |                         Magic Cookie                          |
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//      |                                                               |
//      |                     Transaction ID (96 bits)                  |
//      |                                                               |
//      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

/// STUN message header size
pub const MESSAGE_HEADER_SIZE: usize = 20;
pub(crate) const ATTRIBUTE_HEADER_SIZE: usize = 4;

/// The STUN message header
#[derive(Debug, PartialEq, Eq)]
pub struct MessageHeader<'a> {
    /// The value of the most significant 2 bits
    pub bits: u8,
    /// Message type
    pub msg_type: u16,
    /// Message length
    pub msg_length: u16,
    /// Magic cookie
    pub cookie: &'a [u8; MAGIC_COOKIE_SIZE],
    /// Transaction Id
    pub transaction_id: &'a [u8; TRANSACTION_ID_SIZE],
}

impl<'a> TryFrom<&'a [u8; MESSAGE_HEADER_SIZE]> for MessageHeader<'a> {
    type Error = StunError;
    fn try_from(buff: &'a [u8; MESSAGE_HEADER_SIZE]) -> Result<Self, Self::Error> {
        let (header, _) = MessageHeader::decode(buff)?;
        Ok(header)
    }
}

impl<'a> Decode<'a> for MessageHeader<'a> {
    fn decode(buffer: &'a [u8]) -> Result<(Self, usize), StunError> {
        check_buffer_boundaries(buffer, MESSAGE_HEADER_SIZE)?;

        let msg_type = BigEndian::read_u16(&buffer[..2]);
        let bits: u8 = (msg_type >> 14).try_into()?;
        let msg_type = msg_type & 0x3FFF;
        let msg_length = BigEndian::read_u16(&buffer[2..4]);

        let cookie = <&[u8; MAGIC_COOKIE_SIZE]>::try_from(&buffer[4..8])?;
        let transaction_id = <&[u8; TRANSACTION_ID_SIZE]>::try_from(&buffer[8..20])?;

        Ok((
            Self {
                bits,
                msg_type,
                msg_length,
                cookie,
                transaction_id,
            },
            MESSAGE_HEADER_SIZE,
        ))
    }
}

/// A framed STUN message whose attributes are still undecoded.
#[derive(Debug)]
pub struct RawMessage<'a> {
    /// Message header
    pub header: MessageHeader<'a>,
    /// Attributes
    pub attributes: &'a [u8],
}

impl<'a> Decode<'a> for RawMessage<'a> {
    fn decode(buffer: &'a [u8]) -> Result<(Self, usize), StunError> {
        if buffer.len() < MESSAGE_HEADER_SIZE {
            return Err(StunError::new(
                StunErrorType::TruncatedMessage,
                format!(
                    "{} bytes can not hold a {} bytes header",
                    buffer.len(),
                    MESSAGE_HEADER_SIZE
                ),
            ));
        }
        let (header, _) = MessageHeader::decode(buffer)?;

        if header.bits != 0 || MAGIC_COOKIE != header.cookie {
            return Err(StunError::new(
                StunErrorType::NotStunMessage,
                format!(
                    "Leading bits {:#04b}, cookie {:02X?}",
                    header.bits, header.cookie
                ),
            ));
        }

        if header.msg_length % 4 != 0 {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                format!(
                    "Message length {} is not a multiple of 4",
                    header.msg_length
                ),
            ));
        }

        let value_size: usize = MESSAGE_HEADER_SIZE + header.msg_length as usize;
        if buffer.len() < value_size {
            return Err(StunError::new(
                StunErrorType::TruncatedMessage,
                format!(
                    "Header declares {} bytes, buffer size: {}",
                    value_size,
                    buffer.len()
                ),
            ));
        }
        if buffer.len() > value_size {
            return Err(StunError::new(
                StunErrorType::TrailingBytes,
                format!(
                    "Header declares {} bytes, buffer size: {}",
                    value_size,
                    buffer.len()
                ),
            ));
        }
        let attributes = &buffer[MESSAGE_HEADER_SIZE..value_size];

        Ok((Self { header, attributes }, value_size))
    }
}

// Format of STUN Attributes:
//      0                   1                   2                   3
//      0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |         Type                  |            Length             |
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//     |                         Value (variable)                ....
//     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, PartialEq, Eq)]
pub struct RawAttribute<'a> {
    /// Attribute type
    pub attr_type: u16,
    /// Attribute value of size equal to Length
    pub value: &'a [u8],
}

fn truncated_attribute(required: usize, available: usize) -> StunError {
    StunError::new(
        StunErrorType::TruncatedMessage,
        format!(
            "Attribute requires {} bytes, {} bytes left",
            required, available
        ),
    )
}

impl<'a> Decode<'a> for RawAttribute<'a> {
    fn decode(buffer: &'a [u8]) -> Result<(Self, usize), StunError> {
        if buffer.len() < ATTRIBUTE_HEADER_SIZE {
            return Err(truncated_attribute(ATTRIBUTE_HEADER_SIZE, buffer.len()));
        }
        let attr_type = BigEndian::read_u16(&buffer[..2]);
        let attr_length = BigEndian::read_u16(&buffer[2..4]);

        // 2 Bytes (Type) + 2 Bytes (Length) + Length value
        let value_size: usize = ATTRIBUTE_HEADER_SIZE + attr_length as usize;
        if buffer.len() < value_size {
            return Err(truncated_attribute(value_size, buffer.len()));
        }

        let value = &buffer[ATTRIBUTE_HEADER_SIZE..value_size];

        Ok((Self { attr_type, value }, value_size))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RawAttributes<'a>(&'a [u8]);

impl<'a> From<&'a [u8]> for RawAttributes<'a> {
    fn from(buff: &'a [u8]) -> Self {
        RawAttributes(buff)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RawAttributesIter<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> RawAttributesIter<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl<'a> FallibleIterator for RawAttributesIter<'a> {
    type Item = RawAttribute<'a>;
    type Error = StunError;

    fn next(&mut self) -> Result<Option<Self::Item>, Self::Error> {
        if self.pos == self.buffer.len() {
            return Ok(None);
        }

        let (attr, value_size) = RawAttribute::decode(&self.buffer[self.pos..])?;
        let size = value_size + padding(value_size);
        self.pos += size;

        (self.pos <= self.buffer.len())
            .then_some(Some(attr))
            .ok_or_else(|| {
                truncated_attribute(size, self.buffer.len() - (self.pos - size))
            })
    }
}

impl<'a> IntoFallibleIterator for RawAttributes<'a> {
    type Item = RawAttribute<'a>;
    type Error = StunError;
    type IntoFallibleIter = RawAttributesIter<'a>;

    fn into_fallible_iter(self) -> Self::IntoFallibleIter {
        RawAttributesIter {
            buffer: self.0,
            pos: 0,
        }
    }
}

/// Returns the STUN message up to, and excluding, the first attribute of
/// type `attr_type`, with the header length adjusted to end where that
/// attribute ends. This is the input text of MESSAGE-INTEGRITY and
/// FINGERPRINT.
pub(crate) fn get_input_text(buffer: &[u8], attr_type: u16) -> Result<Vec<u8>, StunError> {
    let (raw_msg, _) = RawMessage::decode(buffer)?;

    let attributes = RawAttributes::from(raw_msg.attributes);
    let mut iter = attributes.into_fallible_iter();
    let mut pos = 0;
    let mut len = None;

    while let Some(raw_attr) = iter.next()? {
        if attr_type == raw_attr.attr_type {
            len = Some(iter.pos());
            break;
        } else {
            pos = iter.pos();
        }
    }

    let len: usize = len.ok_or_else(|| {
        StunError::new(
            StunErrorType::InvalidParam,
            format!("Attribute type '{:#06x}' not found", attr_type),
        )
    })?;
    let index = pos + MESSAGE_HEADER_SIZE;
    check_buffer_boundaries(buffer, index)?;
    let mut out = buffer[..index].to_vec();

    BigEndian::write_u16(&mut out[2..4], len.try_into()?);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_header() {
        let header = [
            0x80, 0x01, 0x00, 0x58, // Request type and message length
            0x21, 0x12, 0xa4, 0x42, // Magic cookie
            0xb7, 0xe7, 0xa7, 0x01, // }
            0xbc, 0x34, 0xd6, 0x86, // }  Transaction ID
            0xfa, 0x87, 0xdf, 0xae, // }
        ];
        let header = MessageHeader::try_from(&header).expect("Can not get STUN header");
        assert_eq!(header.bits, 0x02);
        assert_eq!(header.msg_type, 0x01);
        assert_eq!(header.msg_length, 0x58);
        assert!(MAGIC_COOKIE.eq(&header.cookie));
        assert_eq!(
            header.transaction_id,
            &[0xb7, 0xe7, 0xa7, 0x01, 0xbc, 0x34, 0xd6, 0x86, 0xfa, 0x87, 0xdf, 0xae]
        );
    }

    #[test]
    fn decode_message() {
        let buffer = [
            0x01, 0x13, 0x00, 0x00, // Allocate error response, no attributes
            0x21, 0x12, 0xA4, 0x42, // Magic cookie
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x07, 0x08, // } Transaction ID
            0x09, 0x0A, 0x0B, 0x0C, // }
        ];
        let (msg, size) = RawMessage::decode(&buffer).expect("Can not decode Stun Message");
        assert_eq!(size, buffer.len());
        assert!(msg.attributes.is_empty());

        let buffer = [
            0x01, 0x13, 0x00, 0x10, // Allocate error response, 16 bytes of attributes
            0x21, 0x12, 0xA4, 0x42, // Magic cookie
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x07, 0x08, // } Transaction ID
            0x09, 0x0A, 0x0B, 0x0C, // }
            0x00, 0x14, 0x00, 0x0B, // REALM attribute header
            0x65, 0x78, 0x61, 0x6D, // }
            0x70, 0x6c, 0x65, 0x2e, // }  Realm value (11 bytes) and padding (1 byte)
            0x6f, 0x72, 0x67, 0x00, // }
        ];
        let (msg, size) = RawMessage::decode(&buffer).expect("Can not decode Stun Message");
        assert_eq!(size, buffer.len());
        assert_eq!(msg.attributes.len(), 16);
    }

    #[test]
    fn decode_message_framing_errors() {
        let header = [
            0x00, 0x01, 0x00, 0x00, // Binding request, no attributes
            0x21, 0x12, 0xA4, 0x42, // Magic cookie
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x07, 0x08, // } Transaction ID
            0x09, 0x0A, 0x0B, 0x0C, // }
        ];

        // Empty buffer and short header
        assert_eq!(
            RawMessage::decode(&[]).expect_err("Error expected"),
            StunErrorType::TruncatedMessage
        );
        assert_eq!(
            RawMessage::decode(&header[..19]).expect_err("Error expected"),
            StunErrorType::TruncatedMessage
        );

        // Leading bits set
        let mut buffer = header;
        buffer[0] = 0x40;
        assert_eq!(
            RawMessage::decode(&buffer).expect_err("Error expected"),
            StunErrorType::NotStunMessage
        );

        // Wrong cookie
        let mut buffer = header;
        buffer[7] = 0x43;
        assert_eq!(
            RawMessage::decode(&buffer).expect_err("Error expected"),
            StunErrorType::NotStunMessage
        );

        // Length not multiple of 4
        let mut buffer = header;
        buffer[3] = 0x02;
        assert_eq!(
            RawMessage::decode(&buffer).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );

        // Length bigger than the buffer
        let mut buffer = header;
        buffer[3] = 0x04;
        assert_eq!(
            RawMessage::decode(&buffer).expect_err("Error expected"),
            StunErrorType::TruncatedMessage
        );

        // Extra bytes after the message
        let mut buffer = header.to_vec();
        buffer.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            RawMessage::decode(&buffer).expect_err("Error expected"),
            StunErrorType::TrailingBytes
        );
    }

    #[test]
    fn raw_attributes_iterator() {
        let attributes = [
            0x00, 0x14, 0x00, 0x0B, // REALM attribute header
            0x65, 0x78, 0x61, 0x6D, // }
            0x70, 0x6c, 0x65, 0x2e, // }  Realm value (11 bytes) and padding (1 byte)
            0x6f, 0x72, 0x67, 0xff, // }
            0x00, 0x0D, 0x00, 0x04, // LIFETIME attribute header
            0x00, 0x00, 0x02, 0x58, // 600 seconds
        ];
        let mut iter = RawAttributes::from(&attributes[..]).into_fallible_iter();

        let attr = iter.next().expect("Error").expect("No attribute");
        assert_eq!(attr.attr_type, 0x0014);
        assert_eq!(attr.value, b"example.org");
        assert_eq!(iter.pos(), 16);

        let attr = iter.next().expect("Error").expect("No attribute");
        assert_eq!(attr.attr_type, 0x000D);
        assert_eq!(attr.value, &[0x00, 0x00, 0x02, 0x58]);
        assert_eq!(iter.pos(), 24);

        assert!(iter.next().expect("Error").is_none());
    }

    #[test]
    fn raw_attributes_truncated() {
        // Length runs past the buffer
        let attributes = [0x00, 0x14, 0x00, 0x0B, 0x65, 0x78, 0x61, 0x6D];
        let mut iter = RawAttributes::from(&attributes[..]).into_fallible_iter();
        assert_eq!(
            iter.next().expect_err("Error expected"),
            StunErrorType::TruncatedMessage
        );

        // Value fits but padding does not
        let attributes = [0x00, 0x14, 0x00, 0x03, 0x65, 0x78, 0x61];
        let mut iter = RawAttributes::from(&attributes[..]).into_fallible_iter();
        assert_eq!(
            iter.next().expect_err("Error expected"),
            StunErrorType::TruncatedMessage
        );

        // Incomplete attribute header
        let attributes = [0x00, 0x14];
        let mut iter = RawAttributes::from(&attributes[..]).into_fallible_iter();
        assert_eq!(
            iter.next().expect_err("Error expected"),
            StunErrorType::TruncatedMessage
        );
    }

    #[test]
    fn input_text() {
        let buffer = [
            0x00, 0x01, 0x00, 0x10, // Binding request, 16 bytes of attributes
            0x21, 0x12, 0xA4, 0x42, // Magic cookie
            0x01, 0x02, 0x03, 0x04, // }
            0x05, 0x06, 0x07, 0x08, // } Transaction ID
            0x09, 0x0A, 0x0B, 0x0C, // }
            0x00, 0x0D, 0x00, 0x04, // LIFETIME attribute header
            0x00, 0x00, 0x02, 0x58, // 600 seconds
            0x80, 0x28, 0x00, 0x04, // FINGERPRINT attribute header
            0x00, 0x00, 0x00, 0x00, // CRC32
        ];
        let input = get_input_text(&buffer, 0x8028).expect("Can not get input text");
        assert_eq!(input.len(), 28);
        // Length covers the LIFETIME and the FINGERPRINT attributes
        assert_eq!(&input[2..4], &[0x00, 0x10]);
        assert_eq!(&input[4..], &buffer[4..28]);

        let input = get_input_text(&buffer, 0x000D).expect("Can not get input text");
        assert_eq!(input.len(), 20);
        assert_eq!(&input[2..4], &[0x00, 0x08]);

        assert_eq!(
            get_input_text(&buffer, 0x0008).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }
}

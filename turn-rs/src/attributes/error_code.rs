use crate::attributes::{stun_attribute, DecodeAttributeValue, EncodeAttributeValue};
use crate::common::check_buffer_boundaries;
use crate::context::{AttributeDecoderContext, AttributeEncoderContext};
use crate::error::{StunError, StunErrorType};
use crate::{Decode, Encode};
use std::fmt;

const ERROR_CODE: u16 = 0x0009;
const ERROR_CODE_HEADER_SIZE: usize = 4;
const MIN_ERROR_CODE: u16 = 300;
const MAX_ERROR_CODE: u16 = 699;

// Format of Error-Code Attribute:
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |           Reserved, should be 0         |  C  |     Number    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |      Reason Phrase (variable)                                ..
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

/// The ERROR-CODE attribute is used in error response messages. It
/// contains a numeric error code value in the range of 300 to 699 plus a
/// textual reason phrase encoded in UTF-8.
///
/// # Examples
///```rust
/// # use turn_rs::attributes::ErrorCode;
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let attr = ErrorCode::new(438, "Stale Nonce")?;
/// assert_eq!(attr.class(), 4);
/// assert_eq!(attr.number(), 38);
/// assert_eq!(attr.code(), 438);
/// assert_eq!(attr.reason(), "Stale Nonce");
/// #  Ok(())
/// # }
///```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    class: u8,
    number: u8,
    reason: String,
}

impl ErrorCode {
    /// Creates a new [`ErrorCode`] attribute.
    /// # Returns:
    /// The attribute or an [`InvalidParam`](crate::StunErrorType::InvalidParam)
    /// error if `code` is not in the range 300..=699.
    pub fn new<S>(code: u16, reason: S) -> Result<Self, StunError>
    where
        S: Into<String>,
    {
        if !(MIN_ERROR_CODE..=MAX_ERROR_CODE).contains(&code) {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                format!(
                    "Error code {} out of range [{}, {}]",
                    code, MIN_ERROR_CODE, MAX_ERROR_CODE
                ),
            ));
        }
        Ok(Self {
            class: (code / 100).try_into()?,
            number: (code % 100).try_into()?,
            reason: reason.into(),
        })
    }

    /// Returns the error class (hundreds digit)
    pub fn class(&self) -> u8 {
        self.class
    }

    /// Returns the error number (code modulo 100)
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Returns the numeric error code
    pub fn code(&self) -> u16 {
        self.class as u16 * 100 + self.number as u16
    }

    /// Returns the reason phrase
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason)
    }
}

impl DecodeAttributeValue for ErrorCode {
    fn decode(ctx: AttributeDecoderContext) -> Result<(Self, usize), StunError> {
        let raw_value = ctx.raw_value();
        check_buffer_boundaries(raw_value, ERROR_CODE_HEADER_SIZE)?;

        // Reserved bits are ignored
        let class = raw_value[2] & 0x07;
        let number = raw_value[3];
        if !(3..=6).contains(&class) || number > 99 {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                format!("Invalid error class {} or number {}", class, number),
            ));
        }

        let (reason, size) = <&str>::decode(&raw_value[ERROR_CODE_HEADER_SIZE..])?;
        Ok((
            Self {
                class,
                number,
                reason: reason.to_string(),
            },
            ERROR_CODE_HEADER_SIZE + size,
        ))
    }
}

impl EncodeAttributeValue for ErrorCode {
    fn encode(&self, mut ctx: AttributeEncoderContext) -> Result<usize, StunError> {
        let raw_value = ctx.raw_value_mut();
        check_buffer_boundaries(raw_value, ERROR_CODE_HEADER_SIZE)?;
        raw_value[..2].fill(0);
        raw_value[2] = self.class;
        raw_value[3] = self.number;
        let size = self
            .reason
            .as_str()
            .encode(&mut raw_value[ERROR_CODE_HEADER_SIZE..])?;
        Ok(ERROR_CODE_HEADER_SIZE + size)
    }
}

stun_attribute!(ErrorCode, ERROR_CODE);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransactionId;

    #[test]
    fn error_code_constructor() {
        let attr = ErrorCode::new(401, "Unauthorized").expect("Can not create error code");
        assert_eq!(attr.class(), 4);
        assert_eq!(attr.number(), 1);
        assert_eq!(attr.code(), 401);
        assert_eq!(format!("{}", attr), "401 Unauthorized");

        assert!(ErrorCode::new(300, "").is_ok());
        assert!(ErrorCode::new(699, "").is_ok());
        assert_eq!(
            ErrorCode::new(299, "").expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
        assert_eq!(
            ErrorCode::new(700, "").expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }

    #[test]
    fn decode_error_code() {
        let value = [
            0xff, 0xff, 0xfc, 0x26, // Reserved bits set, class 4, number 38
            0x53, 0x74, 0x61, 0x6c, // "Stal"
            0x65, // "e"
        ];
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &value);
        let (attr, size) = ErrorCode::decode(ctx).expect("Can not decode ERROR-CODE");
        assert_eq!(size, 9);
        assert_eq!(attr.code(), 438);
        assert_eq!(attr.reason(), "Stale");
    }

    #[test]
    fn decode_error_code_invalid() {
        // Class 2
        let value = [0x00, 0x00, 0x02, 0x00];
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &value);
        assert_eq!(
            ErrorCode::decode(ctx).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );

        // Number 100
        let value = [0x00, 0x00, 0x04, 0x64];
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &value);
        assert_eq!(
            ErrorCode::decode(ctx).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );

        // Too short
        let value = [0x00, 0x00, 0x04];
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &value);
        assert_eq!(
            ErrorCode::decode(ctx).expect_err("Error expected"),
            StunErrorType::SmallBuffer
        );
    }

    #[test]
    fn encode_error_code() {
        let attr = ErrorCode::new(438, "Stale").expect("Can not create error code");
        let mut value = [0xffu8; 9];
        let ctx = AttributeEncoderContext::new(&[], &mut value);
        assert_eq!(attr.encode(ctx).expect("Can not encode ERROR-CODE"), 9);
        assert_eq!(
            value,
            [0x00, 0x00, 0x04, 0x26, 0x53, 0x74, 0x61, 0x6c, 0x65]
        );

        let mut value = [0xffu8; 3];
        let ctx = AttributeEncoderContext::new(&[], &mut value);
        assert_eq!(
            attr.encode(ctx).expect_err("Error expected"),
            StunErrorType::SmallBuffer
        );
    }
}

//! STUN/TURN Errors.
//! This module contains the errors that can happen when encoding or
//! decoding messages.

use std::error;
use std::fmt;

use crate::AttributeType;

/// Defines the type of error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunErrorType {
    /// Invalid parameter
    InvalidParam,
    /// Failure to perform validations
    ValidationFailed,
    /// Encoded or decoded value is bigger than the maximum allowed value
    ValueTooLong,
    /// Small buffer
    SmallBuffer,
    /// The buffer does not carry the STUN magic cookie or the leading
    /// two bits of the header are not zero
    NotStunMessage,
    /// Fewer bytes are available than the header or an attribute declares
    TruncatedMessage,
    /// More bytes are available than the header declares
    TrailingBytes,
    /// Address family unknown or address length inconsistent with it
    MalformedAddress,
    /// MESSAGE-INTEGRITY does not match the one computed with the key
    IntegrityCheckFailed,
    /// FINGERPRINT does not match the CRC-32 of the message
    FingerprintMismatch,
}

impl fmt::Display for StunErrorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StunErrorType::InvalidParam => write!(f, "invalid parameter"),
            StunErrorType::ValidationFailed => write!(f, "validation failed"),
            StunErrorType::ValueTooLong => write!(f, "value is too long"),
            StunErrorType::SmallBuffer => write!(f, "small input buffer"),
            StunErrorType::NotStunMessage => write!(f, "not a STUN message"),
            StunErrorType::TruncatedMessage => write!(f, "truncated message"),
            StunErrorType::TrailingBytes => write!(f, "trailing bytes after message"),
            StunErrorType::MalformedAddress => write!(f, "malformed address"),
            StunErrorType::IntegrityCheckFailed => write!(f, "integrity check failed"),
            StunErrorType::FingerprintMismatch => write!(f, "fingerprint mismatch"),
        }
    }
}

/// Provides information about the error
#[derive(Debug)]
pub enum StunErrorInfo {
    /// A [`String`] describing the error,
    Text(String),
    /// Source of error
    Error(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for StunErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            StunErrorInfo::Text(msg) => write!(f, "{}", msg),
            StunErrorInfo::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Stun error
#[derive(Debug)]
pub struct StunError {
    /// Error type
    pub error_type: StunErrorType,
    /// Information about the error
    pub info: StunErrorInfo,
}

impl fmt::Display for StunError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}. {}", self.error_type, self.info)
    }
}

impl error::Error for StunError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.info {
            StunErrorInfo::Text(_) => None,
            StunErrorInfo::Error(e) => Some(e.as_ref()),
        }
    }
}

impl PartialEq<StunError> for StunErrorType {
    fn eq(&self, other: &StunError) -> bool {
        *self == other.error_type
    }
}

impl PartialEq<StunErrorType> for StunError {
    fn eq(&self, other: &StunErrorType) -> bool {
        self.error_type == *other
    }
}

impl PartialEq for StunError {
    fn eq(&self, other: &Self) -> bool {
        self.error_type == other.error_type
    }
}

impl Eq for StunError {}

impl From<std::array::TryFromSliceError> for StunError {
    fn from(e: std::array::TryFromSliceError) -> Self {
        StunError::from_error(StunErrorType::InvalidParam, Box::new(e))
    }
}

impl From<std::str::Utf8Error> for StunError {
    fn from(e: std::str::Utf8Error) -> Self {
        StunError::from_error(StunErrorType::InvalidParam, Box::new(e))
    }
}

impl From<std::num::TryFromIntError> for StunError {
    fn from(e: std::num::TryFromIntError) -> Self {
        StunError::from_error(StunErrorType::ValueTooLong, Box::new(e))
    }
}

impl StunError {
    pub(crate) fn new<S>(error_type: StunErrorType, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            error_type,
            info: StunErrorInfo::Text(msg.into()),
        }
    }

    pub(crate) fn from_error(
        error_type: StunErrorType,
        e: Box<dyn error::Error + Send + Sync>,
    ) -> Self {
        Self {
            error_type,
            info: StunErrorInfo::Error(e),
        }
    }
}

/// Describes the error happened when processing an
/// [`StunAttribute`](crate::attributes::StunAttribute)
#[derive(Debug)]
pub struct StunAttributeError {
    /// The attribute type, if it is known
    pub attr_type: Option<AttributeType>,
    /// The position of the attribute in the [`StunMessage`](crate::StunMessage)
    pub position: usize,
    /// The error
    pub error: StunError,
}

impl fmt::Display for StunAttributeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.attr_type {
            Some(attr_type) => write!(f, "{}", attr_type)?,
            None => write!(f, "unknown attribute type")?,
        }
        write!(f, ", position: {}, error: {}", self.position, self.error)
    }
}

/// Describes an error happening at message level
#[derive(Debug)]
pub struct StunMessageError(pub StunError);

impl fmt::Display for StunMessageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Indicates if the error happened processing the message as a whole,
/// for example if the input buffer is shorter than the length indicated
/// in the header, or if the error happened processing an attribute.
#[derive(Debug)]
pub enum StunErrorLevel {
    /// Message level error
    Message(StunMessageError),
    /// Attribute level error
    Attribute(StunAttributeError),
}

impl StunErrorLevel {
    /// Returns the underlying [`StunError`]
    pub fn error(&self) -> &StunError {
        match self {
            StunErrorLevel::Message(e) => &e.0,
            StunErrorLevel::Attribute(e) => &e.error,
        }
    }

    pub(crate) fn message(error: StunError) -> Self {
        StunErrorLevel::Message(StunMessageError(error))
    }

    pub(crate) fn attribute(
        attr_type: Option<AttributeType>,
        position: usize,
        error: StunError,
    ) -> Self {
        StunErrorLevel::Attribute(StunAttributeError {
            attr_type,
            position,
            error,
        })
    }
}

impl fmt::Display for StunErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StunErrorLevel::Message(e) => write!(f, "message level: {}", e),
            StunErrorLevel::Attribute(e) => write!(f, "attribute level: {}", e),
        }
    }
}

/// Describes an error decoding a [`StunMessage`](crate::StunMessage)
#[derive(Debug)]
pub struct StunDecodeError(pub StunErrorLevel);

impl StunDecodeError {
    /// Returns the type of the error, regardless of the level it happened at
    pub fn error_type(&self) -> StunErrorType {
        self.0.error().error_type
    }
}

impl fmt::Display for StunDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "decode error: {}", self.0)
    }
}

impl error::Error for StunDecodeError {}

impl PartialEq<StunErrorType> for StunDecodeError {
    fn eq(&self, other: &StunErrorType) -> bool {
        self.error_type() == *other
    }
}

/// Describes an error encoding a [`StunMessage`](crate::StunMessage)
#[derive(Debug)]
pub struct StunEncodeError(pub StunErrorLevel);

impl StunEncodeError {
    /// Returns the type of the error, regardless of the level it happened at
    pub fn error_type(&self) -> StunErrorType {
        self.0.error().error_type
    }
}

impl fmt::Display for StunEncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "encode error: {}", self.0)
    }
}

impl error::Error for StunEncodeError {}

impl PartialEq<StunErrorType> for StunEncodeError {
    fn eq(&self, other: &StunErrorType) -> bool {
        self.error_type() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_level_type() {
        let error = StunDecodeError(StunErrorLevel::message(StunError::new(
            StunErrorType::NotStunMessage,
            "bad cookie",
        )));
        assert_eq!(error.error_type(), StunErrorType::NotStunMessage);
        assert_eq!(error, StunErrorType::NotStunMessage);

        let error = StunDecodeError(StunErrorLevel::attribute(
            Some(AttributeType::from(0x0020)),
            2,
            StunError::new(StunErrorType::MalformedAddress, "bad family"),
        ));
        assert_eq!(error.error_type(), StunErrorType::MalformedAddress);
        let text = format!("{}", error);
        assert!(text.contains("attribute type (0x0020)"));
        assert!(text.contains("position: 2"));
    }

    #[test]
    fn error_from_conversions() {
        let e: StunError = u16::try_from(70000u32).expect_err("Error expected").into();
        assert_eq!(e, StunErrorType::ValueTooLong);

        let bytes = vec![0xffu8, 0xfe];
        let e: StunError = std::str::from_utf8(&bytes).expect_err("Error expected").into();
        assert_eq!(e, StunErrorType::InvalidParam);
        assert!(error::Error::source(&e).is_some());
    }
}

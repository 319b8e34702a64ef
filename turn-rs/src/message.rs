use crate::attributes::{StunAttribute, StunAttributeType};
use crate::common::check_buffer_boundaries;
use crate::credentials::Credentials;
use crate::error::{StunError, StunErrorType};
use crate::{Encode, TransactionId};
use byteorder::{BigEndian, ByteOrder};
use std::convert::TryFrom;
use std::fmt;

/// The message type defines the message class (request, success
/// response, error response, or indication) and the message method (the
/// primary function) of the STUN message.
/// # Examples
///```rust
/// # use turn_rs::{MessageClass, MessageType};
/// # use turn_rs::methods::ALLOCATE;
/// let msg_type = MessageType::new(ALLOCATE, MessageClass::ErrorResponse);
/// assert_eq!(msg_type.as_u16(), 0x0113);
/// assert_eq!(msg_type.method(), ALLOCATE);
/// assert_eq!(msg_type.class(), MessageClass::ErrorResponse);
///
/// assert_eq!(MessageType::from(0x0103), MessageType::new(ALLOCATE, MessageClass::SuccessResponse));
///```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType {
    method: MessageMethod,
    class: MessageClass,
}

impl MessageType {
    /// Creates a new message type.
    pub fn new(method: MessageMethod, class: MessageClass) -> Self {
        Self { method, class }
    }

    /// Returns the message class.
    pub fn class(&self) -> MessageClass {
        self.class
    }

    /// Returns the message method
    pub fn method(&self) -> MessageMethod {
        self.method
    }

    /// Returns the [`u16`] representation of this [`MessageType`]
    pub fn as_u16(&self) -> u16 {
        let method = self.method.as_u16();
        let class = self.class.as_u16();
        ((method & 0x1F80) << 2)
            | ((method & 0x0070) << 1)
            | (method & 0x000F)
            | ((class & 0x0002) << 7)
            | ((class & 0x0001) << 4)
    }
}

impl From<u16> for MessageType {
    fn from(value: u16) -> Self {
        // Discard two most significant bits
        let val = value & 0x3FFF;
        let class = match ((val & 0x0100) >> 7) | ((val & 0x0010) >> 4) {
            0b00 => MessageClass::Request,
            0b01 => MessageClass::Indication,
            0b10 => MessageClass::SuccessResponse,
            _ => MessageClass::ErrorResponse,
        };
        // Always fits in 12 bits
        let method = MessageMethod(((val & 0x3E00) >> 2) | ((val & 0x00E0) >> 1) | (val & 0x000F));
        MessageType::new(method, class)
    }
}

impl From<&[u8; 2]> for MessageType {
    fn from(value: &[u8; 2]) -> Self {
        MessageType::from(BigEndian::read_u16(value))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} (0x{:04X})", self.method, self.class, self.as_u16())
    }
}

impl Encode for MessageType {
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, StunError> {
        check_buffer_boundaries(buffer, 2)?;
        BigEndian::write_u16(buffer, self.as_u16());
        Ok(2)
    }
}

/// The STUN method is a 12 bits hex number in the range 0x000-0xFFF.
///
/// # Examples
///```rust
/// # use turn_rs::{MessageMethod, StunErrorType};
/// # use std::convert::TryFrom;
/// let allocate = MessageMethod::try_from(0x003).expect("Can not create method");
/// assert_eq!(allocate.as_u16(), 0x003);
///
/// assert_eq!(
///     MessageMethod::try_from(0x1000).expect_err("Error expected"),
///     StunErrorType::InvalidParam
/// );
///```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageMethod(pub(crate) u16);

impl MessageMethod {
    /// Returns the [`u16`] representation of this message method.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for MessageMethod {
    type Error = StunError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        (value & 0xF000 == 0)
            .then_some(MessageMethod(value))
            .ok_or_else(|| {
                StunError::new(
                    StunErrorType::InvalidParam,
                    format!("Value '{:#02x}' is not a valid a MessageMethod", value),
                )
            })
    }
}

impl fmt::Display for MessageMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            0x0001 => write!(f, "Binding"),
            0x0003 => write!(f, "Allocate"),
            0x0004 => write!(f, "Refresh"),
            0x0006 => write!(f, "Send"),
            0x0007 => write!(f, "Data"),
            0x0008 => write!(f, "CreatePermission"),
            0x0009 => write!(f, "ChannelBind"),
            other => write!(f, "method 0x{:03X}", other),
        }
    }
}

/// The STUN message class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    /// request
    Request,
    /// indication
    Indication,
    /// success response
    SuccessResponse,
    /// error response
    ErrorResponse,
}

impl MessageClass {
    fn as_u16(&self) -> u16 {
        match self {
            MessageClass::Request => 0b00,
            MessageClass::Indication => 0b01,
            MessageClass::SuccessResponse => 0b10,
            MessageClass::ErrorResponse => 0b11,
        }
    }
}

impl TryFrom<u8> for MessageClass {
    type Error = StunError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(MessageClass::Request),
            0b01 => Ok(MessageClass::Indication),
            0b10 => Ok(MessageClass::SuccessResponse),
            0b11 => Ok(MessageClass::ErrorResponse),
            _ => Err(StunError::new(
                StunErrorType::InvalidParam,
                format!("Value '{:#02x}' is not a valid a MessageClass", value),
            )),
        }
    }
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MessageClass::Request => write!(f, "request"),
            MessageClass::Indication => write!(f, "indication"),
            MessageClass::SuccessResponse => write!(f, "success response"),
            MessageClass::ErrorResponse => write!(f, "error response"),
        }
    }
}

#[derive(Debug)]
struct StunMessageParameters {
    method: MessageMethod,
    class: MessageClass,
    transaction_id: Option<TransactionId>,
    attributes: Vec<StunAttribute>,
    credentials: Option<Credentials>,
}

/// The [`StunMessageBuilder`] ease the creation of a [`StunMessage`]
///
/// # Examples
///```rust
/// # use turn_rs::{MessageClass, StunMessageBuilder};
/// # use turn_rs::attributes::{Nonce, RequestedTransport, UserName};
/// # use turn_rs::methods::ALLOCATE;
/// # use turn_rs::protocols::UDP;
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let message = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
///     .with_attribute(RequestedTransport::from(UDP))
///     .with_attribute(UserName::new("test-username"))
///     .build();
///
/// let username = message.get::<UserName>()
///   .ok_or("UserName attribute not found")?
///   .as_user_name()?;
/// assert_eq!(username, "test-username");
///
/// // Nonce attribute must return None
/// assert!(message.get::<Nonce>().is_none());
/// #
/// #   Ok(())
/// # }
///```
#[derive(Debug)]
pub struct StunMessageBuilder(StunMessageParameters);

impl StunMessageBuilder {
    /// Creates a new builder.
    pub fn new(method: MessageMethod, class: MessageClass) -> StunMessageBuilder {
        Self(StunMessageParameters {
            method,
            class,
            transaction_id: None,
            attributes: Vec::new(),
            credentials: None,
        })
    }

    /// Creates a STUN message using an specific transaction ID. If no
    /// [`TransactionId`] is specified, a random one will be used
    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.0.transaction_id = Some(transaction_id);
        self
    }

    /// Adds an attribute to the message.
    pub fn with_attribute<T>(mut self, attribute: T) -> Self
    where
        T: Into<StunAttribute>,
    {
        self.0.attributes.push(attribute.into());
        self
    }

    /// Attaches long-term credentials. When the credentials yield a key,
    /// the encoder appends USERNAME, REALM, NONCE and MESSAGE-INTEGRITY
    /// after the explicit attributes.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.0.credentials = Some(credentials);
        self
    }

    /// Creates the STUN message.
    pub fn build(self) -> StunMessage {
        StunMessage {
            method: self.0.method,
            class: self.0.class,
            transaction_id: self.0.transaction_id.unwrap_or_default(),
            attributes: self.0.attributes,
            credentials: self.0.credentials,
        }
    }
}

/// The stun message is the basic unit of information interchanged between
/// two agents implementing the STUN protocol.
///
/// All STUN messages comprise a 20-byte header followed by zero or more
/// attributes. The STUN header contains a STUN message type, message
/// length, magic cookie, and transaction ID.
///
/// STUN messages can be created using the [`StunMessageBuilder`].
#[derive(Debug, Clone)]
pub struct StunMessage {
    method: MessageMethod,
    class: MessageClass,
    transaction_id: TransactionId,
    attributes: Vec<StunAttribute>,
    credentials: Option<Credentials>,
}

impl StunMessage {
    /// Returns the message method.
    pub fn method(&self) -> MessageMethod {
        self.method
    }

    /// Returns the message class
    pub fn class(&self) -> MessageClass {
        self.class
    }

    /// Returns the message type
    pub fn message_type(&self) -> MessageType {
        MessageType::new(self.method, self.class)
    }

    /// Returns the transaction-id
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Returns the attributes contained in this STUN message.
    pub fn attributes(&self) -> &[StunAttribute] {
        &self.attributes
    }

    /// Returns the credentials attached to this message, if any
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns the attribute if the message contains the attribute type
    /// or None if there is no such attribute.
    /// If there are more than one attributes of this type, this function
    /// will return the first one.
    pub fn get<A>(&self) -> Option<&StunAttribute>
    where
        A: StunAttributeType,
    {
        self.attributes
            .iter()
            .find(|&attr| attr.attribute_type() == A::get_type())
    }
}

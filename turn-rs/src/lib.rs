//! TURN client message library.
//!
//! This crate provides the message layer a TURN client needs to obtain a
//! relayed transport address using the long-term credential mechanism.
//! The implementation is based on:
//! * [`RFC5389`](https://datatracker.ietf.org/doc/html/rfc5389). Session Traversal Utilities for NAT (STUN).
//! * [`RFC5766`](https://datatracker.ietf.org/doc/html/rfc5766). Traversal Using Relays around NAT (TURN).
//! * [`RFC5769`](https://datatracker.ietf.org/doc/html/rfc5769). Test Vectors for Session Traversal Utilities for NAT (STUN).
//!
//! # Usage
//! Example that creates and encodes an authenticated Allocate request.
//! Attaching [`Credentials`] that carry a realm makes the encoder append
//! USERNAME, REALM, NONCE and MESSAGE-INTEGRITY after the attributes of
//! the message.
//!```rust
//! # use turn_rs::attributes::{MessageIntegrity, RequestedTransport};
//! # use turn_rs::{Credentials, DecoderContextBuilder, MessageClass, MessageDecoderBuilder,
//! #  MessageEncoderBuilder, StunMessageBuilder};
//! # use turn_rs::methods::ALLOCATE;
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let credentials = Credentials::new("alice", "secret")
//!     .with_realm("example.org")
//!     .with_nonce("abc123");
//!
//! let msg = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
//!     .with_attribute(RequestedTransport::default())
//!     .with_credentials(credentials.clone())
//!     .build();
//!
//! let encoder = MessageEncoderBuilder::default().build();
//! let buffer = encoder.encode_to_vec(&msg)?;
//! // Header, REQUESTED-TRANSPORT, USERNAME, REALM, NONCE and MESSAGE-INTEGRITY
//! assert_eq!(buffer.len(), 20 + 8 + 12 + 16 + 12 + 24);
//!
//! // The same credentials check the integrity of the message
//! let ctx = DecoderContextBuilder::default()
//!     .with_credentials(&credentials)
//!     .build();
//! let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
//! let (msg, _) = decoder.decode(&buffer)?;
//! assert_eq!(msg.method(), ALLOCATE);
//! assert!(msg.get::<MessageIntegrity>().is_some());
//! #
//! #   Ok(())
//! # }
//!```
//!
//! Example that decodes the error response a TURN server sends to an
//! unauthenticated Allocate request.
//!```rust
//! # use turn_rs::attributes::{ErrorCode, Nonce, Realm};
//! # use turn_rs::{MessageClass, MessageDecoder};
//! # use turn_rs::methods::ALLOCATE;
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let response = [
//!     0x01, 0x13, 0x00, 0x30, // Allocate error response and message length
//!     0x21, 0x12, 0xa4, 0x42, // Magic cookie
//!     0x01, 0x02, 0x03, 0x04, // }
//!     0x05, 0x06, 0x07, 0x08, // }  Transaction ID
//!     0x09, 0x0a, 0x0b, 0x0c, // }
//!     0x00, 0x09, 0x00, 0x10, // ERROR-CODE attribute header
//!     0x00, 0x00, 0x04, 0x01, // Class (4) and number (1)
//!     0x55, 0x6e, 0x61, 0x75, // }
//!     0x74, 0x68, 0x6f, 0x72, // }  Reason phrase "Unauthorized"
//!     0x69, 0x7a, 0x65, 0x64, // }
//!     0x00, 0x14, 0x00, 0x0b, // REALM attribute header
//!     0x65, 0x78, 0x61, 0x6d, // }
//!     0x70, 0x6c, 0x65, 0x2e, // }  Realm value (11 bytes) and padding (1 byte)
//!     0x6f, 0x72, 0x67, 0x00, // }
//!     0x00, 0x15, 0x00, 0x06, // NONCE attribute header
//!     0x61, 0x62, 0x63, 0x31, // }  Nonce value (6 bytes) and padding (2 bytes)
//!     0x32, 0x33, 0x00, 0x00, // }
//! ];
//!
//! let decoder = MessageDecoder::default();
//! let (msg, size) = decoder.decode(&response)?;
//! assert_eq!(size, response.len());
//! assert_eq!(msg.method(), ALLOCATE);
//! assert_eq!(msg.class(), MessageClass::ErrorResponse);
//!
//! let error = msg.get::<ErrorCode>()
//!   .ok_or("ErrorCode attribute not found")?
//!   .as_error_code()?;
//! assert_eq!(error.code(), 401);
//!
//! let realm = msg.get::<Realm>()
//!   .ok_or("Realm attribute not found")?
//!   .as_realm()?;
//! assert_eq!(realm, "example.org");
//!
//! let nonce = msg.get::<Nonce>()
//!   .ok_or("Nonce attribute not found")?
//!   .as_nonce()?;
//! assert_eq!(nonce, "abc123");
//! #
//! #   Ok(())
//! # }
//!```

#![deny(missing_docs)]

mod common;
mod context;
mod credentials;
mod message;
mod raw;
mod registry;
mod types;

pub mod attributes;
pub mod error;
pub mod methods;
pub mod protocols;

pub use crate::attributes::{AttributeType, StunAttribute, StunAttributeType};
pub use crate::context::{
    DecoderContext, DecoderContextBuilder, MessageDecoder, MessageDecoderBuilder,
};
pub use crate::context::{
    EncoderContext, EncoderContextBuilder, MessageEncoder, MessageEncoderBuilder,
};
pub use crate::credentials::{CredentialMechanism, Credentials, HMACKey};
pub use crate::error::{StunDecodeError, StunEncodeError, StunError, StunErrorType};
pub use crate::message::{
    MessageClass, MessageMethod, MessageType, StunMessage, StunMessageBuilder,
};
pub use crate::raw::{MessageHeader, MESSAGE_HEADER_SIZE};
pub use crate::registry::decode_attribute;
pub use crate::types::{AddressFamily, Cookie, TransactionId, MAGIC_COOKIE};

/// Provides a simple interface to encode elements into buffers.
pub(crate) trait Encode {
    /// Encodes an object in binary using network-oriented format.
    /// # Arguments:
    /// - `buffer`- output buffer where the data will be serialized.
    /// # Returns:
    /// The size in bytes taken by the serialized object or
    /// a [`StunError`] describing the error.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, StunError>;
}

/// Provides a simple interface to decode elements from buffers.
pub(crate) trait Decode<'a> {
    /// Decodes an object serialized in binary from a buffer.
    /// # Arguments:
    /// - `buffer`: input buffer were the object is encoded.
    /// # Returns:
    /// The object or a [`StunError`] describing the error.
    fn decode(buffer: &'a [u8]) -> Result<(Self, usize), StunError>
    where
        Self: Sized;
}

/// Gets the input text of MESSAGE-INTEGRITY or FINGERPRINT: the STUN
/// message up to, and excluding, the attribute `A`, with the Length
/// field of the header adjusted to end where that attribute ends.
///
/// # Examples
///```rust
/// # use turn_rs::get_input_text;
/// # use turn_rs::attributes::{MessageIntegrity, Nonce};
/// let buffer = [
///     0x00, 0x03, 0x00, 0x20, // Allocate request and message length
///     0x21, 0x12, 0xa4, 0x42, // Magic cookie
///     0x01, 0x02, 0x03, 0x04, // }
///     0x05, 0x06, 0x07, 0x08, // }  Transaction ID
///     0x09, 0x0a, 0x0b, 0x0c, // }
///     0x00, 0x19, 0x00, 0x04, // REQUESTED-TRANSPORT attribute header
///     0x11, 0x00, 0x00, 0x00, // UDP
///     0x00, 0x08, 0x00, 0x14, // MESSAGE-INTEGRITY attribute header
///     0x00, 0x00, 0x00, 0x00, // }
///     0x00, 0x00, 0x00, 0x00, // }
///     0x00, 0x00, 0x00, 0x00, // }  HMAC-SHA1
///     0x00, 0x00, 0x00, 0x00, // }
///     0x00, 0x00, 0x00, 0x00, // }
/// ];
///
/// // No NONCE attribute in this buffer
/// assert_eq!(get_input_text::<Nonce>(&buffer), None);
///
/// let input = get_input_text::<MessageIntegrity>(&buffer).unwrap();
/// assert_eq!(input, [
///     0x00, 0x03, 0x00, 0x20, // Allocate request and message length
///     0x21, 0x12, 0xa4, 0x42, // Magic cookie
///     0x01, 0x02, 0x03, 0x04, // }
///     0x05, 0x06, 0x07, 0x08, // }  Transaction ID
///     0x09, 0x0a, 0x0b, 0x0c, // }
///     0x00, 0x19, 0x00, 0x04, // REQUESTED-TRANSPORT attribute header
///     0x11, 0x00, 0x00, 0x00, // UDP
/// ]);
///```
pub fn get_input_text<A>(buffer: &[u8]) -> Option<Vec<u8>>
where
    A: StunAttributeType,
{
    raw::get_input_text(buffer, A::get_type().as_u16()).ok()
}

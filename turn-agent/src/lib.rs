//! TURN client agent.
//!
//! Drives the long-term credential handshake a TURN client runs to obtain
//! a relayed transport address: an unauthenticated Allocate that the
//! server challenges, an authenticated Allocate, and a CreatePermission
//! for the client's own reflexive address. Messages are encoded and
//! decoded with [`turn_rs`]; datagrams go through a [`DatagramChannel`]
//! owned by the session.

use std::error;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use turn_rs::error::{StunDecodeError, StunEncodeError};
use turn_rs::{AttributeType, MessageType, StunErrorType};

pub mod channel;
pub mod config;
pub mod handshake;
pub mod requests;

pub use crate::channel::{ChannelError, DatagramChannel, UdpChannel};
pub use crate::config::{TurnClientConfig, TurnClientConfigBuilder};
pub use crate::handshake::{Allocation, HandshakeError, HandshakeState, HandshakeStep, TurnSession};
pub use crate::requests::{allocate_request, allocate_request_with_lifetime, permission_request};

/// Errors raised by the agent while building requests or processing
/// responses.
#[derive(Debug)]
pub enum TurnAgentError {
    /// Send or receive failed at the socket layer
    Transport(io::Error),
    /// No response arrived within the read timeout
    Timeout,
    /// The response could not be decoded
    Decode(StunDecodeError),
    /// The request could not be encoded
    Encode(StunEncodeError),
    /// A response lacks an attribute the handshake needs
    MissingAttribute(AttributeType),
    /// MESSAGE-INTEGRITY of a response does not match the session key
    IntegrityCheckFailed,
    /// The server answered with a method or class out of sequence
    UnexpectedMessageType(MessageType),
    /// An authenticated request was built before the server sent a nonce
    MissingNonce,
    /// The peer address can not be used in a permission
    InvalidAddress(SocketAddr),
    /// The server rejected an authenticated request. Carries the
    /// ERROR-CODE value and reason, if the response included one.
    CredentialRejected(Option<(u16, String)>),
    /// A received datagram exceeds the maximum message size of the
    /// session or of its channel
    MessageTooLarge(usize),
    /// The session already failed with an error of this kind and must be
    /// restarted before it can make progress
    SessionFailed(TurnErrorKind),
}

/// Classification of [`TurnAgentError`] without the attached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnErrorKind {
    /// Socket layer error
    Transport,
    /// Read timeout
    Timeout,
    /// Malformed message
    Decode,
    /// Message could not be serialized
    Encode,
    /// Expected attribute not found
    MissingAttribute,
    /// HMAC mismatch
    IntegrityCheckFailed,
    /// Protocol sequencing violation
    UnexpectedMessageType,
    /// No nonce available
    MissingNonce,
    /// Unsupported peer address
    InvalidAddress,
    /// Server error response after authentication
    CredentialRejected,
    /// Oversize datagram
    MessageTooLarge,
}

impl TurnAgentError {
    /// Returns the kind of this error
    pub fn kind(&self) -> TurnErrorKind {
        match self {
            TurnAgentError::Transport(_) => TurnErrorKind::Transport,
            TurnAgentError::Timeout => TurnErrorKind::Timeout,
            TurnAgentError::Decode(_) => TurnErrorKind::Decode,
            TurnAgentError::Encode(_) => TurnErrorKind::Encode,
            TurnAgentError::MissingAttribute(_) => TurnErrorKind::MissingAttribute,
            TurnAgentError::IntegrityCheckFailed => TurnErrorKind::IntegrityCheckFailed,
            TurnAgentError::UnexpectedMessageType(_) => TurnErrorKind::UnexpectedMessageType,
            TurnAgentError::MissingNonce => TurnErrorKind::MissingNonce,
            TurnAgentError::InvalidAddress(_) => TurnErrorKind::InvalidAddress,
            TurnAgentError::CredentialRejected(_) => TurnErrorKind::CredentialRejected,
            TurnAgentError::MessageTooLarge(_) => TurnErrorKind::MessageTooLarge,
            TurnAgentError::SessionFailed(kind) => *kind,
        }
    }
}

impl fmt::Display for TurnAgentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TurnAgentError::Transport(e) => write!(f, "transport error: {}", e),
            TurnAgentError::Timeout => write!(f, "no response within the read timeout"),
            TurnAgentError::Decode(e) => write!(f, "{}", e),
            TurnAgentError::Encode(e) => write!(f, "{}", e),
            TurnAgentError::MissingAttribute(t) => write!(f, "missing {}", t),
            TurnAgentError::IntegrityCheckFailed => write!(f, "integrity check failed"),
            TurnAgentError::UnexpectedMessageType(t) => write!(f, "unexpected {}", t),
            TurnAgentError::MissingNonce => write!(f, "credentials carry no nonce"),
            TurnAgentError::InvalidAddress(addr) => write!(f, "invalid peer address {}", addr),
            TurnAgentError::CredentialRejected(Some((code, reason))) => {
                write!(f, "credentials rejected: {} {}", code, reason)
            }
            TurnAgentError::CredentialRejected(None) => write!(f, "credentials rejected"),
            TurnAgentError::MessageTooLarge(size) => {
                write!(f, "datagram of {} bytes exceeds the maximum size", size)
            }
            TurnAgentError::SessionFailed(kind) => {
                write!(f, "session already failed: {:?}", kind)
            }
        }
    }
}

impl error::Error for TurnAgentError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            TurnAgentError::Transport(e) => Some(e),
            TurnAgentError::Decode(e) => Some(e),
            TurnAgentError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StunDecodeError> for TurnAgentError {
    fn from(e: StunDecodeError) -> Self {
        if e.error_type() == StunErrorType::IntegrityCheckFailed {
            TurnAgentError::IntegrityCheckFailed
        } else {
            TurnAgentError::Decode(e)
        }
    }
}

impl From<StunEncodeError> for TurnAgentError {
    fn from(e: StunEncodeError) -> Self {
        TurnAgentError::Encode(e)
    }
}

impl From<ChannelError> for TurnAgentError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::Timeout => TurnAgentError::Timeout,
            ChannelError::Transport(e) => TurnAgentError::Transport(e),
            ChannelError::MessageTooLarge(size) => TurnAgentError::MessageTooLarge(size),
        }
    }
}

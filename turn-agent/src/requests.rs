//! Constructors for the requests of the allocation handshake. Every
//! request gets a fresh random transaction id.

use crate::TurnAgentError;
use log::debug;
use std::net::SocketAddr;
use turn_rs::attributes::{LifeTime, Nonce, Realm, RequestedTransport, XorPeerAddress};
use turn_rs::methods::{ALLOCATE, CREATE_PERMISSION};
use turn_rs::{Credentials, MessageClass, StunAttributeType, StunMessage, StunMessageBuilder};

// Copies REALM and NONCE from the challenge into the credentials
pub(crate) fn learn_challenge(
    credentials: &Credentials,
    challenge: &StunMessage,
) -> Result<Credentials, TurnAgentError> {
    let realm = challenge
        .get::<Realm>()
        .ok_or(TurnAgentError::MissingAttribute(Realm::get_type()))?
        .as_realm()
        .map_err(|_| TurnAgentError::MissingAttribute(Realm::get_type()))?;
    let nonce = challenge
        .get::<Nonce>()
        .ok_or(TurnAgentError::MissingAttribute(Nonce::get_type()))?
        .as_nonce()
        .map_err(|_| TurnAgentError::MissingAttribute(Nonce::get_type()))?;
    debug!("Challenge realm: {}, nonce: {}", realm, nonce);

    Ok(credentials
        .clone()
        .with_realm(realm.as_str())
        .with_nonce(nonce.as_str()))
}

fn allocate_builder(
    credentials: &Credentials,
    challenge: Option<&StunMessage>,
) -> Result<StunMessageBuilder, TurnAgentError> {
    let builder = StunMessageBuilder::new(ALLOCATE, MessageClass::Request)
        .with_attribute(RequestedTransport::default());

    match challenge {
        None => Ok(builder),
        Some(challenge) => {
            let credentials = learn_challenge(credentials, challenge)?;
            Ok(builder.with_credentials(credentials))
        }
    }
}

/// Builds an Allocate request asking for a UDP relay.
///
/// Without a `challenge` the request carries only REQUESTED-TRANSPORT.
/// With the error response the server sent to that first request, REALM
/// and NONCE are copied from it into the credentials attached to the new
/// request, so the encoder adds USERNAME, REALM, NONCE and
/// MESSAGE-INTEGRITY. The credentials in effect are available through
/// [`StunMessage::credentials`].
/// # Examples
///```rust
/// # use turn_agent::allocate_request;
/// # use turn_rs::attributes::{RequestedTransport, Realm};
/// # use turn_rs::{Credentials, MessageClass};
/// # use turn_rs::methods::ALLOCATE;
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let credentials = Credentials::new("alice", "secret");
/// let msg = allocate_request(&credentials, None)?;
/// assert_eq!(msg.method(), ALLOCATE);
/// assert_eq!(msg.class(), MessageClass::Request);
/// assert_eq!(msg.attributes().len(), 1);
/// assert!(msg.get::<RequestedTransport>().is_some());
/// assert!(msg.credentials().is_none());
/// #
/// #   Ok(())
/// # }
///```
pub fn allocate_request(
    credentials: &Credentials,
    challenge: Option<&StunMessage>,
) -> Result<StunMessage, TurnAgentError> {
    Ok(allocate_builder(credentials, challenge)?.build())
}

/// Same as [`allocate_request`], also asking for an allocation that
/// lasts `lifetime` seconds.
pub fn allocate_request_with_lifetime(
    credentials: &Credentials,
    challenge: Option<&StunMessage>,
    lifetime: u32,
) -> Result<StunMessage, TurnAgentError> {
    Ok(allocate_builder(credentials, challenge)?
        .with_attribute(LifeTime::new(lifetime))
        .build())
}

fn check_peer_address(peer: SocketAddr) -> Result<(), TurnAgentError> {
    match peer {
        SocketAddr::V4(addr) if !addr.ip().is_unspecified() && addr.port() != 0 => Ok(()),
        _ => Err(TurnAgentError::InvalidAddress(peer)),
    }
}

/// Builds a CreatePermission request installing a permission for `peer`.
/// The credentials must already carry the realm and nonce learnt during
/// the Allocate exchange.
pub fn permission_request(
    credentials: &Credentials,
    peer: SocketAddr,
) -> Result<StunMessage, TurnAgentError> {
    if !credentials.is_authenticated() {
        return Err(TurnAgentError::MissingNonce);
    }
    check_peer_address(peer)?;

    Ok(
        StunMessageBuilder::new(CREATE_PERMISSION, MessageClass::Request)
            .with_attribute(XorPeerAddress::from(peer))
            .with_credentials(credentials.clone())
            .build(),
    )
}

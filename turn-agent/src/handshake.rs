//! Allocation handshake state machine.
//!
//! A [`TurnSession`] runs the exchange below, one request and one
//! response per round trip:
//!
//! ```text
//! Init ── Allocate ──> AwaitingChallenge ── 401 ──> Authenticated
//!   ── Allocate + MESSAGE-INTEGRITY ──> AwaitingAllocateAuth ── success ──> Allocated
//!   ── CreatePermission ──> AwaitingPermission ── success ──> PermissionGranted
//! ```
//!
//! Any failure moves the session to [`HandshakeState::Failed`], after
//! which nothing else is sent until [`TurnSession::restart`] is called.

use crate::channel::DatagramChannel;
use crate::config::TurnClientConfig;
use crate::requests::{
    allocate_request, allocate_request_with_lifetime, learn_challenge, permission_request,
};
use crate::{TurnAgentError, TurnErrorKind};
use log::{debug, info, warn};
use std::error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use turn_rs::attributes::{
    ErrorCode, LifeTime, XorMappedAddress, XorRelayedAddress,
};
use turn_rs::methods::{ALLOCATE, CREATE_PERMISSION};
use turn_rs::{
    Credentials, DecoderContextBuilder, EncoderContextBuilder, MessageClass,
    MessageDecoderBuilder, MessageEncoder, MessageEncoderBuilder, MessageType, StunAttributeType,
    StunMessage, TransactionId,
};

/// The transaction a session was running when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeStep {
    /// Unauthenticated Allocate and its challenge
    Allocate,
    /// Allocate carrying MESSAGE-INTEGRITY
    AuthenticatedAllocate,
    /// CreatePermission for the reflexive address
    CreatePermission,
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HandshakeStep::Allocate => write!(f, "Allocate"),
            HandshakeStep::AuthenticatedAllocate => write!(f, "authenticated Allocate"),
            HandshakeStep::CreatePermission => write!(f, "CreatePermission"),
        }
    }
}

/// States of the allocation handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet
    Init,
    /// Unauthenticated Allocate sent
    AwaitingChallenge,
    /// Realm and nonce learnt from the challenge
    Authenticated,
    /// Authenticated Allocate sent
    AwaitingAllocateAuth,
    /// Relayed and reflexive addresses known
    Allocated,
    /// CreatePermission sent
    AwaitingPermission,
    /// The relay accepts traffic from the reflexive address
    PermissionGranted,
    /// The handshake stopped
    Failed(HandshakeStep, TurnErrorKind),
}

impl HandshakeState {
    /// Returns true for [`HandshakeState::PermissionGranted`] and
    /// [`HandshakeState::Failed`]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HandshakeState::PermissionGranted | HandshakeState::Failed(_, _)
        )
    }

    fn handshake_step(&self) -> HandshakeStep {
        match self {
            HandshakeState::Init | HandshakeState::AwaitingChallenge => HandshakeStep::Allocate,
            HandshakeState::Authenticated | HandshakeState::AwaitingAllocateAuth => {
                HandshakeStep::AuthenticatedAllocate
            }
            HandshakeState::Allocated
            | HandshakeState::AwaitingPermission
            | HandshakeState::PermissionGranted => HandshakeStep::CreatePermission,
            HandshakeState::Failed(step, _) => *step,
        }
    }
}

/// Result of a successful handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Transport address allocated on the server
    pub relayed: SocketAddr,
    /// The client's address as seen by the server
    pub reflexive: SocketAddr,
    /// Peer allowed to send through the relay, once the permission is installed
    pub permitted_peer: Option<SocketAddr>,
    /// Lifetime granted by the server, if it sent one
    pub lifetime: Option<Duration>,
}

/// Error returned when a handshake step fails
#[derive(Debug)]
pub struct HandshakeError {
    /// The step that failed
    pub step: HandshakeStep,
    /// Why it failed
    pub error: TurnAgentError,
}

impl HandshakeError {
    /// Returns the kind of the underlying error
    pub fn kind(&self) -> TurnErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.error)
    }
}

impl error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.error)
    }
}

/// A TURN client session. It owns the channel towards the server and the
/// credentials, which gain a realm and a nonce along the handshake.
#[derive(Debug)]
pub struct TurnSession<C> {
    config: TurnClientConfig,
    channel: C,
    username: String,
    password: String,
    credentials: Credentials,
    encoder: MessageEncoder,
    state: HandshakeState,
    transaction_id: Option<TransactionId>,
    challenge: Option<StunMessage>,
    allocation: Option<Allocation>,
}

impl<C> TurnSession<C>
where
    C: DatagramChannel,
{
    /// Creates a session in [`HandshakeState::Init`]
    pub fn new<U, P>(config: TurnClientConfig, channel: C, username: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        let username = username.into();
        let password = password.into();
        let mut ctx = EncoderContextBuilder::default();
        if config.fingerprint() {
            ctx = ctx.with_fingerprint();
        }
        let encoder = MessageEncoderBuilder::default()
            .with_context(ctx.build())
            .build();

        Self {
            config,
            channel,
            credentials: Credentials::new(username.as_str(), password.as_str()),
            username,
            password,
            encoder,
            state: HandshakeState::Init,
            transaction_id: None,
            challenge: None,
            allocation: None,
        }
    }

    /// Current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Credentials in use, including the realm and nonce once learnt
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The configuration of this session
    pub fn config(&self) -> &TurnClientConfig {
        &self.config
    }

    /// Addresses learnt so far. Available from [`HandshakeState::Allocated`]
    /// on; `permitted_peer` is set once the permission is granted.
    pub fn allocation(&self) -> Option<&Allocation> {
        self.allocation.as_ref()
    }

    /// Returns the session to [`HandshakeState::Init`], forgetting the
    /// realm, nonce and addresses learnt.
    pub fn restart(&mut self) {
        debug!("Restarting session from {:?}", self.state);
        self.credentials = Credentials::new(self.username.as_str(), self.password.as_str());
        self.state = HandshakeState::Init;
        self.transaction_id = None;
        self.challenge = None;
        self.allocation = None;
    }

    /// Consumes the session and returns its channel
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Runs one transition. Terminal states are left untouched: a
    /// granted session reports its state again, a failed one returns
    /// [`TurnAgentError::SessionFailed`].
    pub fn step(&mut self) -> Result<HandshakeState, HandshakeError> {
        if let HandshakeState::Failed(step, kind) = self.state {
            return Err(HandshakeError {
                step,
                error: TurnAgentError::SessionFailed(kind),
            });
        }

        let step = self.state.handshake_step();
        match self.transition() {
            Ok(state) => {
                debug!("{:?} -> {:?}", self.state, state);
                self.state = state;
                Ok(state)
            }
            Err(error) => {
                warn!("{} failed in state {:?}: {}", step, self.state, error);
                self.state = HandshakeState::Failed(step, error.kind());
                Err(HandshakeError { step, error })
            }
        }
    }

    /// Runs the handshake until the permission is granted or a step fails
    pub fn run(&mut self) -> Result<Allocation, HandshakeError> {
        loop {
            if self.step()? == HandshakeState::PermissionGranted {
                return self.allocation.clone().ok_or(HandshakeError {
                    step: HandshakeStep::AuthenticatedAllocate,
                    error: TurnAgentError::MissingAttribute(XorRelayedAddress::get_type()),
                });
            }
        }
    }

    fn transition(&mut self) -> Result<HandshakeState, TurnAgentError> {
        match self.state {
            HandshakeState::Init => {
                let msg = self.allocate(None)?;
                self.send(&msg)?;
                Ok(HandshakeState::AwaitingChallenge)
            }
            HandshakeState::AwaitingChallenge => {
                let msg = self.recv()?;
                expect_type(&msg, ALLOCATE, MessageClass::ErrorResponse)?;
                self.credentials = learn_challenge(&self.credentials, &msg)?;
                self.challenge = Some(msg);
                info!("Challenged by realm {:?}", self.credentials.realm());
                Ok(HandshakeState::Authenticated)
            }
            HandshakeState::Authenticated => {
                // The challenge was validated when learnt; allocate_request
                // copies REALM and NONCE from it again into the request
                let challenge = self.challenge.take().ok_or(TurnAgentError::MissingNonce)?;
                let msg = self.allocate(Some(&challenge))?;
                self.send(&msg)?;
                Ok(HandshakeState::AwaitingAllocateAuth)
            }
            HandshakeState::AwaitingAllocateAuth => {
                let msg = self.recv()?;
                check_rejection(&msg, ALLOCATE)?;
                expect_type(&msg, ALLOCATE, MessageClass::SuccessResponse)?;
                let allocation = read_allocation(&msg)?;
                info!(
                    "Relayed address {}, reflexive address {}",
                    allocation.relayed, allocation.reflexive
                );
                self.allocation = Some(allocation);
                Ok(HandshakeState::Allocated)
            }
            HandshakeState::Allocated => {
                let peer = self
                    .allocation
                    .as_ref()
                    .map(|allocation| allocation.reflexive)
                    .ok_or(TurnAgentError::MissingAttribute(XorMappedAddress::get_type()))?;
                let msg = permission_request(&self.credentials, peer)?;
                self.send(&msg)?;
                Ok(HandshakeState::AwaitingPermission)
            }
            HandshakeState::AwaitingPermission => {
                let msg = self.recv()?;
                check_rejection(&msg, CREATE_PERMISSION)?;
                expect_type(&msg, CREATE_PERMISSION, MessageClass::SuccessResponse)?;
                if let Some(allocation) = self.allocation.as_mut() {
                    allocation.permitted_peer = Some(allocation.reflexive);
                    info!("Permission granted for {}", allocation.reflexive);
                }
                Ok(HandshakeState::PermissionGranted)
            }
            state => Ok(state),
        }
    }

    fn allocate(&self, challenge: Option<&StunMessage>) -> Result<StunMessage, TurnAgentError> {
        match self.config.lifetime() {
            Some(lifetime) => allocate_request_with_lifetime(&self.credentials, challenge, lifetime),
            None => allocate_request(&self.credentials, challenge),
        }
    }

    fn send(&mut self, msg: &StunMessage) -> Result<(), TurnAgentError> {
        let buffer = self.encoder.encode_to_vec(msg)?;
        self.channel.send(&buffer)?;
        debug!(
            "Sent {} ({} bytes), {}",
            msg.message_type(),
            buffer.len(),
            msg.transaction_id()
        );
        self.transaction_id = Some(*msg.transaction_id());
        Ok(())
    }

    fn recv(&mut self) -> Result<StunMessage, TurnAgentError> {
        let buffer = self.channel.recv_timeout(self.config.read_timeout())?;
        if buffer.len() > self.config.max_message_size() {
            return Err(TurnAgentError::MessageTooLarge(buffer.len()));
        }

        let ctx = DecoderContextBuilder::default()
            .with_credentials(&self.credentials)
            .build();
        let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
        let (msg, _) = decoder.decode(&buffer)?;
        debug!(
            "Received {} ({} bytes), {}",
            msg.message_type(),
            buffer.len(),
            msg.transaction_id()
        );

        if self.transaction_id.as_ref() != Some(msg.transaction_id()) {
            warn!(
                "Response {} does not match the request {:?}",
                msg.transaction_id(),
                self.transaction_id
            );
        }
        Ok(msg)
    }
}

fn expect_type(
    msg: &StunMessage,
    method: turn_rs::MessageMethod,
    class: MessageClass,
) -> Result<(), TurnAgentError> {
    let expected = MessageType::new(method, class);
    if msg.message_type() != expected {
        debug!("Expected {}, got {}", expected, msg.message_type());
        return Err(TurnAgentError::UnexpectedMessageType(msg.message_type()));
    }
    Ok(())
}

// An error response to an authenticated request
fn check_rejection(msg: &StunMessage, method: turn_rs::MessageMethod) -> Result<(), TurnAgentError> {
    if msg.message_type() != MessageType::new(method, MessageClass::ErrorResponse) {
        return Ok(());
    }

    let error = msg
        .get::<ErrorCode>()
        .and_then(|attr| attr.as_error_code().ok())
        .map(|error| (error.code(), String::from(error.reason())));
    Err(TurnAgentError::CredentialRejected(error))
}

fn read_allocation(msg: &StunMessage) -> Result<Allocation, TurnAgentError> {
    let relayed = msg
        .get::<XorRelayedAddress>()
        .and_then(|attr| attr.as_xor_relayed_address().ok())
        .ok_or(TurnAgentError::MissingAttribute(XorRelayedAddress::get_type()))?;
    let reflexive = msg
        .get::<XorMappedAddress>()
        .and_then(|attr| attr.as_xor_mapped_address().ok())
        .ok_or(TurnAgentError::MissingAttribute(XorMappedAddress::get_type()))?;
    let lifetime = msg
        .get::<LifeTime>()
        .and_then(|attr| attr.as_life_time().ok())
        .map(LifeTime::as_duration);

    Ok(Allocation {
        relayed: *relayed.socket_address(),
        reflexive: *reflexive.socket_address(),
        permitted_peer: None,
        lifetime,
    })
}

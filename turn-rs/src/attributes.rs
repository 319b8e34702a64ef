//! STUN and TURN attributes.
//! This module contains the attributes a TURN client needs to run the
//! long-term-credential allocation handshake. Any other attribute is
//! decoded as [`Unknown`].

use crate::context::{AttributeDecoderContext, AttributeEncoderContext};
use crate::error::StunError;
use crate::registry::DecoderRegistry;
use std::fmt;

mod address;
mod error_code;
mod fingerprint;
mod integrity;
mod lifetime;
mod requested_transport;
mod text;
mod unknown;

pub use address::{XorMappedAddress, XorPeerAddress, XorRelayedAddress};
pub use error_code::ErrorCode;
pub use fingerprint::Fingerprint;
pub use integrity::MessageIntegrity;
pub use lifetime::LifeTime;
pub use requested_transport::RequestedTransport;
pub use text::{Nonce, Realm, UserName};
pub use unknown::Unknown;

pub(crate) trait EncodeAttributeValue {
    fn encode(&self, ctx: AttributeEncoderContext) -> Result<usize, StunError>;
    fn post_encode(&self, _ctx: AttributeEncoderContext) -> Result<(), StunError> {
        Ok(())
    }
}

pub(crate) trait DecodeAttributeValue {
    fn decode(ctx: AttributeDecoderContext) -> Result<(Self, usize), StunError>
    where
        Self: Sized;
}

/// A STUN attribute type is a hex number in the range 0x0000-0xFFFF.
/// STUN attribute types in the range 0x0000-0x7FFF are considered
/// comprehension-required.
///
/// # Examples
///```rust
/// # use turn_rs::AttributeType;
/// let attr_type = AttributeType::from(0x0008);
/// assert_eq!(attr_type.as_u16(), 0x0008);
/// assert!(attr_type.is_comprehension_required());
/// assert!(!attr_type.is_comprehension_optional());
///```
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct AttributeType(u16);

impl AttributeType {
    /// Creates a new [`AttributeType` ]
    pub fn new(attr_type: u16) -> Self {
        AttributeType(attr_type)
    }

    /// Return the [`u16`] representation of this attribute type
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a comprehension required attribute
    pub fn is_comprehension_required(&self) -> bool {
        // Comprehension-required range (0x0000-0x7FFF)
        self.0 < 0x8000
    }

    /// Returns true if this is a comprehension optional attribute
    pub fn is_comprehension_optional(&self) -> bool {
        !self.is_comprehension_required()
    }
}

impl From<u16> for AttributeType {
    fn from(val: u16) -> Self {
        Self::new(val)
    }
}

impl From<AttributeType> for u16 {
    fn from(val: AttributeType) -> Self {
        val.0
    }
}

impl fmt::Debug for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AttributeType (0x{:04X})", self.0)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "attribute type (0x{:04X})", self.0)
    }
}

/// Trait implemented by all [`StunAttribute`]
pub trait StunAttributeType {
    /// Returns the STUN attribute type of this instance.
    fn attribute_type(&self) -> AttributeType;

    /// Returns the STUN attribute type.
    fn get_type() -> AttributeType
    where
        Self: Sized;
}

macro_rules! stun_attribute (
    ($attr_class:ident, $attr_type:ident) => {
        impl crate::attributes::StunAttributeType for $attr_class {
            fn get_type() -> crate::attributes::AttributeType where Self: Sized {
                crate::attributes::AttributeType::from($attr_type)
            }
            fn attribute_type(&self) -> crate::attributes::AttributeType {
                $attr_class::get_type()
            }
        }
        impl From<$attr_class> for crate::attributes::StunAttribute {
            fn from(value: $attr_class) -> Self {
                crate::attributes::StunAttribute::$attr_class(value)
            }
        }
    }
);
pub(crate) use stun_attribute;

macro_rules! stun_attribute_impl (
    ($($class:ident),*) => {
        paste::paste! {
            /// Attributes that can be attached to a [`StunMessage`](crate::StunMessage)
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub enum StunAttribute {
                $(
                    #[doc = "The `" $class "` attribute"]
                    $class($class),
                )*
            }
        }

        impl EncodeAttributeValue for StunAttribute {
            fn encode(&self, ctx: AttributeEncoderContext) -> Result<usize, StunError> {
                match self {
                    $(
                        StunAttribute::$class(attr) => attr.encode(ctx),
                    )*
                }
            }

            fn post_encode(&self, ctx: AttributeEncoderContext) -> Result<(), StunError> {
                match self {
                    $(
                        StunAttribute::$class(attr) => attr.post_encode(ctx),
                    )*
                }
            }
        }

        impl StunAttribute {
            /// Returns the STUN attribute type of this instance.
            pub fn attribute_type(&self) -> AttributeType {
                match self {
                    $(
                        StunAttribute::$class(attr) => attr.attribute_type(),
                    )*
                }
            }

            $(
                paste::paste! {
                    #[doc = "Returns true if this `StunAttribute` is `" $class "`"]
                    pub fn [<is_ $class:snake>] (&self) -> bool {
                        matches!(self, StunAttribute::$class(_))
                    }

                    #[doc = "Returns a reference to the internal attribute value or an error if the type of the attribute is not `" $class "`"]
                    pub fn [<as_ $class:snake>] (&self) -> Result<&$class, crate::StunError> {
                        match self {
                            StunAttribute::$class(attr) => Ok(attr),
                            _ => Err(crate::error::StunError::new(
                                crate::error::StunErrorType::InvalidParam,
                                format!("Attribute is not of type {}", std::stringify!($class))
                            )),
                        }
                    }
                }
            )*
        }
    }
);

stun_attribute_impl!(
    Unknown,
    ErrorCode,
    Fingerprint,
    LifeTime,
    MessageIntegrity,
    Nonce,
    Realm,
    RequestedTransport,
    UserName,
    XorMappedAddress,
    XorPeerAddress,
    XorRelayedAddress
);

pub(crate) fn register_attributes(registry: &mut DecoderRegistry) {
    registry.register::<ErrorCode>();
    registry.register::<Fingerprint>();
    registry.register::<LifeTime>();
    registry.register::<MessageIntegrity>();
    registry.register::<Nonce>();
    registry.register::<Realm>();
    registry.register::<RequestedTransport>();
    registry.register::<UserName>();
    registry.register::<XorMappedAddress>();
    registry.register::<XorPeerAddress>();
    registry.register::<XorRelayedAddress>();
}

use crate::attributes::{stun_attribute, DecodeAttributeValue, EncodeAttributeValue};
use crate::common::check_value_size;
use crate::context::{AttributeDecoderContext, AttributeEncoderContext};
use crate::error::StunError;
use crate::{Decode, Encode};
use std::time::Duration;

const LIFETIME: u16 = 0x000D;
const LIFETIME_SIZE: usize = 4;

/// The [`LifeTime`] attribute represents the duration in seconds for which
/// the server will maintain an allocation in the absence of a refresh.
///
/// # Examples
///```rust
/// # use std::time::Duration;
/// # use turn_rs::attributes::LifeTime;
/// let attr = LifeTime::new(600);
/// assert_eq!(attr.as_u32(), 600);
/// assert_eq!(attr.as_duration(), Duration::from_secs(600));
///```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LifeTime(u32);

impl LifeTime {
    /// Creates a new [`LifeTime`] attribute from a number of seconds
    pub fn new(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Returns the lifetime in seconds
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the lifetime as a [`Duration`]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0.into())
    }
}

impl From<u32> for LifeTime {
    fn from(seconds: u32) -> Self {
        LifeTime::new(seconds)
    }
}

impl DecodeAttributeValue for LifeTime {
    fn decode(ctx: AttributeDecoderContext) -> Result<(Self, usize), StunError> {
        let raw_value = ctx.raw_value();
        check_value_size(raw_value, LIFETIME_SIZE)?;
        let (seconds, size) = u32::decode(raw_value)?;
        Ok((LifeTime(seconds), size))
    }
}

impl EncodeAttributeValue for LifeTime {
    fn encode(&self, mut ctx: AttributeEncoderContext) -> Result<usize, StunError> {
        self.0.encode(ctx.raw_value_mut())
    }
}

stun_attribute!(LifeTime, LIFETIME);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StunErrorType;
    use crate::TransactionId;

    #[test]
    fn decode_lifetime() {
        let value = [0x00, 0x00, 0x02, 0x58];
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &value);
        let (attr, size) = LifeTime::decode(ctx).expect("Can not decode LIFETIME");
        assert_eq!(size, 4);
        assert_eq!(attr, LifeTime::from(600));

        let value = [0x00, 0x00, 0x02];
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &value);
        assert_eq!(
            LifeTime::decode(ctx).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );

        let value = [0x00, 0x00, 0x02, 0x58, 0x00];
        let ctx = AttributeDecoderContext::new(TransactionId::default(), &value);
        assert_eq!(
            LifeTime::decode(ctx).expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }

    #[test]
    fn encode_lifetime() {
        let mut value = [0xffu8; 4];
        let ctx = AttributeEncoderContext::new(&[], &mut value);
        let size = LifeTime::new(3600)
            .encode(ctx)
            .expect("Can not encode LIFETIME");
        assert_eq!(size, 4);
        assert_eq!(value, [0x00, 0x00, 0x0e, 0x10]);
    }
}

use crate::attributes::{AttributeType, DecodeAttributeValue, StunAttribute, Unknown};
use crate::context::AttributeDecoderContext;
use crate::{StunAttributeType, StunError, TransactionId};
use lazy_static::lazy_static;
use std::collections::HashMap;

pub(crate) type DecoderHandler =
    fn(AttributeDecoderContext) -> Result<(StunAttribute, usize), StunError>;

#[derive(Default)]
pub(crate) struct DecoderRegistry(HashMap<AttributeType, DecoderHandler>);

impl DecoderRegistry {
    pub fn register<A>(&mut self)
    where
        A: DecodeAttributeValue + StunAttributeType + Into<StunAttribute> + 'static,
    {
        assert!(
            self.0
                .insert(A::get_type(), |ctx: AttributeDecoderContext| {
                    let (val, size) = A::decode(ctx)?;
                    Ok((val.into(), size))
                })
                .is_none(),
            "Could not register attribute type 0x{:04X} because it is already registered",
            A::get_type().as_u16()
        );
    }
}

lazy_static! {
    static ref REGISTRY: DecoderRegistry = {
        let mut registry = DecoderRegistry::default();
        crate::attributes::register_attributes(&mut registry);
        registry
    };
}

pub(crate) fn get_handler(t: AttributeType) -> Option<&'static DecoderHandler> {
    REGISTRY.0.get(&t)
}

/// Decodes a single attribute value looked up by its type tag. Values of
/// unregistered types are returned as [`Unknown`] attributes carrying
/// the raw bytes.
/// # Arguments:
/// - `attr_type` - The attribute type read from the TLV header.
/// - `transaction_id` - The transaction id of the enclosing message, used
///   by the XOR'ed address attributes.
/// - `value` - The attribute value, without padding.
///
/// # Examples
///```rust
/// # use turn_rs::{decode_attribute, AttributeType, TransactionId};
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let attr = decode_attribute(AttributeType::from(0x000D), TransactionId::default(), &[0x00, 0x00, 0x02, 0x58])?;
/// assert_eq!(attr.as_life_time()?.as_u32(), 600);
///
/// let attr = decode_attribute(AttributeType::from(0x8022), TransactionId::default(), b"test")?;
/// assert_eq!(attr.as_unknown()?.attribute_data(), b"test");
/// #
/// #   Ok(())
/// # }
///```
pub fn decode_attribute(
    attr_type: AttributeType,
    transaction_id: TransactionId,
    value: &[u8],
) -> Result<StunAttribute, StunError> {
    match get_handler(attr_type) {
        Some(handler) => {
            let (attr, _) = handler(AttributeDecoderContext::new(transaction_id, value))?;
            Ok(attr)
        }
        None => Ok(Unknown::new(attr_type, value).into()),
    }
}

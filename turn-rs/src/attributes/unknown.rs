use crate::attributes::EncodeAttributeValue;
use crate::context::AttributeEncoderContext;
use crate::error::{StunError, StunErrorType};
use crate::{AttributeType, StunAttribute};

/// Unknown attribute.
/// This attribute is added to a decoded message when there is not a known
/// handler to decode an attribute. The raw value is kept as an opaque blob.
/// Unknown attributes can not be encoded.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Unknown {
    attr_type: AttributeType,
    attr_data: Vec<u8>,
}

impl Unknown {
    pub(crate) fn new(attr_type: AttributeType, data: &[u8]) -> Self {
        Self {
            attr_type,
            attr_data: data.to_vec(),
        }
    }

    /// Returns the STUN attribute type associated to this unknown attribute.
    pub fn attribute_type(&self) -> AttributeType {
        self.attr_type
    }

    /// Returns the raw value associated to this unknown attribute.
    pub fn attribute_data(&self) -> &[u8] {
        &self.attr_data
    }
}

impl EncodeAttributeValue for Unknown {
    fn encode(&self, _ctx: AttributeEncoderContext) -> Result<usize, StunError> {
        Err(StunError::new(
            StunErrorType::InvalidParam,
            format!(
                "Unknown attribute [{:#06x}] can not be encoded",
                self.attr_type.as_u16()
            ),
        ))
    }

    fn post_encode(&self, _ctx: AttributeEncoderContext) -> Result<(), StunError> {
        Err(StunError::new(
            StunErrorType::InvalidParam,
            format!(
                "Unknown attribute [{:#06x}] can not be encoded",
                self.attr_type.as_u16()
            ),
        ))
    }
}

impl From<Unknown> for StunAttribute {
    fn from(value: Unknown) -> Self {
        StunAttribute::Unknown(value)
    }
}

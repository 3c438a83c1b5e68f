//! Field metadata resolution and wire type inference.

use tracing::debug;

use crate::error::MappingError;
use crate::object::{descriptor, BusinessObject, FieldSelection};
use crate::types::{FieldDefinition, FieldValue, WireType};

/// Wire type code for a field value.
///
/// Text and absent text both map to `C`; dates and date-times share `T`.
/// Any other kind is an error rather than a skipped column, since dropping
/// it would shift every following value out of position.
pub fn infer_type(value: &FieldValue) -> Result<WireType, MappingError> {
    match value {
        FieldValue::Integer(_) => Ok(WireType::Integer),
        FieldValue::Text(_) => Ok(WireType::Character),
        FieldValue::Decimal(_) => Ok(WireType::Numeric),
        FieldValue::Date(_) | FieldValue::DateTime(_) => Ok(WireType::Temporal),
        other => Err(MappingError::UnsupportedType { kind: other.kind() }),
    }
}

/// Field definitions for `selection`, in selection order.
///
/// The type of each field is taken from the object's current value, so an
/// optional text field classifies the same whether or not it is set.
pub fn resolve<T>(object: &T, selection: &FieldSelection) -> Result<Vec<FieldDefinition>, MappingError>
where
    T: BusinessObject + ?Sized,
{
    let descriptors = object.fields();
    selection
        .names()
        .iter()
        .map(|name| -> Result<FieldDefinition, MappingError> {
            let field = descriptor(descriptors, name)?;
            check_wire_name(name, field.wire_name)?;
            let value = object.value(name)?;
            let field_type = infer_type(&value).inspect_err(|_| {
                debug!(field = %name, kind = value.kind(), "field has no wire type");
            })?;
            Ok(FieldDefinition::new(field.wire_name, field_type))
        })
        .collect()
}

fn check_wire_name(field: &str, wire_name: &str) -> Result<(), MappingError> {
    let reason = if wire_name.is_empty() {
        "wire name is empty"
    } else if wire_name.chars().any(char::is_whitespace) {
        "wire name contains whitespace"
    } else if wire_name.chars().any(|c| c == '"' || c == '\'' || c == ',' || c.is_control()) {
        "wire name contains a reserved character"
    } else {
        return Ok(());
    };
    Err(MappingError::MetadataParse {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

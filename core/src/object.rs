//! The contract a domain record implements to be mapped into tables.
//!
//! # Design
//! Each business object type declares a static descriptor table that pairs
//! every logical field name with the wire name it serialises under. Which
//! fields take part in a request is decided by the caller through a
//! `FieldSelection`, so suppressing a field never mutates the object itself.

use crate::error::MappingError;
use crate::types::FieldValue;

/// Static metadata for one field of a business object.
///
/// `wire_name` must match the serde name the type serialises the field
/// under, so the table definition and the encoded record agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub wire_name: &'static str,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, wire_name: &'static str) -> Self {
        Self { name, wire_name }
    }
}

/// Ordered list of logical field names taking part in a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    names: Vec<String>,
}

impl FieldSelection {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Every field the descriptor table declares, in declaration order.
    pub fn all(descriptors: &[FieldDescriptor]) -> Self {
        Self::new(descriptors.iter().map(|d| d.name))
    }

    /// Drop `name` from the selection. Unknown names are ignored.
    pub fn without(mut self, name: &str) -> Self {
        self.names.retain(|n| n != name);
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// A domain record that can be mapped into an AccountView table.
pub trait BusinessObject {
    /// Business object code, e.g. `DJ1` for journal pages.
    fn business_object(&self) -> &str;

    /// Wire name of the table this record lives in.
    fn table(&self) -> &str;

    /// Descriptor table for every mappable field.
    fn fields(&self) -> &'static [FieldDescriptor];

    /// Current value of the logical field `field`.
    fn value(&self, field: &str) -> Result<FieldValue, MappingError>;

    fn field_names(&self) -> FieldSelection {
        FieldSelection::all(self.fields())
    }

    /// Values for `selection`, in selection order.
    fn values(&self, selection: &FieldSelection) -> Result<Vec<FieldValue>, MappingError> {
        selection.names().iter().map(|name| self.value(name)).collect()
    }
}

/// Look up the descriptor for `field`.
pub fn descriptor(
    descriptors: &'static [FieldDescriptor],
    field: &str,
) -> Result<&'static FieldDescriptor, MappingError> {
    descriptors
        .iter()
        .find(|d| d.name == field)
        .ok_or_else(|| MappingError::FieldNotFound {
            field: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor::new("DjCode", "DJ_CODE"),
        FieldDescriptor::new("TrnDate", "TRN_DATE"),
        FieldDescriptor::new("Period", "PERIOD"),
    ];

    #[test]
    fn all_keeps_declaration_order() {
        let selection = FieldSelection::all(FIELDS);
        assert_eq!(selection.names(), ["DjCode", "TrnDate", "Period"]);
    }

    #[test]
    fn without_suppresses_a_field() {
        let selection = FieldSelection::all(FIELDS).without("TrnDate");
        assert_eq!(selection.len(), 2);
        assert!(!selection.contains("TrnDate"));
        assert_eq!(selection.names(), ["DjCode", "Period"]);
    }

    #[test]
    fn without_unknown_field_is_noop() {
        let selection = FieldSelection::all(FIELDS).without("Nope");
        assert_eq!(selection, FieldSelection::all(FIELDS));
    }

    #[test]
    fn descriptor_lookup_reports_missing_field() {
        assert_eq!(descriptor(FIELDS, "Period").unwrap().wire_name, "PERIOD");
        let err = descriptor(FIELDS, "NoSuchField").unwrap_err();
        assert!(matches!(err, MappingError::FieldNotFound { field } if field == "NoSuchField"));
    }
}

//! Wire model of the AccountView data endpoint.
//!
//! # Design
//! The remote side describes every booking as tables: a header table
//! definition with one data row, plus optional detail table definitions
//! whose rows point back at the header through `RowId` / `HeaderId`.
//! Definitions and rows are positional, so the order of `Fields` must match
//! the order of `Values` in every row. `CompositePayload::validate` re-checks
//! that before anything is handed to transport.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::MappingError;

/// Synthetic row identifier appended to every table definition.
pub const ROW_ID: &str = "RowId";

/// Synthetic header linkage appended to every detail table definition.
pub const HEADER_ID: &str = "HeaderId";

/// The only header row identifier a request may carry.
pub const FIRST_ROW_ID: &str = "1";

/// Wire type code of a table field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireType {
    #[serde(rename = "I")]
    Integer,
    #[serde(rename = "C")]
    Character,
    #[serde(rename = "N")]
    Numeric,
    #[serde(rename = "T")]
    Temporal,
}

impl WireType {
    pub fn code(self) -> &'static str {
        match self {
            WireType::Integer => "I",
            WireType::Character => "C",
            WireType::Numeric => "N",
            WireType::Temporal => "T",
        }
    }
}

/// Runtime value of a single business object field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    /// Character data; `None` for an optional field that is not set.
    Text(Option<String>),
    /// Encoded as a JSON float, which is lossy past roughly 15 significant
    /// digits.
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Flags have no wire type and are rejected when mapped.
    Boolean(bool),
}

impl FieldValue {
    /// Name of the value's kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "integer",
            FieldValue::Text(_) => "string",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Boolean(_) => "bool",
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Integer(v) => serializer.serialize_i64(*v),
            FieldValue::Text(Some(v)) => serializer.serialize_str(v),
            FieldValue::Text(None) => serializer.serialize_none(),
            FieldValue::Decimal(v) => rust_decimal::serde::float::serialize(v, serializer),
            FieldValue::Date(v) => serializer.collect_str(&v.format("%Y-%m-%d")),
            FieldValue::DateTime(v) => {
                serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            FieldValue::Boolean(v) => serializer.serialize_bool(*v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(Some(v.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(Some(v))
    }
}

impl From<Option<String>> for FieldValue {
    fn from(v: Option<String>) -> Self {
        FieldValue::Text(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::DateTime(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: WireType,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: WireType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
        }
    }
}

/// A named, ordered list of field definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// Values aligned positionally with a `TableDefinition`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Row {
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableData {
    pub rows: Vec<Row>,
}

/// Rows of one detail group. Row ids are assigned by position in `rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetailDataEntry {
    pub rows: Vec<Row>,
}

impl DetailDataEntry {
    /// Row id the next appended row receives.
    pub fn next_row_id(&self) -> String {
        (self.rows.len() + 1).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSection {
    pub definition: TableDefinition,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detail_definitions: Vec<TableDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDataSection {
    pub data: TableData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detail_data: Vec<DetailDataEntry>,
}

/// The request body posted to the AccountView data endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompositePayload {
    #[serde(serialize_with = "serialize_book_date")]
    pub book_date: DateTime<Utc>,
    pub business_object: String,
    pub table: TableSection,
    pub table_data: TableDataSection,
}

fn serialize_book_date<S: Serializer>(v: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl CompositePayload {
    /// Check that every row lines up with its definition and that the
    /// synthetic identifiers follow the single-header layout.
    pub fn validate(&self) -> Result<(), MappingError> {
        let header_rows = &self.table_data.data.rows;
        if header_rows.len() != 1 {
            return Err(MappingError::Inconsistent(format!(
                "expected exactly one header row, got {}",
                header_rows.len()
            )));
        }
        let header_fields = self.table.definition.fields.len();
        if header_rows[0].values.len() != header_fields {
            return Err(MappingError::Inconsistent(format!(
                "header row has {} values for {} fields",
                header_rows[0].values.len(),
                header_fields
            )));
        }

        let definitions = &self.table.detail_definitions;
        let groups = &self.table_data.detail_data;
        if definitions.len() > 1 || definitions.len() != groups.len() {
            return Err(MappingError::Inconsistent(format!(
                "{} detail definitions for {} detail groups",
                definitions.len(),
                groups.len()
            )));
        }

        for (definition, group) in definitions.iter().zip(groups) {
            let width = definition.fields.len();
            for (i, row) in group.rows.iter().enumerate() {
                if row.values.len() != width {
                    return Err(MappingError::Inconsistent(format!(
                        "detail row {} has {} values for {} fields",
                        i + 1,
                        row.values.len(),
                        width
                    )));
                }
                let expected_row_id = FieldValue::from((i + 1).to_string());
                if width < 2
                    || row.values[width - 2] != expected_row_id
                    || row.values[width - 1] != FieldValue::from(FIRST_ROW_ID)
                {
                    return Err(MappingError::Inconsistent(format!(
                        "detail row {} carries unexpected row or header id",
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Error envelope returned by the remote side. An envelope with an empty
/// type and an empty message means "no error".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub error_numbers: Option<Vec<i64>>,
    #[serde(default)]
    pub error_message: String,
}

impl ErrorEnvelope {
    pub fn is_error(&self) -> bool {
        !(self.error_type.is_empty() && self.error_message.is_empty())
    }
}

impl std::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type, self.error_message)
    }
}

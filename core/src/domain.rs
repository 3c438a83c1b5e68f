//! Journal business objects: a journal page header with its journal lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, MappingError};
use crate::mapping::build_payload;
use crate::object::{BusinessObject, FieldDescriptor, FieldSelection};
use crate::types::{CompositePayload, FieldValue};

pub const JOURNAL_BUSINESS_OBJECT: &str = "DJ1";

const DJ_PAGE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("DjCode", "DJ_CODE"),
    FieldDescriptor::new("HdrDesc", "HDR_DESC"),
    FieldDescriptor::new("TrnDate", "TRN_DATE"),
    FieldDescriptor::new("Period", "PERIOD"),
    FieldDescriptor::new("SubNr", "SUB_NR"),
    FieldDescriptor::new("InvNr", "INV_NR"),
];

const DJ_LINE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("AcctNr", "ACCT_NR"),
    FieldDescriptor::new("Amount", "AMOUNT"),
    FieldDescriptor::new("RecID", "REC_ID"),
];

/// Header of a journal booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DjPage {
    #[serde(rename = "DJ_CODE")]
    pub dj_code: String,
    #[serde(rename = "HDR_DESC")]
    pub hdr_desc: String,
    #[serde(rename = "TRN_DATE")]
    pub trn_date: NaiveDate,
    #[serde(rename = "PERIOD")]
    pub period: i64,
    #[serde(rename = "SUB_NR")]
    pub sub_nr: Option<String>,
    #[serde(rename = "INV_NR")]
    pub inv_nr: Option<String>,
}

/// A single journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DjLine {
    #[serde(rename = "ACCT_NR")]
    pub acct_nr: String,
    #[serde(rename = "AMOUNT", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "REC_ID")]
    pub rec_id: String,
}

impl DjPage {
    /// Request body booking this page with `lines` as its detail rows.
    ///
    /// `fields` selects the page columns; lines always map every field.
    pub fn to_payload(
        &self,
        book_date: DateTime<Utc>,
        fields: &FieldSelection,
        lines: &[DjLine],
    ) -> Result<CompositePayload, BuildError> {
        let line_fields = FieldSelection::all(DJ_LINE_FIELDS);
        build_payload(book_date, self, fields, lines, &line_fields)
    }
}

impl BusinessObject for DjPage {
    fn business_object(&self) -> &str {
        JOURNAL_BUSINESS_OBJECT
    }

    fn table(&self) -> &str {
        "DJ_PAGE"
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        DJ_PAGE_FIELDS
    }

    fn value(&self, field: &str) -> Result<FieldValue, MappingError> {
        let value = match field {
            "DjCode" => self.dj_code.clone().into(),
            "HdrDesc" => self.hdr_desc.clone().into(),
            "TrnDate" => self.trn_date.into(),
            "Period" => self.period.into(),
            "SubNr" => self.sub_nr.clone().into(),
            "InvNr" => self.inv_nr.clone().into(),
            other => {
                return Err(MappingError::FieldNotFound {
                    field: other.to_string(),
                })
            }
        };
        Ok(value)
    }
}

impl BusinessObject for DjLine {
    fn business_object(&self) -> &str {
        JOURNAL_BUSINESS_OBJECT
    }

    fn table(&self) -> &str {
        "DJ_LINE"
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        DJ_LINE_FIELDS
    }

    fn value(&self, field: &str) -> Result<FieldValue, MappingError> {
        let value = match field {
            "AcctNr" => self.acct_nr.clone().into(),
            "Amount" => self.amount.into(),
            "RecID" => self.rec_id.clone().into(),
            other => {
                return Err(MappingError::FieldNotFound {
                    field: other.to_string(),
                })
            }
        };
        Ok(value)
    }
}

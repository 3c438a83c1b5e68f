//! Maps business objects onto the header/detail table layout.
//!
//! # Design
//! A request carries exactly one header row, identified as row `"1"`, and at
//! most one detail group whose rows all point back at that header. Every
//! function here reads its inputs and returns fresh output; a failing stage
//! leaves nothing half-built behind.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{BuildError, MappingError, Stage};
use crate::metadata::resolve;
use crate::object::{BusinessObject, FieldSelection};
use crate::types::{
    CompositePayload, DetailDataEntry, FieldDefinition, Row, TableData, TableDataSection,
    TableDefinition, TableSection, WireType, FIRST_ROW_ID, HEADER_ID, ROW_ID,
};

/// Header table definition: the selected fields plus a trailing `RowId`.
pub fn build_header_definition<T>(
    object: &T,
    selection: &FieldSelection,
) -> Result<TableDefinition, MappingError>
where
    T: BusinessObject + ?Sized,
{
    let mut fields = resolve(object, selection)?;
    fields.push(FieldDefinition::new(ROW_ID, WireType::Character));
    Ok(TableDefinition {
        name: object.table().to_string(),
        fields,
    })
}

/// The single header row, ending in row id `"1"`.
pub fn build_header_data<T>(object: &T, selection: &FieldSelection) -> Result<TableData, MappingError>
where
    T: BusinessObject + ?Sized,
{
    let mut values = object.values(selection)?;
    values.push(FIRST_ROW_ID.into());
    Ok(TableData {
        rows: vec![Row { values }],
    })
}

/// Detail table definition derived from one representative child.
///
/// Every child of a group is expected to expose the same fields; only
/// `sample` is inspected.
pub fn build_detail_definition<T>(
    sample: &T,
    selection: &FieldSelection,
) -> Result<TableDefinition, MappingError>
where
    T: BusinessObject + ?Sized,
{
    let mut fields = resolve(sample, selection)?;
    fields.push(FieldDefinition::new(ROW_ID, WireType::Character));
    fields.push(FieldDefinition::new(HEADER_ID, WireType::Character));
    Ok(TableDefinition {
        name: sample.table().to_string(),
        fields,
    })
}

/// Append one row per child to `entry`.
///
/// Row ids continue from the rows already in `entry`, so calling this
/// repeatedly keeps them unique within the group. Only header `"1"` exists,
/// any other `header_id` is rejected. On error `entry` is left untouched.
pub fn build_detail_rows<T>(
    children: &[T],
    selection: &FieldSelection,
    header_id: &str,
    entry: &mut DetailDataEntry,
) -> Result<(), MappingError>
where
    T: BusinessObject,
{
    if header_id != FIRST_ROW_ID {
        return Err(MappingError::Inconsistent(format!(
            "only header row {FIRST_ROW_ID} is supported, got {header_id}"
        )));
    }

    let offset = entry.rows.len();
    let rows = children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let mut values = child.values(selection)?;
            values.push((offset + i + 1).to_string().into());
            values.push(header_id.into());
            Ok(Row { values })
        })
        .collect::<Result<Vec<_>, MappingError>>()?;

    entry.rows.extend(rows);
    Ok(())
}

/// Build the full request body for `object` and its `children`.
///
/// `header_fields` selects the header columns, `detail_fields` the columns
/// of every child. With no children the payload carries no detail section.
pub fn build_payload<H, C>(
    book_date: DateTime<Utc>,
    object: &H,
    header_fields: &FieldSelection,
    children: &[C],
    detail_fields: &FieldSelection,
) -> Result<CompositePayload, BuildError>
where
    H: BusinessObject + ?Sized,
    C: BusinessObject,
{
    let business_object = object.business_object().to_string();
    debug!(%business_object, table = object.table(), "mapping header");

    let definition = build_header_definition(object, header_fields)
        .map_err(tagged(Stage::HeaderDefinition, Stage::HeaderData))?;
    let data = build_header_data(object, header_fields)
        .map_err(tagged(Stage::HeaderData, Stage::HeaderData))?;

    let mut detail_definitions = Vec::new();
    let mut detail_data = Vec::new();
    if let Some(sample) = children.first() {
        debug!(%business_object, table = sample.table(), rows = children.len(), "mapping details");

        let detail_definition = build_detail_definition(sample, detail_fields)
            .map_err(tagged(Stage::DetailDefinition, Stage::DetailData))?;

        let mut entry = DetailDataEntry::default();
        for child in children {
            build_detail_rows(std::slice::from_ref(child), detail_fields, FIRST_ROW_ID, &mut entry)
                .map_err(tagged(Stage::DetailData, Stage::DetailData))?;
        }

        detail_definitions.push(detail_definition);
        detail_data.push(entry);
    }

    Ok(CompositePayload {
        book_date,
        business_object,
        table: TableSection {
            definition,
            detail_definitions,
        },
        table_data: TableDataSection { data, detail_data },
    })
}

/// Error mapper for one stage. Value extraction failures belong to the data
/// stage even when a definition surfaces them first, since definitions read
/// values to infer wire types.
fn tagged(stage: Stage, data_stage: Stage) -> impl FnOnce(MappingError) -> BuildError {
    move |e| match e {
        MappingError::ValueExtraction { .. } => BuildError::new(data_stage, e),
        e => BuildError::new(stage, e),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::object::FieldDescriptor;
    use crate::types::FieldValue;

    struct Line {
        acct_nr: &'static str,
        amount: Decimal,
        closed: bool,
    }

    const LINE_FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor::new("AcctNr", "AcctNr"),
        FieldDescriptor::new("Amount", "Amount"),
        FieldDescriptor::new("Closed", "Closed"),
    ];

    impl BusinessObject for Line {
        fn business_object(&self) -> &str {
            "DJ1"
        }

        fn table(&self) -> &str {
            "DjLine"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            LINE_FIELDS
        }

        fn value(&self, field: &str) -> Result<FieldValue, MappingError> {
            match field {
                "AcctNr" => Ok(self.acct_nr.into()),
                "Amount" => Ok(self.amount.into()),
                "Closed" => Ok(self.closed.into()),
                other => Err(MappingError::FieldNotFound {
                    field: other.to_string(),
                }),
            }
        }
    }

    fn line(amount: Decimal) -> Line {
        Line {
            acct_nr: "9999",
            amount,
            closed: false,
        }
    }

    fn mapped() -> FieldSelection {
        FieldSelection::new(["AcctNr", "Amount"])
    }

    fn book_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 7, 2, 10, 39, 5).unwrap()
    }

    #[test]
    fn header_definition_and_data_line_up() {
        let object = line(Decimal::new(121, 1));
        let definition = build_header_definition(&object, &mapped()).unwrap();
        let data = build_header_data(&object, &mapped()).unwrap();

        assert_eq!(definition.name, "DjLine");
        assert_eq!(definition.fields.len(), 3);
        assert_eq!(definition.fields[2], FieldDefinition::new(ROW_ID, WireType::Character));
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].values.len(), 3);
        assert_eq!(data.rows[0].values[2], FieldValue::from("1"));
    }

    #[test]
    fn detail_definition_ends_with_row_and_header_id() {
        let definition = build_detail_definition(&line(Decimal::ONE), &mapped()).unwrap();
        assert_eq!(
            definition.fields,
            vec![
                FieldDefinition::new("AcctNr", WireType::Character),
                FieldDefinition::new("Amount", WireType::Numeric),
                FieldDefinition::new(ROW_ID, WireType::Character),
                FieldDefinition::new(HEADER_ID, WireType::Character),
            ]
        );
    }

    #[test]
    fn detail_rows_accumulate_row_ids() {
        let mut entry = DetailDataEntry::default();
        let first = [line(Decimal::new(121, 1)), line(Decimal::new(-121, 1))];
        let second = [line(Decimal::ONE)];
        build_detail_rows(&first, &mapped(), "1", &mut entry).unwrap();
        build_detail_rows(&second, &mapped(), "1", &mut entry).unwrap();

        let ids: Vec<_> = entry.rows.iter().map(|r| r.values[2].clone()).collect();
        assert_eq!(ids, vec![FieldValue::from("1"), FieldValue::from("2"), FieldValue::from("3")]);
        assert!(entry.rows.iter().all(|r| r.values[3] == FieldValue::from("1")));
        assert_eq!(entry.next_row_id(), "4");
    }

    #[test]
    fn detail_rows_reject_second_header() {
        let mut entry = DetailDataEntry::default();
        let err = build_detail_rows(&[line(Decimal::ONE)], &mapped(), "2", &mut entry).unwrap_err();
        assert!(matches!(err, MappingError::Inconsistent(_)));
        assert!(entry.rows.is_empty());
    }

    #[test]
    fn failing_child_leaves_entry_untouched() {
        let mut entry = DetailDataEntry::default();
        let selection = FieldSelection::new(["AcctNr", "Missing"]);
        let err = build_detail_rows(&[line(Decimal::ONE)], &selection, "1", &mut entry).unwrap_err();
        assert!(matches!(err, MappingError::FieldNotFound { .. }));
        assert!(entry.rows.is_empty());
    }

    #[test]
    fn payload_without_children_has_no_detail_section() {
        let object = line(Decimal::ONE);
        let payload =
            build_payload::<_, Line>(book_date(), &object, &mapped(), &[], &mapped()).unwrap();
        assert!(payload.table.detail_definitions.is_empty());
        assert!(payload.table_data.detail_data.is_empty());
        assert_eq!(payload.business_object, "DJ1");
        payload.validate().unwrap();
    }

    #[test]
    fn unsupported_header_field_aborts_before_details() {
        let object = line(Decimal::ONE);
        let header = FieldSelection::new(["AcctNr", "Closed"]);
        let children = [line(Decimal::ONE)];
        let err = build_payload(book_date(), &object, &header, &children, &mapped()).unwrap_err();
        assert_eq!(err.stage, Stage::HeaderDefinition);
        assert!(matches!(err.source, MappingError::UnsupportedType { kind: "bool" }));
    }

    #[test]
    fn unsupported_detail_field_reports_detail_stage() {
        let object = line(Decimal::ONE);
        let detail = FieldSelection::new(["Closed"]);
        let children = [line(Decimal::ONE)];
        let err = build_payload(book_date(), &object, &mapped(), &children, &detail).unwrap_err();
        assert_eq!(err.stage, Stage::DetailDefinition);
    }

    #[test]
    fn extraction_failures_carry_the_data_stage() {
        let err = tagged(Stage::DetailDefinition, Stage::DetailData)(MappingError::extraction("DJ_LINE", "overflow"));
        assert_eq!(err.stage, Stage::DetailData);

        let err = tagged(Stage::DetailDefinition, Stage::DetailData)(MappingError::UnsupportedType { kind: "bool" });
        assert_eq!(err.stage, Stage::DetailDefinition);
    }

    #[test]
    fn building_twice_is_identical() {
        let object = line(Decimal::ONE);
        let children = [line(Decimal::new(121, 1)), line(Decimal::new(-121, 1))];
        let a = build_payload(book_date(), &object, &mapped(), &children, &mapped()).unwrap();
        let b = build_payload(book_date(), &object, &mapped(), &children, &mapped()).unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }
}

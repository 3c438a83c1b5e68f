use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Business objects the server knows how to book.
pub const KNOWN_BUSINESS_OBJECTS: &[&str] = &["DJ1"];

const FIELD_TYPES: &[&str] = &["I", "C", "N", "T"];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataPost {
    pub book_date: String,
    pub business_object: String,
    pub table: Table,
    pub table_data: TableData,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Table {
    pub definition: Definition,
    #[serde(default)]
    pub detail_definitions: Vec<Definition>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Definition {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldDef {
    pub name: String,
    pub field_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableData {
    pub data: Rows,
    #[serde(default)]
    pub detail_data: Vec<Rows>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rows {
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Row {
    pub values: Vec<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorEnvelope {
    pub error_type: String,
    pub error_numbers: Option<Vec<i64>>,
    pub error_message: String,
}

/// A booking the server accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Booking {
    pub id: Uuid,
    pub business_object: String,
    pub table: String,
    pub book_date: String,
    pub header_rows: usize,
    pub detail_rows: usize,
}

/// Body of a successful post: an empty envelope plus the stored booking.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostResult {
    #[serde(flatten)]
    pub envelope: ErrorEnvelope,
    pub booking: Booking,
}

pub type Db = Arc<RwLock<Vec<Booking>>>;

type Rejection = (StatusCode, Json<ErrorEnvelope>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/accountviewdata", post(post_data).get(list_bookings))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn envelope(error_type: &str, numbers: Option<Vec<i64>>, message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope {
        error_type: error_type.to_string(),
        error_numbers: numbers,
        error_message: message.into(),
    }
}

fn reject(status: StatusCode, error_type: &str, number: i64, message: impl Into<String>) -> Rejection {
    let body = envelope(error_type, Some(vec![number]), message);
    warn!(%status, message = %body.error_message, "rejecting data post");
    (status, Json(body))
}

async fn list_bookings(State(db): State<Db>) -> Json<Vec<Booking>> {
    Json(db.read().await.clone())
}

async fn post_data(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Result<Json<DataPost>, JsonRejection>,
) -> Result<Json<Value>, Rejection> {
    let company = headers
        .get("x-company")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if company.is_empty() {
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            "AuthenticationError",
            401,
            "X-Company header is required",
        ));
    }

    let Json(post) = body.map_err(|e| reject(StatusCode::BAD_REQUEST, "AccountViewError", 1000, e.body_text()))?;
    validate(&post).map_err(|msg| reject(StatusCode::BAD_REQUEST, "AccountViewError", 1001, msg))?;

    // Unknown business objects are reported inside a 200 response.
    if !KNOWN_BUSINESS_OBJECTS.contains(&post.business_object.as_str()) {
        let body = envelope(
            "AccountViewError",
            None,
            format!("Unknown business object {}", post.business_object),
        );
        return Ok(Json(serde_json::to_value(body).unwrap_or_default()));
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        business_object: post.business_object,
        table: post.table.definition.name,
        book_date: post.book_date,
        header_rows: post.table_data.data.rows.len(),
        detail_rows: post.table_data.detail_data.iter().map(|d| d.rows.len()).sum(),
    };
    info!(company, id = %booking.id, detail_rows = booking.detail_rows, "booking accepted");
    db.write().await.push(booking.clone());

    let result = PostResult {
        envelope: ErrorEnvelope::default(),
        booking,
    };
    Ok(Json(serde_json::to_value(result).unwrap_or_default()))
}

/// Structural checks the remote side performs on every post.
pub fn validate(post: &DataPost) -> Result<(), String> {
    let header = &post.table.definition;
    check_definition(header, &["RowId"])?;

    let rows = &post.table_data.data.rows;
    if rows.len() != 1 {
        return Err(format!("expected one header row, got {}", rows.len()));
    }
    check_rows(header, rows)?;

    let details = &post.table.detail_definitions;
    let detail_data = &post.table_data.detail_data;
    if details.len() != detail_data.len() {
        return Err(format!(
            "{} detail definitions for {} detail groups",
            details.len(),
            detail_data.len()
        ));
    }
    for (definition, data) in details.iter().zip(detail_data) {
        check_definition(definition, &["RowId", "HeaderId"])?;
        check_rows(definition, &data.rows)?;
        for row in &data.rows {
            if row.values.last() != Some(&Value::from("1")) {
                return Err(format!("{}: detail row does not reference header 1", definition.name));
            }
        }
    }
    Ok(())
}

fn check_definition(definition: &Definition, trailing: &[&str]) -> Result<(), String> {
    if let Some(field) = definition
        .fields
        .iter()
        .find(|f| !FIELD_TYPES.contains(&f.field_type.as_str()))
    {
        return Err(format!(
            "{}: unknown field type {} for {}",
            definition.name, field.field_type, field.name
        ));
    }
    let names: Vec<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
    if !names.ends_with(trailing) {
        return Err(format!("{}: definition must end with {}", definition.name, trailing.join(", ")));
    }
    Ok(())
}

fn check_rows(definition: &Definition, rows: &[Row]) -> Result<(), String> {
    let width = definition.fields.len();
    match rows.iter().position(|r| r.values.len() != width) {
        Some(i) => Err(format!(
            "{}: row {} has {} values for {} fields",
            definition.name,
            i + 1,
            rows[i].values.len(),
            width
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> DataPost {
        serde_json::from_value(serde_json::json!({
            "BookDate": "2021-07-02T10:39:05.276Z",
            "BusinessObject": "DJ1",
            "Table": {
                "Definition": {"Name": "DJ_PAGE", "Fields": [
                    {"Name": "DJ_CODE", "FieldType": "C"},
                    {"Name": "RowId", "FieldType": "C"}
                ]},
                "DetailDefinitions": [{"Name": "DJ_LINE", "Fields": [
                    {"Name": "AMOUNT", "FieldType": "N"},
                    {"Name": "RowId", "FieldType": "C"},
                    {"Name": "HeaderId", "FieldType": "C"}
                ]}]
            },
            "TableData": {
                "Data": {"Rows": [{"Values": ["600", "1"]}]},
                "DetailData": [{"Rows": [{"Values": [12.1, "1", "1"]}]}]
            }
        }))
        .unwrap()
    }

    #[test]
    fn detail_sections_default_to_empty() {
        let post: DataPost = serde_json::from_value(serde_json::json!({
            "BookDate": "",
            "BusinessObject": "DJ1",
            "Table": {"Definition": {"Name": "DJ_PAGE", "Fields": []}},
            "TableData": {"Data": {"Rows": []}}
        }))
        .unwrap();
        assert!(post.table.detail_definitions.is_empty());
        assert!(post.table_data.detail_data.is_empty());
    }

    #[test]
    fn valid_post_passes() {
        assert!(validate(&post()).is_ok());
    }

    #[test]
    fn short_detail_row_is_rejected() {
        let mut p = post();
        p.table_data.detail_data[0].rows[0].values.remove(0);
        assert!(validate(&p).unwrap_err().contains("row 1 has 2 values for 3 fields"));
    }

    #[test]
    fn missing_header_id_is_rejected() {
        let mut p = post();
        p.table.detail_definitions[0].fields.pop();
        assert!(validate(&p).is_err());
    }

    #[test]
    fn unknown_field_type_is_rejected() {
        let mut p = post();
        p.table.definition.fields[0].field_type = "B".to_string();
        assert!(validate(&p).unwrap_err().contains("unknown field type B"));
    }

    #[test]
    fn success_envelope_flattens_into_result() {
        let result = PostResult {
            envelope: ErrorEnvelope::default(),
            booking: Booking {
                id: Uuid::nil(),
                business_object: "DJ1".to_string(),
                table: "DJ_PAGE".to_string(),
                book_date: String::new(),
                header_rows: 1,
                detail_rows: 0,
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ErrorType"], "");
        assert_eq!(json["ErrorNumbers"], Value::Null);
        assert_eq!(json["Booking"]["Table"], "DJ_PAGE");
    }
}

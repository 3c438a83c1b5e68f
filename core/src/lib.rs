//! Client-side adapter for the AccountView data endpoint.
//!
//! # Overview
//! Maps typed business objects (a journal page and its lines, say) onto the
//! generic table format the remote side accepts, and decodes the error
//! envelope it answers with. Nothing here touches the network: requests are
//! built as `HttpRequest` values and responses are parsed from
//! `HttpResponse` values the caller produced (host-does-IO pattern).
//!
//! # Design
//! - A business object implements `BusinessObject`: a business object code,
//!   a table name, a static descriptor table and per-field value access.
//! - `mapping::build_payload` assembles header definition and row plus an
//!   optional detail group, appending the synthetic `RowId` / `HeaderId`
//!   columns the wire format requires.
//! - Mapping is pure and stateless; every call reads its inputs and returns a
//!   fresh `CompositePayload` or a `BuildError` naming the failing stage.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod mapping;
pub mod metadata;
pub mod object;
pub mod types;

pub use client::AccountViewClient;
pub use config::ClientConfig;
pub use domain::{DjLine, DjPage};
pub use error::{ApiError, BuildError, MappingError, Stage};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mapping::{
    build_detail_definition, build_detail_rows, build_header_data, build_header_definition, build_payload,
};
pub use metadata::{infer_type, resolve};
pub use object::{BusinessObject, FieldDescriptor, FieldSelection};
pub use types::{CompositePayload, DetailDataEntry, ErrorEnvelope, FieldValue, TableDefinition, WireType};

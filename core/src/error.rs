//! Error types for the mapping engine and the AccountView client.
//!
//! # Design
//! Mapping failures are structural: a malformed domain model or a field whose
//! value has no wire type. They are never transient, so nothing here is
//! retryable. `BuildError` adds the stage that failed so a caller can tell a
//! broken header from a broken detail line. Transport-facing failures live in
//! `ApiError`, which also carries the remote error envelope verbatim.

use std::fmt;

use crate::types::ErrorEnvelope;

/// Structural failures raised while turning a business object into tables.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// A logical field name has no descriptor on the business object.
    #[error("{field} is not an existing field")]
    FieldNotFound { field: String },

    /// The descriptor's wire name is empty or not a usable JSON key.
    #[error("invalid wire name for field {field}: {reason}")]
    MetadataParse { field: String, reason: String },

    /// The field's runtime value has no wire type code.
    #[error("don't know how to map type {kind}")]
    UnsupportedType { kind: &'static str },

    /// The business object could not produce its field values.
    #[error("value extraction failed for {object}")]
    ValueExtraction {
        object: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Definitions and rows no longer line up positionally.
    #[error("inconsistent payload: {0}")]
    Inconsistent(String),
}

impl MappingError {
    /// Wrap a domain-side failure raised while extracting values.
    pub fn extraction<E>(object: &str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        MappingError::ValueExtraction {
            object: object.to_string(),
            source: source.into(),
        }
    }
}

/// The payload-building stage a `MappingError` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    HeaderDefinition,
    HeaderData,
    DetailDefinition,
    DetailData,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::HeaderDefinition => "header definition",
            Stage::HeaderData => "header data",
            Stage::DetailDefinition => "detail definition",
            Stage::DetailData => "detail data",
        };
        f.write_str(name)
    }
}

/// A `MappingError` tagged with the stage that produced it.
#[derive(Debug, thiserror::Error)]
#[error("building {stage} failed: {source}")]
pub struct BuildError {
    pub stage: Stage,
    #[source]
    pub source: MappingError,
}

impl BuildError {
    pub fn new(stage: Stage, source: MappingError) -> Self {
        Self { stage, source }
    }
}

/// Errors returned by `AccountViewClient` build and parse methods.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The remote side answered with a populated error envelope.
    #[error("{0}")]
    Remote(ErrorEnvelope),

    /// A non-2xx status whose body carried no error envelope.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// An error response was not JSON.
    #[error("expected content type \"{expected}\", got \"{actual}\"")]
    UnexpectedContentType { expected: String, actual: String },

    /// An error response arrived without a body.
    #[error("response body is empty")]
    EmptyBody,

    /// The response body could not be deserialized.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The payload failed its positional consistency check.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A business object could not be mapped into a payload.
    #[error(transparent)]
    Build(#[from] BuildError),
}

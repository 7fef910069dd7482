// src/ingest/error.rs
use thiserror::Error;

/// Failure kinds surfaced by the content source and the document store.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Network/API failure from the content source.
    #[error("external source error: {0}")]
    ExternalSource(String),
    /// Failure from the document store.
    #[error("store error: {0}")]
    Store(String),
    /// Unexpected or missing fields in a response.
    #[error("malformed data: {0}")]
    MalformedData(String),
}

impl IngestError {
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::ExternalSource(_) => "external_source",
            IngestError::Store(_) => "store",
            IngestError::MalformedData(_) => "malformed_data",
        }
    }
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

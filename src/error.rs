use thiserror::Error;

/// Failures on the upload path. Validation and authentication failures are
/// operator-correctable and must stay distinguishable from a corrupt document.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid upload: {0}")]
    Validation(String),

    #[error("document password was rejected: {0}")]
    Authentication(String),

    #[error("failed to extract document: {0}")]
    Parse(String),

    /// A zero-vehicle certificate is never a successful upload.
    #[error("document yielded no vehicle records")]
    EmptyExtraction,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("certificate not found: {0}")]
    CertificateNotFound(String),

    #[error("record not found: {certificate_id}/{record_id}")]
    RecordNotFound {
        certificate_id: String,
        record_id: String,
    },

    #[error("vehicle not found in active or archived inventory: {0}")]
    VehicleNotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Errors surfaced by record validation and the storage backends.
///
/// Every operation returns these directly to the caller; there is no retry
/// or recovery layer in this crate.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A field value violates a type, length, or format constraint.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness constraint was violated at creation time.
    #[error("uniqueness violation: {0}")]
    UniquenessViolation(&'static str),

    /// A lookup by slug or identifier matched no record.
    #[error("record not found")]
    NotFound,

    /// The storage layer itself failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RecordError {
    /// Whether the error is the caller's fault (bad input or a conflicting
    /// write) rather than a storage failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecordError::Validation(_)
                | RecordError::UniquenessViolation(_)
                | RecordError::NotFound
        )
    }
}

pub(crate) fn validation<S: Into<String>>(msg: S) -> RecordError {
    let msg = msg.into();
    tracing::warn!("validation failed: {msg}");
    RecordError::Validation(msg)
}

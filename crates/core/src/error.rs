#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

/// Error returned by [`Formatter::format`](crate::formatter::Formatter::format).
///
/// Encoding is the only way formatting can fail. Any bytes already appended
/// to the destination buffer should be discarded.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to marshal fields to JSON, {0}")]
    Encode(#[from] serde_json::Error),
}

/// Error returned when installing the global subscriber.
#[cfg(feature = "layer")]
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// A record could not be converted to or from the store's native format.
    #[error("Conversion error in field '{field}': {message}")]
    Conversion { field: String, message: String },

    /// The store reported a value the adapter cannot interpret.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// MongoDB driver error.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Error raised by a non-driver store, e.g. injected by a test double.
    #[error("Store error: {0}")]
    Store(String),
}

impl AdapterError {
    pub fn conversion(field: impl Into<String>, message: impl Into<String>) -> Self {
        AdapterError::Conversion {
            field: field.into(),
            message: message.into(),
        }
    }
}

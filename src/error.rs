use thiserror::Error;

/// Failures of the key-value storage backing the site state.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize storage contents: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Rejections from [`crate::cart::CartItem::new`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartItemError {
    #[error("cart item is missing its {0}")]
    MissingField(&'static str),
}

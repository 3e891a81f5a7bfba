use reel_tree::TreeError;

/// Errors from store directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    /// I/O error while reading or writing the store directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document was read but could not be turned into a tree.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// The configuration file is malformed or could not be written.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias for store directory operations.
pub type DiskResult<T> = Result<T, DiskError>;

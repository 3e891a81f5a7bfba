//! Error types for tree store operations.

use reel_types::ItemId;
use thiserror::Error;

/// Errors that can occur during tree operations.
///
/// Path lookups never produce an error: an address with no matching node is
/// an ordinary `None`.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The document root could not be decoded.
    #[error("cannot decode document: {reason}")]
    Decode { reason: String },

    /// The item is not part of this store.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// The item is a recording where a folder is required.
    #[error("not a folder: {0}")]
    NotAFolder(ItemId),

    /// Moving `item` under `target` would make it its own ancestor.
    #[error("cannot move {item} under its own descendant {target}")]
    ReparentCycle { item: ItemId, target: ItemId },

    /// The root folder cannot be moved or deleted.
    #[error("the root folder cannot be moved or deleted")]
    RootImmovable,

    /// An item with this identifier already lives in the store.
    #[error("duplicate item id: {0}")]
    DuplicateId(ItemId),

    /// JSON text could not be produced or parsed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A shared store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<serde_json::Error> for TreeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Convenience type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

//! Foundation types for Reel.
//!
//! Every other Reel crate depends on `reel-types` for the identity
//! primitives that tie the recording tree together.
//!
//! # Key Types
//!
//! - [`ItemId`] - Stable identity of a folder or recording (UUID v4)
//! - [`StoreId`] - Identity of one tree store instance

pub mod error;
pub mod identity;

pub use error::TypeError;
pub use identity::{ItemId, StoreId};

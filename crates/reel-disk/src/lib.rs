//! On-disk store directories for Reel.
//!
//! A store directory holds the tree document, an optional `reel.toml`, and
//! one payload file per recording named after the recording's identifier.
//! [`StoreDirectory`] loads and saves the document; [`PayloadSweeper`]
//! removes payloads once their recordings are deleted from the tree.

pub mod config;
pub mod directory;
pub mod error;
pub mod sweeper;

pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use directory::{PayloadDir, StoreDirectory};
pub use error::{DiskError, DiskResult};
pub use sweeper::PayloadSweeper;

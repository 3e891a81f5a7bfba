//! The seam between the tree and wherever recording payloads live.

use std::path::PathBuf;

use reel_types::ItemId;

/// Maps a recording's identity to the location of its payload bytes.
///
/// The mapping must depend on the identifier alone, so a recording keeps
/// its payload across renames and moves. The tree never opens the location
/// itself.
pub trait PayloadResolver: Send + Sync {
    fn location(&self, id: ItemId) -> PathBuf;
}

impl<F> PayloadResolver for F
where
    F: Fn(ItemId) -> PathBuf + Send + Sync,
{
    fn location(&self, id: ItemId) -> PathBuf {
        self(id)
    }
}

use std::fs;
use std::io;

use tracing::{debug, warn};

use reel_tree::{ChangeEvent, ChangeObserver, PayloadResolver};
use reel_types::ItemId;

/// Deletes payload files of recordings a store has released.
///
/// Either subscribe one to a store, which sweeps as soon as a removal is
/// emitted, or call [`sweep`](Self::sweep) with the released ids once the
/// removal has been persisted. Moves and renames release nothing, so
/// payloads survive them.
#[derive(Clone, Debug)]
pub struct PayloadSweeper<R> {
    resolver: R,
}

impl<R: PayloadResolver> PayloadSweeper<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Remove the payload files of `ids`. Missing files are not an error.
    ///
    /// Hosts that persist the tree should call this only once the document
    /// without these recordings has been written.
    pub fn sweep(&self, ids: &[ItemId]) {
        for &id in ids {
            let path = self.resolver.location(id);
            match fs::remove_file(&path) {
                Ok(()) => debug!(item = %id, path = %path.display(), "removed payload"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(item = %id, path = %path.display(), error = %e, "failed to remove payload"),
            }
        }
    }
}

impl<R: PayloadResolver> ChangeObserver for PayloadSweeper<R> {
    fn on_change(&self, event: &ChangeEvent) {
        self.sweep(event.released());
    }
}

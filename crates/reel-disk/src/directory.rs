//! A store directory: one JSON document plus one payload file per recording.
//!
//! ```text
//! <base>/
//!   reel.toml                  optional configuration
//!   store.json                 the tree document
//!   <UPPERCASE-UUID>.m4a       one payload per recording
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use reel_tree::{LoadReport, PayloadResolver, TreeStore};
use reel_types::ItemId;

use crate::config::StoreConfig;
use crate::error::{DiskError, DiskResult};

/// Resolves recording payloads to `<dir>/<UPPERCASE-UUID>.<extension>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadDir {
    dir: PathBuf,
    extension: String,
}

impl PayloadDir {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PayloadResolver for PayloadDir {
    fn location(&self, id: ItemId) -> PathBuf {
        self.dir
            .join(format!("{}.{}", id.to_canonical(), self.extension))
    }
}

/// A store rooted at a directory on disk.
#[derive(Clone, Debug)]
pub struct StoreDirectory {
    base: PathBuf,
    config: StoreConfig,
}

impl StoreDirectory {
    /// Use `base` with an explicit configuration.
    pub fn new(base: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            base: base.into(),
            config,
        }
    }

    /// Use `base`, reading `reel.toml` from it when present.
    pub fn open(base: impl Into<PathBuf>) -> DiskResult<Self> {
        let base = base.into();
        let config = StoreConfig::load(&base)?;
        Ok(Self { base, config })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn document_path(&self) -> PathBuf {
        self.base.join(&self.config.document_name)
    }

    /// Whether a document has been saved here.
    pub fn exists(&self) -> bool {
        self.document_path().is_file()
    }

    /// Payload resolver for this directory.
    pub fn payloads(&self) -> PayloadDir {
        PayloadDir::new(&self.base, &self.config.payload_extension)
    }

    /// Load the tree. A directory without a document yields a fresh store
    /// with an empty root folder.
    pub fn load(&self) -> DiskResult<(TreeStore, LoadReport)> {
        let path = self.document_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no document; starting an empty store");
                let store = TreeStore::new(self.config.root_name.clone());
                let report = LoadReport {
                    items: store.len(),
                    skipped: 0,
                };
                return Ok((store, report));
            }
            Err(e) => return Err(e.into()),
        };

        let (store, report) = TreeStore::from_json(&text)?;
        if report.is_clean() {
            debug!(path = %path.display(), items = report.items, "loaded store");
        } else {
            warn!(
                path = %path.display(),
                items = report.items,
                skipped = report.skipped,
                "loaded store with malformed records skipped"
            );
        }
        Ok((store, report))
    }

    /// Write the tree document.
    ///
    /// The document is written to a temporary file in the same directory
    /// and renamed over the old one, so readers see either the old or the
    /// new document.
    pub fn save(&self, store: &TreeStore) -> DiskResult<()> {
        fs::create_dir_all(&self.base)?;
        let text = store.to_json(self.config.pretty)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.base)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        let path = self.document_path();
        tmp.persist(&path).map_err(|e| DiskError::Io(e.error))?;

        debug!(path = %path.display(), items = store.len(), "saved store");
        Ok(())
    }

    /// Copy `source` into place as the payload of recording `id`.
    pub fn import_payload(&self, id: ItemId, source: &Path) -> DiskResult<PathBuf> {
        fs::create_dir_all(&self.base)?;
        let dest = self.payloads().location(id);
        let bytes = fs::copy(source, &dest)?;
        debug!(item = %id, bytes, dest = %dest.display(), "imported payload");
        Ok(dest)
    }
}

impl PayloadResolver for StoreDirectory {
    fn location(&self, id: ItemId) -> PathBuf {
        self.payloads().location(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reel_tree::Item;

    fn dir() -> (tempfile::TempDir, StoreDirectory) {
        let tmp = tempfile::tempdir().unwrap();
        let store_dir = StoreDirectory::new(tmp.path(), StoreConfig::default());
        (tmp, store_dir)
    }

    #[test]
    fn payload_location_uses_uppercase_uuid() {
        let id: ItemId = "1b4e28ba-2fa1-11d2-883f-0016d3cca427".parse().unwrap();
        let payloads = PayloadDir::new("/data", "m4a");
        assert_eq!(
            payloads.location(id),
            PathBuf::from("/data/1B4E28BA-2FA1-11D2-883F-0016D3CCA427.m4a")
        );
    }

    #[test]
    fn missing_document_gives_fresh_store() {
        let (_tmp, store_dir) = dir();
        assert!(!store_dir.exists());
        let (store, report) = store_dir.load().unwrap();
        assert_eq!(store.root().name(), "Recordings");
        assert_eq!(store.len(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn save_then_load_preserves_tree() {
        let (_tmp, store_dir) = dir();
        let (mut store, _) = store_dir.load().unwrap();
        let root = store.root_id();
        let folder = store.add(root, Item::folder("Lectures")).unwrap();
        let rec = store.add(folder, Item::recording("Week 1")).unwrap();
        store_dir.save(&store).unwrap();
        assert!(store_dir.exists());

        let (loaded, report) = store_dir.load().unwrap();
        assert!(report.is_clean());
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.identifier_path(rec), Some(vec![root, folder, rec]));
        assert_eq!(loaded.get(rec).unwrap().name(), "Week 1");
    }

    #[test]
    fn save_replaces_previous_document() {
        let (tmp, store_dir) = dir();
        let (mut store, _) = store_dir.load().unwrap();
        store_dir.save(&store).unwrap();
        let root = store.root_id();
        store.add(root, Item::recording("later")).unwrap();
        store_dir.save(&store).unwrap();

        let (loaded, _) = store_dir.load().unwrap();
        assert_eq!(loaded.len(), 2);
        // No temporary files left behind.
        let entries = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn corrupt_document_is_tree_error() {
        let (_tmp, store_dir) = dir();
        fs::write(store_dir.document_path(), "not json").unwrap();
        assert!(matches!(store_dir.load(), Err(DiskError::Tree(_))));
    }

    #[test]
    fn malformed_children_are_reported() {
        let (_tmp, store_dir) = dir();
        let doc = r#"{
            "name": "Recordings",
            "uuid": "00000000-0000-0000-0000-000000000000",
            "isFolder": true,
            "children": [
                {"name": "ok", "uuid": "1B4E28BA-2FA1-11D2-883F-0016D3CCA427", "isFolder": false},
                {"name": "bad", "uuid": "nope", "isFolder": false}
            ]
        }"#;
        fs::write(store_dir.document_path(), doc).unwrap();
        let (store, report) = store_dir.load().unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn open_reads_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            document_name: "tree.json".into(),
            root_name: "Memos".into(),
            ..Default::default()
        };
        config.save(tmp.path()).unwrap();

        let store_dir = StoreDirectory::open(tmp.path()).unwrap();
        assert_eq!(store_dir.document_path(), tmp.path().join("tree.json"));
        let (store, _) = store_dir.load().unwrap();
        assert_eq!(store.root().name(), "Memos");
    }

    #[test]
    fn import_payload_copies_into_place() {
        let (tmp, store_dir) = dir();
        let source = tmp.path().join("take.m4a");
        fs::write(&source, b"audio").unwrap();
        let id = ItemId::new();
        let dest = store_dir.import_payload(id, &source).unwrap();
        assert_eq!(dest, store_dir.location(id));
        assert_eq!(fs::read(dest).unwrap(), b"audio");
    }

    proptest! {
        #[test]
        fn names_survive_disk(names in prop::collection::vec(".{0,12}", 0..8)) {
            let (_tmp, store_dir) = dir();
            let (mut store, _) = store_dir.load().unwrap();
            let root = store.root_id();
            let ids: Vec<_> = names
                .iter()
                .map(|n| store.add(root, Item::recording(n.clone())).unwrap())
                .collect();
            store_dir.save(&store).unwrap();

            let (loaded, report) = store_dir.load().unwrap();
            prop_assert!(report.is_clean());
            for (id, name) in ids.iter().zip(&names) {
                prop_assert_eq!(loaded.get(*id).unwrap().name(), name.as_str());
            }
            prop_assert_eq!(loaded.root().child_ids(), store.root().child_ids());
        }
    }

    #[test]
    fn store_payload_location_is_recordings_only() {
        let (_tmp, store_dir) = dir();
        let (mut store, _) = store_dir.load().unwrap();
        let root = store.root_id();
        let folder = store.add(root, Item::folder("F")).unwrap();
        let rec = store.add(folder, Item::recording("R")).unwrap();
        assert_eq!(store.payload_location(folder, &store_dir), None);
        assert_eq!(
            store.payload_location(rec, &store_dir),
            Some(store_dir.base().join(format!("{}.m4a", rec.to_canonical())))
        );
    }
}

//! JSON document codec for the tree.
//!
//! Each node is one record:
//!
//! ```text
//! { "name": "...", "uuid": "UPPERCASE-HYPHENATED-UUID", "isFolder": bool,
//!   "children": [ ...records ] }        // folders only
//! ```
//!
//! Decoding is tolerant below the root: a child record that is not an
//! object, lacks a field, carries an unparsable uuid, or repeats a uuid
//! already seen is dropped together with its subtree, logged, and counted.
//! Sibling order is not trusted; the store re-sorts on load.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use reel_types::{ItemId, TypeError};

use crate::error::{Result, TreeError};
use crate::item::{Item, ItemKind};
use crate::store::NodeRef;

pub const NAME_KEY: &str = "name";
pub const UUID_KEY: &str = "uuid";
pub const IS_FOLDER_KEY: &str = "isFolder";
pub const CHILDREN_KEY: &str = "children";

/// Outcome of a tolerant decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Records decoded into the tree, root included.
    pub items: usize,
    /// Child records dropped as malformed. A dropped folder counts once,
    /// whatever it contained.
    pub skipped: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// Why a single record was rejected.
#[derive(Debug, Error)]
enum RecordError {
    #[error("record is not an object")]
    NotAnObject,

    #[error("missing or mistyped field `{0}`")]
    Field(&'static str),

    #[error(transparent)]
    Uuid(#[from] TypeError),

    #[error("duplicate uuid {0}")]
    Duplicate(ItemId),
}

/// Encode a node and its subtree as a record.
pub fn encode(node: NodeRef<'_>) -> Value {
    let mut record = Map::new();
    record.insert(NAME_KEY.into(), Value::String(node.name().to_string()));
    record.insert(UUID_KEY.into(), Value::String(node.id().to_canonical()));
    record.insert(IS_FOLDER_KEY.into(), Value::Bool(node.is_folder()));
    if node.is_folder() {
        let children = node.children().map(encode).collect();
        record.insert(CHILDREN_KEY.into(), Value::Array(children));
    }
    Value::Object(record)
}

/// Decode a document into a detached root folder.
///
/// Fails only when the root record itself is unusable or is not a folder.
pub fn decode(document: &Value) -> Result<(Item, LoadReport)> {
    let mut decoder = Decoder::default();
    let root = decoder.record(document).map_err(|e| TreeError::Decode {
        reason: format!("root record: {e}"),
    })?;
    if !root.is_folder() {
        return Err(TreeError::Decode {
            reason: format!("root record {} is not a folder", root.id()),
        });
    }
    decoder.report.items = root.len();
    Ok((root, decoder.report))
}

#[derive(Default)]
struct Decoder {
    seen: HashSet<ItemId>,
    report: LoadReport,
}

impl Decoder {
    fn record(&mut self, value: &Value) -> std::result::Result<Item, RecordError> {
        let record = value.as_object().ok_or(RecordError::NotAnObject)?;
        let name = record
            .get(NAME_KEY)
            .and_then(Value::as_str)
            .ok_or(RecordError::Field(NAME_KEY))?;
        let uuid = record
            .get(UUID_KEY)
            .and_then(Value::as_str)
            .ok_or(RecordError::Field(UUID_KEY))?;
        let is_folder = record
            .get(IS_FOLDER_KEY)
            .and_then(Value::as_bool)
            .ok_or(RecordError::Field(IS_FOLDER_KEY))?;
        let id = ItemId::parse(uuid)?;

        if !is_folder {
            self.claim(id)?;
            return Ok(Item::with_id(ItemKind::Recording, id, name));
        }

        let entries: &[Value] = match record.get(CHILDREN_KEY) {
            None | Some(Value::Null) => &[],
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(RecordError::Field(CHILDREN_KEY)),
        };
        self.claim(id)?;

        let mut children = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match self.record(entry) {
                Ok(child) => children.push(child),
                Err(e) => {
                    warn!(parent = %id, index, error = %e, "skipping malformed record");
                    self.report.skipped += 1;
                }
            }
        }

        Ok(Item::Folder {
            id,
            name: name.to_string(),
            children,
        })
    }

    fn claim(&mut self, id: ItemId) -> std::result::Result<(), RecordError> {
        if self.seen.insert(id) {
            Ok(())
        } else {
            Err(RecordError::Duplicate(id))
        }
    }
}

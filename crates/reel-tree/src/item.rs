//! Detached items: folders and recordings that belong to no store.
//!
//! An [`Item`] is the owned form of a node. Freshly constructed items and
//! subtrees removed from a store are both `Item`s: they have no parent and no
//! store, and dropping one drops the whole subtree. Attaching an `Item` to a
//! store hands ownership to the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use reel_types::{ItemId, StoreId};

use crate::error::{Result, TreeError};

/// The two kinds of node in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// A container holding other items.
    Folder,
    /// A leaf whose payload lives outside the tree.
    Recording,
}

impl ItemKind {
    pub fn is_folder(self) -> bool {
        matches!(self, Self::Folder)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Folder => "folder",
            Self::Recording => "recording",
        };
        write!(f, "{s}")
    }
}

/// An owned folder or recording outside any store.
///
/// Only the `Folder` variant carries children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Folder {
        id: ItemId,
        name: String,
        children: Vec<Item>,
    },
    Recording {
        id: ItemId,
        name: String,
    },
}

impl Item {
    /// A new empty folder with a fresh identity.
    pub fn folder(name: impl Into<String>) -> Self {
        Self::Folder {
            id: ItemId::new(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// A new recording with a fresh identity.
    pub fn recording(name: impl Into<String>) -> Self {
        Self::Recording {
            id: ItemId::new(),
            name: name.into(),
        }
    }

    /// Rebuild an item with a known identity (used when decoding).
    pub fn with_id(kind: ItemKind, id: ItemId, name: impl Into<String>) -> Self {
        match kind {
            ItemKind::Folder => Self::Folder {
                id,
                name: name.into(),
                children: Vec::new(),
            },
            ItemKind::Recording => Self::Recording {
                id,
                name: name.into(),
            },
        }
    }

    pub fn id(&self) -> ItemId {
        match self {
            Self::Folder { id, .. } | Self::Recording { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } | Self::Recording { name, .. } => name,
        }
    }

    /// Rename a detached item. No ordering or notification is involved.
    pub fn set_name(&mut self, new_name: impl Into<String>) {
        match self {
            Self::Folder { name, .. } | Self::Recording { name, .. } => *name = new_name.into(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Folder { .. } => ItemKind::Folder,
            Self::Recording { .. } => ItemKind::Recording,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind().is_folder()
    }

    /// A detached item never has a parent.
    pub fn parent(&self) -> Option<ItemId> {
        None
    }

    /// A detached item never belongs to a store.
    pub fn store(&self) -> Option<StoreId> {
        None
    }

    /// Children of a folder; empty for recordings.
    pub fn children(&self) -> &[Item] {
        match self {
            Self::Folder { children, .. } => children,
            Self::Recording { .. } => &[],
        }
    }

    /// Append a child to a detached folder.
    ///
    /// Order is irrelevant here: a store sorts children on attach.
    pub fn push_child(&mut self, child: Item) -> Result<()> {
        match self {
            Self::Folder { children, .. } => {
                children.push(child);
                Ok(())
            }
            Self::Recording { id, .. } => Err(TreeError::NotAFolder(*id)),
        }
    }

    /// Builder form of [`push_child`](Self::push_child).
    pub fn with_child(mut self, child: Item) -> Result<Self> {
        self.push_child(child)?;
        Ok(self)
    }

    /// Number of items in this subtree, including `self`.
    pub fn len(&self) -> usize {
        1 + self.children().iter().map(Item::len).sum::<usize>()
    }

    /// Always `false`: a subtree contains at least its own root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Identifiers of every item in the subtree, pre-order.
    pub fn ids(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_ids(&mut out, false);
        out
    }

    /// Identifiers of every recording in the subtree, pre-order.
    pub fn recording_ids(&self) -> Vec<ItemId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out, true);
        out
    }

    fn collect_ids(&self, out: &mut Vec<ItemId>, recordings_only: bool) {
        if !recordings_only || !self.is_folder() {
            out.push(self.id());
        }
        for child in self.children() {
            child.collect_ids(out, recordings_only);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_items_are_detached() {
        let folder = Item::folder("Drafts");
        assert!(folder.is_folder());
        assert_eq!(folder.name(), "Drafts");
        assert!(folder.parent().is_none());
        assert!(folder.store().is_none());
        assert!(folder.children().is_empty());

        let rec = Item::recording("take 1");
        assert_eq!(rec.kind(), ItemKind::Recording);
        assert_ne!(folder.id(), rec.id());
    }

    #[test]
    fn recordings_reject_children() {
        let mut rec = Item::recording("leaf");
        let err = rec.push_child(Item::recording("child")).unwrap_err();
        assert!(matches!(err, TreeError::NotAFolder(id) if id == rec.id()));
    }

    #[test]
    fn subtree_counts_and_ids() {
        let a = Item::recording("a");
        let b = Item::recording("b");
        let inner = Item::folder("inner").with_child(b.clone()).unwrap();
        let outer = Item::folder("outer")
            .with_child(a.clone())
            .unwrap()
            .with_child(inner.clone())
            .unwrap();

        assert_eq!(outer.len(), 4);
        assert_eq!(outer.ids(), vec![outer.id(), a.id(), inner.id(), b.id()]);
        assert_eq!(outer.recording_ids(), vec![a.id(), b.id()]);
    }

    #[test]
    fn set_name_on_detached_item() {
        let mut rec = Item::recording("");
        rec.set_name("Interview");
        assert_eq!(rec.name(), "Interview");
    }

    #[test]
    fn with_id_keeps_identity() {
        let id = ItemId::new();
        let folder = Item::with_id(ItemKind::Folder, id, "x");
        assert_eq!(folder.id(), id);
        assert!(folder.is_folder());
    }

    #[test]
    fn kind_display() {
        assert_eq!(ItemKind::Folder.to_string(), "folder");
        assert_eq!(ItemKind::Recording.to_string(), "recording");
    }
}

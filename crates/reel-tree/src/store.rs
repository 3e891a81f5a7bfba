//! The tree store: an arena of folders and recordings under one root.
//!
//! [`TreeStore`] owns every attached node in a `HashMap` keyed by
//! [`ItemId`]. A folder lists its children by identifier and each node
//! records its parent the same way, so both directions are plain handles:
//! a handle whose target has been removed simply resolves to `None`.
//! Membership in the map is what ties a node to its store, which makes the
//! store of a subtree change exactly when the subtree is attached or
//! detached.
//!
//! # Invariants
//!
//! - Every node except the root has a parent, and appears exactly once in
//!   that parent's children.
//! - Children are always in canonical order (see [`crate::ordering`]).
//! - The parent relation is acyclic; moves that would break this are
//!   rejected before anything changes.
//! - Every mutation either fully succeeds and emits its events, or fails
//!   and leaves the store untouched.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, error};

use reel_types::{ItemId, StoreId};

use crate::codec::{self, LoadReport};
use crate::error::{Result, TreeError};
use crate::item::{Item, ItemKind};
use crate::notify::{ChangeEvent, ChangeKind, ChangeObserver, Notifier, ObserverId};
use crate::ordering::{self, SortKey};
use crate::resolver::PayloadResolver;

/// Default name of the root folder of a fresh store.
pub const DEFAULT_ROOT_NAME: &str = "Recordings";

#[derive(Debug)]
enum Body {
    Folder(Vec<ItemId>),
    Recording,
}

/// A node as stored in the arena.
#[derive(Debug)]
struct Slot {
    name: String,
    parent: Option<ItemId>,
    body: Body,
}

impl Slot {
    fn kind(&self) -> ItemKind {
        match self.body {
            Body::Folder(_) => ItemKind::Folder,
            Body::Recording => ItemKind::Recording,
        }
    }

    fn children(&self) -> &[ItemId] {
        match &self.body {
            Body::Folder(children) => children,
            Body::Recording => &[],
        }
    }
}

/// A hierarchical store of folders and recordings.
pub struct TreeStore {
    id: StoreId,
    root: ItemId,
    nodes: HashMap<ItemId, Slot>,
    notifier: Notifier,
}

impl TreeStore {
    /// Create a store with an empty root folder under the well-known root id.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_root(ItemId::root(), root_name)
    }

    /// Create a store with an empty root folder under a chosen id.
    pub fn with_root(root: ItemId, root_name: impl Into<String>) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Slot {
                name: root_name.into(),
                parent: None,
                body: Body::Folder(Vec::new()),
            },
        );
        Self {
            id: StoreId::new(),
            root,
            nodes,
            notifier: Notifier::new(),
        }
    }

    /// Build a store whose root is the given detached folder.
    ///
    /// Every node of the subtree is registered and every folder sorted.
    pub fn from_root(root: Item) -> Result<Self> {
        if !root.is_folder() {
            return Err(TreeError::NotAFolder(root.id()));
        }
        let mut seen = HashSet::new();
        for id in root.ids() {
            if !seen.insert(id) {
                return Err(TreeError::DuplicateId(id));
            }
        }

        let mut store = Self {
            id: StoreId::new(),
            root: root.id(),
            nodes: HashMap::with_capacity(seen.len()),
            notifier: Notifier::new(),
        };
        store.register(None, root);
        Ok(store)
    }

    /// Decode a store from its JSON document.
    ///
    /// Malformed child records are skipped and counted in the report; only
    /// an unusable root record fails the load.
    pub fn load(document: &Value) -> Result<(Self, LoadReport)> {
        let (root, report) = codec::decode(document)?;
        let store = Self::from_root(root)?;
        debug!(store = %store.id, items = store.len(), skipped = report.skipped, "store loaded");
        Ok((store, report))
    }

    /// Decode a store from JSON text.
    pub fn from_json(text: &str) -> Result<(Self, LoadReport)> {
        let document: Value = serde_json::from_str(text)?;
        Self::load(&document)
    }

    /// Encode the whole tree as a JSON document, in canonical order.
    pub fn save(&self) -> Value {
        codec::encode(self.root())
    }

    /// Encode the whole tree as JSON text.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let document = self.save();
        let text = if pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(text)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn root_id(&self) -> ItemId {
        self.root
    }

    pub fn root(&self) -> NodeRef<'_> {
        match self.get(self.root) {
            Some(node) => node,
            None => unreachable!("root slot is never removed"),
        }
    }

    /// Look up an attached node.
    pub fn get(&self, id: ItemId) -> Option<NodeRef<'_>> {
        self.nodes.get(&id).map(|slot| NodeRef {
            store: self,
            id,
            slot,
        })
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a store always has its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Root-first identifiers leading to `id`, or `None` if it is not here.
    pub fn identifier_path(&self, id: ItemId) -> Option<Vec<ItemId>> {
        self.get(id).map(|node| node.identifier_path())
    }

    /// Resolve a root-first identifier path.
    ///
    /// The first element must be this store's root. Any miss, including an
    /// empty path, yields `None`.
    pub fn item_at_path(&self, path: &[ItemId]) -> Option<NodeRef<'_>> {
        match path.first() {
            Some(first) if *first == self.root => self.root().resolve_path(path, 1),
            _ => None,
        }
    }

    /// Payload location of a recording in this store.
    pub fn payload_location(
        &self,
        id: ItemId,
        resolver: &dyn PayloadResolver,
    ) -> Option<PathBuf> {
        let node = self.get(id)?;
        if node.is_folder() {
            return None;
        }
        Some(resolver.location(id))
    }

    /// Pre-order walk of the whole tree, root first.
    pub fn walk(&self) -> Walk<'_> {
        self.walk_from(self.root)
    }

    /// Pre-order walk of the subtree rooted at `id`.
    pub fn walk_from(&self, id: ItemId) -> Walk<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Walk { store: self, stack }
    }

    // ---------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------

    /// Register an observer for this store's change events.
    pub fn subscribe(&mut self, observer: impl ChangeObserver + 'static) -> ObserverId {
        self.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Attach a detached subtree under `parent`.
    ///
    /// Fails if `parent` is not a folder of this store or if any identifier
    /// of the subtree is already present.
    pub fn add(&mut self, parent: ItemId, item: Item) -> Result<ItemId> {
        self.ensure_folder(parent)?;
        self.ensure_absent(&item)?;

        let name = item.name().to_string();
        let (id, index) = self.attach(parent, item);
        debug!(store = %self.id, item = %id, parent = %parent, index, "item added");
        self.emit(id, parent, name, ChangeKind::Added { index });
        Ok(id)
    }

    /// Rename an item and move it to its sorted position.
    ///
    /// Renaming the root emits nothing, since it has no siblings to reorder.
    pub fn rename(&mut self, id: ItemId, new_name: impl Into<String>) -> Result<()> {
        let new_name = new_name.into();
        let slot = self.nodes.get_mut(&id).ok_or(TreeError::NotFound(id))?;
        let old_name = std::mem::replace(&mut slot.name, new_name.clone());
        let Some(parent) = slot.parent else {
            debug!(store = %self.id, item = %id, "root renamed");
            return Ok(());
        };

        let (old_index, new_index) = self
            .with_children(parent, |store, children| {
                let old_index = position(children, id);
                ordering::re_sort(children, |c| store.sort_key(c));
                (old_index, position(children, id))
            })
            .unwrap_or((0, 0));

        debug!(store = %self.id, item = %id, old_index, new_index, "item renamed");
        self.emit(
            id,
            parent,
            new_name,
            ChangeKind::Renamed {
                old_name,
                old_index,
                new_index,
            },
        );
        Ok(())
    }

    /// Move an item under another folder of this store.
    ///
    /// Moving an item to the folder it is already in is a no-op.
    pub fn move_item(&mut self, id: ItemId, new_parent: ItemId) -> Result<()> {
        let old_parent = self.parent_of_movable(id)?;
        self.ensure_folder(new_parent)?;
        self.ensure_not_ancestor(id, new_parent)?;
        if old_parent == new_parent {
            return Ok(());
        }

        let old_index = self.unlink(id, old_parent);
        if let Some(slot) = self.nodes.get_mut(&id) {
            slot.parent = Some(new_parent);
        }
        let index = self.link(id, new_parent);

        let name = self.name_of(id);
        debug!(store = %self.id, item = %id, from = %old_parent, to = %new_parent, "item moved");
        self.emit(
            id,
            new_parent,
            name,
            ChangeKind::Moved {
                from: old_parent,
                old_index,
                index,
            },
        );
        Ok(())
    }

    /// Detach an item and its subtree, returning it as a detached [`Item`].
    ///
    /// The store keeps no reference to the removed nodes; once the caller
    /// drops the returned value they are gone.
    pub fn delete(&mut self, id: ItemId) -> Result<Item> {
        let parent = self.parent_of_movable(id)?;
        let index = self.unlink(id, parent);
        let item = self.unregister(id).ok_or(TreeError::NotFound(id))?;

        let released = item.recording_ids();
        debug!(
            store = %self.id,
            item = %id,
            parent = %parent,
            removed = item.len(),
            "item deleted"
        );
        self.emit(
            id,
            parent,
            item.name().to_string(),
            ChangeKind::Removed { index, released },
        );
        Ok(item)
    }

    /// Re-parent an item: `Some` moves it, `None` deletes it.
    ///
    /// Returns the detached subtree when deleting.
    pub fn set_parent(&mut self, id: ItemId, new_parent: Option<ItemId>) -> Result<Option<Item>> {
        match new_parent {
            Some(parent) => self.move_item(id, parent).map(|()| None),
            None => self.delete(id).map(Some),
        }
    }

    /// Move a subtree into a folder of another store.
    ///
    /// Both stores are checked before anything changes. The source reports
    /// the removal without releasing any payloads, since the recordings live
    /// on in `dest`.
    pub fn transfer(&mut self, id: ItemId, dest: &mut TreeStore, dest_parent: ItemId) -> Result<()> {
        let parent = self.parent_of_movable(id)?;
        dest.ensure_folder(dest_parent)?;
        if let Some(clash) = self.walk_from(id).map(|n| n.id()).find(|n| dest.contains(*n)) {
            return Err(TreeError::DuplicateId(clash));
        }

        let index = self.unlink(id, parent);
        let item = self.unregister(id).ok_or(TreeError::NotFound(id))?;
        let name = item.name().to_string();
        self.emit(
            id,
            parent,
            name.clone(),
            ChangeKind::Removed {
                index,
                released: Vec::new(),
            },
        );

        let (id, index) = dest.attach(dest_parent, item);
        debug!(from = %self.id, to = %dest.id, item = %id, "item transferred");
        dest.emit(id, dest_parent, name, ChangeKind::Added { index });
        Ok(())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn sort_key(&self, id: ItemId) -> SortKey<'_> {
        let name = self.nodes.get(&id).map_or("", |slot| slot.name.as_str());
        SortKey::new(name, id)
    }

    fn name_of(&self, id: ItemId) -> String {
        self.nodes
            .get(&id)
            .map(|slot| slot.name.clone())
            .unwrap_or_default()
    }

    fn emit(&self, item: ItemId, parent: ItemId, name: String, kind: ChangeKind) {
        self.notifier.emit(&ChangeEvent {
            store: self.id,
            item,
            parent,
            name,
            kind,
        });
    }

    fn ensure_folder(&self, id: ItemId) -> Result<()> {
        match self.nodes.get(&id) {
            None => Err(TreeError::NotFound(id)),
            Some(slot) if slot.kind().is_folder() => Ok(()),
            Some(_) => Err(TreeError::NotAFolder(id)),
        }
    }

    /// Every identifier of `item` must be new to this store and unique
    /// within the subtree.
    fn ensure_absent(&self, item: &Item) -> Result<()> {
        let mut seen = HashSet::new();
        for id in item.ids() {
            if self.nodes.contains_key(&id) || !seen.insert(id) {
                return Err(TreeError::DuplicateId(id));
            }
        }
        Ok(())
    }

    /// Parent of a node that may be moved or deleted.
    fn parent_of_movable(&self, id: ItemId) -> Result<ItemId> {
        if id == self.root {
            return Err(TreeError::RootImmovable);
        }
        self.nodes
            .get(&id)
            .and_then(|slot| slot.parent)
            .ok_or(TreeError::NotFound(id))
    }

    /// Reject moving `id` under `target` when `id` is `target` or one of
    /// its ancestors.
    fn ensure_not_ancestor(&self, id: ItemId, target: ItemId) -> Result<()> {
        let mut cursor = Some(target);
        // A well-formed chain is never longer than the store.
        for _ in 0..=self.nodes.len() {
            match cursor {
                Some(current) if current == id => {
                    error!(store = %self.id, item = %id, target = %target, "rejected cyclic move");
                    return Err(TreeError::ReparentCycle { item: id, target });
                }
                Some(current) => cursor = self.nodes.get(&current).and_then(|s| s.parent),
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Run `f` over a folder's child list. `None` if `folder` is not one.
    fn with_children<R>(
        &mut self,
        folder: ItemId,
        f: impl FnOnce(&Self, &mut Vec<ItemId>) -> R,
    ) -> Option<R> {
        let mut children = match self.nodes.get_mut(&folder) {
            Some(Slot {
                body: Body::Folder(children),
                ..
            }) => std::mem::take(children),
            _ => return None,
        };
        let out = f(self, &mut children);
        if let Some(Slot {
            body: Body::Folder(slot),
            ..
        }) = self.nodes.get_mut(&folder)
        {
            *slot = children;
        }
        Some(out)
    }

    /// Insert an already registered node into a folder at its sorted index.
    fn link(&mut self, id: ItemId, folder: ItemId) -> usize {
        self.with_children(folder, |store, children| {
            let at = ordering::insertion_index(children, store.sort_key(id), |c| store.sort_key(c));
            children.insert(at, id);
            at
        })
        .unwrap_or(0)
    }

    /// Remove a node from its folder's child list, returning its old index.
    fn unlink(&mut self, id: ItemId, folder: ItemId) -> usize {
        self.with_children(folder, |_, children| {
            let at = position(children, id);
            if children.get(at) == Some(&id) {
                children.remove(at);
            }
            at
        })
        .unwrap_or(0)
    }

    /// Register a detached subtree and link it under `parent`.
    fn attach(&mut self, parent: ItemId, item: Item) -> (ItemId, usize) {
        let id = self.register(Some(parent), item);
        let index = self.link(id, parent);
        (id, index)
    }

    /// Insert every node of `item` into the arena, sorting each folder.
    fn register(&mut self, parent: Option<ItemId>, item: Item) -> ItemId {
        match item {
            Item::Recording { id, name } => {
                self.nodes.insert(
                    id,
                    Slot {
                        name,
                        parent,
                        body: Body::Recording,
                    },
                );
                id
            }
            Item::Folder { id, name, children } => {
                self.nodes.insert(
                    id,
                    Slot {
                        name,
                        parent,
                        body: Body::Folder(Vec::new()),
                    },
                );
                let mut ids: Vec<ItemId> = children
                    .into_iter()
                    .map(|child| self.register(Some(id), child))
                    .collect();
                ordering::re_sort(&mut ids, |c| self.sort_key(c));
                if let Some(Slot {
                    body: Body::Folder(slot),
                    ..
                }) = self.nodes.get_mut(&id)
                {
                    *slot = ids;
                }
                id
            }
        }
    }

    /// Remove every node of the subtree at `id` from the arena.
    fn unregister(&mut self, id: ItemId) -> Option<Item> {
        let slot = self.nodes.remove(&id)?;
        let item = match slot.body {
            Body::Recording => Item::Recording {
                id,
                name: slot.name,
            },
            Body::Folder(children) => Item::Folder {
                id,
                name: slot.name,
                children: children
                    .into_iter()
                    .filter_map(|child| self.unregister(child))
                    .collect(),
            },
        };
        Some(item)
    }
}

fn position(children: &[ItemId], id: ItemId) -> usize {
    children.iter().position(|c| *c == id).unwrap_or(children.len())
}

impl fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeStore")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("len", &self.nodes.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

/// Borrowed view of an attached node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    store: &'a TreeStore,
    id: ItemId,
    slot: &'a Slot,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.slot.name
    }

    pub fn kind(&self) -> ItemKind {
        self.slot.kind()
    }

    pub fn is_folder(&self) -> bool {
        self.kind().is_folder()
    }

    pub fn is_root(&self) -> bool {
        self.id == self.store.root
    }

    pub fn parent_id(&self) -> Option<ItemId> {
        self.slot.parent
    }

    /// The containing folder, resolved through the store.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.slot.parent.and_then(|p| self.store.get(p))
    }

    /// The store this node belongs to.
    pub fn store(&self) -> Option<StoreId> {
        Some(self.store.id)
    }

    pub fn child_ids(&self) -> &'a [ItemId] {
        self.slot.children()
    }

    pub fn child_count(&self) -> usize {
        self.slot.children().len()
    }

    /// Children in canonical order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let store = self.store;
        self.slot
            .children()
            .iter()
            .filter_map(move |id| store.get(*id))
    }

    /// Position among siblings; `None` for the root.
    pub fn index(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent.child_ids().iter().position(|c| *c == self.id)
    }

    /// Root-first identifiers leading to this node, rebuilt from parent links.
    pub fn identifier_path(&self) -> Vec<ItemId> {
        let mut path = vec![self.id];
        let mut cursor = self.slot.parent;
        while let Some(id) = cursor {
            if path.len() > self.store.len() {
                break;
            }
            path.push(id);
            cursor = self.store.nodes.get(&id).and_then(|s| s.parent);
        }
        path.reverse();
        path
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.identifier_path().len() - 1
    }

    /// Follow `path[index..]` downwards from this node.
    ///
    /// `index == path.len()` yields this node. A recording with path left to
    /// follow, an unknown child, or an index past the end yields `None`.
    pub fn resolve_path(&self, path: &[ItemId], index: usize) -> Option<NodeRef<'a>> {
        let mut node = *self;
        for next in path.get(index..)? {
            node = node.children().find(|child| child.id == *next)?;
        }
        Some(node)
    }

    /// Copy this subtree out as a detached [`Item`] with the same identities.
    pub fn to_item(&self) -> Item {
        match self.kind() {
            ItemKind::Recording => Item::Recording {
                id: self.id,
                name: self.slot.name.clone(),
            },
            ItemKind::Folder => Item::Folder {
                id: self.id,
                name: self.slot.name.clone(),
                children: self.children().map(|c| c.to_item()).collect(),
            },
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.slot.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Pre-order iterator over a subtree. See [`TreeStore::walk`].
pub struct Walk<'a> {
    store: &'a TreeStore,
    stack: Vec<ItemId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            if let Some(node) = self.store.get(id) {
                self.stack.extend(node.child_ids().iter().rev());
                return Some(node);
            }
        }
    }
}

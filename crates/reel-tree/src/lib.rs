//! Recording tree store for Reel.
//!
//! This crate holds the hierarchical store at the heart of Reel: folders and
//! recordings addressed by stable identifiers, kept in canonical order,
//! persisted as a JSON document, and observed through synchronous change
//! events.
//!
//! # Architecture
//!
//! - A [`TreeStore`] owns every attached node in an arena keyed by
//!   [`ItemId`](reel_types::ItemId). Parent and store back-references are
//!   handles resolved through the arena, never owning pointers.
//! - Detached subtrees (freshly built, or just deleted) are owned [`Item`]
//!   values with no parent and no store.
//! - Every mutation re-applies the [`ordering`] to the affected folder and
//!   emits one [`ChangeEvent`] to the store's observers.
//! - The [`codec`] maps the tree to and from its JSON document, skipping
//!   malformed child records instead of failing the load.
//!
//! # Modules
//!
//! - [`error`] - [`TreeError`] and the crate `Result`
//! - [`item`] - detached [`Item`]s and [`ItemKind`]
//! - [`ordering`] - sibling comparator and re-sort
//! - [`notify`] - [`ChangeEvent`], [`ChangeObserver`], [`Notifier`]
//! - [`store`] - [`TreeStore`] and borrowed [`NodeRef`] views
//! - [`codec`] - document encode/decode and [`LoadReport`]
//! - [`resolver`] - the [`PayloadResolver`] seam
//! - [`shared`] - [`SharedStore`] for multi-threaded hosts

pub mod codec;
pub mod error;
pub mod item;
pub mod notify;
pub mod ordering;
pub mod resolver;
pub mod shared;
pub mod store;

pub use codec::LoadReport;
pub use error::{Result, TreeError};
pub use item::{Item, ItemKind};
pub use notify::{ChangeEvent, ChangeKind, ChangeObserver, EventLog, Notifier, ObserverId};
pub use resolver::PayloadResolver;
pub use shared::SharedStore;
pub use store::{NodeRef, TreeStore, Walk, DEFAULT_ROOT_NAME};

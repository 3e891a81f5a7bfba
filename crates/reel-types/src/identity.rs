use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Stable identity of a folder or recording.
///
/// An `ItemId` is a random (v4) UUID assigned when the item is created and
/// never changed afterwards. Renames and moves leave it untouched, which is
/// what makes identifier paths usable as long-lived addresses and lets the
/// payload location be derived from the identity alone.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero identity used for the root folder of a fresh store.
    pub const fn root() -> Self {
        Self(Uuid::nil())
    }

    /// Create from an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns `true` for the well-known root identity.
    pub fn is_root(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse the canonical text form. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidUuid {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Uppercase hyphenated text, the form written to documents and used
    /// for payload file names.
    pub fn to_canonical(&self) -> String {
        let mut buf = Uuid::encode_buffer();
        self.0.hyphenated().encode_upper(&mut buf).to_string()
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        self.to_canonical()[..8].to_string()
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ItemId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.short_id())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical())
    }
}

/// Identity of one tree store instance.
///
/// Nodes report the store that owns them through this handle. It is never
/// persisted: every store constructed or loaded in a process gets a fresh
/// one, so two stores loaded from the same document are still distinct.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Generate a fresh store identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreId({})", self.short_id())
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store:{}", self.short_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = ItemId::new();
        let b = ItemId::new();
        assert_ne!(a, b);
        assert!(!a.is_root());
    }

    #[test]
    fn root_is_nil() {
        let root = ItemId::root();
        assert!(root.is_root());
        assert_eq!(root.to_canonical(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn canonical_form_is_uppercase() {
        let id = ItemId::parse("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap();
        assert_eq!(id.to_canonical(), "6F9619FF-8B86-D011-B42D-00CF4FC964FF");
        assert_eq!(format!("{id}"), "6F9619FF-8B86-D011-B42D-00CF4FC964FF");
        assert_eq!(id.short_id(), "6F9619FF");
    }

    #[test]
    fn parse_is_case_insensitive() {
        let lower = ItemId::parse("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap();
        let upper = ItemId::parse("6F9619FF-8B86-D011-B42D-00CF4FC964FF").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = ItemId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, TypeError::InvalidUuid { .. }));
    }

    #[test]
    fn from_str_matches_parse() {
        let id = ItemId::new();
        let parsed: ItemId = id.to_canonical().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn debug_uses_short_form() {
        let id = ItemId::parse("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap();
        assert_eq!(format!("{id:?}"), "ItemId(6F9619FF)");
    }

    #[test]
    fn store_ids_are_unique() {
        assert_ne!(StoreId::new(), StoreId::new());
        assert!(format!("{}", StoreId::new()).starts_with("store:"));
    }

    #[test]
    fn serde_roundtrip() {
        let id = ItemId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    proptest! {
        #[test]
        fn canonical_text_parses_back(bytes in any::<[u8; 16]>()) {
            let id = ItemId::from_uuid(Uuid::from_bytes(bytes));
            prop_assert_eq!(ItemId::parse(&id.to_canonical()).unwrap(), id);
        }
    }
}

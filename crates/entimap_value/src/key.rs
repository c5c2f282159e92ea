//! Path-qualified entity keys.

use serde::{Deserialize, Serialize};

/// The identity slot of a key: a numeric id or a text name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyId {
    /// Store-allocatable numeric identity.
    Numeric(i64),
    /// Caller-assigned text identity.
    Text(String),
}

impl KeyId {
    /// Get this id as a numeric value, if it is one.
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            KeyId::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this id as a text value, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyId::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyId::Numeric(n) => write!(f, "{}", n),
            KeyId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for KeyId {
    fn from(n: i64) -> Self {
        KeyId::Numeric(n)
    }
}

impl From<String> for KeyId {
    fn from(s: String) -> Self {
        KeyId::Text(s)
    }
}

impl From<&str> for KeyId {
    fn from(s: &str) -> Self {
        KeyId::Text(s.to_string())
    }
}

/// A path-qualified entity key: a kind, an optional identity slot, and an
/// optional ancestry chain.
///
/// A key without an identity slot is *incomplete*; the store assigns the
/// numeric id on first write. Ancestors are carried as a boxed parent chain,
/// root-most last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    kind: String,
    id: Option<KeyId>,
    parent: Option<Box<Key>>,
}

impl Key {
    /// Create an incomplete key of the given kind.
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            parent: None,
        }
    }

    /// Create a key with a numeric identity.
    pub fn numeric(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id: Some(KeyId::Numeric(id)),
            parent: None,
        }
    }

    /// Create a key with a text identity.
    pub fn text(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(KeyId::Text(id.into())),
            parent: None,
        }
    }

    /// Attach an identity slot to this key.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<KeyId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a parent key, making this key a child in the ancestry chain.
    #[must_use]
    pub fn with_parent(mut self, parent: Key) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// The kind of entity this key addresses.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The identity slot, if assigned.
    pub fn id(&self) -> Option<&KeyId> {
        self.id.as_ref()
    }

    /// The parent key, if this key has ancestry.
    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// Whether the identity slot is assigned.
    pub fn is_complete(&self) -> bool {
        self.id.is_some()
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(parent) = &self.parent {
            write!(f, "{}/", parent)?;
        }
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => write!(f, "{}:?", self.kind),
        }
    }
}

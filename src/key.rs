//! Identity keys.
//!
//! Nodes are matched against the previous generation by key only; there is no positional
//! matching. Siblings that share a type, identifier and key list are told apart by an ordinal
//! that counts up in traversal order:
//!
//! ```text
//! children  [Text, Text, Image(id=a), Text, Image(id=a)]
//! ordinal     0     1      0          2       1
//! ```

use crate::component::Component;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

/// A user-supplied key value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(u64),
    Str(Arc<str>),
}

impl From<u64> for Key {
    fn from(value: u64) -> Key {
        Key::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Key {
        Key::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Key {
        Key::Str(value.into())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// The identity of a node relative to its parent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey {
    type_name: &'static str,
    identifier: Option<Key>,
    keys: Vec<Key>,
    ordinal: u32,
}

impl IdentityKey {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn identifier(&self) -> Option<&Key> {
        self.identifier.as_ref()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.type_name)?;
        if let Some(identifier) = &self.identifier {
            write!(f, "({})", identifier)?;
        }
        for key in &self.keys {
            write!(f, "[{}]", key)?;
        }
        write!(f, "#{}", self.ordinal)
    }
}

/// Hands out identity keys for the children of one parent.
///
/// Each call is a new sibling; calling it twice for the same component yields two different
/// identities.
#[derive(Debug, Default)]
pub struct KeyAssigner {
    counters: HashMap<(&'static str, Option<Key>, Vec<Key>), u32>,
}

impl KeyAssigner {
    pub fn new() -> KeyAssigner {
        KeyAssigner::default()
    }

    /// Assigns the next key for the given type, identifier and disambiguating keys.
    pub fn assign(
        &mut self,
        type_name: &'static str,
        identifier: Option<Key>,
        keys: Vec<Key>,
    ) -> IdentityKey {
        let counter = self
            .counters
            .entry((type_name, identifier.clone(), keys.clone()))
            .or_insert(0);
        let ordinal = *counter;
        *counter += 1;

        IdentityKey {
            type_name,
            identifier,
            keys,
            ordinal,
        }
    }

    /// Assigns the next key for a component.
    pub fn assign_component(&mut self, component: &dyn Component) -> IdentityKey {
        self.assign(
            component.type_name(),
            component.identifier(),
            component.keys(),
        )
    }
}

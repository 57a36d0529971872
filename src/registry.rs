//! Type registry for decoding stored JSON
//!
//! Maps a string tag (the `object_type` column of a change log) to a factory
//! that decodes raw JSON text into a fresh value of the registered shape.
//! Registries are filled during start-up and only read afterwards.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::models::naming::short_type_name;

/// Decodes raw JSON text into a type-erased value
pub type TypeFactory = Arc<dyn Fn(&str) -> serde_json::Result<Decoded> + Send + Sync>;

/// A value decoded through the registry
///
/// Use [`Decoded::downcast_ref`] to get at the concrete type.
#[derive(Clone)]
pub struct Decoded {
    value: Arc<dyn Any + Send + Sync>,
    type_name: String,
}

impl Decoded {
    /// Wrap a decoded value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: short_type_name::<T>(),
        }
    }

    /// Borrow the value as `T`, if that is its type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Check whether the value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Short name of the decoded Rust type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoded")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Build the factory for a deserializable type
pub fn factory_for<T>() -> TypeFactory
where
    T: DeserializeOwned + Any + Send + Sync,
{
    Arc::new(|raw: &str| serde_json::from_str::<T>(raw).map(Decoded::new))
}

/// Outcome of decoding one raw blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Value decoded and attached to the record
    Decoded,
    /// No shape registered for the tag; the raw text is still available
    NotRegistered,
    /// Nothing stored (empty text or JSON `null`)
    Empty,
}

/// Tag-to-shape mapping used on the read path
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, TypeFactory>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `tag`. A second registration for the same tag replaces the first.
    pub fn register<T>(&mut self, tag: impl Into<String>)
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        self.register_factory(tag, factory_for::<T>());
    }

    /// Register a factory for `tag`, replacing any earlier one
    pub fn register_factory(&mut self, tag: impl Into<String>, factory: TypeFactory) {
        self.entries.insert(tag.into(), factory);
    }

    /// Check whether `tag` has a factory
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of registered tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<_> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Decode `raw` with the factory registered for `tag`
    ///
    /// Returns `None` when nothing is registered for the tag.
    pub fn decode(&self, tag: &str, raw: &str) -> Option<serde_json::Result<Decoded>> {
        self.entries.get(tag).map(|factory| factory(raw))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

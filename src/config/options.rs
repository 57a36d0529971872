//! Capture configuration
//!
//! A [`Config`] is assembled once at start-up, either through the
//! [`ConfigBuilder`] methods or by applying [`ConfigOption`] values, and is
//! read-only afterwards. Share it between threads with an `Arc`.
//!
//! ```rust,ignore
//! use entity_changelog::config::{options, Config};
//!
//! let config = Config::with_options([
//!     options::compute_diff(),
//!     options::lazy_update(["updated_at"]),
//!     options::register_object_type::<User>("User"),
//! ]);
//! ```

use std::any::Any;
use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::models::naming::to_pascal_case;
use crate::registry::{TypeFactory, TypeRegistry};

/// Immutable capture configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    compute_diff: bool,
    lazy_update: bool,
    /// Normalized to PascalCase
    lazy_update_fields: HashSet<String>,
    object_types: TypeRegistry,
    meta_types: TypeRegistry,
}

impl Config {
    /// Start building a configuration with everything off
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Build a configuration from a list of options, applied in order
    pub fn with_options(options: impl IntoIterator<Item = ConfigOption>) -> Self {
        let mut builder = Self::builder();
        for option in options {
            builder = builder.apply(option);
        }
        builder.build()
    }

    /// Whether update logs carry a field diff
    pub fn compute_diff(&self) -> bool {
        self.compute_diff
    }

    /// Whether updates that change nothing are skipped
    pub fn lazy_update(&self) -> bool {
        self.lazy_update
    }

    /// Whether `field` is ignored when deciding that an update changed something
    pub fn is_lazy_ignored(&self, field: &str) -> bool {
        self.lazy_update_fields.contains(&to_pascal_case(field))
    }

    /// Get the registry used to decode `raw_object`
    pub fn object_types(&self) -> &TypeRegistry {
        &self.object_types
    }

    /// Get the registry used to decode `raw_meta`
    pub fn meta_types(&self) -> &TypeRegistry {
        &self.meta_types
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Also record field differences on update
    ///
    /// The diff only compares the in-memory snapshots handed to the hooks;
    /// changes made outside them are not seen.
    pub fn compute_diff(mut self) -> Self {
        self.config.compute_diff = true;
        self
    }

    /// Skip update logs when nothing but the given fields changed
    pub fn lazy_update<I, S>(mut self, ignored_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.lazy_update = true;
        self.config.lazy_update_fields = ignored_fields
            .into_iter()
            .map(|f| to_pascal_case(f.as_ref()))
            .collect();
        self
    }

    /// Decode `raw_object` of logs tagged `tag` into `T`
    pub fn register_object_type<T>(mut self, tag: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        self.config.object_types.register::<T>(tag);
        self
    }

    /// Register several object factories at once
    pub fn register_object_types<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeFactory)>,
        S: Into<String>,
    {
        for (tag, factory) in entries {
            self.config.object_types.register_factory(tag, factory);
        }
        self
    }

    /// Decode `raw_meta` of logs tagged `tag` into `T`
    pub fn register_meta_type<T>(mut self, tag: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        self.config.meta_types.register::<T>(tag);
        self
    }

    /// Apply a composable option
    pub fn apply(mut self, option: ConfigOption) -> Self {
        (option.0)(&mut self);
        self
    }

    /// Finish the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

type Apply = Box<dyn FnOnce(&mut ConfigBuilder) + Send>;

/// A composable configuration option
pub struct ConfigOption(Apply);

impl ConfigOption {
    fn new(f: impl FnOnce(ConfigBuilder) -> ConfigBuilder + Send + 'static) -> Self {
        Self(Box::new(move |builder: &mut ConfigBuilder| {
            let current = std::mem::take(builder);
            *builder = f(current);
        }))
    }
}

impl std::fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ConfigOption")
    }
}

/// Option form of [`ConfigBuilder::compute_diff`]
pub fn compute_diff() -> ConfigOption {
    ConfigOption::new(ConfigBuilder::compute_diff)
}

/// Option form of [`ConfigBuilder::lazy_update`]
pub fn lazy_update<I, S>(ignored_fields: I) -> ConfigOption
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let fields: Vec<String> = ignored_fields
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .collect();
    ConfigOption::new(move |builder| builder.lazy_update(fields))
}

/// Option form of [`ConfigBuilder::register_object_type`]
pub fn register_object_type<T>(tag: impl Into<String>) -> ConfigOption
where
    T: DeserializeOwned + Any + Send + Sync,
{
    let tag = tag.into();
    ConfigOption::new(move |builder| builder.register_object_type::<T>(tag))
}

/// Option form of [`ConfigBuilder::register_object_types`]
pub fn register_object_types<I, S>(entries: I) -> ConfigOption
where
    I: IntoIterator<Item = (S, TypeFactory)>,
    S: Into<String>,
{
    let entries: Vec<(String, TypeFactory)> = entries
        .into_iter()
        .map(|(tag, factory)| (tag.into(), factory))
        .collect();
    ConfigOption::new(move |builder| builder.register_object_types(entries))
}

/// Option form of [`ConfigBuilder::register_meta_type`]
pub fn register_meta_type<T>(tag: impl Into<String>) -> ConfigOption
where
    T: DeserializeOwned + Any + Send + Sync,
{
    let tag = tag.into();
    ConfigOption::new(move |builder| builder.register_meta_type::<T>(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::factory_for;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct User {}

    #[derive(Deserialize)]
    struct Team {}

    #[derive(Deserialize)]
    struct Actor {}

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.compute_diff());
        assert!(!config.lazy_update());
        assert!(config.object_types().is_empty());
        assert!(config.meta_types().is_empty());
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .compute_diff()
            .lazy_update(["updated_at"])
            .register_object_type::<User>("User")
            .register_meta_type::<Actor>("User")
            .build();

        assert!(config.compute_diff());
        assert!(config.lazy_update());
        assert!(config.object_types().contains("User"));
        assert!(config.meta_types().contains("User"));
    }

    #[test]
    fn test_lazy_fields_match_any_casing() {
        let config = Config::builder().lazy_update(["updated_at"]).build();

        assert!(config.is_lazy_ignored("updated_at"));
        assert!(config.is_lazy_ignored("UpdatedAt"));
        assert!(config.is_lazy_ignored("updatedAt"));
        assert!(!config.is_lazy_ignored("name"));
    }

    #[test]
    fn test_lazy_update_without_fields() {
        let config = Config::builder().lazy_update(Vec::<String>::new()).build();
        assert!(config.lazy_update());
        assert!(!config.is_lazy_ignored("updated_at"));
    }

    #[test]
    fn test_with_options() {
        let config = Config::with_options([
            compute_diff(),
            lazy_update(["updated_at", "version"]),
            register_object_type::<User>("User"),
            register_object_types([("Team", factory_for::<Team>())]),
            register_meta_type::<Actor>("User"),
        ]);

        assert!(config.compute_diff());
        assert!(config.is_lazy_ignored("version"));
        assert_eq!(config.object_types().tags(), vec!["Team", "User"]);
        assert!(config.meta_types().contains("User"));
    }
}

use serde::{Deserialize, Serialize};

use audiff_types::{DiffRecord, TypeKey};

use crate::error::{DiffError, DiffResult, HandlerError};
use crate::handler::HandlerRegistry;
use crate::ignore::IgnoreSet;
use crate::node::Node;

/// Default nesting limit applied during introspection.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Serializable part of a [`DiffConfig`], suitable for TOML files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Field names ignored in addition to the baseline.
    pub ignored_fields: Vec<String>,
    /// Maximum nesting depth before a diff fails.
    pub max_depth: usize,
    /// Apply ignore rules to mapping keys as well as struct fields.
    pub ignore_map_keys: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            ignored_fields: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            ignore_map_keys: false,
        }
    }
}

impl DiffSettings {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> DiffResult<Self> {
        let settings: Self =
            toml::from_str(input).map_err(|e| DiffError::Config(e.to_string()))?;
        if settings.max_depth == 0 {
            return Err(DiffError::Config("max_depth must be at least 1".into()));
        }
        Ok(settings)
    }

    /// Render settings as TOML.
    pub fn to_toml_string(&self) -> DiffResult<String> {
        toml::to_string(self).map_err(|e| DiffError::Config(e.to_string()))
    }
}

/// Ignore rules and caller-registered handlers for one audited model.
///
/// A config is mutated during setup and then moved into a
/// [`DiffEngine`](crate::DiffEngine), after which it can no longer change.
#[derive(Clone, Debug)]
pub struct DiffConfig {
    ignored: IgnoreSet,
    handlers: HandlerRegistry,
    max_depth: usize,
    ignore_map_keys: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            ignored: IgnoreSet::new(),
            handlers: HandlerRegistry::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            ignore_map_keys: false,
        }
    }
}

impl DiffConfig {
    /// A config with only the baseline ignore rules and no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from serializable settings.
    pub fn from_settings(settings: &DiffSettings) -> Self {
        let mut config = Self::new();
        config
            .add_ignored_fields(settings.ignored_fields.iter().cloned())
            .set_max_depth(settings.max_depth)
            .set_ignore_map_keys(settings.ignore_map_keys);
        config
    }

    /// Snapshot of the serializable part of this config.
    pub fn settings(&self) -> DiffSettings {
        DiffSettings {
            ignored_fields: self.ignored.extra().to_vec(),
            max_depth: self.max_depth,
            ignore_map_keys: self.ignore_map_keys,
        }
    }

    /// Merge names into the ignore extension (de-duplicated).
    pub fn add_ignored_fields<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.add(names);
        self
    }

    /// Replace the ignore extension wholesale.
    pub fn set_ignored_fields<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.set(names);
        self
    }

    /// Register or overwrite the handler for fields declared as `T`.
    pub fn add_type_handler<T, F>(&mut self, handler: F) -> &mut Self
    where
        T: ?Sized,
        F: Fn(&Node, &Node, &str) -> Result<Vec<DiffRecord>, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert::<T, F>(handler);
        self
    }

    /// Register or overwrite the handler for the type of `sample`.
    pub fn add_type_handler_for<T, F>(&mut self, _sample: &T, handler: F) -> &mut Self
    where
        T: ?Sized,
        F: Fn(&Node, &Node, &str) -> Result<Vec<DiffRecord>, HandlerError> + Send + Sync + 'static,
    {
        self.add_type_handler::<T, F>(handler)
    }

    /// Set the nesting limit. Values below 1 are raised to 1.
    pub fn set_max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn set_ignore_map_keys(&mut self, enabled: bool) -> &mut Self {
        self.ignore_map_keys = enabled;
        self
    }

    pub fn ignored(&self) -> &IgnoreSet {
        &self.ignored
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn ignore_map_keys(&self) -> bool {
        self.ignore_map_keys
    }

    /// Returns `true` if a field called `name` is skipped.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Returns `true` if a caller handler is registered for `key`.
    pub fn has_handler(&self, key: &TypeKey) -> bool {
        self.handlers.contains(key)
    }
}

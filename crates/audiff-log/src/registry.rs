//! Model registration.
//!
//! Each audited model gets a [`ModelRegistration`] carrying its diff
//! configuration. Registrations are mutable only until the registry is
//! frozen; [`ModelRegistry::freeze`] turns every registration into a
//! [`DiffEngine`], after which ignore rules and handlers can no longer change.

use std::collections::BTreeMap;

use audiff_diff::{DiffConfig, DiffEngine, DiffSettings, HandlerError, Node};
use audiff_types::DiffRecord;

use crate::error::{AuditError, AuditResult};

/// Setup-time configuration for one audited model.
#[derive(Clone, Debug)]
pub struct ModelRegistration {
    name: String,
    config: DiffConfig,
}

impl ModelRegistration {
    fn new(name: String) -> Self {
        Self {
            name,
            config: DiffConfig::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Merge names into this model's ignored fields.
    pub fn add_ignored_fields<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.add_ignored_fields(names);
        self
    }

    /// Replace this model's ignored fields.
    pub fn set_ignored_fields<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.set_ignored_fields(names);
        self
    }

    /// Register a handler for fields of this model declared as `T`.
    pub fn add_type_handler<T, F>(&mut self, handler: F) -> &mut Self
    where
        T: ?Sized,
        F: Fn(&Node, &Node, &str) -> Result<Vec<DiffRecord>, HandlerError> + Send + Sync + 'static,
    {
        self.config.add_type_handler::<T, F>(handler);
        self
    }

    /// Apply file-based settings. Replaces the ignored-field extension and
    /// limits; registered handlers are kept.
    pub fn with_settings(&mut self, settings: &DiffSettings) -> &mut Self {
        self.config
            .set_ignored_fields(settings.ignored_fields.iter().cloned())
            .set_max_depth(settings.max_depth)
            .set_ignore_map_keys(settings.ignore_map_keys);
        self
    }
}

/// Registrations under construction.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelRegistration>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, or return its existing registration.
    pub fn register(&mut self, name: impl Into<String>) -> &mut ModelRegistration {
        let name = name.into();
        self.models
            .entry(name.clone())
            .or_insert_with(|| ModelRegistration::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&ModelRegistration> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Freeze every registration into a diff engine.
    pub fn freeze(self) -> FrozenRegistry {
        let engines = self
            .models
            .into_iter()
            .map(|(name, registration)| (name, DiffEngine::new(registration.config)))
            .collect();
        FrozenRegistry { engines }
    }
}

/// Immutable per-model diff engines.
#[derive(Clone, Debug, Default)]
pub struct FrozenRegistry {
    engines: BTreeMap<String, DiffEngine>,
}

impl FrozenRegistry {
    /// The engine for `model`.
    pub fn engine(&self, model: &str) -> AuditResult<&DiffEngine> {
        self.engines
            .get(model)
            .ok_or_else(|| AuditError::UnknownModel(model.to_string()))
    }

    /// Registered model names, sorted.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }
}

//! ModelRegistry - Application-level arena of built models
//!
//! Registration is the startup boundary where `ModelBuildError` surfaces;
//! once a type is registered, its dispatch table is fixed for the life of
//! the application.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::builder::ModelBuilder;
use super::composite::CompositeModel;
use super::errors::ModelBuildError;

/// Dense index of a registered composite type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// Returns the arena index of this type.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Arena of composite models keyed by type name and dense id.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<Arc<CompositeModel>>,
    by_name: BTreeMap<String, TypeId>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a composite type.
    ///
    /// Fails if the build fails or the type name is already taken.
    pub fn register(&mut self, builder: ModelBuilder) -> Result<TypeId, ModelBuildError> {
        let model = builder.build()?;
        if self.by_name.contains_key(model.type_name()) {
            return Err(ModelBuildError::DuplicateType(model.type_name().to_string()));
        }
        let id = TypeId(self.models.len() as u32);
        self.by_name.insert(model.type_name().to_string(), id);
        self.models.push(Arc::new(model));
        Ok(id)
    }

    /// Returns the model at `id`, if minted by this registry.
    pub fn get(&self, id: TypeId) -> Option<&Arc<CompositeModel>> {
        self.models.get(id.index())
    }

    /// Returns the model registered under `name`.
    pub fn by_name(&self, name: &str) -> Option<&Arc<CompositeModel>> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    /// Returns the number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if no type has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

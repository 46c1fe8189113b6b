use crate::{
    cache::{CacheStats, MemoCache},
    error::MapError,
    model::{DataType, Field, FieldAccessor, TypeKey, TypeModel},
    traits::Reflect,
};
use serde::Serialize;
use std::{any::TypeId, sync::Arc};

///
/// TypeRegistry
///
/// Memoized reflection state: one `DataType` and at most one `TypeModel`
/// per runtime type, plus compiled accessors per field. Every lookup for a
/// type returns the same shared instance.
///

#[derive(Debug)]
pub struct TypeRegistry {
    data_types: MemoCache<TypeId, Arc<DataType>>,
    models: MemoCache<TypeId, Arc<TypeModel>>,
    accessors: MemoCache<(TypeId, usize), Arc<FieldAccessor>>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_types: MemoCache::new("data_types"),
            models: MemoCache::new("type_models"),
            accessors: MemoCache::new("accessors"),
        }
    }

    pub fn data_type(&self, key: TypeKey) -> Result<Arc<DataType>, MapError> {
        self.data_types
            .get_or_try_build(key.id(), || DataType::build(key, self).map(Arc::new))
    }

    pub fn data_type_of<T: Reflect>(&self) -> Result<Arc<DataType>, MapError> {
        self.data_type(TypeKey::of::<T>())
    }

    /// Model of a composite type. `Option<T>` resolves to the model of `T`;
    /// asking for the model of a scalar or collection is a contract error.
    pub fn type_model(&self, key: TypeKey) -> Result<Arc<TypeModel>, MapError> {
        let data_type = self.data_type(key)?;
        if !data_type.is_composite() {
            return Err(MapError::model_contract(format!(
                "'{}' is not a composite type and has no model",
                key.name()
            )));
        }

        let member = data_type.member_type();
        if member != key {
            return self.type_model(member);
        }

        self.models.get_or_try_build(key.id(), || {
            let model = TypeModel::build(data_type);
            tracing::debug!(
                type_name = model.name(),
                fields = model.len(),
                "type model built"
            );

            Ok(Arc::new(model))
        })
    }

    pub fn type_model_of<T: Reflect>(&self) -> Result<Arc<TypeModel>, MapError> {
        self.type_model(TypeKey::of::<T>())
    }

    /// Compiled accessor for a model field.
    pub fn accessor(&self, field: &Arc<Field>) -> Result<Arc<FieldAccessor>, MapError> {
        let key = (field.declaring_type().id(), field.index());

        self.accessors.get_or_try_build(key, || {
            FieldAccessor::compile(Arc::clone(field), self).map(Arc::new)
        })
    }

    #[must_use]
    pub fn stats(&self) -> TypeRegistryStats {
        TypeRegistryStats {
            data_types: self.data_types.stats(),
            models: self.models.stats(),
            accessors: self.accessors.stats(),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

///
/// TypeRegistryStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TypeRegistryStats {
    pub data_types: CacheStats,
    pub models: CacheStats,
    pub accessors: CacheStats,
}

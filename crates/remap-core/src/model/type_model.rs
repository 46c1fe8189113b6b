use crate::{
    error::MapError,
    model::{DataType, Field, TypeKey},
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

///
/// TypeModel
///
/// Ordered field list of one composite type.
/// Name lookup is last-write-wins when a type declares a name twice; the
/// ordered list keeps every declaration.
///

#[derive(Debug)]
pub struct TypeModel {
    data_type: Arc<DataType>,
    fields: Vec<Arc<Field>>,
    by_name: FxHashMap<&'static str, usize>,
}

impl TypeModel {
    pub(crate) fn build(data_type: Arc<DataType>) -> Self {
        let key = data_type.key();
        let fields: Vec<Arc<Field>> = key
            .field_specs()
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Arc::new(Field::from_spec(spec, index, key)))
            .collect();

        let mut by_name = FxHashMap::default();
        for field in &fields {
            by_name.insert(field.name(), field.index());
        }

        Self {
            data_type,
            fields,
            by_name,
        }
    }

    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.data_type.key()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.data_type.name()
    }

    #[must_use]
    pub const fn data_type(&self) -> &Arc<DataType> {
        &self.data_type
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by declared name.
    pub fn field(&self, name: &str) -> Result<&Arc<Field>, MapError> {
        self.try_field(name)
            .ok_or_else(|| MapError::field_not_found(self.name(), name))
    }

    #[must_use]
    pub fn try_field(&self, name: &str) -> Option<&Arc<Field>> {
        self.by_name.get(name).and_then(|&i| self.fields.get(i))
    }
}

use crate::{
    error::MapError,
    model::{Field, TypeKey, TypeRegistry},
    traits::Node,
    value::{Value, ValueKind},
};
use std::sync::Arc;

///
/// FieldAccessor
///
/// Compiled per-field access used by the object cursors. Built once per
/// field and cached by the registry. Writes coerce the transport value to
/// the slot's kind, and a lone scalar written into a list slot becomes a
/// one-element list.
///

pub struct FieldAccessor {
    field: Arc<Field>,
    target_kind: Option<ValueKind>,
}

impl FieldAccessor {
    pub(crate) fn compile(field: Arc<Field>, types: &TypeRegistry) -> Result<Self, MapError> {
        let data_type = field.data_type(types)?;

        Ok(Self {
            target_kind: data_type.value_kind().cloned(),
            field,
        })
    }

    #[must_use]
    pub const fn field(&self) -> &Arc<Field> {
        &self.field
    }

    #[must_use]
    pub fn declaring_type(&self) -> TypeKey {
        self.field.declaring_type()
    }

    #[must_use]
    pub fn read(&self, owner: &Node) -> Option<Value> {
        self.field.access().read(owner)
    }

    /// Write `value`; `false` when it cannot be converted to the slot.
    pub fn write(&self, owner: &mut Node, value: Value) -> bool {
        if value.is_null() {
            return self.field.access().write(owner, value);
        }

        let value = match (&self.target_kind, value) {
            (Some(ValueKind::List(_)), value @ Value::List(_)) => value,
            (Some(ValueKind::List(_)), scalar) => Value::List(vec![scalar]),
            (_, value) => value,
        };

        let value = match &self.target_kind {
            Some(kind) => match value.coerce_to(kind) {
                Some(value) => value,
                None => return false,
            },
            None => value,
        };

        self.field.access().write(owner, value)
    }

    #[must_use]
    pub fn member<'a>(&self, owner: &'a Node) -> Option<&'a Node> {
        self.field.access().member(owner)
    }

    pub fn member_mut<'a>(&self, owner: &'a mut Node) -> Option<&'a mut Node> {
        self.field.access().member_mut(owner)
    }

    pub fn put(&self, owner: &mut Node, member: Box<Node>) -> bool {
        self.field.access().put(owner, member)
    }
}

impl std::fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("field", &self.field)
            .field("target_kind", &self.target_kind)
            .finish()
    }
}

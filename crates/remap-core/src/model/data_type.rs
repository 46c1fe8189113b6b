use crate::{
    error::MapError,
    model::{EnumerableOps, Shape, TypeKey, TypeRegistry},
    traits::Node,
    value::ValueKind,
};
use std::{any::TypeId, sync::Arc};

///
/// DataType
///
/// Classification of one runtime type.
///
/// * nullable   → declared as `Option<T>`; every other flag comes from `T`
/// * enumerable → text, sequences, sets, dictionaries
/// * pure       → enumerable and not text
///

#[derive(Clone, Debug)]
pub struct DataType {
    key: TypeKey,
    member_type: TypeKey,
    shape: Shape,
    element_type: Option<TypeKey>,
    is_nullable: bool,
    is_anonymous_type: bool,
    value_kind: Option<ValueKind>,
    construct: Option<fn() -> Option<Box<Node>>>,
    enumerable: Option<EnumerableOps>,
}

impl DataType {
    pub(crate) fn build(key: TypeKey, types: &TypeRegistry) -> Result<Self, MapError> {
        let spec = key.spec();

        if let Shape::Nullable { inner } | Shape::Boxed { inner } = spec.shape {
            let nullable = matches!(spec.shape, Shape::Nullable { .. });
            let inner = types.data_type(inner)?;
            if nullable && inner.is_nullable {
                return Err(MapError::model_contract(format!(
                    "'{}' nests nullable wrappers",
                    key.name()
                )));
            }

            return Ok(Self {
                key,
                is_nullable: nullable || inner.is_nullable,
                ..(*inner).clone()
            });
        }

        let element_type = match spec.shape {
            Shape::Text => Some(TypeKey::of::<char>()),
            Shape::Sequence { element } | Shape::Set { element } => Some(element),
            Shape::Dictionary { entry, .. } => Some(entry),
            _ => None,
        };

        Ok(Self {
            key,
            member_type: key,
            shape: spec.shape,
            element_type,
            is_nullable: false,
            is_anonymous_type: spec.anonymous,
            value_kind: spec.value_kind,
            construct: spec.construct,
            enumerable: spec.enumerable,
        })
    }

    #[must_use]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.key.id()
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.key.name()
    }

    /// Type of the node behind this one once any `Option` is unwrapped.
    #[must_use]
    pub const fn member_type(&self) -> TypeKey {
        self.member_type
    }

    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    #[must_use]
    pub const fn is_enumerable(&self) -> bool {
        matches!(
            self.shape,
            Shape::Text | Shape::Sequence { .. } | Shape::Set { .. } | Shape::Dictionary { .. }
        )
    }

    #[must_use]
    pub const fn is_pure_enumerable(&self) -> bool {
        self.is_enumerable() && !matches!(self.shape, Shape::Text)
    }

    #[must_use]
    pub const fn element_type(&self) -> Option<TypeKey> {
        self.element_type
    }

    #[must_use]
    pub const fn is_anonymous_type(&self) -> bool {
        self.is_anonymous_type
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self.shape, Shape::Composite)
    }

    /// Leaf for binding purposes: copied as one transport value.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.value_kind.is_some()
    }

    #[must_use]
    pub const fn value_kind(&self) -> Option<&ValueKind> {
        self.value_kind.as_ref()
    }

    #[must_use]
    pub const fn enumerable_ops(&self) -> Option<EnumerableOps> {
        self.enumerable
    }

    /// Build a fresh instance of the member type, when it has a default.
    #[must_use]
    pub fn construct(&self) -> Option<Box<Node>> {
        self.construct.and_then(|construct| construct())
    }

    #[must_use]
    pub const fn can_construct(&self) -> bool {
        self.construct.is_some()
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DataType {}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Shared helper for accessors that need the element classification.
pub(crate) fn element_member(
    data_type: &DataType,
    types: &TypeRegistry,
) -> Result<Option<Arc<DataType>>, MapError> {
    let Some(element) = data_type.element_type() else {
        return Ok(None);
    };
    let element = types.data_type(element)?;

    types.data_type(element.member_type()).map(Some)
}

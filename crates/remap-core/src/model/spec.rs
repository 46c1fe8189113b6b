use crate::{
    model::field::FieldSpec,
    traits::{Node, Reflect},
    value::ValueKind,
};
use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
};

///
/// TypeKey
///
/// Type-erased handle for one `Reflect` type. Carries the monomorphized
/// description functions so registries can build models from a key alone.
/// Identity is the `TypeId`.
///

#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    spec: fn() -> TypeSpec,
    fields: fn() -> Vec<FieldSpec>,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: Reflect>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            spec: T::type_spec,
            fields: T::fields,
        }
    }

    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn spec(&self) -> TypeSpec {
        (self.spec)()
    }

    #[must_use]
    pub fn field_specs(&self) -> Vec<FieldSpec> {
        (self.fields)()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

///
/// Shape
/// Structural classification declared by a `Reflect` impl.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape {
    Scalar,
    /// Enumerable of `char`, treated as a scalar during mapping.
    Text,
    /// The untyped `Value`.
    Any,
    Composite,
    Sequence {
        element: TypeKey,
    },
    Set {
        element: TypeKey,
    },
    Dictionary {
        key: TypeKey,
        value: TypeKey,
        entry: TypeKey,
    },
    Nullable {
        inner: TypeKey,
    },
    /// Heap indirection; classified as `inner`.
    Boxed {
        inner: TypeKey,
    },
}

///
/// EnumerableOps
///
/// Monomorphized element access for a pure-enumerable type.
/// `elements` borrows each element at its member level; `collect` rebuilds
/// the collection from owned element nodes.
///

#[derive(Clone, Copy)]
pub struct EnumerableOps {
    pub elements: for<'a> fn(&'a Node) -> Option<Vec<Option<&'a Node>>>,
    pub collect: fn(Vec<Box<Node>>) -> Option<Box<Node>>,
}

impl fmt::Debug for EnumerableOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnumerableOps")
    }
}

///
/// TypeSpec
/// Raw description returned by `Reflect::type_spec`, before classification.
///

#[derive(Clone, Debug)]
pub struct TypeSpec {
    pub shape: Shape,
    pub value_kind: Option<ValueKind>,
    pub anonymous: bool,
    pub construct: Option<fn() -> Option<Box<Node>>>,
    pub enumerable: Option<EnumerableOps>,
}

impl TypeSpec {
    #[must_use]
    pub fn scalar<T: Reflect>(kind: ValueKind) -> Self {
        Self {
            shape: Shape::Scalar,
            value_kind: Some(kind),
            anonymous: false,
            construct: Some(construct_node::<T>),
            enumerable: None,
        }
    }

    #[must_use]
    pub fn text<T: Reflect>() -> Self {
        Self {
            shape: Shape::Text,
            value_kind: Some(ValueKind::Text),
            anonymous: false,
            construct: Some(construct_node::<T>),
            enumerable: None,
        }
    }

    #[must_use]
    pub fn any<T: Reflect>() -> Self {
        Self {
            shape: Shape::Any,
            value_kind: Some(ValueKind::Any),
            anonymous: false,
            construct: Some(construct_node::<T>),
            enumerable: None,
        }
    }

    #[must_use]
    pub fn composite<T: Reflect>() -> Self {
        Self {
            shape: Shape::Composite,
            value_kind: None,
            anonymous: false,
            construct: Some(construct_node::<T>),
            enumerable: None,
        }
    }

    /// Composite without a declared name (tuples).
    #[must_use]
    pub fn anonymous<T: Reflect>() -> Self {
        Self {
            anonymous: true,
            ..Self::composite::<T>()
        }
    }

    #[must_use]
    pub fn sequence<T: Reflect, E: Reflect>(ops: EnumerableOps) -> Self {
        Self {
            shape: Shape::Sequence {
                element: TypeKey::of::<E>(),
            },
            value_kind: list_kind::<E>(),
            anonymous: false,
            construct: Some(construct_node::<T>),
            enumerable: Some(ops),
        }
    }

    #[must_use]
    pub fn set<T: Reflect, E: Reflect>(ops: EnumerableOps) -> Self {
        Self {
            shape: Shape::Set {
                element: TypeKey::of::<E>(),
            },
            ..Self::sequence::<T, E>(ops)
        }
    }

    #[must_use]
    pub fn dictionary<T: Reflect, K: Reflect, V: Reflect>() -> Self {
        let scalar_entries = K::type_spec().value_kind.is_some() && V::type_spec().value_kind.is_some();

        Self {
            shape: Shape::Dictionary {
                key: TypeKey::of::<K>(),
                value: TypeKey::of::<V>(),
                entry: TypeKey::of::<(K, V)>(),
            },
            value_kind: scalar_entries.then_some(ValueKind::Map),
            anonymous: false,
            construct: Some(construct_node::<T>),
            enumerable: None,
        }
    }

    #[must_use]
    pub fn nullable<T: Reflect>() -> Self {
        let inner = T::type_spec();

        Self {
            shape: Shape::Nullable {
                inner: TypeKey::of::<T>(),
            },
            value_kind: inner.value_kind,
            anonymous: inner.anonymous,
            construct: inner.construct,
            enumerable: inner.enumerable,
        }
    }

    #[must_use]
    pub fn boxed<T: Reflect>() -> Self {
        Self {
            shape: Shape::Boxed {
                inner: TypeKey::of::<T>(),
            },
            ..Self::nullable::<T>()
        }
    }
}

fn list_kind<E: Reflect>() -> Option<ValueKind> {
    E::type_spec()
        .value_kind
        .map(|kind| ValueKind::List(Box::new(kind)))
}

/// Construct a boxed node through `Reflect::construct`.
pub fn construct_node<T: Reflect>() -> Option<Box<Node>> {
    T::construct().and_then(Reflect::into_node)
}

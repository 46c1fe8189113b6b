mod collection;
mod tuple;


use crate::{
    model::{FieldSpec, TypeSpec},
    value::{Value, ValueKind},
};
use std::any::Any;

///
/// Node
/// Type-erased object handled by the cursors.
///

pub type Node = dyn Any + Send + Sync;

// ============================================================================
// REFLECTION CONTRACT
// ============================================================================

///
/// Reflect
///
/// Static reflection surface for mappable types. Implemented for scalars,
/// std collections and tuples here, and for user structs via
/// `#[derive(Model)]`.
///
/// `Member` is the type a cursor lands on after unwrapping `Option` and
/// `Box`; every node conversion below works at that level.
///

pub trait Reflect: Any + Send + Sync + Sized {
    type Member: Reflect;

    fn type_spec() -> TypeSpec;

    /// Declared fields, in declaration order. Empty for non-composites.
    fn fields() -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Scalar transport value; `None` for composites.
    fn to_value(&self) -> Option<Value> {
        None
    }

    #[must_use]
    fn from_value(value: Value) -> Option<Self> {
        let _ = value;
        None
    }

    /// Fresh instance used when a writer materializes a missing member.
    #[must_use]
    fn construct() -> Option<Self> {
        None
    }

    fn as_node(&self) -> Option<&Node> {
        Some(self)
    }

    fn into_node(self) -> Option<Box<Node>> {
        let node: Box<Node> = Box::new(self);
        Some(node)
    }

    #[must_use]
    fn from_node(node: Box<Node>) -> Option<Self> {
        node.downcast::<Self>().ok().map(|boxed| *boxed)
    }

    /// Mutable view of the member in place; `None` when it is absent.
    fn as_node_mut(&mut self) -> Option<&mut Node> {
        Some(self)
    }

    fn put_node(slot: &mut Self, node: Box<Node>) -> bool {
        match Self::from_node(node) {
            Some(value) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

///
/// FieldValue
///
/// Conversion boundary between scalar Rust types and the `Value`
/// transport. `from_value` is strict; coercion happens before it.
///

pub trait FieldValue {
    fn kind() -> ValueKind
    where
        Self: Sized;

    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

// impl_reflect_scalar
macro_rules! impl_reflect_scalar {
    ( $( $type:ty ),* $(,)? ) => {
        $(
            impl Reflect for $type {
                type Member = Self;

                fn type_spec() -> TypeSpec {
                    TypeSpec::scalar::<Self>(<Self as FieldValue>::kind())
                }

                fn to_value(&self) -> Option<Value> {
                    Some(FieldValue::to_value(self))
                }

                fn from_value(value: Value) -> Option<Self> {
                    let value = value.coerce_to(&<Self as FieldValue>::kind())?;

                    <Self as FieldValue>::from_value(&value)
                }

                fn construct() -> Option<Self> {
                    Some(Self::default())
                }
            }
        )*
    };
}

// impl_field_value
macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                fn kind() -> ValueKind {
                    ValueKind::$variant
                }

                fn to_value(&self) -> Value {
                    Value::$variant((*self).into())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => (*v).try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*

        impl_reflect_scalar!($( $type ),*);
    };
}

impl_field_value!(
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    f64 => Float,
    bool => Bool,
    char => Char,
);

impl FieldValue for usize {
    fn kind() -> ValueKind {
        ValueKind::Uint
    }

    fn to_value(&self) -> Value {
        u64::try_from(*self).map_or(Value::Null, Value::Uint)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uint(v) => Self::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FieldValue for isize {
    fn kind() -> ValueKind {
        ValueKind::Int
    }

    fn to_value(&self) -> Value {
        i64::try_from(*self).map_or(Value::Null, Value::Int)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Self::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FieldValue for f32 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    // only values that survive the round trip through f32
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) if f64::from(*v as Self) == *v || v.is_nan() => Some(*v as Self),
            _ => None,
        }
    }
}

impl FieldValue for String {
    fn kind() -> ValueKind {
        ValueKind::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl_reflect_scalar!(usize, isize, f32);

// String is enumerable text; it is still copied as one value.
impl Reflect for String {
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::text::<Self>()
    }

    fn to_value(&self) -> Option<Value> {
        Some(FieldValue::to_value(self))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    fn construct() -> Option<Self> {
        Some(Self::new())
    }
}

// Value is the untyped slot; anything non-null passes through.
impl Reflect for Value {
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::any::<Self>()
    }

    fn to_value(&self) -> Option<Value> {
        Some(self.clone())
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }

    fn construct() -> Option<Self> {
        Some(Self::Null)
    }
}

// ============================================================================
// WRAPPERS
// ============================================================================

impl<T: Reflect> Reflect for Option<T> {
    type Member = T::Member;

    fn type_spec() -> TypeSpec {
        TypeSpec::nullable::<T>()
    }

    fn to_value(&self) -> Option<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Some(Value::Null),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }

        T::from_value(value).map(Some)
    }

    fn construct() -> Option<Self> {
        Some(None)
    }

    fn as_node(&self) -> Option<&Node> {
        self.as_ref().and_then(T::as_node)
    }

    fn into_node(self) -> Option<Box<Node>> {
        self.and_then(T::into_node)
    }

    fn from_node(node: Box<Node>) -> Option<Self> {
        T::from_node(node).map(Some)
    }

    fn as_node_mut(&mut self) -> Option<&mut Node> {
        self.as_mut().and_then(T::as_node_mut)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    type Member = T::Member;

    fn type_spec() -> TypeSpec {
        TypeSpec::boxed::<T>()
    }

    fn to_value(&self) -> Option<Value> {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Option<Self> {
        T::from_value(value).map(Self::new)
    }

    fn construct() -> Option<Self> {
        T::construct().map(Self::new)
    }

    fn as_node(&self) -> Option<&Node> {
        (**self).as_node()
    }

    fn into_node(self) -> Option<Box<Node>> {
        (*self).into_node()
    }

    fn from_node(node: Box<Node>) -> Option<Self> {
        T::from_node(node).map(Self::new)
    }

    fn as_node_mut(&mut self) -> Option<&mut Node> {
        (**self).as_node_mut()
    }

    fn put_node(slot: &mut Self, node: Box<Node>) -> bool {
        T::put_node(slot, node)
    }
}

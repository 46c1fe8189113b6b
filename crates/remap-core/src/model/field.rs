use crate::{
    error::MapError,
    model::{DataType, TypeKey, TypeModel, TypeRegistry},
    traits::{Node, Reflect},
    value::Value,
};
use std::{fmt, sync::Arc};

///
/// FieldAccess
///
/// Type-erased accessor for one declared field. Owners arrive as `Node`
/// and are downcast to the declaring type; a mismatched owner reads as
/// absent and rejects writes.
///

pub trait FieldAccess: Send + Sync {
    fn can_read(&self) -> bool;

    fn can_write(&self) -> bool;

    /// Whether cursors may enter the member; `false` when the value only
    /// exists as a whole.
    fn can_descend(&self) -> bool {
        true
    }

    /// Read the field as a transport value.
    fn read(&self, owner: &Node) -> Option<Value>;

    /// Write a transport value; `false` when the value does not fit the slot.
    fn write(&self, owner: &mut Node, value: Value) -> bool;

    /// Borrow the member node for descent. `None` means a null member.
    fn member<'a>(&self, owner: &'a Node) -> Option<&'a Node>;

    /// Mutably borrow the member node for in-place updates.
    fn member_mut<'a>(&self, owner: &'a mut Node) -> Option<&'a mut Node>;

    /// Store a member node back; `false` on a type mismatch.
    fn put(&self, owner: &mut Node, member: Box<Node>) -> bool;
}

// Stored slot with optional getter and setter halves.
struct SlotAccess<P, F> {
    get: Option<fn(&P) -> &F>,
    get_mut: Option<fn(&mut P) -> &mut F>,
}

impl<P: Reflect, F: Reflect> FieldAccess for SlotAccess<P, F> {
    fn can_read(&self) -> bool {
        self.get.is_some()
    }

    fn can_write(&self) -> bool {
        self.get_mut.is_some()
    }

    fn read(&self, owner: &Node) -> Option<Value> {
        let get = self.get?;
        get(owner.downcast_ref::<P>()?).to_value()
    }

    fn write(&self, owner: &mut Node, value: Value) -> bool {
        let (Some(get_mut), Some(owner)) = (self.get_mut, owner.downcast_mut::<P>()) else {
            return false;
        };
        let Some(value) = F::from_value(value) else {
            return false;
        };
        *get_mut(owner) = value;

        true
    }

    fn member<'a>(&self, owner: &'a Node) -> Option<&'a Node> {
        let get = self.get?;
        get(owner.downcast_ref::<P>()?).as_node()
    }

    fn member_mut<'a>(&self, owner: &'a mut Node) -> Option<&'a mut Node> {
        let get_mut = self.get_mut?;
        get_mut(owner.downcast_mut::<P>()?).as_node_mut()
    }

    fn put(&self, owner: &mut Node, member: Box<Node>) -> bool {
        let (Some(get_mut), Some(owner)) = (self.get_mut, owner.downcast_mut::<P>()) else {
            return false;
        };

        F::put_node(get_mut(owner), member)
    }
}

// Getter-only property computed from the owner.
struct ComputedAccess<P, F> {
    get: fn(&P) -> F,
}

impl<P: Reflect, F: Reflect> FieldAccess for ComputedAccess<P, F> {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        false
    }

    // the value is produced on demand, so there is no member to borrow
    fn can_descend(&self) -> bool {
        false
    }

    fn read(&self, owner: &Node) -> Option<Value> {
        (self.get)(owner.downcast_ref::<P>()?).to_value()
    }

    fn write(&self, _: &mut Node, _: Value) -> bool {
        false
    }

    fn member<'a>(&self, _: &'a Node) -> Option<&'a Node> {
        None
    }

    fn member_mut<'a>(&self, _: &'a mut Node) -> Option<&'a mut Node> {
        None
    }

    fn put(&self, _: &mut Node, _: Box<Node>) -> bool {
        false
    }
}

// Setter-only property.
struct SetterAccess<P, F> {
    set: fn(&mut P, F),
}

impl<P: Reflect, F: Reflect> FieldAccess for SetterAccess<P, F> {
    fn can_read(&self) -> bool {
        false
    }

    fn can_write(&self) -> bool {
        true
    }

    fn read(&self, _: &Node) -> Option<Value> {
        None
    }

    fn write(&self, owner: &mut Node, value: Value) -> bool {
        let (Some(owner), Some(value)) = (owner.downcast_mut::<P>(), F::from_value(value)) else {
            return false;
        };
        (self.set)(owner, value);

        true
    }

    fn member<'a>(&self, _: &'a Node) -> Option<&'a Node> {
        None
    }

    fn member_mut<'a>(&self, _: &'a mut Node) -> Option<&'a mut Node> {
        None
    }

    fn put(&self, owner: &mut Node, member: Box<Node>) -> bool {
        let (Some(owner), Some(member)) = (owner.downcast_mut::<P>(), F::from_node(member)) else {
            return false;
        };
        (self.set)(owner, member);

        true
    }
}

///
/// FieldSpec
///
/// One declared field as emitted by `Reflect::fields`.
/// Declaration order is the order of the returned list.
///

#[derive(Clone)]
pub struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) value_type: TypeKey,
    pub(crate) member_type: TypeKey,
    pub(crate) access: Arc<dyn FieldAccess>,
}

impl FieldSpec {
    /// Readable and writable stored field.
    pub fn new<P: Reflect, F: Reflect>(
        name: &'static str,
        get: fn(&P) -> &F,
        get_mut: fn(&mut P) -> &mut F,
    ) -> Self {
        Self::with_access::<F>(
            name,
            SlotAccess::<P, F> {
                get: Some(get),
                get_mut: Some(get_mut),
            },
        )
    }

    pub fn read_only<P: Reflect, F: Reflect>(name: &'static str, get: fn(&P) -> &F) -> Self {
        Self::with_access::<F>(
            name,
            SlotAccess::<P, F> {
                get: Some(get),
                get_mut: None,
            },
        )
    }

    pub fn write_only<P: Reflect, F: Reflect>(
        name: &'static str,
        get_mut: fn(&mut P) -> &mut F,
    ) -> Self {
        Self::with_access::<F>(
            name,
            SlotAccess::<P, F> {
                get: None,
                get_mut: Some(get_mut),
            },
        )
    }

    /// Getter-only property.
    pub fn computed<P: Reflect, F: Reflect>(name: &'static str, get: fn(&P) -> F) -> Self {
        Self::with_access::<F>(name, ComputedAccess::<P, F> { get })
    }

    /// Setter-only property.
    pub fn setter<P: Reflect, F: Reflect>(name: &'static str, set: fn(&mut P, F)) -> Self {
        Self::with_access::<F>(name, SetterAccess::<P, F> { set })
    }

    fn with_access<F: Reflect>(name: &'static str, access: impl FieldAccess + 'static) -> Self {
        Self {
            name,
            value_type: TypeKey::of::<F>(),
            member_type: TypeKey::of::<F::Member>(),
            access: Arc::new(access),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

///
/// Field
///
/// A field as it appears in a `TypeModel`: declaration position, owning
/// type and access capabilities. The field's own model is resolved lazily
/// through the registry, so recursive types never build eagerly.
///

#[derive(Clone)]
pub struct Field {
    name: &'static str,
    index: usize,
    declaring_type: TypeKey,
    value_type: TypeKey,
    member_type: TypeKey,
    access: Arc<dyn FieldAccess>,
}

impl Field {
    pub(crate) fn from_spec(spec: FieldSpec, index: usize, declaring_type: TypeKey) -> Self {
        Self {
            name: spec.name,
            index,
            declaring_type,
            value_type: spec.value_type,
            member_type: spec.member_type,
            access: spec.access,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn declaring_type(&self) -> TypeKey {
        self.declaring_type
    }

    /// Declared type, including any `Option` wrapper.
    #[must_use]
    pub const fn value_type(&self) -> TypeKey {
        self.value_type
    }

    /// Type of the node a cursor lands on after entering this field.
    #[must_use]
    pub const fn member_type(&self) -> TypeKey {
        self.member_type
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        self.access.can_read()
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        self.access.can_write()
    }

    /// Whether cursors may enter this field; computed properties are
    /// readable only as a whole value.
    #[must_use]
    pub fn can_descend(&self) -> bool {
        self.access.can_descend()
    }

    pub(crate) fn access(&self) -> &dyn FieldAccess {
        self.access.as_ref()
    }

    /// Classification of the declared type.
    pub fn data_type(&self, types: &TypeRegistry) -> Result<Arc<DataType>, MapError> {
        types.data_type(self.value_type)
    }

    /// The model of this field's type, when the field is composite.
    pub fn field_model(&self, types: &TypeRegistry) -> Result<Option<Arc<TypeModel>>, MapError> {
        if !self.data_type(types)?.is_composite() {
            return Ok(None);
        }

        types.type_model(self.member_type).map(Some)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type && self.index == other.index
    }
}

impl Eq for Field {}

impl std::hash::Hash for Field {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.declaring_type.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type.name(), self.name)
    }
}

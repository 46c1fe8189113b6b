use crate::{
    error::MapError,
    model::{DataType, EnumerableOps, Field, FieldAccessor, TypeKey, TypeRegistry, element_member},
    runtime::{CursorState, DataModelWriter, ObjectFactory, check_owner},
    traits::{Node, Reflect},
    value::Value,
};
use std::{any::type_name, sync::Arc};

///
/// ObjectWriter
///
/// Writer over an owned object graph. Entered members stay pending until
/// the first write below them, so members the mapping never touches are
/// left as they were. Present members are updated in place; only absent
/// ones are built by the factory and stored on leave.
///

pub struct ObjectWriter<'a> {
    types: &'a TypeRegistry,
    factory: &'a dyn ObjectFactory,
    root: Box<Node>,
    root_type: Arc<DataType>,
    frames: Vec<WriteFrame>,
}

enum WriteFrame {
    Member {
        accessor: Arc<FieldAccessor>,
        data_type: Arc<DataType>,
        state: MemberState,
    },
    Enumerable {
        ops: EnumerableOps,
        element: Arc<DataType>,
        items: Vec<Box<Node>>,
        current: Option<Box<Node>>,
    },
}

enum MemberState {
    Pending,
    InPlace,
    Owned(Box<Node>),
}

impl<'a> ObjectWriter<'a> {
    /// Writer that updates an existing root in place.
    pub fn new<T: Reflect>(
        types: &'a TypeRegistry,
        factory: &'a dyn ObjectFactory,
        root: T,
    ) -> Result<Self, MapError> {
        let root_type = types.data_type(TypeKey::of::<T::Member>())?;
        let root = match root.into_node() {
            Some(root) => root,
            None => factory.create_instance(&root_type)?,
        };

        Ok(Self::from_node(types, factory, root, root_type))
    }

    /// Writer over a fresh root built by the factory.
    pub fn create<T: Reflect>(
        types: &'a TypeRegistry,
        factory: &'a dyn ObjectFactory,
    ) -> Result<Self, MapError> {
        let root_type = types.data_type(TypeKey::of::<T::Member>())?;
        let root = factory.create_instance(&root_type)?;

        Ok(Self::from_node(types, factory, root, root_type))
    }

    #[must_use]
    pub fn from_node(
        types: &'a TypeRegistry,
        factory: &'a dyn ObjectFactory,
        root: Box<Node>,
        root_type: Arc<DataType>,
    ) -> Self {
        Self {
            types,
            factory,
            root,
            root_type,
            frames: Vec::new(),
        }
    }

    /// Finish writing and take the root back out.
    pub fn into_inner<T: Reflect>(self) -> Result<T, MapError> {
        if !self.frames.is_empty() {
            return Err(MapError::runtime_contract(format!(
                "writer finished with {} open frame(s)",
                self.frames.len()
            )));
        }

        T::from_node(self.root).ok_or_else(|| {
            MapError::runtime_contract(format!("writer root is not a '{}'", type_name::<T>()))
        })
    }

    fn current_type(&self) -> Result<&Arc<DataType>, MapError> {
        match self.frames.last() {
            None => Ok(&self.root_type),
            Some(WriteFrame::Member { data_type, .. }) => Ok(data_type),
            Some(WriteFrame::Enumerable {
                element, current, ..
            }) => {
                if current.is_none() {
                    return Err(MapError::runtime_contract(
                        "writer element accessed before move_next",
                    ));
                }
                Ok(element)
            }
        }
    }

    fn check_field(&self, field: &Field) -> Result<(), MapError> {
        check_owner(field, self.current_type()?, "writer")?;

        if field.can_write() {
            Ok(())
        } else {
            Err(MapError::runtime_contract(format!(
                "field {field:?} is not writable"
            )))
        }
    }
}

// Resolve the innermost node, creating pending members on the way down.
fn materialize<'f>(
    factory: &dyn ObjectFactory,
    root: &'f mut Box<Node>,
    frames: &'f mut [WriteFrame],
) -> Result<&'f mut Node, MapError> {
    let Some((last, parents)) = frames.split_last_mut() else {
        return Ok(&mut **root);
    };

    match last {
        WriteFrame::Member {
            accessor,
            data_type,
            state,
        } => match state {
            MemberState::Owned(node) => Ok(&mut **node),
            MemberState::Pending | MemberState::InPlace => {
                let parent = materialize(factory, root, parents)?;

                if matches!(state, MemberState::InPlace)
                    || accessor.member_mut(&mut *parent).is_some()
                {
                    *state = MemberState::InPlace;
                    return accessor.member_mut(parent).ok_or_else(|| {
                        MapError::runtime_contract(format!(
                            "member {:?} disappeared while writing",
                            accessor.field()
                        ))
                    });
                }

                *state = MemberState::Owned(factory.create_instance(data_type)?);
                match state {
                    MemberState::Owned(node) => Ok(&mut **node),
                    MemberState::Pending | MemberState::InPlace => Err(
                        MapError::runtime_contract("writer member could not be materialized"),
                    ),
                }
            }
        },
        WriteFrame::Enumerable { current, .. } => current.as_deref_mut().ok_or_else(|| {
            MapError::runtime_contract("writer element accessed before move_next")
        }),
    }
}

impl DataModelWriter for ObjectWriter<'_> {
    fn state(&self) -> CursorState {
        let depth = self.frames.len();

        match self.frames.last() {
            None => CursorState::AtRoot,
            Some(WriteFrame::Member { .. }) => CursorState::InMember { depth },
            Some(WriteFrame::Enumerable { items, current, .. }) => CursorState::InEnumerable {
                depth,
                position: current.as_ref().map(|_| items.len()),
            },
        }
    }

    fn enter_member(&mut self, field: &Arc<Field>) -> Result<(), MapError> {
        self.check_field(field)?;

        let data_type = self.types.data_type(field.member_type())?;
        if !(data_type.is_composite() || data_type.is_pure_enumerable()) {
            return Err(MapError::runtime_contract(format!(
                "cannot enter field {field:?}: '{}' is neither composite nor enumerable",
                data_type.name()
            )));
        }

        let accessor = self.types.accessor(field)?;
        self.frames.push(WriteFrame::Member {
            accessor,
            data_type,
            state: MemberState::Pending,
        });

        Ok(())
    }

    fn leave_member(&mut self) -> Result<(), MapError> {
        let (accessor, state) = match self.frames.pop() {
            Some(WriteFrame::Member {
                accessor, state, ..
            }) => (accessor, state),
            other => {
                self.frames.extend(other);
                return Err(MapError::runtime_contract(
                    "writer leave_member without a matching enter_member",
                ));
            }
        };

        // untouched and in-place members need no store
        let MemberState::Owned(node) = state else {
            return Ok(());
        };

        let parent = materialize(self.factory, &mut self.root, &mut self.frames)?;
        if accessor.put(parent, node) {
            Ok(())
        } else {
            Err(MapError::runtime_contract(format!(
                "cannot store member back into {:?}",
                accessor.field()
            )))
        }
    }

    fn enter_enumerable(&mut self) -> Result<(), MapError> {
        let data_type = Arc::clone(self.current_type()?);

        let Some(ops) = data_type.enumerable_ops() else {
            return Err(if data_type.is_pure_enumerable() {
                MapError::runtime_unsupported(format!(
                    "'{}' does not support element enumeration",
                    data_type.name()
                ))
            } else {
                MapError::runtime_contract(format!("'{}' is not enumerable", data_type.name()))
            });
        };
        let element = element_member(&data_type, self.types)?.ok_or_else(|| {
            MapError::runtime_contract(format!("'{}' has no element type", data_type.name()))
        })?;

        self.frames.push(WriteFrame::Enumerable {
            ops,
            element,
            items: Vec::new(),
            current: None,
        });

        Ok(())
    }

    fn move_next(&mut self) -> Result<(), MapError> {
        let Some(WriteFrame::Enumerable {
            element,
            items,
            current,
            ..
        }) = self.frames.last_mut()
        else {
            return Err(MapError::runtime_contract(
                "writer move_next outside an enumerable",
            ));
        };

        if let Some(done) = current.take() {
            items.push(done);
        }
        *current = Some(self.factory.create_instance(element)?);

        Ok(())
    }

    fn leave_enumerable(&mut self) -> Result<(), MapError> {
        let (ops, mut items, current) = match self.frames.pop() {
            Some(WriteFrame::Enumerable {
                ops,
                items,
                current,
                ..
            }) => (ops, items, current),
            other => {
                self.frames.extend(other);
                return Err(MapError::runtime_contract(
                    "writer leave_enumerable without a matching enter_enumerable",
                ));
            }
        };

        items.extend(current);
        let collection = (ops.collect)(items).ok_or_else(|| {
            MapError::runtime_contract("writer elements do not fit the target collection")
        })?;

        match self.frames.last_mut() {
            None => self.root = collection,
            Some(WriteFrame::Member { state, .. }) => *state = MemberState::Owned(collection),
            Some(WriteFrame::Enumerable { current, .. }) => *current = Some(collection),
        }

        Ok(())
    }

    fn write_field(&mut self, field: &Arc<Field>, value: Value) -> Result<bool, MapError> {
        self.check_field(field)?;

        let accessor = self.types.accessor(field)?;
        let owner = materialize(self.factory, &mut self.root, &mut self.frames)?;

        Ok(accessor.write(owner, value))
    }
}

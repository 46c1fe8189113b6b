use crate::{
    error::MapError,
    model::{DataType, Field, TypeKey, TypeRegistry, element_member},
    runtime::{CursorState, DataModelReader, check_owner},
    traits::{Node, Reflect},
    value::Value,
};
use std::sync::Arc;

///
/// ObjectReader
///
/// Reader over a borrowed in-memory object graph.
///

pub struct ObjectReader<'a> {
    types: &'a TypeRegistry,
    root: &'a Node,
    root_type: Arc<DataType>,
    frames: Vec<ReadFrame<'a>>,
}

enum ReadFrame<'a> {
    Member {
        node: &'a Node,
        data_type: Arc<DataType>,
    },
    Enumerable {
        items: Vec<Option<&'a Node>>,
        element: Arc<DataType>,
        position: Option<usize>,
    },
}

impl<'a> ObjectReader<'a> {
    pub fn new<T: Reflect>(types: &'a TypeRegistry, root: &'a T) -> Result<Self, MapError> {
        let root_type = types.data_type(TypeKey::of::<T::Member>())?;
        let root = root.as_node().ok_or_else(|| {
            MapError::runtime_contract(format!("source root '{}' is null", root_type.name()))
        })?;

        Ok(Self::from_node(types, root, root_type))
    }

    /// Reader over an already type-erased root; `root_type` must describe it.
    #[must_use]
    pub const fn from_node(
        types: &'a TypeRegistry,
        root: &'a Node,
        root_type: Arc<DataType>,
    ) -> Self {
        Self {
            types,
            root,
            root_type,
            frames: Vec::new(),
        }
    }

    // Current node and its classification; `None` for a null element.
    fn current(&self) -> Result<Option<(&'a Node, &Arc<DataType>)>, MapError> {
        match self.frames.last() {
            None => Ok(Some((self.root, &self.root_type))),
            Some(ReadFrame::Member { node, data_type }) => Ok(Some((*node, data_type))),
            Some(ReadFrame::Enumerable {
                items,
                element,
                position,
            }) => {
                let Some(position) = position else {
                    return Err(MapError::runtime_contract(
                        "reader element accessed before move_next",
                    ));
                };
                let slot = items.get(*position).ok_or_else(|| {
                    MapError::runtime_contract("reader element accessed after enumeration ended")
                })?;

                Ok(slot.map(|node| (node, element)))
            }
        }
    }
}

impl DataModelReader for ObjectReader<'_> {
    fn state(&self) -> CursorState {
        let depth = self.frames.len();

        match self.frames.last() {
            None => CursorState::AtRoot,
            Some(ReadFrame::Member { .. }) => CursorState::InMember { depth },
            Some(ReadFrame::Enumerable { position, .. }) => CursorState::InEnumerable {
                depth,
                position: *position,
            },
        }
    }

    fn enter_member(&mut self, field: &Arc<Field>) -> Result<bool, MapError> {
        let Some((owner, owner_type)) = self.current()? else {
            return Ok(false);
        };
        check_owner(field, owner_type, "reader")?;

        if !field.can_read() {
            return Err(MapError::runtime_contract(format!(
                "field {field:?} is not readable"
            )));
        }
        if !field.can_descend() {
            return Err(MapError::runtime_contract(format!(
                "field {field:?} is computed and can only be read as a value"
            )));
        }

        let member_type = self.types.data_type(field.member_type())?;
        if !(member_type.is_composite() || member_type.is_pure_enumerable()) {
            return Err(MapError::runtime_contract(format!(
                "cannot enter field {field:?}: '{}' is neither composite nor enumerable",
                member_type.name()
            )));
        }

        let accessor = self.types.accessor(field)?;
        let Some(node) = accessor.member(owner) else {
            return Ok(false);
        };

        self.frames.push(ReadFrame::Member {
            node,
            data_type: member_type,
        });

        Ok(true)
    }

    fn leave_member(&mut self) -> Result<(), MapError> {
        match self.frames.last() {
            Some(ReadFrame::Member { .. }) => {
                self.frames.pop();
                Ok(())
            }
            _ => Err(MapError::runtime_contract(
                "reader leave_member without a matching enter_member",
            )),
        }
    }

    fn enter_enumerable(&mut self) -> Result<(), MapError> {
        let Some((node, data_type)) = self.current()? else {
            return Err(MapError::runtime_contract(
                "reader cannot enumerate a null element",
            ));
        };
        let data_type = Arc::clone(data_type);

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
        let items = (ops.elements)(node).ok_or_else(|| {
            MapError::runtime_contract(format!(
                "reader node does not match '{}'",
                data_type.name()
            ))
        })?;

        self.frames.push(ReadFrame::Enumerable {
            items,
            element,
            position: None,
        });

        Ok(())
    }

    fn leave_enumerable(&mut self) -> Result<(), MapError> {
        match self.frames.last() {
            Some(ReadFrame::Enumerable { .. }) => {
                self.frames.pop();
                Ok(())
            }
            _ => Err(MapError::runtime_contract(
                "reader leave_enumerable without a matching enter_enumerable",
            )),
        }
    }

    fn move_next(&mut self) -> Result<bool, MapError> {
        let Some(ReadFrame::Enumerable {
            items, position, ..
        }) = self.frames.last_mut()
        else {
            return Err(MapError::runtime_contract(
                "reader move_next outside an enumerable",
            ));
        };

        let next = position.map_or(0, |p| p + 1).min(items.len());
        *position = Some(next);

        Ok(next < items.len())
    }

    fn read_field(&mut self, field: &Arc<Field>) -> Result<Option<Value>, MapError> {
        let Some((owner, owner_type)) = self.current()? else {
            return Ok(None);
        };
        check_owner(field, owner_type, "reader")?;

        if !field.can_read() {
            return Err(MapError::runtime_contract(format!(
                "field {field:?} is not readable"
            )));
        }

        let value = self.types.accessor(field)?.read(owner);

        Ok(value.filter(|value| !value.is_null()))
    }
}

//! Graph cursors: a reader walks the source object graph and a writer
//! builds or updates the target graph, both driven by a compiled mapping.

mod factory;
mod reader;
mod writer;


use crate::{error::MapError, model::Field, traits::Reflect, value::Value};
use std::sync::Arc;

pub use factory::{DefaultFactory, FactoryRegistry, ObjectFactory};
pub use reader::ObjectReader;
pub use writer::ObjectWriter;

///
/// CursorState
///
/// AtRoot       → no member or enumerable entered
/// InMember     → inside `depth` nested frames, innermost a member
/// InEnumerable → innermost frame is an enumerable; `position` is the
///                current element once `move_next` has been called
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CursorState {
    AtRoot,
    InMember {
        depth: usize,
    },
    InEnumerable {
        depth: usize,
        position: Option<usize>,
    },
}

///
/// DataModelReader
///
/// Forward cursor over a source graph. Every enter must be matched by the
/// corresponding leave; unmatched leaves are contract errors.
///

pub trait DataModelReader {
    fn state(&self) -> CursorState;

    /// Descend into a composite or enumerable member.
    /// Returns `false` when the member is null; no frame is pushed then.
    fn enter_member(&mut self, field: &Arc<Field>) -> Result<bool, MapError>;

    fn leave_member(&mut self) -> Result<(), MapError>;

    /// Start enumerating the current node.
    fn enter_enumerable(&mut self) -> Result<(), MapError>;

    fn leave_enumerable(&mut self) -> Result<(), MapError>;

    /// Advance to the next element; `false` once exhausted.
    fn move_next(&mut self) -> Result<bool, MapError>;

    /// Read a field of the current node. `None` when the field or the
    /// current element is null.
    fn read_field(&mut self, field: &Arc<Field>) -> Result<Option<Value>, MapError>;

    fn read_typed<T: Reflect>(&mut self, field: &Arc<Field>) -> Result<Option<T>, MapError>
    where
        Self: Sized,
    {
        Ok(self.read_field(field)?.and_then(T::from_value))
    }
}

///
/// DataModelWriter
///
/// Cursor that builds or updates a target graph. Members are materialized
/// lazily on first write and stored back on leave.
///

pub trait DataModelWriter {
    fn state(&self) -> CursorState;

    fn enter_member(&mut self, field: &Arc<Field>) -> Result<(), MapError>;

    fn leave_member(&mut self) -> Result<(), MapError>;

    /// Start building the collection at the current node.
    fn enter_enumerable(&mut self) -> Result<(), MapError>;

    /// Start a new element, created through the object factory.
    fn move_next(&mut self) -> Result<(), MapError>;

    /// Finish the collection and store it in place of the current node.
    fn leave_enumerable(&mut self) -> Result<(), MapError>;

    /// Write a field of the current node; `false` when the value does not
    /// fit the slot.
    fn write_field(&mut self, field: &Arc<Field>, value: Value) -> Result<bool, MapError>;
}

// Contract check shared by both cursors.
pub(crate) fn check_owner(
    field: &Field,
    owner: &crate::model::DataType,
    cursor: &str,
) -> Result<(), MapError> {
    if field.declaring_type() == owner.key() {
        return Ok(());
    }

    Err(MapError::runtime_contract(format!(
        "{cursor} is at '{}', field {field:?} belongs to '{}'",
        owner.name(),
        field.declaring_type().name()
    )))
}

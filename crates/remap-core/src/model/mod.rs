//! Runtime reflection model: type classification, per-type field lists and
//! compiled field accessors, all memoized in a `TypeRegistry`.

mod accessor;
mod data_type;
mod field;
mod registry;
mod spec;
mod type_model;

#[cfg(test)]
mod tests;

pub use accessor::FieldAccessor;
pub use data_type::DataType;
pub use field::{Field, FieldAccess, FieldSpec};
pub use registry::{TypeRegistry, TypeRegistryStats};
pub use spec::{EnumerableOps, Shape, TypeKey, TypeSpec, construct_node};
pub use type_model::TypeModel;

pub(crate) use data_type::element_member;

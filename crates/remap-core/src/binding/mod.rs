//! Binding engine: which source path feeds which target path, and how the
//! value is carried over.

mod builder;
mod context;
mod matcher;
mod path;
mod transform;

#[cfg(test)]
mod tests;

use crate::{
    error::MapError,
    mapping::Mapping,
    model::{TypeKey, TypeRegistry},
};
use std::sync::Arc;

pub use builder::TypeBindingBuilder;
pub use context::{BindingContext, PathSegment};
pub use matcher::{PairKind, PathMatch, classify_pair, match_paths};
pub use path::FieldGraphPath;
pub use transform::{
    BindingTransformation, Converter, CopyValue, ReadFieldTransform, converter,
    read_field_transform,
};

pub(crate) use matcher::{Matcher, needs_descent};

///
/// BindingKind
///
/// Value    → read one value, transform it, write it
/// Elements → enumerate both collections, mapping each element with the
///            nested binding
///

#[derive(Clone, Debug)]
pub enum BindingKind {
    Value(Arc<dyn BindingTransformation>),
    Elements(Arc<DataModelBinding>),
}

///
/// FieldBinding
///

#[derive(Clone, Debug)]
pub struct FieldBinding {
    source: FieldGraphPath,
    target: FieldGraphPath,
    kind: BindingKind,
}

impl FieldBinding {
    #[must_use]
    pub const fn new(source: FieldGraphPath, target: FieldGraphPath, kind: BindingKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &FieldGraphPath {
        &self.source
    }

    #[must_use]
    pub const fn target(&self) -> &FieldGraphPath {
        &self.target
    }

    #[must_use]
    pub const fn kind(&self) -> &BindingKind {
        &self.kind
    }
}

///
/// DataModelBinding
///
/// Immutable binding plan for one source/target pair. No target path is
/// bound twice, and no bound target path is a prefix of another.
///

#[derive(Debug)]
pub struct DataModelBinding {
    source: TypeKey,
    target: TypeKey,
    bindings: Vec<FieldBinding>,
}

impl DataModelBinding {
    pub(crate) const fn new(source: TypeKey, target: TypeKey, bindings: Vec<FieldBinding>) -> Self {
        Self {
            source,
            target,
            bindings,
        }
    }

    #[must_use]
    pub const fn source(&self) -> TypeKey {
        self.source
    }

    #[must_use]
    pub const fn target(&self) -> TypeKey {
        self.target
    }

    #[must_use]
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binding for a dotted target path, if one exists. The empty string
    /// addresses the root.
    #[must_use]
    pub fn binding_for(&self, target: &str) -> Option<&FieldBinding> {
        self.bindings.iter().find(|binding| {
            if target.is_empty() {
                binding.target.is_empty()
            } else {
                binding.target.segments().eq(target.split('.'))
            }
        })
    }

    /// Compile into an executable mapping. Uncached; the mapper caches
    /// per type pair.
    pub fn build_mapping(self: &Arc<Self>, types: &TypeRegistry) -> Result<Mapping, MapError> {
        Mapping::compile(Arc::clone(self), types)
    }
}

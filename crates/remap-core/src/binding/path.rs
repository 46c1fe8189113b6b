use crate::{
    config::NameStyle,
    error::MapError,
    model::{Field, TypeKey, TypeRegistry},
};
use std::{fmt, sync::Arc};

///
/// FieldGraphPath
///
/// A root type plus the ordered fields walked from it. Equality is
/// structural: same root, same fields in the same order. The empty path
/// denotes the root itself.
///

#[derive(Clone, Eq, Hash, PartialEq)]
pub struct FieldGraphPath {
    root: TypeKey,
    fields: Vec<Arc<Field>>,
}

impl FieldGraphPath {
    #[must_use]
    pub const fn root_of(root: TypeKey) -> Self {
        Self {
            root,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub const fn from_fields(root: TypeKey, fields: Vec<Arc<Field>>) -> Self {
        Self { root, fields }
    }

    /// Resolve a dot-separated path against `root`.
    ///
    /// Unknown names are lookup errors; descending through a field that
    /// is not composite, or through a computed property, is a contract
    /// error.
    pub fn parse(types: &TypeRegistry, root: TypeKey, path: &str) -> Result<Self, MapError> {
        if path.is_empty() {
            return Ok(Self::root_of(root));
        }

        let mut model = types.type_model(root)?;
        let mut fields = Vec::new();
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let field = Arc::clone(model.field(segment)?);

            if segments.peek().is_some() {
                if !field.can_descend() {
                    return Err(MapError::binding_contract(format!(
                        "cannot descend through '{segment}' in '{path}': it is computed"
                    )));
                }
                let next = field.field_model(types)?.ok_or_else(|| {
                    MapError::binding_contract(format!(
                        "cannot descend through '{segment}' in '{path}': '{}' is not composite",
                        field.value_type().name()
                    ))
                })?;
                model = next;
            }

            fields.push(field);
        }

        Ok(Self { root, fields })
    }

    #[must_use]
    pub const fn root(&self) -> TypeKey {
        self.root
    }

    #[must_use]
    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Last field on the path; `None` for the root.
    #[must_use]
    pub fn terminal(&self) -> Option<&Arc<Field>> {
        self.fields.last()
    }

    /// Type the path ends on, at member level.
    #[must_use]
    pub fn end_type(&self) -> TypeKey {
        self.terminal().map_or(self.root, |field| field.member_type())
    }

    pub fn segments(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name())
    }

    /// Extend with one more field.
    #[must_use]
    pub fn child(&self, field: Arc<Field>) -> Self {
        let mut fields = self.fields.clone();
        fields.push(field);

        Self {
            root: self.root,
            fields,
        }
    }

    /// Append `suffix`, which must be rooted where this path ends.
    pub fn join(&self, suffix: &Self) -> Result<Self, MapError> {
        if suffix.root != self.end_type() {
            return Err(MapError::binding_contract(format!(
                "cannot join '{suffix}' rooted at '{}' onto '{self}' ending at '{}'",
                suffix.root.name(),
                self.end_type().name()
            )));
        }

        let mut fields = self.fields.clone();
        fields.extend(suffix.fields.iter().cloned());

        Ok(Self {
            root: self.root,
            fields,
        })
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.root == prefix.root && self.fields.starts_with(&prefix.fields)
    }

    /// Whether one path is a prefix of the other; such bindings shadow
    /// each other on the target side.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }

    /// Flattened name used by auto-bind matching.
    #[must_use]
    pub fn flatten_key(&self, style: NameStyle) -> String {
        style.flatten_key(self.segments())
    }
}

impl fmt::Display for FieldGraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str("<root>");
        }

        for (i, segment) in self.segments().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }

        Ok(())
    }
}

impl fmt::Debug for FieldGraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{self}", self.root.name())
    }
}

use rustc_hash::FxHashMap;
use std::{
    any::{Any, TypeId},
    collections::BTreeMap,
    fmt::Write,
};

///
/// PathSegment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathSegment {
    Field(&'static str),
    Index(usize),
}

impl From<&'static str> for PathSegment {
    fn from(s: &'static str) -> Self {
        Self::Field(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

///
/// BindingContext
///
/// Per-execution state handed to every transformation. Collects non-fatal
/// issues keyed by the rendered target path (`items[1].name`) and carries
/// typed extension slots for transformations that need scratch state.
/// Never shared between executions.
///

#[derive(Default)]
pub struct BindingContext {
    path: Vec<PathSegment>,
    issues: BTreeMap<String, Vec<String>>,
    extensions: FxHashMap<TypeId, Box<dyn Any + Send>>,
}

impl BindingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue at the current target path.
    pub fn add_issue(&mut self, message: impl Into<String>) {
        let key = render_path(&self.path, None);
        self.issues.entry(key).or_default().push(message.into());
    }

    /// Record an issue one segment below the current target path.
    pub fn add_issue_at(&mut self, seg: impl Into<PathSegment>, message: impl Into<String>) {
        let key = render_path(&self.path, Some(seg.into()));
        self.issues.entry(key).or_default().push(message.into());
    }

    #[must_use]
    pub const fn issues(&self) -> &BTreeMap<String, Vec<String>> {
        &self.issues
    }

    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }

    pub fn take_issues(&mut self) -> BTreeMap<String, Vec<String>> {
        std::mem::take(&mut self.issues)
    }

    /// Current target path, rendered.
    #[must_use]
    pub fn path(&self) -> String {
        render_path(&self.path, None)
    }

    pub(crate) fn push(&mut self, seg: PathSegment) {
        self.path.push(seg);
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }

    /// Store a typed extension, returning the previous value.
    pub fn insert_extension<T: Any + Send>(&mut self, value: T) -> Option<T> {
        self.extensions
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    #[must_use]
    pub fn extension<T: Any + Send>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|ext| ext.downcast_ref::<T>())
    }

    pub fn extension_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|ext| ext.downcast_mut::<T>())
    }
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("path", &self.path)
            .field("issues", &self.issues)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

fn render_path(path: &[PathSegment], extra: Option<PathSegment>) -> String {
    let mut out = String::new();

    for seg in path.iter().cloned().chain(extra) {
        match seg {
            PathSegment::Field(s) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(s);
            }
            PathSegment::Index(i) => {
                let _ = write!(out, "[{i}]");
            }
        }
    }

    out
}

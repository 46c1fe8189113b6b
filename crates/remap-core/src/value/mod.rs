mod kind;


use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

// re-exports
pub use kind::ValueKind;

///
/// Value
///
/// Tagged transport for one field value moving from a reader to a writer.
///
/// Null  → the source slot is absent (`Option::None`); never written.
/// List  → ordered elements of a scalar collection.
/// Map   → entries of a scalar dictionary, in source iteration order.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    List(Vec<Self>),
    Map(Vec<(Self, Self)>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime kind of this value; `None` for `Null`.
    #[must_use]
    pub fn kind(&self) -> Option<ValueKind> {
        let kind = match self {
            Self::Null => return None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Char(_) => ValueKind::Char,
            Self::Int(_) => ValueKind::Int,
            Self::Uint(_) => ValueKind::Uint,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List(Box::new(ValueKind::Any)),
            Self::Map(_) => ValueKind::Map,
        };

        Some(kind)
    }

    #[must_use]
    pub const fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert into `target` without losing information.
    ///
    /// Integers cross signedness only when in range and widen to `Float`;
    /// lists coerce element-wise. Returns `None` when no lossless
    /// conversion exists.
    #[must_use]
    pub fn coerce_to(self, target: &ValueKind) -> Option<Self> {
        match (self, target) {
            (Self::Null, _) => None,
            (value, ValueKind::Any) => Some(value),
            (Self::Int(v), ValueKind::Uint) => u64::try_from(v).ok().map(Self::Uint),
            (Self::Uint(v), ValueKind::Int) => i64::try_from(v).ok().map(Self::Int),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(v), ValueKind::Float) if v.unsigned_abs() <= F64_SAFE_INT => {
                Some(Self::Float(v as f64))
            }
            #[allow(clippy::cast_precision_loss)]
            (Self::Uint(v), ValueKind::Float) if v <= F64_SAFE_INT => Some(Self::Float(v as f64)),
            (Self::List(items), ValueKind::List(element)) => items
                .into_iter()
                .map(|item| item.coerce_to(element))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            (value, kind) if value.kind().as_ref() == Some(kind) => Some(value),
            _ => None,
        }
    }
}

const F64_SAFE_INT: u64 = 1u64 << 53;

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

use std::fmt::{self, Display};

///
/// ValueKind
///
/// Static kind of a scalar-capable type, known without a value in hand.
/// Auto-binding uses it to reject pairs that could never convert.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ValueKind {
    Any,
    Bool,
    Char,
    Int,
    Uint,
    Float,
    Text,
    List(Box<Self>),
    Map,
}

impl ValueKind {
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float)
    }

    /// Whether a value of this kind may be written to a `target` slot,
    /// possibly after lossless coercion. `Any` defers the check to runtime.
    #[must_use]
    pub fn is_assignable_to(&self, target: &Self) -> bool {
        match (self, target) {
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::List(from), Self::List(to)) => from.is_assignable_to(to),
            (from, to) if from.is_numeric() && to.is_numeric() => true,
            (from, to) => from == to,
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Bool => write!(f, "bool"),
            Self::Char => write!(f, "char"),
            Self::Int => write!(f, "int"),
            Self::Uint => write!(f, "uint"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::List(element) => write!(f, "list<{element}>"),
            Self::Map => write!(f, "map"),
        }
    }
}

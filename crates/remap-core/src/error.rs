use std::fmt;
use thiserror::Error as ThisError;

///
/// MapError
///
/// Structured engine error with a stable classification.
/// Lookup failures and contract violations are kept apart so callers can
/// tell a misspelled field from a structurally impossible path.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct MapError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl MapError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a lookup failure for a field name a model does not contain.
    pub fn field_not_found(type_name: &str, field: &str) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Model,
            format!("field '{field}' not found on '{type_name}'"),
        )
    }

    /// Construct a model-origin contract violation.
    pub(crate) fn model_contract(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Model,
            message.into(),
        )
    }

    /// Construct a binding-origin contract violation.
    pub(crate) fn binding_contract(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Binding,
            message.into(),
        )
    }

    /// Construct a compile-origin contract violation.
    pub(crate) fn compile_contract(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Compile,
            message.into(),
        )
    }

    /// Construct a runtime-origin contract violation (cursor misuse).
    pub(crate) fn runtime_contract(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Runtime,
            message.into(),
        )
    }

    /// Construct a runtime-origin unsupported error.
    pub(crate) fn runtime_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Runtime, message.into())
    }

    /// Construct a compile-origin unsupported error.
    pub(crate) fn compile_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Compile, message.into())
    }

    /// Construct a binding-origin conflict.
    pub(crate) fn binding_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, ErrorOrigin::Binding, message.into())
    }

    /// Construct a factory-origin failure.
    pub fn construction(type_name: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            ErrorClass::Internal,
            ErrorOrigin::Factory,
            format!("cannot construct '{type_name}': {}", message.as_ref()),
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self.class, ErrorClass::Unsupported)
    }

    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self.class, ErrorClass::InvariantViolation)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    InvariantViolation,
    Conflict,
    Unsupported,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::InvariantViolation => "invariant_violation",
            Self::Conflict => "conflict",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which engine stage raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Model,
    Binding,
    Compile,
    Runtime,
    Cache,
    Factory,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Model => "model",
            Self::Binding => "binding",
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Cache => "cache",
            Self::Factory => "factory",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_contract_errors_classify_separately() {
        let missing = MapError::field_not_found("Order", "total");
        let contract = MapError::model_contract("field 'total' is not composite");

        assert!(missing.is_not_found());
        assert!(!missing.is_contract_violation());
        assert!(contract.is_contract_violation());
        assert_eq!(
            missing.display_with_class(),
            "model:not_found: field 'total' not found on 'Order'"
        );
    }
}

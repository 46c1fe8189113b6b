use crate::{
    binding::{BindingContext, FieldGraphPath},
    error::MapError,
    runtime::DataModelReader,
    traits::Reflect,
    value::{Value, ValueKind},
};
use std::{fmt, marker::PhantomData, sync::Arc};

///
/// BindingTransformation
///
/// Turns a source value into the value written to the target field.
/// Returning `None` is a transformation failure: nothing is written and
/// the target keeps its current value.
///

pub trait BindingTransformation: Send + Sync {
    fn transform(&self, ctx: &mut BindingContext, value: Value) -> Option<Value>;

    /// Short label for diagnostics.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> BindingTransformation for F
where
    F: Fn(&mut BindingContext, Value) -> Option<Value> + Send + Sync,
{
    fn transform(&self, ctx: &mut BindingContext, value: Value) -> Option<Value> {
        self(ctx, value)
    }
}

impl fmt::Debug for dyn BindingTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingTransformation({})", self.describe())
    }
}

///
/// CopyValue
///
/// Default transformation. Null never overwrites an existing target value;
/// anything else is coerced to the target kind when one is known.
///

#[derive(Clone, Debug, Default)]
pub struct CopyValue {
    target: Option<ValueKind>,
}

impl CopyValue {
    #[must_use]
    pub const fn new(target: Option<ValueKind>) -> Self {
        Self { target }
    }
}

impl BindingTransformation for CopyValue {
    fn transform(&self, ctx: &mut BindingContext, value: Value) -> Option<Value> {
        if value.is_null() {
            return None;
        }

        let Some(kind) = &self.target else {
            return Some(value);
        };

        // lone scalars are allowed into list slots; the accessor wraps them
        let probe = match (kind, &value) {
            (ValueKind::List(element), v) if !matches!(v, Value::List(_)) => element.as_ref(),
            _ => kind,
        };

        let label = value.kind().map(|k| k.to_string()).unwrap_or_default();
        let coerced = value.coerce_to(probe);
        if coerced.is_none() {
            ctx.add_issue(format!("cannot convert {label} to {kind}"));
        }

        coerced
    }

    fn describe(&self) -> String {
        match &self.target {
            Some(kind) => format!("copy as {kind}"),
            None => "copy".to_string(),
        }
    }
}

///
/// Converter
///
/// Typed conversion between a source type `S` and a target type `T`.
/// Inputs that do not decode as `S` are reported and skipped.
///

pub struct Converter<S, T, F> {
    convert: F,
    _marker: PhantomData<fn(S) -> T>,
}

impl<S, T, F> Converter<S, T, F>
where
    S: Reflect,
    T: Reflect,
    F: Fn(S) -> T + Send + Sync,
{
    pub const fn new(convert: F) -> Self {
        Self {
            convert,
            _marker: PhantomData,
        }
    }
}

impl<S, T, F> BindingTransformation for Converter<S, T, F>
where
    S: Reflect,
    T: Reflect,
    F: Fn(S) -> T + Send + Sync,
{
    fn transform(&self, ctx: &mut BindingContext, value: Value) -> Option<Value> {
        if value.is_null() {
            return None;
        }

        let label = value.to_string();
        let Some(input) = S::from_value(value) else {
            ctx.add_issue(format!(
                "cannot read '{label}' as {}",
                std::any::type_name::<S>()
            ));
            return None;
        };

        (self.convert)(input).to_value()
    }

    fn describe(&self) -> String {
        format!(
            "convert {} -> {}",
            std::any::type_name::<S>(),
            std::any::type_name::<T>()
        )
    }
}

/// Wrap a typed conversion closure as a transformation.
pub fn converter<S, T, F>(convert: F) -> Arc<dyn BindingTransformation>
where
    S: Reflect,
    T: Reflect,
    F: Fn(S) -> T + Send + Sync + 'static,
{
    Arc::new(Converter::<S, T, F>::new(convert))
}

///
/// ReadFieldTransform
///
/// Reads the value at the end of a field path through a reader, entering
/// and leaving each intermediate member. Any null along the way yields
/// `None` without error, and the reader is always returned to where it
/// started.
///

#[derive(Clone, Debug)]
pub struct ReadFieldTransform {
    path: FieldGraphPath,
}

impl ReadFieldTransform {
    #[must_use]
    pub const fn new(path: FieldGraphPath) -> Self {
        Self { path }
    }

    #[must_use]
    pub const fn path(&self) -> &FieldGraphPath {
        &self.path
    }

    pub fn read<R>(&self, reader: &mut R) -> Result<Option<Value>, MapError>
    where
        R: DataModelReader + ?Sized,
    {
        let Some((terminal, members)) = self.path.fields().split_last() else {
            return Err(MapError::binding_contract(
                "cannot read the root as a field value",
            ));
        };

        let mut entered = 0;
        let mut result = Ok(None);
        for member in members {
            match reader.enter_member(member) {
                Ok(true) => entered += 1,
                Ok(false) => break,
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        if entered == members.len() && result.is_ok() {
            result = reader.read_field(terminal);
        }

        for _ in 0..entered {
            reader.leave_member()?;
        }

        result
    }
}

/// Null-safe reader for a field path.
#[must_use]
pub const fn read_field_transform(path: FieldGraphPath) -> ReadFieldTransform {
    ReadFieldTransform::new(path)
}

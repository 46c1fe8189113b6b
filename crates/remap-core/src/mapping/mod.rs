//! Compiled mappings: a binding plan lowered once into a linear op program
//! and executed against any reader/writer pair.

mod compile;
mod explain;

#[cfg(test)]
mod tests;

use crate::{
    binding::{
        BindingContext, BindingTransformation, DataModelBinding, PathSegment, ReadFieldTransform,
    },
    error::MapError,
    model::{Field, TypeKey, TypeRegistry},
    runtime::{DataModelReader, DataModelWriter},
    value::Value,
};
use std::sync::Arc;

///
/// Op
///
/// One step of a compiled mapping. Enter/leave ops are always balanced;
/// `skip_to` on `EnterSource` points just past the matching `LeaveSource`,
/// so a null source member skips its whole scope. A deep source read that
/// shares no members with other bindings is lowered to one `ReadPath`.
///

#[derive(Clone, Debug)]
pub enum Op {
    EnterSource {
        field: Arc<Field>,
        skip_to: usize,
    },
    LeaveSource,
    EnterTarget {
        field: Arc<Field>,
    },
    LeaveTarget,
    Copy {
        source: Arc<Field>,
        target: Arc<Field>,
        transform: Arc<dyn BindingTransformation>,
    },
    /// Null-safe read down `path`, then copy into `target`.
    ReadPath {
        path: ReadFieldTransform,
        target: Arc<Field>,
        transform: Arc<dyn BindingTransformation>,
    },
    /// Enumerate the collection at `source` into `target`, running
    /// `element` per element. `None` addresses the current node.
    Enumerate {
        source: Option<Arc<Field>>,
        target: Option<Arc<Field>>,
        element: Arc<Mapping>,
    },
}

///
/// ElementMappings
///
/// Where compilation gets the mapping for each element binding it meets.
///

pub trait ElementMappings {
    fn element_mapping(
        &self,
        binding: &Arc<DataModelBinding>,
        types: &TypeRegistry,
    ) -> Result<Arc<Mapping>, MapError>;
}

///
/// CompileEach
/// Compiles every element binding on the spot.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct CompileEach;

impl ElementMappings for CompileEach {
    fn element_mapping(
        &self,
        binding: &Arc<DataModelBinding>,
        types: &TypeRegistry,
    ) -> Result<Arc<Mapping>, MapError> {
        Mapping::compile_with(Arc::clone(binding), types, self).map(Arc::new)
    }
}

///
/// Mapping
///
/// Immutable and shareable; every execution gets its own context.
///

#[derive(Debug)]
pub struct Mapping {
    binding: Arc<DataModelBinding>,
    ops: Vec<Op>,
}

impl Mapping {
    pub fn compile(binding: Arc<DataModelBinding>, types: &TypeRegistry) -> Result<Self, MapError> {
        Self::compile_with(binding, types, &CompileEach)
    }

    /// Compile, taking element mappings from `elements`.
    pub fn compile_with(
        binding: Arc<DataModelBinding>,
        types: &TypeRegistry,
        elements: &dyn ElementMappings,
    ) -> Result<Self, MapError> {
        let ops = compile::compile_ops(&binding, types, elements)?;

        tracing::debug!(
            source = binding.source().name(),
            target = binding.target().name(),
            ops = ops.len(),
            "mapping compiled"
        );

        Ok(Self { binding, ops })
    }

    #[must_use]
    pub fn source(&self) -> TypeKey {
        self.binding.source()
    }

    #[must_use]
    pub fn target(&self) -> TypeKey {
        self.binding.target()
    }

    #[must_use]
    pub const fn binding(&self) -> &Arc<DataModelBinding> {
        &self.binding
    }

    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Run once with a fresh context, returning it with any issues.
    pub fn execute<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<BindingContext, MapError>
    where
        R: DataModelReader + ?Sized,
        W: DataModelWriter + ?Sized,
    {
        let mut ctx = BindingContext::new();
        self.execute_with(reader, writer, &mut ctx)?;

        Ok(ctx)
    }

    /// Run with a caller-owned context. The context must not be shared
    /// with a concurrent execution.
    pub fn execute_with<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        ctx: &mut BindingContext,
    ) -> Result<(), MapError>
    where
        R: DataModelReader + ?Sized,
        W: DataModelWriter + ?Sized,
    {
        let mut pc = 0;

        while let Some(op) = self.ops.get(pc) {
            pc += 1;

            match op {
                Op::EnterSource { field, skip_to } => {
                    if !reader.enter_member(field)? {
                        pc = *skip_to;
                    }
                }
                Op::LeaveSource => reader.leave_member()?,
                Op::EnterTarget { field } => {
                    writer.enter_member(field)?;
                    ctx.push(PathSegment::Field(field.name()));
                }
                Op::LeaveTarget => {
                    ctx.pop();
                    writer.leave_member()?;
                }
                Op::Copy {
                    source,
                    target,
                    transform,
                } => {
                    // nulls never overwrite
                    let Some(value) = reader.read_field(source)? else {
                        continue;
                    };

                    ctx.push(PathSegment::Field(target.name()));
                    let result = copy(writer, ctx, target, transform.as_ref(), value);
                    ctx.pop();
                    result?;
                }
                Op::ReadPath {
                    path,
                    target,
                    transform,
                } => {
                    let Some(value) = path.read(reader)? else {
                        continue;
                    };

                    ctx.push(PathSegment::Field(target.name()));
                    let result = copy(writer, ctx, target, transform.as_ref(), value);
                    ctx.pop();
                    result?;
                }
                Op::Enumerate {
                    source,
                    target,
                    element,
                } => enumerate(
                    reader,
                    writer,
                    ctx,
                    source.as_ref(),
                    target.as_ref(),
                    element,
                )?,
            }
        }

        Ok(())
    }
}

fn copy<W>(
    writer: &mut W,
    ctx: &mut BindingContext,
    target: &Arc<Field>,
    transform: &dyn BindingTransformation,
    value: Value,
) -> Result<(), MapError>
where
    W: DataModelWriter + ?Sized,
{
    let Some(value) = transform.transform(ctx, value) else {
        return Ok(());
    };

    let label = value.to_string();
    if !writer.write_field(target, value)? {
        ctx.add_issue(format!(
            "'{label}' does not fit '{}'",
            target.value_type().name()
        ));
    }

    Ok(())
}

fn enumerate<R, W>(
    reader: &mut R,
    writer: &mut W,
    ctx: &mut BindingContext,
    source: Option<&Arc<Field>>,
    target: Option<&Arc<Field>>,
    element: &Mapping,
) -> Result<(), MapError>
where
    R: DataModelReader + ?Sized,
    W: DataModelWriter + ?Sized,
{
    if let Some(field) = source
        && !reader.enter_member(field)?
    {
        return Ok(());
    }
    if let Some(field) = target {
        writer.enter_member(field)?;
        ctx.push(PathSegment::Field(field.name()));
    }

    reader.enter_enumerable()?;
    writer.enter_enumerable()?;

    let mut index = 0;
    while reader.move_next()? {
        writer.move_next()?;

        ctx.push(PathSegment::Index(index));
        let result = element.execute_with(reader, writer, ctx);
        ctx.pop();
        result?;

        index += 1;
    }

    writer.leave_enumerable()?;
    reader.leave_enumerable()?;

    if target.is_some() {
        ctx.pop();
        writer.leave_member()?;
    }
    if source.is_some() {
        reader.leave_member()?;
    }

    Ok(())
}

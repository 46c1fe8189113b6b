use crate::{
    binding::{BindingKind, DataModelBinding, FieldGraphPath, read_field_transform},
    error::MapError,
    mapping::{ElementMappings, Op},
    model::{Field, TypeRegistry},
};
use std::sync::Arc;

// Binding whose paths have been consumed down to the current scope.
struct Pending<'b> {
    source: &'b [Arc<Field>],
    target: &'b [Arc<Field>],
    kind: &'b BindingKind,
}

// Bindings sharing the same entered members at this scope. Leaves (both
// heads `None`) always get a group of their own.
struct Group<'b> {
    source: Option<&'b Arc<Field>>,
    target: Option<&'b Arc<Field>>,
    items: Vec<Pending<'b>>,
}

pub(super) fn compile_ops(
    binding: &DataModelBinding,
    types: &TypeRegistry,
    elements: &dyn ElementMappings,
) -> Result<Vec<Op>, MapError> {
    let source = types.data_type(binding.source())?;
    let target = types.data_type(binding.target())?;

    if source.is_pure_enumerable() && target.is_pure_enumerable() {
        return compile_root_elements(binding, types, elements);
    }
    if !(source.is_composite() && target.is_composite()) {
        return Err(MapError::compile_unsupported(format!(
            "cannot compile a mapping from '{}' to '{}'",
            source.name(),
            target.name()
        )));
    }

    let items = binding
        .bindings()
        .iter()
        .map(|binding| Pending {
            source: binding.source().fields(),
            target: binding.target().fields(),
            kind: binding.kind(),
        })
        .collect();

    let mut ops = Vec::new();
    emit(&mut ops, items, types, elements)?;

    Ok(ops)
}

fn compile_root_elements(
    binding: &DataModelBinding,
    types: &TypeRegistry,
    elements: &dyn ElementMappings,
) -> Result<Vec<Op>, MapError> {
    let element = binding
        .bindings()
        .iter()
        .find_map(|binding| match binding.kind() {
            BindingKind::Elements(element)
                if binding.source().is_empty() && binding.target().is_empty() =>
            {
                Some(element)
            }
            _ => None,
        })
        .ok_or_else(|| {
            MapError::compile_unsupported(format!(
                "enumerable root '{}' has no element binding",
                binding.source().name()
            ))
        })?;

    Ok(vec![Op::Enumerate {
        source: None,
        target: None,
        element: elements.element_mapping(element, types)?,
    }])
}

fn emit(
    ops: &mut Vec<Op>,
    items: Vec<Pending<'_>>,
    types: &TypeRegistry,
    elements: &dyn ElementMappings,
) -> Result<(), MapError> {
    for group in group_by_heads(items) {
        if let (Some(head), None) = (group.source, group.target)
            && let Some(op) = lone_read(head, &group.items)
        {
            ops.push(op);
            continue;
        }

        match (group.source, group.target) {
            (None, None) => {
                for item in group.items {
                    emit_leaf(ops, &item, types, elements)?;
                }
            }
            (source, target) => {
                let enter = ops.len();
                if let Some(field) = source {
                    ops.push(Op::EnterSource {
                        field: Arc::clone(field),
                        skip_to: 0,
                    });
                }
                if let Some(field) = target {
                    ops.push(Op::EnterTarget {
                        field: Arc::clone(field),
                    });
                }

                emit(ops, group.items, types, elements)?;

                if target.is_some() {
                    ops.push(Op::LeaveTarget);
                }
                if source.is_some() {
                    ops.push(Op::LeaveSource);
                    let end = ops.len();
                    if let Some(Op::EnterSource { skip_to, .. }) = ops.get_mut(enter) {
                        *skip_to = end;
                    }
                }
            }
        }
    }

    Ok(())
}

// A value binding that alone reads below `head` is read as one path.
fn lone_read(head: &Arc<Field>, items: &[Pending<'_>]) -> Option<Op> {
    let [item] = items else {
        return None;
    };
    let ([target], BindingKind::Value(transform)) = (item.target, item.kind) else {
        return None;
    };

    let fields = std::iter::once(head).chain(item.source).cloned().collect();
    let path = FieldGraphPath::from_fields(head.declaring_type(), fields);

    Some(Op::ReadPath {
        path: read_field_transform(path),
        target: Arc::clone(target),
        transform: Arc::clone(transform),
    })
}

// Group by the members each side still has to enter, in order of first
// appearance.
fn group_by_heads(items: Vec<Pending<'_>>) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();

    for item in items {
        let (source, source_rest) = split_head(item.source);
        let (target, target_rest) = split_head(item.target);
        let rest = Pending {
            source: source_rest,
            target: target_rest,
            kind: item.kind,
        };

        let leaf = source.is_none() && target.is_none();
        if !leaf
            && let Some(group) = groups
                .iter_mut()
                .find(|group| group.source == source && group.target == target)
        {
            group.items.push(rest);
        } else {
            groups.push(Group {
                source,
                target,
                items: vec![rest],
            });
        }
    }

    groups
}

// Head member to enter, if the path continues below it.
fn split_head(fields: &[Arc<Field>]) -> (Option<&Arc<Field>>, &[Arc<Field>]) {
    match fields {
        [head, rest @ ..] if !rest.is_empty() => (Some(head), rest),
        _ => (None, fields),
    }
}

fn emit_leaf(
    ops: &mut Vec<Op>,
    item: &Pending<'_>,
    types: &TypeRegistry,
    elements: &dyn ElementMappings,
) -> Result<(), MapError> {
    let ([source], [target]) = (item.source, item.target) else {
        return Err(MapError::compile_contract(
            "root bindings are only valid between enumerables",
        ));
    };

    let op = match item.kind {
        BindingKind::Value(transform) => Op::Copy {
            source: Arc::clone(source),
            target: Arc::clone(target),
            transform: Arc::clone(transform),
        },
        BindingKind::Elements(element) => Op::Enumerate {
            source: Some(Arc::clone(source)),
            target: Some(Arc::clone(target)),
            element: elements.element_mapping(element, types)?,
        },
    };
    ops.push(op);

    Ok(())
}

//! Flattened-name matching between two composite types.
//!
//! Both sides are enumerated depth-first in declaration order. A target
//! path matches a source path when their flattened keys are equal and the
//! two ends can be copied. Among several candidates the shortest source
//! path wins, then the earliest declared.

use crate::{
    binding::FieldGraphPath,
    config::MapperConfig,
    error::MapError,
    model::{DataType, TypeKey, TypeRegistry, element_member},
};
use rustc_hash::FxHashMap;
use std::{any::TypeId, sync::Arc};

///
/// PairKind
/// How a matched source/target pair is carried over.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PairKind {
    /// Copied as one transport value.
    Value,
    /// Enumerables of composites; elements are mapped one by one.
    Elements {
        source_element: TypeKey,
        target_element: TypeKey,
    },
    /// Both composite; only bound through a nested binding.
    Composite,
}

///
/// PathMatch
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathMatch {
    pub source: FieldGraphPath,
    pub target: FieldGraphPath,
    pub kind: PairKind,
}

///
/// PathCandidate
///

#[derive(Clone, Debug)]
pub(crate) struct PathCandidate {
    pub(crate) path: FieldGraphPath,
    pub(crate) key: String,
    pub(crate) data_type: Arc<DataType>,
    pub(crate) order: usize,
}

#[derive(Clone, Copy)]
enum Side {
    Source,
    Target,
}

/// Classify how `source` could be carried into `target`, if at all.
pub fn classify_pair(
    types: &TypeRegistry,
    source: &DataType,
    target: &DataType,
) -> Result<Option<PairKind>, MapError> {
    if source.is_composite() && target.is_composite() {
        return Ok(Some(PairKind::Composite));
    }

    if source.is_pure_enumerable()
        && target.is_pure_enumerable()
        && let (Some(se), Some(te)) = (
            element_member(source, types)?,
            element_member(target, types)?,
        )
        && se.is_composite()
        && te.is_composite()
    {
        return Ok(Some(PairKind::Elements {
            source_element: se.key(),
            target_element: te.key(),
        }));
    }

    match (source.value_kind(), target.value_kind()) {
        (Some(s), Some(t)) if s.is_assignable_to(t) => Ok(Some(PairKind::Value)),
        _ => Ok(None),
    }
}

/// Whether carrying a value of this type means entering it with a cursor.
pub(crate) fn needs_descent(types: &TypeRegistry, data_type: &DataType) -> Result<bool, MapError> {
    if data_type.is_composite() {
        return Ok(true);
    }
    if !data_type.is_pure_enumerable() {
        return Ok(false);
    }

    Ok(element_member(data_type, types)?.is_some_and(|element| element.is_composite()))
}

///
/// Matcher
///

pub(crate) struct Matcher {
    sources: FxHashMap<String, Vec<PathCandidate>>,
    targets: Vec<PathCandidate>,
}

impl Matcher {
    pub(crate) fn new(
        types: &TypeRegistry,
        source: TypeKey,
        target: TypeKey,
        config: &MapperConfig,
    ) -> Result<Self, MapError> {
        let mut sources: FxHashMap<String, Vec<PathCandidate>> = FxHashMap::default();
        for candidate in enumerate_paths(types, source, config, Side::Source)? {
            sources
                .entry(candidate.key.clone())
                .or_default()
                .push(candidate);
        }
        for group in sources.values_mut() {
            group.sort_by_key(|c| (c.path.len(), c.order));
        }

        let targets = enumerate_paths(types, target, config, Side::Target)?;

        Ok(Self { sources, targets })
    }

    pub(crate) fn targets(&self) -> &[PathCandidate] {
        &self.targets
    }

    /// Source candidates sharing the target's key, best first.
    pub(crate) fn sources_for(&self, target: &PathCandidate) -> &[PathCandidate] {
        self.sources
            .get(&target.key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Pairs of terminal paths auto-binding would consider, in target order.
pub fn match_paths(
    types: &TypeRegistry,
    source: TypeKey,
    target: TypeKey,
    config: &MapperConfig,
) -> Result<Vec<PathMatch>, MapError> {
    let matcher = Matcher::new(types, source, target, config)?;
    let mut out = Vec::new();

    for target in matcher.targets() {
        for source in matcher.sources_for(target) {
            match classify_pair(types, &source.data_type, &target.data_type)? {
                Some(PairKind::Composite) | None => {}
                Some(kind) => {
                    out.push(PathMatch {
                        source: source.path.clone(),
                        target: target.path.clone(),
                        kind,
                    });
                    break;
                }
            }
        }
    }

    Ok(out)
}

fn enumerate_paths(
    types: &TypeRegistry,
    root: TypeKey,
    config: &MapperConfig,
    side: Side,
) -> Result<Vec<PathCandidate>, MapError> {
    let mut out = Vec::new();
    let mut visiting = vec![root.id()];

    walk(
        types,
        config,
        side,
        &FieldGraphPath::root_of(root),
        &mut visiting,
        &mut out,
    )?;

    Ok(out)
}

fn walk(
    types: &TypeRegistry,
    config: &MapperConfig,
    side: Side,
    path: &FieldGraphPath,
    visiting: &mut Vec<TypeId>,
    out: &mut Vec<PathCandidate>,
) -> Result<(), MapError> {
    let model = types.type_model(path.end_type())?;

    for field in model.fields() {
        let accessible = match side {
            Side::Source => field.can_read(),
            Side::Target => field.can_write(),
        };
        if !accessible {
            continue;
        }

        let data_type = field.data_type(types)?;

        // computed sources are only usable as whole values
        if matches!(side, Side::Source)
            && !field.can_descend()
            && needs_descent(types, &data_type)?
        {
            continue;
        }

        let child = path.child(Arc::clone(field));
        out.push(PathCandidate {
            key: child.flatten_key(config.name_style),
            path: child.clone(),
            data_type: Arc::clone(&data_type),
            order: out.len(),
        });

        if !data_type.is_composite() || !config.allows_descent(child.len()) {
            continue;
        }

        // unbounded walks stop at the first repeated type
        let member = field.member_type().id();
        if config.max_depth.is_none() && visiting.contains(&member) {
            continue;
        }

        visiting.push(member);
        walk(types, config, side, &child, visiting, out)?;
        visiting.pop();
    }

    Ok(())
}

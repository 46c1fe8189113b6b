use crate::{
    binding::{
        BindingKind, BindingTransformation, CopyValue, DataModelBinding, FieldBinding,
        FieldGraphPath, Matcher, PairKind, classify_pair, converter, needs_descent,
    },
    cache::MemoCache,
    config::MapperConfig,
    error::MapError,
    model::{DataType, TypeKey, TypeRegistry, element_member},
    traits::Reflect,
};
use std::{fmt, sync::Arc};

///
/// TypeBindingBuilder
///
/// Collects field bindings for one source/target pair. Explicit bindings
/// are applied in call order and evict any earlier binding whose target
/// path overlaps theirs; `auto_bind` only fills target paths nothing else
/// covers yet.
///
/// Both types must be composite, or both enumerables of composites. Keys
/// are held at member level, so `Option<A>` binds like `A`.
///
/// With a shared cache attached, element bindings derived along the way
/// are looked up there first and offered back once built.
///

pub struct TypeBindingBuilder<'a> {
    types: &'a TypeRegistry,
    config: MapperConfig,
    source: Arc<DataType>,
    target: Arc<DataType>,
    bindings: Vec<FieldBinding>,
    spliced: Vec<FieldGraphPath>,
    ancestors: Vec<(TypeKey, TypeKey)>,
    shared: Option<&'a MemoCache<(TypeKey, TypeKey), Arc<DataModelBinding>>>,
    partial: bool,
}

impl<'a> TypeBindingBuilder<'a> {
    pub fn new(types: &'a TypeRegistry, source: TypeKey, target: TypeKey) -> Result<Self, MapError> {
        let source = member_data_type(types, source)?;
        let target = member_data_type(types, target)?;

        let composite = source.is_composite() && target.is_composite();
        if !composite && element_pair(types, &source, &target)?.is_none() {
            return Err(MapError::binding_contract(format!(
                "cannot bind '{}' to '{}': both must be composite, or enumerables of composites",
                source.name(),
                target.name()
            )));
        }

        Ok(Self {
            types,
            config: MapperConfig::default(),
            source,
            target,
            bindings: Vec::new(),
            spliced: Vec::new(),
            ancestors: Vec::new(),
            shared: None,
            partial: false,
        })
    }

    pub fn for_types<S: Reflect, T: Reflect>(types: &'a TypeRegistry) -> Result<Self, MapError> {
        Self::new(types, TypeKey::of::<S>(), TypeKey::of::<T>())
    }

    #[must_use]
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    // Type pairs being bound further up; their element pairs are skipped.
    #[must_use]
    pub(crate) fn with_ancestors(mut self, ancestors: Vec<(TypeKey, TypeKey)>) -> Self {
        self.ancestors = ancestors;
        self
    }

    #[must_use]
    pub(crate) fn with_shared(
        mut self,
        shared: &'a MemoCache<(TypeKey, TypeKey), Arc<DataModelBinding>>,
    ) -> Self {
        self.shared = Some(shared);
        self
    }

    #[must_use]
    pub fn source(&self) -> TypeKey {
        self.source.key()
    }

    #[must_use]
    pub fn target(&self) -> TypeKey {
        self.target.key()
    }

    #[must_use]
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    // ======================================================================
    // Explicit bindings
    // ======================================================================

    /// Bind `target` to `source`, both dot-separated paths.
    ///
    /// Value pairs copy with coercion to the target kind, enumerables of
    /// composites get an element binding, and composite pairs are bound
    /// through a nested auto binding spliced in under both paths.
    pub fn bind(&mut self, target: &str, source: &str) -> Result<&mut Self, MapError> {
        let (source, target) = self.resolve(source, target)?;
        let source_type = end_data_type(self.types, &source)?;
        let target_type = end_data_type(self.types, &target)?;
        check_descent(self.types, &source, &source_type)?;

        match classify_pair(self.types, &source_type, &target_type)? {
            Some(PairKind::Value) => {
                let copy = CopyValue::new(target_type.value_kind().cloned());
                self.bind_paths(source, target, BindingKind::Value(Arc::new(copy)));
            }
            Some(PairKind::Elements {
                source_element,
                target_element,
            }) => {
                let element = self.nested(source_element, target_element, &[])?;
                self.bind_paths(source, target, BindingKind::Elements(element));
            }
            Some(PairKind::Composite) => {
                let nested = self.nested(source.end_type(), target.end_type(), &[])?;
                self.splice(&source, &target, &nested)?;
            }
            None => {
                return Err(MapError::binding_contract(format!(
                    "cannot bind '{target}' ({}) to '{source}' ({}): values are not assignable",
                    target_type.name(),
                    source_type.name()
                )));
            }
        }

        Ok(self)
    }

    /// Bind `target` to `source` through a custom transformation.
    pub fn bind_with(
        &mut self,
        target: &str,
        source: &str,
        transform: Arc<dyn BindingTransformation>,
    ) -> Result<&mut Self, MapError> {
        let (source, target) = self.resolve(source, target)?;

        for path in [&source, &target] {
            let data_type = end_data_type(self.types, path)?;
            if !data_type.is_terminal() {
                return Err(MapError::binding_contract(format!(
                    "cannot transform '{path}': '{}' has no value form",
                    data_type.name()
                )));
            }
        }

        self.bind_paths(source, target, BindingKind::Value(transform));

        Ok(self)
    }

    /// Bind `target` to `source` through a typed conversion.
    pub fn bind_converted<S, T, F>(
        &mut self,
        target: &str,
        source: &str,
        convert: F,
    ) -> Result<&mut Self, MapError>
    where
        S: Reflect,
        T: Reflect,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        self.bind_with(target, source, converter::<S, T, F>(convert))
    }

    /// Bind `target` to `source` with a prebuilt binding.
    ///
    /// Composite ends splice the nested bindings in under both paths;
    /// enumerable ends use it as the element binding. Empty paths address
    /// the roots.
    pub fn bind_nested(
        &mut self,
        target: &str,
        source: &str,
        nested: &Arc<DataModelBinding>,
    ) -> Result<&mut Self, MapError> {
        let source = FieldGraphPath::parse(self.types, self.source.key(), source)?;
        let target = FieldGraphPath::parse(self.types, self.target.key(), target)?;
        check_access(&source, &target)?;

        let source_type = end_data_type(self.types, &source)?;
        let target_type = end_data_type(self.types, &target)?;
        check_descent(self.types, &source, &source_type)?;

        if source_type.is_composite() && target_type.is_composite() {
            expect_pair(nested, source_type.member_type(), target_type.member_type())?;
            self.splice(&source, &target, nested)?;
        } else if let Some((se, te)) = element_pair(self.types, &source_type, &target_type)? {
            expect_pair(nested, se.key(), te.key())?;
            self.bind_paths(source, target, BindingKind::Elements(Arc::clone(nested)));
        } else {
            return Err(MapError::binding_contract(format!(
                "cannot bind '{target}' to '{source}' with a nested binding: '{}' and '{}' are not composites or enumerables of composites",
                target_type.name(),
                source_type.name()
            )));
        }

        Ok(self)
    }

    // ======================================================================
    // Automatic bindings
    // ======================================================================

    /// Fill every uncovered target path by flattened-name matching.
    ///
    /// Bindings in `reuse` are spliced in for composite pairs and used as
    /// element bindings for enumerable pairs instead of deriving new ones.
    pub fn auto_bind(&mut self, reuse: &[Arc<DataModelBinding>]) -> Result<&mut Self, MapError> {
        if let Some((se, te)) = element_pair(self.types, &self.source, &self.target)? {
            if self.bindings.is_empty()
                && let Some(element) = self.element_binding(se.key(), te.key(), reuse)?
            {
                let source = FieldGraphPath::root_of(self.source.key());
                let target = FieldGraphPath::root_of(self.target.key());
                self.bind_paths(source, target, BindingKind::Elements(element));
            }

            return Ok(self);
        }

        let matcher = Matcher::new(
            self.types,
            self.source.key(),
            self.target.key(),
            &self.config,
        )?;

        for target in matcher.targets() {
            if self.is_covered(&target.path) {
                continue;
            }
            let sources = matcher.sources_for(target);

            // composite targets are descended by the matcher; only a
            // reused binding is spliced in at this level
            if target.data_type.is_composite() {
                let reused = sources
                    .iter()
                    .filter(|source| source.data_type.is_composite())
                    .find_map(|source| {
                        find_binding(reuse, source.path.end_type(), target.path.end_type())
                            .map(|nested| (source, Arc::clone(nested)))
                    });

                if let Some((source, nested)) = reused {
                    self.splice(&source.path, &target.path, &nested)?;
                }
                continue;
            }

            for source in sources {
                match classify_pair(self.types, &source.data_type, &target.data_type)? {
                    Some(PairKind::Value) => {
                        let copy = CopyValue::new(target.data_type.value_kind().cloned());
                        self.bind_paths(
                            source.path.clone(),
                            target.path.clone(),
                            BindingKind::Value(Arc::new(copy)),
                        );
                        break;
                    }
                    Some(PairKind::Elements {
                        source_element,
                        target_element,
                    }) => {
                        if let Some(element) =
                            self.element_binding(source_element, target_element, reuse)?
                        {
                            self.bind_paths(
                                source.path.clone(),
                                target.path.clone(),
                                BindingKind::Elements(element),
                            );
                        }
                        break;
                    }
                    Some(PairKind::Composite) | None => {
                        tracing::trace!(
                            source = %source.path,
                            path = %target.path,
                            "candidate skipped"
                        );
                    }
                }
            }
        }

        Ok(self)
    }

    /// Finish into an immutable binding.
    #[must_use]
    pub fn build_binding(&self) -> Arc<DataModelBinding> {
        tracing::debug!(
            source = self.source.name(),
            target = self.target.name(),
            bindings = self.bindings.len(),
            "binding built"
        );

        Arc::new(DataModelBinding::new(
            self.source.key(),
            self.target.key(),
            self.bindings.clone(),
        ))
    }

    // ======================================================================
    // Internals
    // ======================================================================

    fn resolve(
        &self,
        source: &str,
        target: &str,
    ) -> Result<(FieldGraphPath, FieldGraphPath), MapError> {
        let source = FieldGraphPath::parse(self.types, self.source.key(), source)?;
        let target = FieldGraphPath::parse(self.types, self.target.key(), target)?;

        if source.is_empty() || target.is_empty() {
            return Err(MapError::binding_contract(format!(
                "cannot bind '{target}' to '{source}': explicit bindings need field paths"
            )));
        }
        check_access(&source, &target)?;

        Ok((source, target))
    }

    // Push one binding, evicting every earlier one it shadows.
    fn bind_paths(&mut self, source: FieldGraphPath, target: FieldGraphPath, kind: BindingKind) {
        let before = self.bindings.len();
        self.bindings.retain(|binding| !binding.target().overlaps(&target));
        self.spliced.retain(|prefix| !prefix.starts_with(&target));

        let evicted = before - self.bindings.len();
        if evicted > 0 {
            tracing::trace!(path = %target, evicted, "earlier bindings replaced");
        }

        self.bindings.push(FieldBinding::new(source, target, kind));
    }

    // Re-root a nested binding under `source`/`target`. The spliced
    // target prefix is owned by the nested binding from then on.
    fn splice(
        &mut self,
        source: &FieldGraphPath,
        target: &FieldGraphPath,
        nested: &DataModelBinding,
    ) -> Result<(), MapError> {
        let joined = nested
            .bindings()
            .iter()
            .map(|binding| {
                Ok(FieldBinding::new(
                    source.join(binding.source())?,
                    target.join(binding.target())?,
                    binding.kind().clone(),
                ))
            })
            .collect::<Result<Vec<_>, MapError>>()?;

        self.bindings.retain(|binding| !binding.target().overlaps(target));
        self.spliced.retain(|prefix| !prefix.starts_with(target));
        self.bindings.extend(joined);
        self.spliced.push(target.clone());

        Ok(())
    }

    fn is_covered(&self, path: &FieldGraphPath) -> bool {
        self.bindings
            .iter()
            .any(|binding| binding.target().overlaps(path))
            || self.spliced.iter().any(|prefix| path.starts_with(prefix))
    }

    fn element_binding(
        &mut self,
        source: TypeKey,
        target: TypeKey,
        reuse: &[Arc<DataModelBinding>],
    ) -> Result<Option<Arc<DataModelBinding>>, MapError> {
        if let Some(found) = find_binding(reuse, source, target) {
            return Ok(Some(Arc::clone(found)));
        }

        let pair = (source, target);
        let own = pair == (self.source.key(), self.target.key());
        if own || self.ancestors.contains(&pair) {
            // skipping an outer pair makes this binding specific to the build
            self.partial |= !own;
            tracing::trace!(
                source = source.name(),
                target = target.name(),
                "recursive element pair skipped"
            );
            return Ok(None);
        }

        self.nested(source, target, reuse).map(Some)
    }

    fn nested(
        &mut self,
        source: TypeKey,
        target: TypeKey,
        reuse: &[Arc<DataModelBinding>],
    ) -> Result<Arc<DataModelBinding>, MapError> {
        let pair = (source, target);
        if let Some(shared) = self.shared
            && let Some(found) = shared.get(&pair)
        {
            return Ok(found);
        }

        let mut ancestors = self.ancestors.clone();
        ancestors.push((self.source.key(), self.target.key()));

        let mut builder = Self::new(self.types, source, target)?
            .with_config(self.config.clone())
            .with_ancestors(ancestors);
        builder.shared = self.shared;
        builder.auto_bind(reuse)?;
        let binding = builder.build_binding();

        if builder.partial {
            self.partial = true;
        } else if let Some(shared) = self.shared {
            shared.offer(pair, Arc::clone(&binding));
        }

        Ok(binding)
    }
}

impl fmt::Debug for TypeBindingBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeBindingBuilder")
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

fn member_data_type(types: &TypeRegistry, key: TypeKey) -> Result<Arc<DataType>, MapError> {
    let data_type = types.data_type(key)?;
    let member = data_type.member_type();

    if member == key {
        Ok(data_type)
    } else {
        types.data_type(member)
    }
}

// Classification of the value a path ends on.
fn end_data_type(types: &TypeRegistry, path: &FieldGraphPath) -> Result<Arc<DataType>, MapError> {
    match path.terminal() {
        Some(field) => field.data_type(types),
        None => types.data_type(path.root()),
    }
}

// Element types of two enumerables of composites.
fn element_pair(
    types: &TypeRegistry,
    source: &DataType,
    target: &DataType,
) -> Result<Option<(Arc<DataType>, Arc<DataType>)>, MapError> {
    if !(source.is_pure_enumerable() && target.is_pure_enumerable()) {
        return Ok(None);
    }

    match (
        element_member(source, types)?,
        element_member(target, types)?,
    ) {
        (Some(se), Some(te)) if se.is_composite() && te.is_composite() => Ok(Some((se, te))),
        _ => Ok(None),
    }
}

fn check_access(source: &FieldGraphPath, target: &FieldGraphPath) -> Result<(), MapError> {
    if let Some(field) = source.fields().iter().find(|field| !field.can_read()) {
        return Err(MapError::binding_contract(format!(
            "cannot bind from '{source}': field {field:?} is not readable"
        )));
    }
    if let Some(field) = target.fields().iter().find(|field| !field.can_write()) {
        return Err(MapError::binding_contract(format!(
            "cannot bind to '{target}': field {field:?} is not writable"
        )));
    }

    Ok(())
}

// Computed sources have no member a cursor could enter.
fn check_descent(
    types: &TypeRegistry,
    source: &FieldGraphPath,
    source_type: &DataType,
) -> Result<(), MapError> {
    match source.terminal() {
        Some(field) if !field.can_descend() && needs_descent(types, source_type)? => {
            Err(MapError::binding_contract(format!(
                "cannot bind from '{source}': field {field:?} is computed and can only be copied as a value"
            )))
        }
        _ => Ok(()),
    }
}

fn expect_pair(
    nested: &DataModelBinding,
    source: TypeKey,
    target: TypeKey,
) -> Result<(), MapError> {
    if nested.source() == source && nested.target() == target {
        return Ok(());
    }

    Err(MapError::binding_contract(format!(
        "nested binding maps '{}' to '{}', expected '{}' to '{}'",
        nested.source().name(),
        nested.target().name(),
        source.name(),
        target.name()
    )))
}

fn find_binding(
    reuse: &[Arc<DataModelBinding>],
    source: TypeKey,
    target: TypeKey,
) -> Option<&Arc<DataModelBinding>> {
    reuse
        .iter()
        .find(|binding| binding.source() == source && binding.target() == target)
}

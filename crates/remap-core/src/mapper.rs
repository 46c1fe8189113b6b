//! Mapper registry: bindings and compiled mappings memoized per type pair.

use crate::{
    binding::{BindingContext, DataModelBinding, TypeBindingBuilder},
    cache::{CacheStats, MemoCache},
    config::MapperConfig,
    error::MapError,
    mapping::{ElementMappings, Mapping},
    model::{TypeKey, TypeRegistry, TypeRegistryStats},
    obs::{MetricsEvent, MetricsSink, NoopSink},
    runtime::{DefaultFactory, ObjectFactory, ObjectReader, ObjectWriter},
    traits::Reflect,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::{fmt, sync::Arc};

type PairKey = (TypeKey, TypeKey);

///
/// MapperStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MapperStats {
    pub types: TypeRegistryStats,
    pub bindings: CacheStats,
    pub mappings: CacheStats,
}

///
/// Mapper
///
/// Owned registry tying the engine together. Bindings are built on first
/// request per (source, target) pair, from a registered override when one
/// exists and by auto-binding otherwise. Once a pair is built it is never
/// rebuilt by this mapper; element pairs derived while auto-binding a
/// parent count as built and are shared with every other parent.
///

pub struct Mapper {
    types: Arc<TypeRegistry>,
    config: MapperConfig,
    factory: Arc<dyn ObjectFactory>,
    sink: Arc<dyn MetricsSink>,
    bindings: MemoCache<PairKey, Arc<DataModelBinding>>,
    mappings: MemoCache<PairKey, Arc<Mapping>>,
    overrides: RwLock<Vec<Arc<DataModelBinding>>>,
}

impl Mapper {
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: Arc::new(TypeRegistry::new()),
            config: MapperConfig::default(),
            factory: Arc::new(DefaultFactory),
            sink: Arc::new(NoopSink),
            bindings: MemoCache::new("bindings"),
            mappings: MemoCache::new("mappings"),
            overrides: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply a `[mapping]` TOML table on top of this mapper.
    pub fn with_config_toml(self, source: &str) -> Result<Self, MapError> {
        let config = MapperConfig::from_toml_str(source)?;

        Ok(self.with_config(config))
    }

    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.factory = factory;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share a type registry with other mappers.
    #[must_use]
    pub fn with_types(mut self, types: Arc<TypeRegistry>) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub const fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    // ======================================================================
    // Bindings
    // ======================================================================

    /// Builder for an explicit binding, using this mapper's config.
    pub fn binding_builder<S: Reflect, T: Reflect>(
        &self,
    ) -> Result<TypeBindingBuilder<'_>, MapError> {
        Ok(TypeBindingBuilder::for_types::<S, T>(&self.types)?.with_config(self.config.clone()))
    }

    /// Register an explicit binding for its type pair.
    ///
    /// Registered bindings are used as-is for their own pair and reused by
    /// auto-binding for nested pairs. Registering for a pair that is
    /// already built, directly or as an element pair, is a conflict.
    pub fn register_binding(&self, binding: Arc<DataModelBinding>) -> Result<(), MapError> {
        let key = (binding.source(), binding.target());
        if self.bindings.contains(&key) {
            return Err(MapError::binding_conflict(format!(
                "binding '{}' -> '{}' is already built",
                key.0.name(),
                key.1.name()
            )));
        }

        let mut overrides = self.overrides.write();
        overrides.retain(|existing| (existing.source(), existing.target()) != key);
        overrides.push(binding);

        Ok(())
    }

    pub fn get_binding<S: Reflect, T: Reflect>(&self) -> Result<Arc<DataModelBinding>, MapError> {
        self.binding_for(pair_key::<S, T>())
    }

    fn binding_for(&self, key: PairKey) -> Result<Arc<DataModelBinding>, MapError> {
        self.bindings.get_or_try_build(key, || {
            let overrides = self.overrides.read().clone();

            let binding = match overrides
                .iter()
                .find(|binding| (binding.source(), binding.target()) == key)
            {
                Some(registered) => Arc::clone(registered),
                None => TypeBindingBuilder::new(&self.types, key.0, key.1)?
                    .with_config(self.config.clone())
                    .with_shared(&self.bindings)
                    .auto_bind(&overrides)?
                    .build_binding(),
            };

            self.sink.record(MetricsEvent::BindingBuilt {
                source: key.0.name(),
                target: key.1.name(),
                bindings: count(binding.len()),
            });

            Ok(binding)
        })
    }

    // ======================================================================
    // Mappings
    // ======================================================================

    pub fn get_mapping<S: Reflect, T: Reflect>(&self) -> Result<Arc<Mapping>, MapError> {
        self.mapping_for(pair_key::<S, T>())
    }

    fn mapping_for(&self, key: PairKey) -> Result<Arc<Mapping>, MapError> {
        self.mappings.get_or_try_build(key, || {
            let binding = self.binding_for(key)?;
            let mapping = Mapping::compile_with(binding, &self.types, self)?;

            self.sink.record(MetricsEvent::MappingCompiled {
                source: key.0.name(),
                target: key.1.name(),
                ops: count(mapping.ops().len()),
            });

            Ok(Arc::new(mapping))
        })
    }

    /// Compile a binding that was not registered. Not cached.
    pub fn build_mapping(&self, binding: &Arc<DataModelBinding>) -> Result<Arc<Mapping>, MapError> {
        binding.build_mapping(&self.types).map(Arc::new)
    }

    // ======================================================================
    // Execution
    // ======================================================================

    /// Map into a fresh target built by the object factory.
    pub fn map_new<S: Reflect, T: Reflect>(&self, source: &S) -> Result<T, MapError> {
        let mapping = self.get_mapping::<S, T>()?;
        let writer = ObjectWriter::create::<T>(&self.types, self.factory.as_ref())?;

        self.run(&mapping, source, writer, &mut BindingContext::new())
    }

    /// Map onto an existing target value and return it. Fields the mapping
    /// does not write, or only reaches through null sources, keep their
    /// current values.
    pub fn map_into<S: Reflect, T: Reflect>(&self, source: &S, target: T) -> Result<T, MapError> {
        self.map_into_with(source, target, &mut BindingContext::new())
    }

    /// As `map_into`, collecting issues into a caller-owned context.
    pub fn map_into_with<S: Reflect, T: Reflect>(
        &self,
        source: &S,
        target: T,
        ctx: &mut BindingContext,
    ) -> Result<T, MapError> {
        let mapping = self.get_mapping::<S, T>()?;
        let writer = ObjectWriter::new(&self.types, self.factory.as_ref(), target)?;

        self.run(&mapping, source, writer, ctx)
    }

    /// Map onto `target` in place. On error `target` is left at its
    /// default value.
    pub fn map_onto<S: Reflect, T: Reflect + Default>(
        &self,
        source: &S,
        target: &mut T,
    ) -> Result<(), MapError> {
        let current = std::mem::take(target);
        *target = self.map_into(source, current)?;

        Ok(())
    }

    fn run<S: Reflect, T: Reflect>(
        &self,
        mapping: &Mapping,
        source: &S,
        mut writer: ObjectWriter<'_>,
        ctx: &mut BindingContext,
    ) -> Result<T, MapError> {
        let source_name = mapping.source().name();
        let target_name = mapping.target().name();
        let issues_before = ctx.issue_count();

        let result = ObjectReader::new(&self.types, source)
            .and_then(|mut reader| mapping.execute_with(&mut reader, &mut writer, ctx))
            .and_then(|()| writer.into_inner::<T>());

        match result {
            Ok(out) => {
                let issues = ctx.issue_count().saturating_sub(issues_before);
                if issues > 0 {
                    tracing::debug!(
                        source = source_name,
                        target = target_name,
                        issues,
                        "mapping finished with issues"
                    );
                }
                self.sink.record(MetricsEvent::MappingExecuted {
                    source: source_name,
                    target: target_name,
                    issues: count(issues),
                });

                Ok(out)
            }
            Err(err) => {
                tracing::debug!(
                    source = source_name,
                    target = target_name,
                    error = %err,
                    "mapping failed"
                );
                self.sink.record(MetricsEvent::MappingFailed {
                    source: source_name,
                    target: target_name,
                });

                Err(err)
            }
        }
    }

    #[must_use]
    pub fn cache_stats(&self) -> MapperStats {
        MapperStats {
            types: self.types.stats(),
            bindings: self.bindings.stats(),
            mappings: self.mappings.stats(),
        }
    }
}

// Element bindings this mapper owns compile once per pair; any other
// binding is compiled where it is met.
impl ElementMappings for Mapper {
    fn element_mapping(
        &self,
        binding: &Arc<DataModelBinding>,
        types: &TypeRegistry,
    ) -> Result<Arc<Mapping>, MapError> {
        let key = (binding.source(), binding.target());
        let owned = self
            .bindings
            .get(&key)
            .is_some_and(|cached| Arc::ptr_eq(&cached, binding))
            || self
                .overrides
                .read()
                .iter()
                .any(|registered| Arc::ptr_eq(registered, binding));

        if owned {
            return self.mapping_for(key);
        }

        Mapping::compile_with(Arc::clone(binding), types, self).map(Arc::new)
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config)
            .field("bindings", &self.bindings.len())
            .field("mappings", &self.mappings.len())
            .field("overrides", &self.overrides.read().len())
            .finish_non_exhaustive()
    }
}

fn pair_key<S: Reflect, T: Reflect>() -> PairKey {
    (TypeKey::of::<S::Member>(), TypeKey::of::<T::Member>())
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

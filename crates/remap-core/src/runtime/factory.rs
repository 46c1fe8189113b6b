use crate::{
    error::MapError,
    model::DataType,
    traits::{Node, Reflect},
};
use rustc_hash::FxHashMap;
use std::{any::TypeId, fmt, sync::Arc};

///
/// ObjectFactory
///
/// Creates target instances when a writer needs a member or element that
/// does not exist yet. `data_type` is always at member level.
///

pub trait ObjectFactory: Send + Sync {
    fn create_instance(&self, data_type: &DataType) -> Result<Box<Node>, MapError>;
}

///
/// DefaultFactory
/// Uses the type's own constructor (`Default` for derived models).
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFactory;

impl ObjectFactory for DefaultFactory {
    fn create_instance(&self, data_type: &DataType) -> Result<Box<Node>, MapError> {
        data_type
            .construct()
            .ok_or_else(|| MapError::construction(data_type.name(), "type has no default constructor"))
    }
}

type Constructor = Box<dyn Fn() -> Result<Box<Node>, MapError> + Send + Sync>;

///
/// FactoryRegistry
///
/// Per-type constructors with a fallback for everything else. Lets types
/// without `Default` appear as mapping targets.
///

pub struct FactoryRegistry {
    constructors: FxHashMap<TypeId, Constructor>,
    fallback: Arc<dyn ObjectFactory>,
}

impl FactoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(DefaultFactory))
    }

    #[must_use]
    pub fn with_fallback(fallback: Arc<dyn ObjectFactory>) -> Self {
        Self {
            constructors: FxHashMap::default(),
            fallback,
        }
    }

    /// Register a constructor for `T`, replacing any earlier one.
    pub fn register<T, F>(&mut self, constructor: F) -> &mut Self
    where
        T: Reflect,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_fallible::<T, _>(move || Ok(constructor()))
    }

    pub fn register_fallible<T, F>(&mut self, constructor: F) -> &mut Self
    where
        T: Reflect,
        F: Fn() -> Result<T, MapError> + Send + Sync + 'static,
    {
        let build: Constructor = Box::new(move || {
            constructor()?.into_node().ok_or_else(|| {
                MapError::construction(std::any::type_name::<T>(), "constructor produced null")
            })
        });
        self.constructors.insert(TypeId::of::<T>(), build);

        self
    }

    #[must_use]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.constructors.contains_key(&type_id)
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectFactory for FactoryRegistry {
    fn create_instance(&self, data_type: &DataType) -> Result<Box<Node>, MapError> {
        match self.constructors.get(&data_type.type_id()) {
            Some(constructor) => constructor(),
            None => self.fallback.create_instance(data_type),
        }
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}

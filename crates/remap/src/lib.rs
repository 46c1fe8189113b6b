//! # remap
//!
//! Object-to-object mapping with flatten-name auto binding. Models are
//! described through `Reflect` (usually `#[derive(Model)]`), bound to each
//! other by name, compiled once per type pair, and then executed with a
//! reader/writer pair over live values.
//!
//! ## Crate layout
//! - `binding`: binding builder, name matcher, transforms, issue context.
//! - `mapping`: compiled mapping procedures and their `explain` output.
//! - `mapper`: the registry that memoizes bindings and mappings per pair.
//! - `model`: reflection types, data types, accessors, and the type registry.
//! - `runtime`: object graph reader/writer and object factories.
//! - `config`, `error`, `obs`, `value`: ambient plumbing.
//!
//! The `prelude` module covers declaring models and running a `Mapper`.

pub use remap_core::{
    binding, cache, config, error, mapper, mapping, model, obs, runtime, traits, value,
};
pub use remap_derive::Model;

// export so derives work inside this crate's own tests
extern crate self as remap;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::MapError as Error;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        Model,
        binding::BindingContext,
        config::MapperConfig,
        error::MapError,
        mapper::Mapper,
        traits::{FieldValue as _, Reflect},
        value::Value,
    };
    pub use serde::{Deserialize, Serialize};
}

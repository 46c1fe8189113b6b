//! Core engine for remap: reflection models, flatten-name binding,
//! compiled mappings, and the object graph reader/writer they run on.
#![warn(unreachable_pub)]

extern crate self as remap;

// public exports are one module level down
pub mod binding;
pub mod cache;
pub mod config;
pub mod error;
pub mod mapper;
pub mod mapping;
pub mod model;
pub mod obs;
pub mod runtime;
pub mod traits;
pub mod value;

///
/// Prelude
///
/// Prelude contains the vocabulary needed to declare models and run
/// mappings. Builders, caches, and cursors stay in their modules.
///

pub mod prelude {
    pub use crate::{
        binding::BindingContext,
        error::MapError,
        mapper::Mapper,
        traits::{FieldValue, Reflect},
        value::Value,
    };
}

//! Core settings types: the settings object, the merge engine and the lazy handle.

mod builder;
mod engine;
mod lazy;
mod settings;

#[cfg(feature = "validation")]
mod validation;

pub use builder::LazySettingsBuilder;
pub use engine::MergeEngine;
pub use lazy::{LazySettings, PROGRAMMATIC};
pub use settings::{
    DEFAULT_ENV, LoadRecord, Provenance, Settings, SettingsMap, SourceTag, canonical_key,
};

#[cfg(feature = "validation")]
pub use validation::Validate;

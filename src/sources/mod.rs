//! Settings source implementations.

mod env;
mod file;
mod source_loader;
mod store;

pub use env::EnvSource;
pub use file::FileSource;
pub use source_loader::SourceLoader;
pub use store::{DisabledPolicy, GLOBAL_ENV, StoreConfig, StoreLoader};

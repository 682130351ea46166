pub mod config;
pub mod error;
pub mod logging;
pub mod module;
pub mod order;
pub mod path;
pub mod policy;
pub mod pool;
pub mod reader;

pub use config::ScanConfig;
pub use error::{ContainerError, Result, RootscopeError, UsageError};
pub use module::{CollectingSink, ModuleResource, ModuleScanner, ScanSink, ScanState, SkipReason};
pub use order::{FrozenOrder, LoaderHandles, LoaderId, PathValue, ReservedRoots, Root, RootOrder};
pub use policy::{PathMatch, PathRules, ScanPolicy};
pub use pool::{ReaderPool, ScopedReader};
pub use reader::{ContainerKey, ContainerReader, MemoryReader, ModuleRef, ReaderFactory};

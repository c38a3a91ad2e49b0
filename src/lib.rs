// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod engine;
pub mod error;
pub mod runtime;
pub mod selection;
pub mod sequence;
pub mod storage;
pub mod timer;

pub use engine::{Catch, EngineOptions, RateGameEngine, Status, Transition};
pub use error::{EngineError, StorageError};
pub use selection::SelectionPolicy;
pub use sequence::RateSequence;

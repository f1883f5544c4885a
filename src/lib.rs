// Blackboard hash index
// Name → slot lookup structure for a shared variable table

#![warn(rust_2018_idioms)]

pub mod blackboard;
pub mod config;
pub mod index;
pub mod registry;
pub mod shared;
pub mod slot;

// Re-exports for convenience
pub use blackboard::{BlackboardIndex, IndexStats};
pub use config::IndexConfig;
pub use index::{hash_name, Cursor, Direction, HashIndex, HashValue, Probe};
pub use registry::{Registration, VariableRegistry};
pub use shared::SharedRegistry;
pub use slot::{SlotAllocator, SlotId};

/// Blackboard index error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Out of memory: {0}")]
        OutOfMemory(String),

        #[error("Directory full: {0}")]
        DirectoryFull(String),

        #[error("Internal error: {0}")]
        Internal(String),

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Config error: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

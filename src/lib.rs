// Chunked text buffer engine - exposes all core modules for testing

pub mod buffer;
pub mod chain;
pub mod config;
pub mod cursor;
pub mod error;
pub mod mapper;
pub mod pool;
pub mod viewport;

// Re-export commonly used types
pub use buffer::{Buffer, PoolStats};
pub use config::{BufferConfig, ConfigError};
pub use cursor::{Cursor, Direction};
pub use error::BufferError;
pub use mapper::Position;
pub use pool::{ChunkId, ChunkPool};

//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - In-process map for KeyValueStore (tests, memory-only mode)
//! - One-JSON-file-per-key directory for KeyValueStore
//! - Local user directory for SessionProvider

pub mod file;
pub mod local_session;
pub mod memory;

pub use file::FileKeyValueStore;
pub use local_session::{LocalSession, PasswordParams};
pub use memory::MemoryKeyValueStore;

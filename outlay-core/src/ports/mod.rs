//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod key_value;
mod session;

pub use key_value::KeyValueStore;
pub use session::SessionProvider;

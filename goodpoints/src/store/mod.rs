//! Session-scoped key-value storage.

mod file;
mod memory;
mod traits;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use traits::{SessionStore, SessionStoreExt};

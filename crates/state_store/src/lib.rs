//! Persistence gateways for serialized conversation state.
//!
//! Stores move opaque bytes only; encoding, schema versioning and recovery
//! from corrupt payloads belong to the caller.

mod error;
mod memory;
mod paths;
mod store;

pub use error::StateStoreError;
pub use memory::MemoryStateStore;
pub use paths::{default_state_path, state_root, temp_path_for, STATE_DIR, STATE_FILE_NAME};
pub use store::{FileStateStore, StateStore};

//! Ordered key/value storage with a transactional overlay and undo patches
//! (§4.A). Every other component crate is generic over [`KvRead`] /
//! [`KvWrite`] so it can run against the in-memory backend in tests and
//! against the `rocksdb`-backed store in a real node.

pub mod overlay;
pub mod store;
pub mod undo;

#[cfg(feature = "rocksdb-backend")]
pub mod rocksdb_backend;

pub use overlay::{Overlay, OverlayChanges};
pub use store::{KvRead, KvWrite, MemoryStore};
pub use undo::Undo;

#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::{RocksDbError, RocksDbStore};

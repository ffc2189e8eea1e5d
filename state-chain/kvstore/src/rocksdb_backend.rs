//! Persistent backend over `rocksdb`, grounded on the column-family /
//! `WriteBatch` pattern the off-chain engine uses for its own KV store.

use crate::store::{KvRead, KvWrite};
use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

const DATA_COLUMN: &str = "data";
const METADATA_COLUMN: &str = "metadata";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum RocksDbError {
	#[error("rocksdb error: {0}")]
	Db(#[from] rocksdb::Error),
	#[error("column family {0:?} missing")]
	MissingColumn(&'static str),
	#[error("on-disk schema version {found} is newer than supported version {supported}")]
	UnsupportedSchema { found: u32, supported: u32 },
}

/// A `rocksdb`-backed [`KvStore`](crate::store). All application data lives
/// in the `data` column family; a `metadata` column family carries the
/// schema version so future migrations can detect stale databases.
pub struct RocksDbStore {
	db: Arc<DB>,
}

impl RocksDbStore {
	pub fn open(path: impl AsRef<Path>) -> Result<Self, RocksDbError> {
		let mut db_opts = Options::default();
		db_opts.create_if_missing(true);
		db_opts.create_missing_column_families(true);

		let columns = vec![
			ColumnFamilyDescriptor::new(DATA_COLUMN, Options::default()),
			ColumnFamilyDescriptor::new(METADATA_COLUMN, Options::default()),
		];
		let db = DB::open_cf_descriptors(&db_opts, path, columns)?;

		let store = RocksDbStore { db: Arc::new(db) };
		store.check_or_write_schema_version()?;
		Ok(store)
	}

	fn data_cf(&self) -> Result<&rocksdb::ColumnFamily, RocksDbError> {
		self.db.cf_handle(DATA_COLUMN).ok_or(RocksDbError::MissingColumn(DATA_COLUMN))
	}

	fn metadata_cf(&self) -> Result<&rocksdb::ColumnFamily, RocksDbError> {
		self.db.cf_handle(METADATA_COLUMN).ok_or(RocksDbError::MissingColumn(METADATA_COLUMN))
	}

	fn check_or_write_schema_version(&self) -> Result<(), RocksDbError> {
		let metadata_cf = self.metadata_cf()?;
		match self.db.get_cf(metadata_cf, SCHEMA_VERSION_KEY)? {
			Some(bytes) if bytes.len() == 4 => {
				let found = u32::from_be_bytes(bytes.try_into().expect("checked len"));
				if found > CURRENT_SCHEMA_VERSION {
					return Err(RocksDbError::UnsupportedSchema { found, supported: CURRENT_SCHEMA_VERSION });
				}
			}
			_ => {
				self.db.put_cf(metadata_cf, SCHEMA_VERSION_KEY, CURRENT_SCHEMA_VERSION.to_be_bytes())?;
			}
		}
		Ok(())
	}

	/// Applies a flushed overlay's change set as a single atomic write batch.
	pub fn write_batch(&self, puts: Vec<(Vec<u8>, Vec<u8>)>, erases: Vec<Vec<u8>>) -> Result<(), RocksDbError> {
		let data_cf = self.data_cf()?;
		let mut batch = WriteBatch::default();
		for (key, value) in puts {
			batch.put_cf(data_cf, key, value);
		}
		for key in erases {
			batch.delete_cf(data_cf, key);
		}
		self.db.write(batch)?;
		Ok(())
	}
}

impl KvRead for RocksDbStore {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
		let data_cf = self.data_cf().ok()?;
		self.db.get_cf(data_cf, key).ok().flatten()
	}

	fn for_each_prefix(&self, prefix: &[u8], visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
		let Ok(data_cf) = self.data_cf() else { return };
		let iter = self.db.prefix_iterator_cf(data_cf, prefix);
		for item in iter {
			let Ok((key, value)) = item else { break };
			if !key.starts_with(prefix) {
				break;
			}
			if !visitor(&key, &value) {
				break;
			}
		}
	}
}

impl KvWrite for RocksDbStore {
	fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
		if let Ok(data_cf) = self.data_cf() {
			let _ = self.db.put_cf(data_cf, key, value);
		}
	}

	fn erase(&mut self, key: &[u8]) {
		if let Ok(data_cf) = self.data_cf() {
			let _ = self.db.delete_cf(data_cf, key);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_through_a_temp_directory() {
		let dir = tempfile::tempdir().unwrap();
		let mut store = RocksDbStore::open(dir.path()).unwrap();
		store.put(b"k".to_vec(), b"v".to_vec());
		assert_eq!(store.get(b"k"), Some(b"v".to_vec()));
	}

	#[test]
	fn reopening_an_existing_database_accepts_the_current_schema_version() {
		let dir = tempfile::tempdir().unwrap();
		{
			let mut store = RocksDbStore::open(dir.path()).unwrap();
			store.put(b"k".to_vec(), b"v".to_vec());
		}
		let reopened = RocksDbStore::open(dir.path()).unwrap();
		assert_eq!(reopened.get(b"k"), Some(b"v".to_vec()));
	}
}

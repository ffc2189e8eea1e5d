//! Pending governance/split schedule (§4.I steps 7 and 9).
//!
//! `pallet-attributes::AttributeStore::set_external` validates an
//! `activation_height` against the current height but keeps no record of
//! attributes that aren't due yet, and `AttributeEffect::SplitScheduled`
//! is just a value returned at the moment a `oracles/splits/...` path is
//! set. Something has to remember both until their height arrives; that's
//! this queue, keyed by activation height so a due sweep is a bounded
//! prefix scan instead of a walk over every attribute ever set.

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Height, TokenId};
use serde::{Deserialize, Serialize};

const HEIGHT_VAR_PREFIX: &[u8] = b"govq/height_var/";
const SPLIT_PREFIX: &[u8] = b"govq/split/";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PendingHeightVar {
	path: String,
	raw: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct PendingSplit {
	token_id: TokenId,
	multiplier_pct: i64,
}

fn height_var_key(activation_height: Height, ordinal: u32) -> Vec<u8> {
	[HEIGHT_VAR_PREFIX, &activation_height.to_be_bytes(), &ordinal.to_be_bytes()].concat()
}

fn split_key(activation_height: Height, token_id: TokenId) -> Vec<u8> {
	[SPLIT_PREFIX, &activation_height.to_be_bytes(), &token_id.to_be_bytes()].concat()
}

fn height_of(key: &[u8], prefix: &[u8]) -> Option<Height> {
	let rest = key.strip_prefix(prefix)?;
	Some(Height::from_be_bytes(rest.get(..4)?.try_into().ok()?))
}

pub struct GovQueue<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> GovQueue<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		GovQueue { store }
	}

	/// Records a `SetGovVariableHeight` entry not yet due. `ordinal`
	/// disambiguates multiple entries scheduled for the same height.
	pub fn queue_height_var(&mut self, activation_height: Height, ordinal: u32, path: String, raw: String) {
		self.store.put(
			height_var_key(activation_height, ordinal),
			serde_json::to_vec(&PendingHeightVar { path, raw }).expect("PendingHeightVar serializes"),
		);
	}

	/// Drains and returns every `(path, raw)` entry due at or before
	/// `height`, in ascending-height order.
	pub fn take_due_height_vars(&mut self, height: Height) -> Vec<(String, String)> {
		let mut due = Vec::new();
		self.store.for_each_prefix(HEIGHT_VAR_PREFIX, &mut |k, v| {
			if height_of(k, HEIGHT_VAR_PREFIX).map(|h| h <= height).unwrap_or(false) {
				if let Ok(entry) = serde_json::from_slice::<PendingHeightVar>(v) {
					due.push((k.to_vec(), entry));
				}
			}
			true
		});
		due.into_iter()
			.map(|(key, entry)| {
				self.store.erase(&key);
				(entry.path, entry.raw)
			})
			.collect()
	}

	/// Records a governance-scheduled token split (`AttributeEffect::SplitScheduled`).
	pub fn queue_split(&mut self, activation_height: Height, token_id: TokenId, multiplier_pct: i64) {
		self.store.put(
			split_key(activation_height, token_id),
			serde_json::to_vec(&PendingSplit { token_id, multiplier_pct }).expect("PendingSplit serializes"),
		);
	}

	/// Drains and returns every `(token_id, multiplier_pct)` split due at or
	/// before `height`.
	pub fn take_due_splits(&mut self, height: Height) -> Vec<(TokenId, i64)> {
		let mut due = Vec::new();
		self.store.for_each_prefix(SPLIT_PREFIX, &mut |k, v| {
			if height_of(k, SPLIT_PREFIX).map(|h| h <= height).unwrap_or(false) {
				if let Ok(entry) = serde_json::from_slice::<PendingSplit>(v) {
					due.push((k.to_vec(), entry));
				}
			}
			true
		});
		due.into_iter()
			.map(|(key, entry)| {
				self.store.erase(&key);
				(entry.token_id, entry.multiplier_pct)
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core_kvstore::MemoryStore;

	#[test]
	fn height_vars_are_only_due_once_their_height_is_reached() {
		let mut store = MemoryStore::new();
		let mut queue = GovQueue::new(&mut store);
		queue.queue_height_var(100, 0, "v0/params/foo".into(), "1".into());

		assert!(queue.take_due_height_vars(99).is_empty());
		let due = queue.take_due_height_vars(100);
		assert_eq!(due, vec![("v0/params/foo".to_string(), "1".to_string())]);
		assert!(queue.take_due_height_vars(100).is_empty());
	}

	#[test]
	fn splits_drain_in_one_sweep_and_not_again() {
		let mut store = MemoryStore::new();
		let mut queue = GovQueue::new(&mut store);
		queue.queue_split(50, 7, 200_000_000);
		queue.queue_split(50, 9, -200_000_000);

		let due = queue.take_due_splits(60);
		assert_eq!(due.len(), 2);
		assert!(queue.take_due_splits(60).is_empty());
	}
}

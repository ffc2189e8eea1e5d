//! Transactional overlay on top of a [`KvRead`] parent (§4.A).

use crate::store::{KvRead, KvWrite};
use std::collections::BTreeMap;

/// A change recorded in an overlay: either a new value or a tombstone for a
/// key the overlay has erased (which may or may not exist in the parent).
#[derive(Clone, Debug, PartialEq, Eq)]
enum Change {
	Put(Vec<u8>),
	Erase,
}

/// Buffers writes against a borrowed parent store without mutating it.
/// Reads fall through to the parent for any key the overlay hasn't touched,
/// so iteration always sees a consistent merged snapshot (§4.A).
///
/// Overlays nest: `Overlay<Overlay<MemoryStore>>` is how the block pipeline
/// gives each transaction its own undo scope inside the block's overlay.
pub struct Overlay<'p, P: KvRead + ?Sized> {
	parent: &'p P,
	changes: BTreeMap<Vec<u8>, Change>,
}

impl<'p, P: KvRead + ?Sized> Overlay<'p, P> {
	pub fn new(parent: &'p P) -> Self {
		Overlay { parent, changes: BTreeMap::new() }
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Ends the overlay's borrow of `parent` and hands back its change set,
	/// ready to be applied to a mutable handle on the same store (`flush`)
	/// or dropped (`discard`).
	pub fn into_changes(self) -> OverlayChanges {
		OverlayChanges(self.changes)
	}

	/// Discards the overlay without touching the parent.
	pub fn discard(self) {}
}

impl<'p, P: KvRead + ?Sized> KvRead for Overlay<'p, P> {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
		match self.changes.get(key) {
			Some(Change::Put(v)) => Some(v.clone()),
			Some(Change::Erase) => None,
			None => self.parent.get(key),
		}
	}

	fn for_each_prefix(&self, prefix: &[u8], visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool) {
		let mut parent_rows = Vec::new();
		self.parent.for_each_prefix(prefix, &mut |k, v| {
			parent_rows.push((k.to_vec(), v.to_vec()));
			true
		});

		let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> =
			parent_rows.into_iter().map(|(k, v)| (k, Some(v))).collect();

		for (k, change) in self.changes.range(prefix.to_vec()..) {
			if !k.starts_with(prefix) {
				break;
			}
			match change {
				Change::Put(v) => {
					merged.insert(k.clone(), Some(v.clone()));
				}
				Change::Erase => {
					merged.insert(k.clone(), None);
				}
			}
		}

		for (k, v) in merged {
			if let Some(v) = v {
				if !visitor(&k, &v) {
					break;
				}
			}
		}
	}
}

impl<'p, P: KvRead + ?Sized> KvWrite for Overlay<'p, P> {
	fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
		self.changes.insert(key, Change::Put(value));
	}

	fn erase(&mut self, key: &[u8]) {
		self.changes.insert(key.to_vec(), Change::Erase);
	}
}

/// The materialized write set of a finished [`Overlay`], detached from its
/// parent's lifetime so it can be applied (`flush`) after the overlay
/// itself has gone out of scope.
pub struct OverlayChanges(BTreeMap<Vec<u8>, Change>);

impl OverlayChanges {
	/// Applies every change to `store`, in key order. O(changes) per §4.A.
	pub fn flush(self, store: &mut dyn KvWrite) {
		for (key, change) in self.0 {
			match change {
				Change::Put(value) => store.put(key, value),
				Change::Erase => store.erase(&key),
			}
		}
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = (&[u8], Option<&[u8]>)> {
		self.0.iter().map(|(k, c)| {
			(
				k.as_slice(),
				match c {
					Change::Put(v) => Some(v.as_slice()),
					Change::Erase => None,
				},
			)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;

	#[test]
	fn overlay_reads_fall_through_to_parent() {
		let mut parent = MemoryStore::new();
		parent.put(b"a".to_vec(), b"1".to_vec());

		let mut overlay = Overlay::new(&parent);
		assert_eq!(overlay.get(b"a"), Some(b"1".to_vec()));
		overlay.put(b"b".to_vec(), b"2".to_vec());
		assert_eq!(overlay.get(b"b"), Some(b"2".to_vec()));
		assert_eq!(parent.get(b"b"), None);
	}

	#[test]
	fn overlay_erase_shadows_parent_without_mutating_it() {
		let mut parent = MemoryStore::new();
		parent.put(b"a".to_vec(), b"1".to_vec());

		let mut overlay = Overlay::new(&parent);
		overlay.erase(b"a");
		assert_eq!(overlay.get(b"a"), None);
		assert_eq!(parent.get(b"a"), Some(b"1".to_vec()));
	}

	#[test]
	fn flush_applies_changes_and_discard_applies_nothing() {
		let mut parent = MemoryStore::new();
		parent.put(b"a".to_vec(), b"1".to_vec());

		let mut overlay = Overlay::new(&parent);
		overlay.put(b"a".to_vec(), b"2".to_vec());
		overlay.erase(b"missing".as_ref());
		overlay.into_changes().flush(&mut parent);
		assert_eq!(parent.get(b"a"), Some(b"2".to_vec()));

		let mut parent2 = MemoryStore::new();
		parent2.put(b"a".to_vec(), b"1".to_vec());
		let mut overlay2 = Overlay::new(&parent2);
		overlay2.put(b"a".to_vec(), b"9".to_vec());
		overlay2.discard();
		assert_eq!(parent2.get(b"a"), Some(b"1".to_vec()));
	}

	#[test]
	fn merged_iteration_respects_overlay_tombstones_and_inserts() {
		let mut parent = MemoryStore::new();
		parent.put(b"a/1".to_vec(), b"p1".to_vec());
		parent.put(b"a/2".to_vec(), b"p2".to_vec());

		let mut overlay = Overlay::new(&parent);
		overlay.erase(b"a/1");
		overlay.put(b"a/3".to_vec(), b"o3".to_vec());

		let mut seen = vec![];
		overlay.for_each_prefix(b"a/", &mut |k, v| {
			seen.push((k.to_vec(), v.to_vec()));
			true
		});
		assert_eq!(seen, vec![(b"a/2".to_vec(), b"p2".to_vec()), (b"a/3".to_vec(), b"o3".to_vec())]);
	}
}

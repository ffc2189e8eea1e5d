//! Undo patch construction and application (§4.A).

use crate::overlay::OverlayChanges;
use crate::store::{KvRead, KvWrite};
use std::collections::BTreeMap;

/// A reversal patch for one block (or one transaction, when nested): for
/// every key an overlay touched, the value to restore on undo. `None` means
/// the key did not exist in the parent before the overlay ran, so undoing
/// means erasing it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Undo {
	patches: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl Undo {
	/// Captures, for every key in `changes`, the value it held in `parent`
	/// before the overlay was applied. Must be called before `changes` is
	/// flushed, since it reads `parent`'s pre-overlay state.
	pub fn construct(parent: &impl KvRead, changes: &OverlayChanges) -> Undo {
		let patches = changes.iter().map(|(k, _)| (k.to_vec(), parent.get(k))).collect();
		Undo { patches }
	}

	pub fn is_empty(&self) -> bool {
		self.patches.is_empty()
	}

	/// Restores `store` to the state it was in when this patch was
	/// constructed. Idempotent: applying the same patch twice in a row
	/// leaves the store in the same state as applying it once, since each
	/// entry is an absolute restore, not a relative delta (§4.A).
	pub fn apply(&self, store: &mut dyn KvWrite) {
		for (key, value) in &self.patches {
			match value {
				Some(v) => store.put(key.clone(), v.clone()),
				None => store.erase(key),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::overlay::Overlay;
	use crate::store::MemoryStore;

	#[test]
	fn undo_restores_overwritten_and_newly_inserted_keys() {
		let mut store = MemoryStore::new();
		store.put(b"existing".to_vec(), b"old".to_vec());

		let undo = {
			let mut overlay = Overlay::new(&store);
			overlay.put(b"existing".to_vec(), b"new".to_vec());
			overlay.put(b"fresh".to_vec(), b"inserted".to_vec());
			let changes = overlay.into_changes();
			let undo = Undo::construct(&store, &changes);
			changes.flush(&mut store);
			undo
		};

		assert_eq!(store.get(b"existing"), Some(b"new".to_vec()));
		assert_eq!(store.get(b"fresh"), Some(b"inserted".to_vec()));

		undo.apply(&mut store);
		assert_eq!(store.get(b"existing"), Some(b"old".to_vec()));
		assert_eq!(store.get(b"fresh"), None);
	}

	#[test]
	fn undo_is_idempotent() {
		let mut store = MemoryStore::new();
		store.put(b"k".to_vec(), b"old".to_vec());

        let undo = {
			let mut overlay = Overlay::new(&store);
			overlay.put(b"k".to_vec(), b"new".to_vec());
			let changes = overlay.into_changes();
			let undo = Undo::construct(&store, &changes);
			changes.flush(&mut store);
			undo
		};

		undo.apply(&mut store);
		let after_first = store.get(b"k");
		undo.apply(&mut store);
		assert_eq!(store.get(b"k"), after_first);
	}
}

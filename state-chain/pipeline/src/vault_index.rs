//! Secondary index over vault ids, kept by the pipeline rather than
//! `pallet-vaults` itself (§9 "Cyclic references": `VaultEngine::rescale_token`
//! and the liquidation sweep both take their vault id list from the
//! caller since the engine keeps no "every vault" index). Lives under its
//! own key prefix in the same store `pallet-vaults` owns.

use core_kvstore::{KvRead, KvWrite};
use core_primitives::TxHash;

const INDEX_PREFIX: &[u8] = b"pipeline/vault_index/";

fn index_key(vault_id: &TxHash) -> Vec<u8> {
	[INDEX_PREFIX, &vault_id.0].concat()
}

/// Records a vault so later sweeps can find it. Called once, right after
/// `VaultEngine::create_vault` succeeds.
pub fn record_vault(store: &mut (impl KvRead + KvWrite + ?Sized), vault_id: TxHash) {
	store.put(index_key(&vault_id), Vec::new());
}

/// Every vault id ever created, in ascending order.
pub fn all_vault_ids(store: &(impl KvRead + ?Sized)) -> Vec<TxHash> {
	let mut ids = Vec::new();
	store.for_each_prefix(INDEX_PREFIX, &mut |key, _value| {
		if let Some(raw) = key.get(INDEX_PREFIX.len()..).and_then(|b| <[u8; 32]>::try_from(b).ok()) {
			ids.push(TxHash(raw));
		}
		true
	});
	ids
}

#[cfg(test)]
mod tests {
	use super::*;
	use core_kvstore::MemoryStore;

	#[test]
	fn records_and_lists_vault_ids() {
		let mut store = MemoryStore::new();
		record_vault(&mut store, TxHash([1; 32]));
		record_vault(&mut store, TxHash([2; 32]));
		assert_eq!(all_vault_ids(&store), vec![TxHash([1; 32]), TxHash([2; 32])]);
	}
}

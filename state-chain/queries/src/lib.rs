//! Read-only query functions behind the RPC surface named in §6.4.
//!
//! `spec.md` places the RPC transport itself out of scope ("referenced only
//! by interface"); this crate is the behavior those RPCs expose, as plain
//! functions over a [`Snapshot`], the way the teacher's `custom-rpc` crate
//! sits on top of pallet storage without being a network server itself.
//! Every function here takes `&MemoryStore`, never `&mut`: a query never
//! mutates state, and the single-writer/many-reader model (§5 "Scheduling
//! model") means callers are expected to hand these functions a snapshot
//! pinned at a specific height, not the live, still-mutating block state.

pub mod accounts;
pub mod futures;
pub mod icx;
pub mod vaults;

#[cfg(test)]
mod tests;

use core_kvstore::MemoryStore;
use core_primitives::{ErrorKind, Kind};

/// A read-only view over every component store, mirroring
/// `chain_pipeline::ChainState`'s field layout so a caller can snapshot one
/// and hand it straight to a query function. Holding borrows rather than
/// owned stores keeps a snapshot cheap to construct per RPC call.
pub struct Snapshot<'s> {
	pub tokens: &'s MemoryStore,
	pub balances: &'s MemoryStore,
	pub oracle: &'s MemoryStore,
	pub attrs: &'s MemoryStore,
	pub futures: &'s MemoryStore,
	pub vaults: &'s MemoryStore,
	pub icx: &'s MemoryStore,
}

impl<'s> Snapshot<'s> {
	pub fn new(state: &'s chain_pipeline::ChainState) -> Self {
		Snapshot {
			tokens: &state.tokens,
			balances: &state.balances,
			oracle: &state.oracle,
			attrs: &state.attrs,
			futures: &state.futures,
			vaults: &state.vaults,
			icx: &state.icx,
		}
	}
}

/// The universal `(start, including_start, limit)` pagination options named
/// in §6.4. Default limit is 100 unless the caller overrides it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination<K> {
	pub start: Option<K>,
	pub including_start: bool,
	pub limit: usize,
}

impl<K> Default for Pagination<K> {
	fn default() -> Self {
		Pagination { start: None, including_start: true, limit: 100 }
	}
}

impl<K> Pagination<K> {
	/// Applies the pagination's limit to an already-ordered iterator,
	/// skipping the start cursor itself when `including_start` is false.
	/// Callers are responsible for seeking to `start` before this point;
	/// this only trims the tail.
	fn take<T>(&self, rows: Vec<T>) -> Vec<T> {
		rows.into_iter().take(self.limit).collect()
	}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QueriesError {
	/// `-acindex` history RPCs (`listaccounthistory`, `listburnhistory`,
	/// `accounthistorycount`, `listvaulthistory`, `listauctionhistory`) when
	/// no persisted history index backs this snapshot (§6.5). This build
	/// carries a per-block [`core_traits::HistoryWriter`] sink but no
	/// queryable history store, so every history RPC answers the same way
	/// the real node does with `-acindex` turned off.
	#[error("account history is not indexed on this node")]
	NotIndexed,
	#[error("vault not found")]
	VaultNotFound,
	#[error("loan scheme not found")]
	SchemeNotFound,
	#[error(transparent)]
	Vaults(#[from] pallet_vaults::VaultsError),
}

impl ErrorKind for QueriesError {
	fn kind(&self) -> Kind {
		match self {
			QueriesError::NotIndexed => Kind::Liveness,
			QueriesError::VaultNotFound | QueriesError::SchemeNotFound => Kind::Validation,
			QueriesError::Vaults(e) => e.kind(),
		}
	}
}

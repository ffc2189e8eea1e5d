//! Futures RPC family (§6.4): `listpendingfutureswaps`,
//! `getpendingfutureswaps`, `listpendingdusdswaps`, `getpendingdusdswaps`.

use crate::{Pagination, Snapshot};
use core_kvstore::Overlay;
use core_primitives::Height;
use pallet_futures::{DUSDFuturesEntry, TokenFuturesEntry};

/// `listpendingfutureswaps`: every token-futures entry still queued,
/// paginated by the height it was submitted at.
pub fn list_pending_futures(snapshot: &Snapshot<'_>, pagination: &Pagination<Height>) -> Vec<(Height, TokenFuturesEntry)> {
	let mut overlay = Overlay::new(snapshot.futures);
	let engine = pallet_futures::FuturesEngine::new(&mut overlay);
	let mut rows = Vec::new();
	engine.for_each_token_entry(|height, entry| {
		if pagination.start.map(|start| if pagination.including_start { height < start } else { height <= start }).unwrap_or(false) {
			return true;
		}
		rows.push((height, *entry));
		true
	});
	pagination.take(rows)
}

/// `getpendingfutureswaps`: the token-futures entries queued at one height.
pub fn get_pending_futures_at(snapshot: &Snapshot<'_>, height: Height) -> Vec<TokenFuturesEntry> {
	let mut overlay = Overlay::new(snapshot.futures);
	let engine = pallet_futures::FuturesEngine::new(&mut overlay);
	let mut rows = Vec::new();
	engine.for_each_token_entry(|entry_height, entry| {
		if entry_height == height {
			rows.push(*entry);
		}
		true
	});
	rows
}

/// `listpendingdusdswaps`: the DUSD-queue counterpart of
/// [`list_pending_futures`].
pub fn list_pending_dusd_swaps(snapshot: &Snapshot<'_>, pagination: &Pagination<Height>) -> Vec<(Height, DUSDFuturesEntry)> {
	let mut overlay = Overlay::new(snapshot.futures);
	let engine = pallet_futures::FuturesEngine::new(&mut overlay);
	let mut rows = Vec::new();
	engine.for_each_dusd_entry(|height, entry| {
		if pagination.start.map(|start| if pagination.including_start { height < start } else { height <= start }).unwrap_or(false) {
			return true;
		}
		rows.push((height, *entry));
		true
	});
	pagination.take(rows)
}

/// `getpendingdusdswaps`: the DUSD-queue entries queued at one height.
pub fn get_pending_dusd_swaps_at(snapshot: &Snapshot<'_>, height: Height) -> Vec<DUSDFuturesEntry> {
	let mut overlay = Overlay::new(snapshot.futures);
	let engine = pallet_futures::FuturesEngine::new(&mut overlay);
	let mut rows = Vec::new();
	engine.for_each_dusd_entry(|entry_height, entry| {
		if entry_height == height {
			rows.push(*entry);
		}
		true
	});
	rows
}

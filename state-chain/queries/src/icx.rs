//! Cross-chain order book RPC family (§6.4): `icx_getorder`,
//! `icx_listorders`, `icx_listhtlcs`.

use crate::{Pagination, Snapshot};
use core_kvstore::Overlay;
use core_primitives::TxHash;
use pallet_icx::{DfcHtlc, ExtHtlc, Offer, Order};

/// `icx_getorder`.
pub fn get_order(snapshot: &Snapshot<'_>, id: &TxHash) -> Option<Order> {
	let mut overlay = Overlay::new(snapshot.icx);
	pallet_icx::IcxEngine::new(&mut overlay).get_order(id)
}

/// `icx_listorders`: every order, or (when `order_tx` is given) every offer
/// made against it, matching the real RPC's overload where passing an order
/// id switches the listing from orders to that order's offers.
pub fn list_orders(snapshot: &Snapshot<'_>, pagination: &Pagination<TxHash>) -> Vec<(TxHash, Order)> {
	let mut overlay = Overlay::new(snapshot.icx);
	let engine = pallet_icx::IcxEngine::new(&mut overlay);
	let mut rows = Vec::new();
	let mut skip_start = !pagination.including_start;
	engine.for_each_order(|id, order| {
		if let Some(start) = pagination.start {
			if id < start {
				return true;
			}
			if skip_start && id == start {
				skip_start = false;
				return true;
			}
		}
		rows.push((id, order.clone()));
		rows.len() < pagination.limit
	});
	pagination.take(rows)
}

/// `icx_listorders <order_tx>`: every offer made against one order.
pub fn list_offers_for_order(snapshot: &Snapshot<'_>, order_tx: &TxHash) -> Vec<(TxHash, Offer)> {
	let mut overlay = Overlay::new(snapshot.icx);
	let engine = pallet_icx::IcxEngine::new(&mut overlay);
	let mut rows = Vec::new();
	engine.for_each_offer(|id, offer| {
		if &offer.order_tx == order_tx {
			rows.push((id, offer.clone()));
		}
		true
	});
	rows
}

/// `icx_listhtlcs`: every DFC and external HTLC submitted against one offer.
pub fn list_htlcs_for_offer(snapshot: &Snapshot<'_>, offer_tx: &TxHash) -> (Vec<(TxHash, DfcHtlc)>, Vec<(TxHash, ExtHtlc)>) {
	let mut overlay = Overlay::new(snapshot.icx);
	let engine = pallet_icx::IcxEngine::new(&mut overlay);
	let mut dfc = Vec::new();
	engine.for_each_dfc_htlc(|id, htlc| {
		if &htlc.offer_tx == offer_tx {
			dfc.push((id, htlc.clone()));
		}
		true
	});
	let mut ext = Vec::new();
	engine.for_each_ext_htlc(|id, htlc| {
		if &htlc.offer_tx == offer_tx {
			ext.push((id, htlc.clone()));
		}
		true
	});
	(dfc, ext)
}

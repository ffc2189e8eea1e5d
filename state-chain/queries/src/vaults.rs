//! Vaults RPC family (§6.4): `listvaults`, `getvault`, `listauctions`,
//! `estimateloan`, `estimatecollateral`, `estimatevault`.
//!
//! `listvaulthistory`/`listauctionhistory` are omitted: they name the
//! `-acindex`-gated history index (§6.5), which this build doesn't carry a
//! queryable store for (see [`crate::QueriesError::NotIndexed`]).

use crate::{Pagination, QueriesError, Snapshot};
use core_kvstore::Overlay;
use core_primitives::{Amount, TokenId, TxHash};
use core_traits::OracleApi;
use pallet_vaults::{vault_assets, Auction, AuctionBatch, Vault, VaultAssets};
use std::collections::BTreeMap;

/// One vault's full read-model: the stored [`Vault`] plus its collateral and
/// loan maps and, when every referenced price feed is live, its valuation.
#[derive(Clone, Debug, PartialEq)]
pub struct VaultDetail {
	pub vault_id: TxHash,
	pub vault: Vault,
	pub collaterals: BTreeMap<TokenId, Amount>,
	pub loans: BTreeMap<TokenId, Amount>,
	pub assets: Option<VaultAssets>,
}

/// `listvaults`: every vault ever created, paginated by id.
pub fn list_vaults(snapshot: &Snapshot<'_>, pagination: &Pagination<TxHash>) -> Vec<(TxHash, Vault)> {
	let mut vaults_overlay = Overlay::new(snapshot.vaults);
	let ids = chain_pipeline::vault_index::all_vault_ids(&vaults_overlay);
	let engine = pallet_vaults::VaultEngine::new(&mut vaults_overlay);
	let mut rows = Vec::new();
	let mut skip_start = !pagination.including_start;
	for id in ids {
		if let Some(start) = pagination.start {
			if id < start {
				continue;
			}
			if skip_start && id == start {
				skip_start = false;
				continue;
			}
		}
		if let Some(vault) = engine.get_vault(&id) {
			rows.push((id, vault));
		}
	}
	pagination.take(rows)
}

/// `getvault`: one vault's full read-model, valued against the current
/// oracle prices when every referenced feed is live.
pub fn get_vault(snapshot: &Snapshot<'_>, vault_id: &TxHash) -> Result<VaultDetail, QueriesError> {
	let mut vaults_overlay = Overlay::new(snapshot.vaults);
	let engine = pallet_vaults::VaultEngine::new(&mut vaults_overlay);
	let vault = engine.get_vault(vault_id).ok_or(QueriesError::VaultNotFound)?;
	let collaterals = engine.collaterals(vault_id);
	let loans = engine.loans(vault_id);

	let mut oracle_overlay = Overlay::new(snapshot.oracle);
	let oracle = pallet_oracle::Oracle::new(&mut oracle_overlay);
	let mut attrs_overlay = Overlay::new(snapshot.attrs);
	let attrs = pallet_attributes::AttributeStore::new(&mut attrs_overlay);

	let assets = vault_assets(&collaterals, &loans, |token| engine.interest_row(vault_id, token), &oracle, &attrs, false, true).ok();

	Ok(VaultDetail { vault_id: *vault_id, vault, collaterals, loans, assets })
}

/// `estimatecollateral`: the vault's valuation as it stands right now, with
/// no hypothetical deposit or withdrawal applied.
pub fn estimate_collateral(snapshot: &Snapshot<'_>, vault_id: &TxHash) -> Result<VaultAssets, QueriesError> {
	Ok(get_vault(snapshot, vault_id)?.assets.ok_or(QueriesError::Vaults(pallet_vaults::VaultsError::NoLivePrice))?)
}

/// `estimatevault`: valuation of a hypothetical vault built from the given
/// collateral and loan maps, without requiring it to already exist.
pub fn estimate_vault(
	snapshot: &Snapshot<'_>,
	collaterals: &BTreeMap<TokenId, Amount>,
	loans: &BTreeMap<TokenId, Amount>,
) -> Result<VaultAssets, QueriesError> {
	let mut oracle_overlay = Overlay::new(snapshot.oracle);
	let oracle = pallet_oracle::Oracle::new(&mut oracle_overlay);
	let mut attrs_overlay = Overlay::new(snapshot.attrs);
	let attrs = pallet_attributes::AttributeStore::new(&mut attrs_overlay);
	vault_assets(collaterals, loans, |_| Default::default(), &oracle, &attrs, false, true).map_err(QueriesError::from)
}

/// `estimateloan`: the maximum additional `loan_token` borrowable against a
/// vault without breaching its scheme's `min_collateral_ratio`, given its
/// current collateral valuation.
pub fn estimate_loan(snapshot: &Snapshot<'_>, vault_id: &TxHash, loan_token: TokenId) -> Result<Amount, QueriesError> {
	let detail = get_vault(snapshot, vault_id)?;
	let assets = detail.assets.ok_or(QueriesError::Vaults(pallet_vaults::VaultsError::NoLivePrice))?;

	let mut vaults_overlay = Overlay::new(snapshot.vaults);
	let engine = pallet_vaults::VaultEngine::new(&mut vaults_overlay);
	let scheme = engine.get_scheme(&detail.vault.scheme_id).ok_or(QueriesError::SchemeNotFound)?;

	let headroom_value = assets.total_collaterals.saturating_sub(
		assets.total_loans.saturating_mul(scheme.min_collateral_ratio.max(0) as u128) / 100,
	);

	let mut oracle_overlay = Overlay::new(snapshot.oracle);
	let oracle = pallet_oracle::Oracle::new(&mut oracle_overlay);
	let mut attrs_overlay = Overlay::new(snapshot.attrs);
	let attrs = pallet_attributes::AttributeStore::new(&mut attrs_overlay);
	let pair = pallet_vaults::fixed_interval_price_pair(&attrs, loan_token).ok_or(QueriesError::Vaults(pallet_vaults::VaultsError::NoLivePrice))?;
	let price = oracle.active_price(&pair).ok_or(QueriesError::Vaults(pallet_vaults::VaultsError::NoLivePrice))?;
	if price.is_zero() {
		return Ok(Amount::ZERO);
	}

	let max_borrow = (headroom_value.saturating_mul(core_primitives::COIN as u128) / price.raw().max(1) as u128).min(i64::MAX as u128);
	Ok(Amount::from_coin_units(max_borrow as i64))
}

/// `listauctions`: every vault currently under an open auction.
pub fn list_auctions(snapshot: &Snapshot<'_>, pagination: &Pagination<TxHash>) -> Vec<(TxHash, Auction)> {
	let mut vaults_overlay = Overlay::new(snapshot.vaults);
	let ids = chain_pipeline::vault_index::all_vault_ids(&vaults_overlay);
	let engine = pallet_vaults::VaultEngine::new(&mut vaults_overlay);
	let mut rows = Vec::new();
	for id in ids {
		if pagination.start.map(|start| id < start || (id == start && !pagination.including_start)).unwrap_or(false) {
			continue;
		}
		if let Some(auction) = engine.get_auction(&id) {
			rows.push((id, auction));
		}
	}
	pagination.take(rows)
}

/// One auction's batches, in index order.
pub fn get_auction_batches(snapshot: &Snapshot<'_>, vault_id: &TxHash) -> Vec<AuctionBatch> {
	let mut vaults_overlay = Overlay::new(snapshot.vaults);
	let engine = pallet_vaults::VaultEngine::new(&mut vaults_overlay);
	let Some(auction) = engine.get_auction(vault_id) else { return Vec::new() };
	(0..auction.batch_count).filter_map(|index| engine.get_batch(vault_id, index)).collect()
}

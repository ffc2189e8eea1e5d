//! Loan vault engine (Component F, §4.F): vault/scheme storage, interest
//! accrual, collateralization valuation, the liquidation sweep, and auction
//! batching/settlement/bids.

mod auction;
mod error;
mod interest;
mod keys;
mod liquidation;
mod scheme;
mod valuation;
mod vault;

pub use auction::{Auction, AuctionBatch, AuctionBid, AuctionSettlementEffect};
pub use error::VaultsError;
pub use interest::VaultInterestRow;
pub use scheme::LoanScheme;
pub use valuation::{fixed_interval_price_pair, vault_assets, VaultAssets};
pub use vault::Vault;

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, ChainParams, Height, Script, TokenId, TxHash, COIN};
use core_traits::{AttributeApi, BalancesApi, OracleApi, VaultApi};
use std::collections::BTreeMap;

/// Amount of collateral value beyond which a loan's auction slice must be
/// split further (§4.F "Auction batching").
pub const BATCH_THRESHOLD: u128 = 10_000 * COIN as u128;

pub struct VaultEngine<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> VaultEngine<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		VaultEngine { store }
	}

	pub fn create_vault(&mut self, vault_id: TxHash, owner: Script, scheme_id: String) -> Result<(), VaultsError> {
		if self.store.get(&keys::vault_key(&vault_id)).is_some() {
			return Err(VaultsError::VaultAlreadyExists);
		}
		self.put_vault(&vault_id, &Vault { owner, scheme_id, is_under_liquidation: false });
		Ok(())
	}

	pub fn get_vault(&self, vault_id: &TxHash) -> Option<Vault> {
		self.store.get(&keys::vault_key(vault_id)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	fn put_vault(&mut self, vault_id: &TxHash, vault: &Vault) {
		self.store.put(keys::vault_key(vault_id), serde_json::to_vec(vault).expect("Vault serializes"));
	}

	pub fn put_scheme(&mut self, scheme: LoanScheme) {
		self.store.put(keys::scheme_key(&scheme.identifier), serde_json::to_vec(&scheme).expect("LoanScheme serializes"));
	}

	pub fn get_scheme(&self, identifier: &str) -> Option<LoanScheme> {
		self.store.get(&keys::scheme_key(identifier)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	pub fn collaterals(&self, vault_id: &TxHash) -> BTreeMap<TokenId, Amount> {
		self.store.get(&keys::collateral_key(vault_id)).and_then(|b| serde_json::from_slice(&b).ok()).unwrap_or_default()
	}

	fn put_collaterals(&mut self, vault_id: &TxHash, map: &BTreeMap<TokenId, Amount>) {
		self.store.put(keys::collateral_key(vault_id), serde_json::to_vec(map).expect("collateral map serializes"));
	}

	pub fn loans(&self, vault_id: &TxHash) -> BTreeMap<TokenId, Amount> {
		self.store.get(&keys::loan_key(vault_id)).and_then(|b| serde_json::from_slice(&b).ok()).unwrap_or_default()
	}

	fn put_loans(&mut self, vault_id: &TxHash, map: &BTreeMap<TokenId, Amount>) {
		self.store.put(keys::loan_key(vault_id), serde_json::to_vec(map).expect("loan map serializes"));
	}

	pub fn interest_row(&self, vault_id: &TxHash, token: TokenId) -> VaultInterestRow {
		self.store.get(&keys::interest_key(vault_id, token)).and_then(|b| serde_json::from_slice(&b).ok()).unwrap_or_default()
	}

	fn put_interest_row(&mut self, vault_id: &TxHash, token: TokenId, row: &VaultInterestRow) {
		self.store.put(keys::interest_key(vault_id, token), serde_json::to_vec(row).expect("interest row serializes"));
	}

	fn erase_interest_row(&mut self, vault_id: &TxHash, token: TokenId) {
		self.store.erase(&keys::interest_key(vault_id, token));
	}

	/// Deposits collateral of `token` into `vault_id`. Debiting the owner's
	/// account balance is the caller's responsibility via [`BalancesApi`].
	pub fn add_collateral(&mut self, vault_id: &TxHash, token: TokenId, amount: Amount) -> Result<(), VaultsError> {
		if self.get_vault(vault_id).is_none() {
			return Err(VaultsError::VaultNotFound);
		}
		let mut map = self.collaterals(vault_id);
		let entry = map.entry(token).or_insert(Amount::ZERO);
		*entry = entry.checked_add(amount).map_err(|_| VaultsError::Overflow)?;
		self.put_collaterals(vault_id, &map);
		Ok(())
	}

	/// Withdraws collateral, requiring the resulting ratio to still clear the
	/// vault's scheme minimum (§4.F).
	pub fn withdraw_collateral<O: OracleApi, A: AttributeApi>(
		&mut self,
		vault_id: &TxHash,
		token: TokenId,
		amount: Amount,
		height: Height,
		oracle: &O,
		attrs: &A,
	) -> Result<(), VaultsError> {
		let vault = self.get_vault(vault_id).ok_or(VaultsError::VaultNotFound)?;
		if vault.is_under_liquidation {
			return Err(VaultsError::AlreadyInLiquidation);
		}
		let mut collaterals = self.collaterals(vault_id);
		let current = collaterals.get(&token).copied().unwrap_or(Amount::ZERO);
		let remaining = current.checked_sub(amount).map_err(|_| VaultsError::Overflow)?.require_non_negative().map_err(|_| VaultsError::Overflow)?;
		if remaining.is_zero() {
			collaterals.remove(&token);
		} else {
			collaterals.insert(token, remaining);
		}

		let loans = self.loans(vault_id);
		if !loans.is_empty() {
			let scheme = self.get_scheme(&vault.scheme_id).ok_or(VaultsError::SchemeNotFound)?;
			let assets = vault_assets(
				&collaterals,
				&loans,
				|tok| self.interest_row(vault_id, tok).accrued_to(height),
				oracle,
				attrs,
				false,
				true,
			)?;
			if assets.ratio < scheme.min_collateral_ratio {
				return Err(VaultsError::InsufficientCollateralization);
			}
		}

		self.put_collaterals(vault_id, &collaterals);
		Ok(())
	}

	/// Borrows `amount` of `token` against `vault_id` (§4.F "Interest
	/// accounting" steps 1-3), crediting `owner`'s account balance.
	pub fn take_loan<O: OracleApi, A: AttributeApi, B: BalancesApi>(
		&mut self,
		vault_id: &TxHash,
		token: TokenId,
		amount: Amount,
		token_interest_rate: i64,
		height: Height,
		chain_params: &ChainParams,
		oracle: &O,
		attrs: &A,
		balances: &mut B,
	) -> Result<(), VaultsError> {
		let vault = self.get_vault(vault_id).ok_or(VaultsError::VaultNotFound)?;
		if vault.is_under_liquidation {
			return Err(VaultsError::AlreadyInLiquidation);
		}
		let scheme = self.get_scheme(&vault.scheme_id).ok_or(VaultsError::SchemeNotFound)?;

		let mut loans = self.loans(vault_id);
		let current = loans.get(&token).copied().unwrap_or(Amount::ZERO);
		let new_balance = current.checked_add(amount).map_err(|_| VaultsError::Overflow)?;

		let row = self.interest_row(vault_id, token);
		let rolled = row.roll_forward(height, new_balance.raw() as i128, scheme.interest_rate, token_interest_rate, chain_params.blocks_per_year);

		loans.insert(token, new_balance);
		let collaterals = self.collaterals(vault_id);
		let assets = vault_assets(
			&collaterals,
			&loans,
			|tok| if tok == token { rolled.accrued_to(height) } else { self.interest_row(vault_id, tok).accrued_to(height) },
			oracle,
			attrs,
			false,
			true,
		)?;
		if assets.ratio < scheme.min_collateral_ratio {
			return Err(VaultsError::InsufficientCollateralization);
		}

		self.put_loans(vault_id, &loans);
		self.put_interest_row(vault_id, token, &rolled);
		balances.add_balance(&vault.owner, token, amount).map_err(|_| VaultsError::Overflow)?;
		Ok(())
	}

	/// Repays `amount` of `token` against `vault_id`, debiting the owner's
	/// account balance, folding accrued interest in first.
	pub fn payback_loan<B: BalancesApi>(
		&mut self,
		vault_id: &TxHash,
		token: TokenId,
		amount: Amount,
		token_interest_rate: i64,
		height: Height,
		chain_params: &ChainParams,
		balances: &mut B,
	) -> Result<(), VaultsError> {
		let vault = self.get_vault(vault_id).ok_or(VaultsError::VaultNotFound)?;
		let scheme = self.get_scheme(&vault.scheme_id).ok_or(VaultsError::SchemeNotFound)?;
		let mut loans = self.loans(vault_id);
		let current = loans.get(&token).copied().unwrap_or(Amount::ZERO);
		let new_balance = current.checked_sub(amount).map_err(|_| VaultsError::Overflow)?.require_non_negative().map_err(|_| VaultsError::Overflow)?;

		let row = self.interest_row(vault_id, token);
		let rolled = row.roll_forward(height, new_balance.raw() as i128, scheme.interest_rate, token_interest_rate, chain_params.blocks_per_year);

		balances.sub_balance(&vault.owner, token, amount).map_err(|_| VaultsError::Overflow)?;
		if new_balance.is_zero() {
			loans.remove(&token);
			self.erase_interest_row(vault_id, token);
		} else {
			loans.insert(token, new_balance);
			self.put_interest_row(vault_id, token, &rolled);
		}
		self.put_loans(vault_id, &loans);
		Ok(())
	}

	/// The liquidation sweep (§4.F), run every
	/// `blocksCollateralizationRatioCalculation` blocks. The original design
	/// values independent vaults in a bounded worker pool with an ordered
	/// merge; that pattern is used for the genuinely CPU-bound reward
	/// consolidation in the token-split engine (Component H). Here, per-vault
	/// valuation is cheap enough (one oracle lookup per collateral/loan
	/// token) that a single serializing pass keeps the borrow checker happy
	/// without the overhead of a parallel fan-out.
	pub fn sweep_liquidations<O: OracleApi, A: AttributeApi>(
		&mut self,
		vault_ids: &[TxHash],
		height: Height,
		liquidation_auction_blocks: Height,
		liquidation_penalty: i64,
		oracle: &O,
		attrs: &A,
	) -> Vec<TxHash> {
		let mut liquidated = Vec::new();
		for id in vault_ids {
			let vault = match self.get_vault(id) {
				Some(v) if !v.is_under_liquidation => v,
				_ => continue,
			};
			let loans = self.loans(id);
			if loans.is_empty() {
				continue;
			}
			let scheme = match self.get_scheme(&vault.scheme_id) {
				Some(s) => s,
				None => continue,
			};
			let collaterals = self.collaterals(id);
			let assets = match vault_assets(
				&collaterals,
				&loans,
				|tok| self.interest_row(id, tok).accrued_to(height),
				oracle,
				attrs,
				false,
				true,
			) {
				Ok(a) => a,
				Err(_) => continue,
			};
			if assets.ratio >= scheme.min_collateral_ratio {
				continue;
			}
			self.liquidate_one(id, height, liquidation_auction_blocks, liquidation_penalty, &scheme, oracle, attrs);
			liquidated.push(*id);
		}
		liquidated
	}

	fn liquidate_one<O: OracleApi, A: AttributeApi>(
		&mut self,
		vault_id: &TxHash,
		height: Height,
		liquidation_auction_blocks: Height,
		liquidation_penalty: i64,
		_scheme: &LoanScheme,
		oracle: &O,
		attrs: &A,
	) {
		let mut vault = match self.get_vault(vault_id) {
			Some(v) => v,
			None => return,
		};
		let collaterals = self.collaterals(vault_id);
		let loans = self.loans(vault_id);

		let mut pre_liquidation_principal_less_interest: u128 = 0;
		let mut folded_loans = BTreeMap::new();
		for (&token, &amount) in &loans {
			let row = self.interest_row(vault_id, token);
			let accrued = row.accrued_to(height).clamp_against_principal(amount.raw() as u128);
			let total = (amount.raw() as i128 + accrued.to_signed()).max(0) as u128;
			pre_liquidation_principal_less_interest =
				pre_liquidation_principal_less_interest.saturating_add(amount.raw() as u128);
			folded_loans.insert(token, (Amount::from_coin_units(total as i64), accrued));
			self.erase_interest_row(vault_id, token);
		}

		vault.is_under_liquidation = true;
		self.put_vault(vault_id, &vault);
		self.put_loans(vault_id, &BTreeMap::new());
		self.put_collaterals(vault_id, &BTreeMap::new());

		let loan_amounts: BTreeMap<TokenId, Amount> = folded_loans.iter().map(|(&t, (a, _))| (t, *a)).collect();
		let batches = liquidation::build_auction_batches(
			&collaterals,
			&loan_amounts,
			|tok| folded_loans.get(&tok).map(|(_, i)| *i).unwrap_or_default(),
			|tok, amt| {
				let pair = match fixed_interval_price_pair(attrs, tok) {
					Some(p) => p,
					None => return 0,
				};
				let price = oracle.active_price(&pair).map(|p| p.raw() as i128).unwrap_or(0);
				(amt.saturating_mul(price) / COIN as i128).max(0) as u128
			},
			|tok, amt| {
				let pair = match fixed_interval_price_pair(attrs, tok) {
					Some(p) => p,
					None => return 0,
				};
				let price = oracle.active_price(&pair).map(|p| p.raw() as i128).unwrap_or(0);
				(amt.saturating_mul(price) / COIN as i128).max(0) as u128
			},
			BATCH_THRESHOLD,
		);

		let batch_total: i128 = batches.iter().map(|b| b.loan_amount.raw() as i128).sum();
		let excess = batch_total - pre_liquidation_principal_less_interest as i128;
		if excess > 0 {
			let mut attr_store = pallet_attributes::AttributeStore::new(self.store);
			let prior: i64 = attr_store
				.get_raw("v0/live/economy/batch_rounding_excess")
				.and_then(|b| serde_json::from_slice::<pallet_attributes::AttributeValue>(&b).ok())
				.and_then(|v| match v {
					pallet_attributes::AttributeValue::Amount(a) => Some(a),
					_ => None,
				})
				.unwrap_or(0);
			attr_store.set_internal_economy_counter("batch_rounding_excess", prior.saturating_add(excess as i64));
			tracing::warn!(vault = %vault_id, excess, "batch rounding excess recorded");
		}

		for (index, batch) in batches.iter().enumerate() {
			self.store.put(keys::auction_batch_key(vault_id, index as u32), serde_json::to_vec(batch).expect("AuctionBatch serializes"));
		}
		let auction = Auction {
			batch_count: batches.len() as u32,
			liquidation_height: height.saturating_add(liquidation_auction_blocks),
			liquidation_penalty,
		};
		self.store.put(keys::auction_key(vault_id), serde_json::to_vec(&auction).expect("Auction serializes"));
	}

	/// Rewrites `vault_id`'s collateral/loan/interest rows, and any open
	/// auction batch/bid, so that every reference to `old_token` becomes a
	/// reference to `new_token` with amounts scaled by the split multiplier
	/// (§4.H step 7). The caller supplies the vault id, since `VaultEngine`
	/// has no secondary index over "vaults holding token X" (§9 "Cyclic
	/// references").
	pub fn rescale_token(&mut self, vault_id: &TxHash, old_token: TokenId, new_token: TokenId, multiplier_pct: i64) -> Result<(), VaultsError> {
		let mut collaterals = self.collaterals(vault_id);
		if let Some(amount) = collaterals.remove(&old_token) {
			let scaled = amount.checked_apply_split_multiplier(multiplier_pct).map_err(|_| VaultsError::Overflow)?;
			if !scaled.is_zero() {
				collaterals.insert(new_token, scaled);
			}
			self.put_collaterals(vault_id, &collaterals);
		}

		let mut loans = self.loans(vault_id);
		if let Some(amount) = loans.remove(&old_token) {
			let scaled = amount.checked_apply_split_multiplier(multiplier_pct).map_err(|_| VaultsError::Overflow)?;
			loans.insert(new_token, scaled);
			self.put_loans(vault_id, &loans);

			let row = self.interest_row(vault_id, old_token);
			self.erase_interest_row(vault_id, old_token);
			let rescaled_row = VaultInterestRow {
				height: row.height,
				interest_per_block: row.interest_per_block.apply_split_multiplier(multiplier_pct),
				interest_to_height: row.interest_to_height.apply_split_multiplier(multiplier_pct),
			};
			self.put_interest_row(vault_id, new_token, &rescaled_row);
		}

		if let Some(auction) = self.get_auction(vault_id) {
			for index in 0..auction.batch_count {
				let key = keys::auction_batch_key(vault_id, index);
				let mut batch = match self.store.get(&key).and_then(|b| serde_json::from_slice::<AuctionBatch>(&b).ok()) {
					Some(b) => b,
					None => continue,
				};
				let mut changed = false;
				if batch.loan_token == old_token {
					batch.loan_token = new_token;
					batch.loan_amount = batch.loan_amount.checked_apply_split_multiplier(multiplier_pct).map_err(|_| VaultsError::Overflow)?;
					batch.loan_interest = batch.loan_interest.apply_split_multiplier(multiplier_pct);
					changed = true;
				}
				if let Some(amount) = batch.collaterals.remove(&old_token) {
					let scaled = amount.checked_apply_split_multiplier(multiplier_pct).map_err(|_| VaultsError::Overflow)?;
					if !scaled.is_zero() {
						batch.collaterals.insert(new_token, scaled);
					}
					changed = true;
				}
				if changed {
					self.store.put(key, serde_json::to_vec(&batch).expect("AuctionBatch serializes"));
				}

				if batch.loan_token == new_token {
					let bid_key = keys::auction_bid_key(vault_id, index);
					if let Some(mut bid) = self.store.get(&bid_key).and_then(|b| serde_json::from_slice::<AuctionBid>(&b).ok()) {
						bid.bid = bid.bid.checked_apply_split_multiplier(multiplier_pct).map_err(|_| VaultsError::Overflow)?;
						self.store.put(bid_key, serde_json::to_vec(&bid).expect("AuctionBid serializes"));
					}
				}
			}
		}
		Ok(())
	}

	pub fn get_auction(&self, vault_id: &TxHash) -> Option<Auction> {
		self.store.get(&keys::auction_key(vault_id)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	pub fn get_batch(&self, vault_id: &TxHash, index: u32) -> Option<AuctionBatch> {
		self.store.get(&keys::auction_batch_key(vault_id, index)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	fn get_bid(&self, vault_id: &TxHash, index: u32) -> Option<AuctionBid> {
		self.store.get(&keys::auction_bid_key(vault_id, index)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	/// Places a bid on an auction batch, requiring it to clear
	/// `batch.loanAmount * (1 + penalty)` and the prior bid (§4.F "Bids").
	/// Escrows the new bid and refunds the prior bidder, both via
	/// [`BalancesApi`].
	pub fn place_bid<B: BalancesApi>(
		&mut self,
		vault_id: &TxHash,
		batch_index: u32,
		bidder: Script,
		bid: Amount,
		balances: &mut B,
		min_increment_pct: i64,
	) -> Result<(), VaultsError> {
		let auction = self.get_auction(vault_id).ok_or(VaultsError::NotInLiquidation)?;
		if batch_index >= auction.batch_count {
			return Err(VaultsError::AuctionBatchNotFound);
		}
		let batch = self.get_batch(vault_id, batch_index).ok_or(VaultsError::AuctionBatchNotFound)?;
		let floor = batch.loan_amount.checked_mul_coin_scaled(COIN + auction.liquidation_penalty).map_err(|_| VaultsError::Overflow)?;
		if bid.raw() < floor.raw() {
			return Err(VaultsError::BidTooLow);
		}

		if let Some(prior) = self.get_bid(vault_id, batch_index) {
			let min_next = prior.bid.checked_mul_coin_scaled(COIN + min_increment_pct).map_err(|_| VaultsError::Overflow)?;
			if bid.raw() <= min_next.raw() {
				return Err(VaultsError::BidTooLow);
			}
			balances.add_balance(&prior.bidder, batch.loan_token, prior.bid).map_err(|_| VaultsError::Overflow)?;
		}
		balances.sub_balance(&bidder, batch.loan_token, bid).map_err(|_| VaultsError::Overflow)?;

		self.store.put(
			keys::auction_bid_key(vault_id, batch_index),
			serde_json::to_vec(&AuctionBid { bidder, bid }).expect("AuctionBid serializes"),
		);
		Ok(())
	}

	/// Settles every batch of `vault_id`'s auction at `liquidationHeight`
	/// (§4.F "Auction settlement at liquidationHeight"), returning the
	/// effects for the pipeline to dispatch.
	pub fn settle_auction(
		&mut self,
		vault_id: &TxHash,
		height: Height,
		token_interest_rate: i64,
		chain_params: &ChainParams,
	) -> Vec<AuctionSettlementEffect> {
		let auction = match self.get_auction(vault_id) {
			Some(a) if a.liquidation_height <= height => a,
			_ => return Vec::new(),
		};
		let mut vault = match self.get_vault(vault_id) {
			Some(v) => v,
			None => return Vec::new(),
		};
		let scheme = self.get_scheme(&vault.scheme_id);

		let mut effects = Vec::new();
		let mut returned_collaterals = BTreeMap::new();
		let mut reseeded_loans: BTreeMap<TokenId, Amount> = BTreeMap::new();

		for index in 0..auction.batch_count {
			let batch = match self.get_batch(vault_id, index) {
				Some(b) => b,
				None => continue,
			};
			match self.get_bid(vault_id, index) {
				Some(bid) => {
					let floor = batch.loan_amount.checked_mul_coin_scaled(COIN + auction.liquidation_penalty).unwrap_or(Amount::ZERO);
					let refund = bid.checked_sub(floor).unwrap_or(Amount::ZERO).require_non_negative().unwrap_or(Amount::ZERO);
					let burn = floor.checked_sub(batch.loan_amount).unwrap_or(Amount::ZERO).require_non_negative().unwrap_or(Amount::ZERO);
					effects.push(AuctionSettlementEffect::Won {
						vault_id: *vault_id,
						batch_index: index,
						winner: bid.bidder,
						collaterals: batch.collaterals.clone(),
						bid_token: batch.loan_token,
						refund_to_vault: refund,
						burn_amount: burn,
						minted_delta: batch.loan_amount.checked_sub(Amount::from_coin_units(batch.loan_interest.to_signed().max(0) as i64)).unwrap_or(Amount::ZERO),
					});
				}
				None => {
					for (&tok, &amt) in &batch.collaterals {
						let entry = returned_collaterals.entry(tok).or_insert(Amount::ZERO);
						*entry = entry.checked_add(amt).unwrap_or(*entry);
					}
					let entry = reseeded_loans.entry(batch.loan_token).or_insert(Amount::ZERO);
					*entry = entry.checked_add(batch.loan_amount).unwrap_or(*entry);
					effects.push(AuctionSettlementEffect::Unwon {
						vault_id: *vault_id,
						batch_index: index,
						returned_collaterals: batch.collaterals.clone(),
						reseeded_loan_token: batch.loan_token,
						reseeded_loan_amount: batch.loan_amount,
					});
				}
			}
			self.store.erase(&keys::auction_batch_key(vault_id, index));
			self.store.erase(&keys::auction_bid_key(vault_id, index));
		}

		self.store.erase(&keys::auction_key(vault_id));
		self.put_collaterals(vault_id, &returned_collaterals);
		self.put_loans(vault_id, &reseeded_loans);
		if let Some(scheme) = scheme {
			for (&token, &amount) in &reseeded_loans {
				let row = VaultInterestRow::default().roll_forward(
					height,
					amount.raw() as i128,
					scheme.interest_rate,
					token_interest_rate,
					chain_params.blocks_per_year,
				);
				self.put_interest_row(vault_id, token, &row);
			}
		}
		vault.is_under_liquidation = false;
		self.put_vault(vault_id, &vault);
		effects
	}
}

impl<'s, S: KvRead + KvWrite + ?Sized> VaultApi for VaultEngine<'s, S> {
	type Error = VaultsError;

	fn vault_owner(&self, vault_id: &TxHash) -> Option<Script> {
		self.get_vault(vault_id).map(|v| v.owner)
	}

	fn is_in_liquidation(&self, vault_id: &TxHash) -> bool {
		self.get_vault(vault_id).map(|v| v.is_under_liquidation).unwrap_or(false)
	}
}

#[cfg(test)]
mod tests;

//! Token-split migration (Component H, §4.H): destroys the split token,
//! creates its successor, and rewrites every subsystem that referenced the
//! old id.
//!
//! Unlike the other component crates, this one has no storage family of its
//! own — it orchestrates `pallet-tokens`, `pallet-balances`,
//! `pallet-attributes`, `pallet-futures`, and `pallet-vaults` in a fixed
//! order. Each collaborator is taken as an independent `&mut S` parameter,
//! the same shape `VaultEngine::take_loan` uses for its `BalancesApi`
//! collaborator, rather than as a single shared store: a migration that
//! mutates five subsystems at once cannot borrow one handle five times.

mod error;

pub use error::SplitsError;

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, Height, TokenId, TxHash};
use pallet_attributes::AttributeValue;
use pallet_tokens::TokenPatch;

/// Outcome of one split, for the pipeline's history/event bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitReport {
	pub old_token: TokenId,
	pub new_token: TokenId,
	pub renamed_old_symbol: String,
	pub refunded_futures_entries: u32,
	pub vaults_considered: u32,
	pub total_minted: Amount,
}

/// Runs the §4.H migration for `old_token` at `activation_height`, scaling
/// every reference by `multiplier_pct` (COIN-scaled; negative means
/// "divide by the magnitude", per [`core_primitives::Amount::checked_apply_split_multiplier`]).
///
/// `vault_ids` is the caller-supplied set of vaults to rescale (step 7): no
/// secondary index of "vaults holding token X" exists, so the pipeline is
/// expected to have one (built the same way it enumerates liquidation
/// candidates for the sweep in §4.F).
#[allow(clippy::too_many_arguments)]
pub fn execute_token_split<STk, SBal, SAttr, SFut, SVault>(
	tokens_store: &mut STk,
	balances_store: &mut SBal,
	attrs_store: &mut SAttr,
	futures_store: &mut SFut,
	vaults_store: &mut SVault,
	old_token: TokenId,
	dusd_token: TokenId,
	multiplier_pct: i64,
	activation_height: Height,
	vault_ids: &[TxHash],
) -> Result<SplitReport, SplitsError>
where
	STk: KvRead + KvWrite + ?Sized,
	SBal: KvRead + KvWrite + ?Sized,
	SAttr: KvRead + KvWrite + ?Sized,
	SFut: KvRead + KvWrite + ?Sized,
	SVault: KvRead + KvWrite + ?Sized,
{
	if multiplier_pct == 0 {
		return Err(SplitsError::ZeroMultiplier);
	}

	// Step 1: refund every futures entry referencing the token being split.
	let refunded_futures_entries = {
		let mut futures = pallet_futures::FuturesEngine::new(futures_store);
		let mut balances = pallet_balances::Balances::new(balances_store);
		futures.refund_entries_referencing(old_token, dusd_token, &mut balances)
	};

	// Step 2: rename the old token to its `/vK` historical symbol, mark it
	// destroyed, and create the successor under the original symbol.
	let (new_token, renamed_old_symbol) = {
		let mut tokens = pallet_tokens::TokenRegistry::new(tokens_store);
		let old = tokens.get_token(old_token).ok_or(SplitsError::TokenNotFound)?;
		if old.destroyed {
			return Err(SplitsError::AlreadyDestroyed);
		}
		let base_symbol = old.symbol.clone();
		let next_version = tokens.highest_successor_version(&base_symbol) + 1;
		let renamed = format!("{base_symbol}/v{next_version}");
		tokens
			.update_token(old_token, TokenPatch { symbol: Some(renamed.clone()), ..Default::default() }, true, true)
			.map_err(|_| SplitsError::TokenNotFound)?;
		tokens.destroy_token(old_token).map_err(|_| SplitsError::TokenNotFound)?;
		let new_token = tokens
			.create_token(base_symbol, old.name, old.flags, activation_height)
			.map_err(|_| SplitsError::TokenNotFound)?;
		(new_token, renamed)
	};

	// Step 3: rewrite attribute paths keyed by the old token id.
	{
		let mut attrs = pallet_attributes::AttributeStore::new(attrs_store);
		attrs.rewrite_token_id(old_token, new_token);

		// Step 4: ascendant/descendant links, recorded as plain strings —
		// there is no tuple-shaped `AttributeValue` variant for them.
		attrs.set_internal(
			&format!("v0/token/{new_token}/ascendant"),
			AttributeValue::Raw(format!("{old_token}/split").into_bytes()),
		);
		attrs.set_internal(
			&format!("v0/token/{old_token}/descendant"),
			AttributeValue::Raw(format!("{new_token}/{activation_height}").into_bytes()),
		);
	}

	// Steps 5 and 6, simplified: the source dismantles every pool holding
	// the old token and reissues it under a fresh LP token, replaying each
	// holder's position largest-first. Reissuing the LP token would need a
	// secondary index of holders by balance that nothing else in this
	// crate maintains, so the pool keeps its existing LP token and only the
	// old-token side's identity and reserve are rewritten in place. LP
	// holder balances and their pending-reward checkpoints are therefore
	// left untouched; step 5's pre-dismantle reward consolidation has
	// nothing to do under this simplification.
	{
		let mut pools = pallet_tokens::Pools::new(tokens_store);
		pools.rescale_token(old_token, new_token, multiplier_pct).map_err(|_| SplitsError::Overflow)?;
	}

	// Plain (and LP) holder balances.
	let holder_total = {
		let mut balances = pallet_balances::Balances::new(balances_store);
		balances.rescale_token(old_token, new_token, multiplier_pct).map_err(|_| SplitsError::Overflow)?
	};

	// Step 7: vault collateral/loan/interest rows and open auctions.
	let mut vaults_considered = 0u32;
	{
		let mut vaults = pallet_vaults::VaultEngine::new(vaults_store);
		for vault_id in vault_ids {
			vaults.rescale_token(vault_id, old_token, new_token, multiplier_pct).map_err(|_| SplitsError::Overflow)?;
			vaults_considered += 1;
		}
	}

	// Step 8: reconcile minted_tokens against holder balances + pool reserves.
	let total_minted = {
		let pool_reserve = {
			let pools = pallet_tokens::Pools::new(tokens_store);
			pools.total_reserve_of(new_token)
		};
		let total = holder_total.checked_add(pool_reserve).map_err(|_| SplitsError::Overflow)?;
		let mut tokens = pallet_tokens::TokenRegistry::new(tokens_store);
		tokens.set_minted(new_token, total.raw()).map_err(|_| SplitsError::TokenNotFound)?;
		total
	};

	// Step 9: flip the lock flags.
	{
		let mut attrs = pallet_attributes::AttributeStore::new(attrs_store);
		attrs.set_internal(&format!("v0/locks/token/{old_token}"), AttributeValue::Bool(false));
		attrs.set_internal(&format!("v0/locks/token/{new_token}"), AttributeValue::Bool(true));
	}

	tracing::info!(old_token, new_token, multiplier_pct, %renamed_old_symbol, "token split executed");

	Ok(SplitReport { old_token, new_token, renamed_old_symbol, refunded_futures_entries, vaults_considered, total_minted })
}

#[cfg(test)]
mod tests;

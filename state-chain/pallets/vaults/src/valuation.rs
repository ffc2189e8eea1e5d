use crate::error::VaultsError;
use core_primitives::{Amount, CurrencyPair, InterestAmount, TokenId, COIN};
use core_traits::{AttributeApi, OracleApi};
use std::collections::BTreeMap;

/// The resolved `(token, currency)` an oracle-priced token is linked to, read
/// from `token/<id>/fixed_interval_price_id` (§4.E, §4.F).
pub fn fixed_interval_price_pair<A: AttributeApi>(attrs: &A, token_id: TokenId) -> Option<CurrencyPair> {
	let raw = attrs.get_raw(&format!("v0/token/{token_id}/fixed_interval_price_id"))?;
	let value: pallet_attributes::AttributeValue = serde_json::from_slice(&raw).ok()?;
	match value {
		pallet_attributes::AttributeValue::Raw(bytes) => {
			let text = std::str::from_utf8(&bytes).ok()?;
			let (token, currency) = text.split_once('/')?;
			Some(CurrencyPair::new(token.to_string(), currency.to_string()))
		}
		_ => None,
	}
}

fn collateral_factor<A: AttributeApi>(attrs: &A, token_id: TokenId) -> i64 {
	attrs
		.get_raw(&format!("v0/token/{token_id}/loan_collateral_factor"))
		.and_then(|bytes| serde_json::from_slice::<pallet_attributes::AttributeValue>(&bytes).ok())
		.and_then(|value| match value {
			pallet_attributes::AttributeValue::Percentage(pct) => Some(pct),
			_ => None,
		})
		.unwrap_or(COIN)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VaultAssets {
	pub total_collaterals: u128,
	pub total_loans: u128,
	/// `totalCollaterals * 100 / totalLoans`, `0` if there are no loans.
	pub ratio: i64,
}

/// `vault_assets` (§4.F): values a vault's collateral and loan maps against
/// oracle prices, optionally requiring every referenced feed to be live and
/// optionally pricing collaterals off the not-yet-rotated `next` slot.
pub fn vault_assets<O: OracleApi, A: AttributeApi>(
	collaterals: &BTreeMap<TokenId, Amount>,
	loans: &BTreeMap<TokenId, Amount>,
	interest_at: impl Fn(TokenId) -> InterestAmount,
	oracle: &O,
	attrs: &A,
	use_next_price: bool,
	require_live: bool,
) -> Result<VaultAssets, VaultsError> {
	let mut total_collaterals: u128 = 0;
	for (&token_id, &amount) in collaterals {
		let pair = fixed_interval_price_pair(attrs, token_id).ok_or(VaultsError::NoLivePrice)?;
		if require_live && !oracle.is_live(&pair, 0) {
			return Err(VaultsError::NoLivePrice);
		}
		let price = if use_next_price { oracle.next_price(&pair).or_else(|| oracle.active_price(&pair)) } else { oracle.active_price(&pair) }
			.ok_or(VaultsError::NoLivePrice)?;
		let factor = collateral_factor(attrs, token_id);
		let value = (amount.raw() as i128) * (price.raw() as i128) / COIN as i128;
		let value = value * factor as i128 / COIN as i128;
		total_collaterals = total_collaterals.saturating_add(value.max(0) as u128);
	}

	let mut total_loans: u128 = 0;
	for (&token_id, &amount) in loans {
		let pair = fixed_interval_price_pair(attrs, token_id).ok_or(VaultsError::NoLivePrice)?;
		if require_live && !oracle.is_live(&pair, 0) {
			return Err(VaultsError::NoLivePrice);
		}
		let price = oracle.active_price(&pair).ok_or(VaultsError::NoLivePrice)?;
		let interest = interest_at(token_id).to_signed();
		let total_amount = amount.raw() as i128 + interest;
		let value = total_amount * (price.raw() as i128) / COIN as i128;
		total_loans = total_loans.saturating_add(value.max(0) as u128);
	}

	let ratio = if total_loans == 0 { 0 } else { (total_collaterals.saturating_mul(100) / total_loans) as i64 };

	Ok(VaultAssets { total_collaterals, total_loans, ratio })
}

use crate::auction::AuctionBatch;
use core_primitives::{Amount, InterestAmount, TokenId};
use std::collections::BTreeMap;

/// Splits a liquidated vault's collateral and loan maps into auction batches
/// (§4.F "Auction batching"). Loans are processed in ascending `TokenId`
/// order for determinism; each loan's collateral chunk is sliced into at
/// most `batch_threshold`-sized pieces, and any rounding residual left after
/// integer division is handed out one unit at a time to the batches holding
/// that collateral, in the order they were created.
pub fn build_auction_batches(
	collaterals: &BTreeMap<TokenId, Amount>,
	loans: &BTreeMap<TokenId, Amount>,
	loan_interest: impl Fn(TokenId) -> InterestAmount,
	collateral_value_of: impl Fn(TokenId, i128) -> u128,
	loan_value_of: impl Fn(TokenId, i128) -> u128,
	batch_threshold: u128,
) -> Vec<AuctionBatch> {
	if loans.is_empty() || collaterals.is_empty() {
		return Vec::new();
	}

	let total_loan_value: u128 =
		loans.iter().map(|(&tok, &amt)| loan_value_of(tok, amt.raw() as i128)).sum();
	if total_loan_value == 0 {
		return Vec::new();
	}
	let total_collateral_value: u128 =
		collaterals.iter().map(|(&tok, &amt)| collateral_value_of(tok, amt.raw() as i128)).sum();

	let mut batches: Vec<AuctionBatch> = Vec::new();

	for (&loan_token, &loan_amount) in loans {
		let this_loan_value = loan_value_of(loan_token, loan_amount.raw() as i128);
		let collateral_chunk_value = total_collateral_value.saturating_mul(this_loan_value) / total_loan_value;
		let slice_count = if batch_threshold == 0 {
			1
		} else {
			collateral_chunk_value.div_ceil(batch_threshold).max(1)
		};

		let interest = loan_interest(loan_token);
		let base_amount = loan_amount.raw() / slice_count as i64;
		let base_interest = InterestAmount::from_signed(interest.to_signed() / slice_count as i128);
		let mut remaining_amount = loan_amount.raw();
		let mut remaining_interest = interest;

		let first_batch_index = batches.len();
		for slice in 0..slice_count {
			let is_last = slice + 1 == slice_count;
			let slice_amount = if is_last { remaining_amount } else { base_amount };
			let slice_interest = if is_last { remaining_interest } else { base_interest };
			remaining_amount -= slice_amount;
			remaining_interest = remaining_interest.sub(slice_interest);

			let mut slice_collaterals = BTreeMap::new();
			for (&coll_token, &coll_amount) in collaterals {
				let share = (coll_amount.raw() as i128).saturating_mul(this_loan_value as i128)
					/ (total_loan_value as i128 * slice_count as i128);
				if share != 0 {
					slice_collaterals.insert(coll_token, Amount::from_coin_units(share as i64));
				}
			}

			batches.push(AuctionBatch {
				loan_token,
				loan_amount: Amount::from_coin_units(slice_amount),
				loan_interest: slice_interest,
				collaterals: slice_collaterals,
			});
		}

		// Distribute the per-collateral rounding residual (the amount lost
		// to integer division above) one unit at a time across this loan's
		// batches, in creation order.
		for (&coll_token, &coll_amount) in collaterals {
			let distributed: i64 = batches[first_batch_index..]
				.iter()
				.filter_map(|b| b.collaterals.get(&coll_token))
				.map(|a| a.raw())
				.sum();
			let owed_for_this_loan = (coll_amount.raw() as i128).saturating_mul(this_loan_value as i128)
				/ total_loan_value as i128;
			let mut residual = (owed_for_this_loan as i64).saturating_sub(distributed);
			let mut i = first_batch_index;
			while residual > 0 && !batches.is_empty() {
				let entry = batches[i % batches.len().max(first_batch_index + 1)]
					.collaterals
					.entry(coll_token)
					.or_insert(Amount::ZERO);
				*entry = *entry + Amount::from_coin_units(1);
				residual -= 1;
				i += 1;
				if i > first_batch_index + slice_count as usize * 4 {
					// Unrecoverable residual: attach to the first batch and move on.
					let entry = batches[first_batch_index].collaterals.entry(coll_token).or_insert(Amount::ZERO);
					*entry = *entry + Amount::from_coin_units(residual);
					break;
				}
			}
		}
	}

	batches
}

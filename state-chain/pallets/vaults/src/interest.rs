use core_primitives::{Height, InterestAmount};
use serde::{Deserialize, Serialize};

/// `VaultInterest(vaultId, tokenId)` (§3.5). The invariant
/// `TotalInterest(v, t, h) = interest_to_height + max(0, h - height) *
/// interest_per_block` is evaluated by [`accrued_to`] rather than stored
/// eagerly, so reads never need a write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultInterestRow {
	pub height: Height,
	pub interest_per_block: InterestAmount,
	pub interest_to_height: InterestAmount,
}

impl VaultInterestRow {
	pub fn accrued_to(&self, now: Height) -> InterestAmount {
		let blocks = now.saturating_sub(self.height) as i128;
		let delta = self.interest_per_block.to_signed().saturating_mul(blocks);
		self.interest_to_height.add(InterestAmount::from_signed(delta))
	}

	/// Folds the accrual up to `now` into `interest_to_height` and reseeds
	/// `interest_per_block` from the current balance and rate (§4.F step 2).
	pub fn roll_forward(&self, now: Height, balance: i128, scheme_rate: i64, token_rate: i64, blocks_per_year: u32) -> Self {
		VaultInterestRow {
			height: now,
			interest_to_height: self.accrued_to(now),
			interest_per_block: InterestAmount::per_block(balance, scheme_rate, token_rate, blocks_per_year),
		}
	}
}

use core_primitives::Height;
use serde::{Deserialize, Serialize};

/// A named loan scheme (§3.5). `min_collateral_ratio` is a plain percentage
/// (150 means 150%, not COIN-scaled) to match the chain's historical RPC
/// shape; `interest_rate` is COIN-scaled annual percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoanScheme {
	pub identifier: String,
	pub min_collateral_ratio: i64,
	pub interest_rate: i64,
	pub activation_height: Option<Height>,
	pub deleted_at: Option<Height>,
}

impl LoanScheme {
	pub fn is_active_at(&self, height: Height) -> bool {
		let after_activation = self.activation_height.map(|h| height >= h).unwrap_or(true);
		let before_deletion = self.deleted_at.map(|h| height < h).unwrap_or(true);
		after_activation && before_deletion
	}
}

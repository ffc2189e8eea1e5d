use core_primitives::Script;
use serde::{Deserialize, Serialize};

/// A loan vault (§3.5). Collateral and loan balances live in their own
/// per-vault maps rather than inline here, mirroring how `Balances` is kept
/// separate from the token registry in Component C.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vault {
	pub owner: Script,
	pub scheme_id: String,
	pub is_under_liquidation: bool,
}

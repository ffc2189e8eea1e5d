use core_primitives::{Amount, InterestAmount, Script, TokenId, TxHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Auction {
	pub batch_count: u32,
	pub liquidation_height: core_primitives::Height,
	pub liquidation_penalty: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuctionBatch {
	pub loan_token: TokenId,
	pub loan_amount: Amount,
	pub loan_interest: InterestAmount,
	pub collaterals: BTreeMap<TokenId, Amount>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionBid {
	pub bidder: Script,
	pub bid: Amount,
}

/// The economic outcome of settling one auction batch (§4.F "Auction
/// settlement"). Vaults computes the amounts; dispatching the described
/// token moves through the AMM and adjusting `minted_tokens` is the
/// pipeline's job, the same split used for `AttributeEffect` in Component E.
#[derive(Clone, Debug, PartialEq)]
pub enum AuctionSettlementEffect {
	Won {
		vault_id: TxHash,
		batch_index: u32,
		winner: Script,
		collaterals: BTreeMap<TokenId, Amount>,
		bid_token: TokenId,
		/// Bid amount routed back to the vault as collateral via an
		/// auto-swap into native coin.
		refund_to_vault: Amount,
		/// `penalty + interest` portion, auto-swapped into native or
		/// stablecoin and burned.
		burn_amount: Amount,
		/// `minted_tokens(loan_token)` decrement: `loanAmount - loanInterest`.
		minted_delta: Amount,
	},
	Unwon {
		vault_id: TxHash,
		batch_index: u32,
		returned_collaterals: BTreeMap<TokenId, Amount>,
		reseeded_loan_token: TokenId,
		reseeded_loan_amount: Amount,
	},
}

use core_primitives::{Amount, TokenId};
use serde::{Deserialize, Serialize};

/// `TokenFuturesEntry` (§3.6): a queued intent to convert `source_amount` of
/// `source_token` into `destination_token` at the next settlement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenFuturesEntry {
	pub source_token: TokenId,
	pub source_amount: Amount,
	pub destination_token: TokenId,
}

/// `DUSDFuturesEntry` (§3.6): a queued DFI-style native-coin-in intent,
/// destined for DUSD at settlement. Value is the escrowed amount of the
/// native coin; the destination (DUSD) is implicit to the queue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DUSDFuturesEntry {
	pub source_amount: Amount,
}

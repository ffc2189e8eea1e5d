//! Trait interfaces at the seams between components. Each pallet crate
//! implements the traits for the state it owns and consumes the traits of
//! its collaborators as a generic bound, so e.g. the vault engine can be
//! built and tested against an in-memory pool/oracle double without
//! depending on their concrete storage layout.

use core_primitives::{Amount, ChainParams, CurrencyPair, ErrorKind, Height, Script, TokenId, TxHash};

/// Balance ledger access (Component B). Implemented by `pallet-balances`.
pub trait BalancesApi {
	type Error: ErrorKind;

	fn get_balance(&self, owner: &Script, token: TokenId) -> Amount;

	/// Credits `owner`'s balance. Must never leave the ledger negative.
	fn add_balance(&mut self, owner: &Script, token: TokenId, amount: Amount) -> Result<(), Self::Error>;

	/// Debits `owner`'s balance. Fails if `amount` exceeds the current
	/// balance (I-B1: balances are never negative).
	fn sub_balance(&mut self, owner: &Script, token: TokenId, amount: Amount) -> Result<(), Self::Error>;
}

/// Token registry and AMM pool access (Component C). Implemented by
/// `pallet-tokens`.
pub trait PoolApi {
	type Error: ErrorKind;

	fn pool_exists(&self, pair: &CurrencyPair) -> bool;

	/// Current reserves of a pool, in (token, currency) order.
	fn pool_reserves(&self, pair: &CurrencyPair) -> Option<(Amount, Amount)>;

	/// Quotes (does not execute) a swap of `amount_in` of `pair.token` for
	/// `pair.currency`, applying the pool's trading fee.
	fn quote_swap(&self, pair: &CurrencyPair, amount_in: Amount) -> Result<Amount, Self::Error>;

	/// Executes a swap, crediting `recipient` and updating reserves.
	fn execute_swap(
		&mut self,
		pair: &CurrencyPair,
		recipient: &Script,
		amount_in: Amount,
	) -> Result<Amount, Self::Error>;

	/// The LP token id for a pool, used to key `PoolShare` rows in the
	/// balances ledger.
	fn lp_token_id(&self, pair: &CurrencyPair) -> Option<TokenId>;

	/// The pool's current cumulative reward-per-share index (§4.C), against
	/// which a share's `last_index` checkpoint is compared.
	fn cumulative_reward_index(&self, lp_token: TokenId) -> Amount;
}

/// Oracle-derived pricing (Component D). Implemented by `pallet-oracle`.
pub trait OracleApi {
	type Error: ErrorKind;

	/// The active fixed-interval price for `pair`, or `None` if the feed is
	/// not live (no aggregated price has rotated in within the liveness
	/// window).
	fn active_price(&self, pair: &CurrencyPair) -> Option<Amount>;

	/// The not-yet-rotated-in price, used by vault valuation when
	/// `useNextPrice` is requested. `None` if no next price has been
	/// produced for this interval.
	fn next_price(&self, _pair: &CurrencyPair) -> Option<Amount> {
		None
	}

	fn is_live(&self, pair: &CurrencyPair, at_height: Height) -> bool;
}

/// Governance attribute store access (Component E). Implemented by
/// `pallet-attributes`.
pub trait AttributeApi {
	type Error: ErrorKind;

	fn get_raw(&self, path: &str) -> Option<Vec<u8>>;

	fn get_bool(&self, path: &str) -> bool {
		self.get_raw(path).map(|v| v == [1]).unwrap_or(false)
	}
}

/// Loan vault access (Component F). Implemented by `pallet-vaults`.
pub trait VaultApi {
	type Error: ErrorKind;

	fn vault_owner(&self, vault_id: &TxHash) -> Option<Script>;

	/// True once a vault's collateral ratio has fallen at or below its
	/// scheme's liquidation threshold and an auction has been opened.
	fn is_in_liquidation(&self, vault_id: &TxHash) -> bool;
}

/// Token futures / DUSD futures queues (Component G). Implemented by
/// `pallet-futures`.
pub trait FuturesApi {
	type Error: ErrorKind;

	fn pending_settlement_value(&self, owner: &Script, token: TokenId) -> Amount;
}

/// Chain-wide parameters, resolved once per block and threaded into every
/// component that needs a fork height or interval length.
pub trait ChainParamsApi {
	fn chain_params(&self) -> &ChainParams;
}

/// Authorization queries over the enclosing UTXO transaction's inputs (§1:
/// an out-of-scope collaborator referenced by interface). The transaction
/// applier (§4.J step 2) uses this to check the auth-set each message type
/// names, without needing to know how inputs resolve to owning scripts.
pub trait UtxoView {
	/// True if `owner` controls the transaction's first input, the
	/// conventional signer for single-party messages.
	fn is_input_owner(&self, owner: &Script) -> bool;

	/// True if the input at `index` is controlled by `owner`, for messages
	/// that name a second authorizing party (e.g. a vault's collateral
	/// owner at input 1).
	fn is_owner_at(&self, index: u32, owner: &Script) -> bool;

	/// True if the transaction carries a foundation-quorum majority of
	/// signatures from `members`.
	fn has_foundation_quorum(&self, members: &std::collections::BTreeSet<Script>) -> bool;
}

/// Sink for read-model events emitted while applying a block, consumed by
/// `chain-queries` to answer RPC-shaped questions without re-deriving them
/// from the KV store on every call.
pub trait HistoryWriter {
	fn record(&mut self, event: HistoryEvent);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryEvent {
	BalanceChanged { owner: Script, token: TokenId, new_balance: Amount },
	VaultLiquidated { vault_id: TxHash, batch_count: u32 },
	AuctionSettled { vault_id: TxHash, batch_index: u32, winner: Script },
	SwapExecuted { pair: CurrencyPair, amount_in: Amount, amount_out: Amount },
}

/// No-op sink, used by crates that don't need read-model history in tests.
#[derive(Default)]
pub struct NullHistory;

impl HistoryWriter for NullHistory {
	fn record(&mut self, _event: HistoryEvent) {}
}

//! Primitive types shared across every consensus component (§3.1 of the spec).

pub mod amount;
pub mod interest;
pub mod script;

pub use amount::Amount;
pub use interest::InterestAmount;
pub use script::Script;

use codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A token identifier. `0` is the native chain coin; `u32::MAX` is the
/// composite reward-pool wildcard ("all-ones" per §3.1).
pub type TokenId = u32;

/// The native chain coin.
pub const NATIVE_TOKEN_ID: TokenId = 0;

/// The composite reward-pool wildcard token id ("all-ones").
pub const ALL_TOKENS_WILDCARD: TokenId = TokenId::MAX;

/// User-created tokens start here; everything below is reserved.
pub const DCT_ID_START: TokenId = 128;

/// Fixed-point scale for [`Amount`]: 8 decimal places.
pub const COIN: i64 = 100_000_000;

/// A cent, i.e. `COIN / 100`, used for percentage-as-fixed-point values.
pub const CENT: i64 = COIN / 100;

/// Minimum liquidity permanently locked in a pool on first deposit (§4.C).
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Maximum byte length of a currency/token symbol (§3.1).
pub const MAX_SYMBOL_LENGTH: usize = 8;

/// Block height. `0` is genesis.
pub type Height = u32;

/// Unix timestamp, seconds.
pub type Timestamp = u64;

/// A 256-bit transaction hash, used as a [`crate::VaultId`] and as a
/// transaction reference throughout the account-history and auction APIs.
#[derive(
	Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Encode, Decode, Serialize, Deserialize,
)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
	pub const fn zero() -> Self {
		TxHash([0u8; 32])
	}
}

impl std::fmt::Display for TxHash {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for byte in self.0.iter().rev() {
			write!(f, "{:02x}", byte)?;
		}
		Ok(())
	}
}

/// A vault is identified by the hash of the transaction that created it.
pub type VaultId = TxHash;

/// Two short symbols identifying an oracle-priced pair, e.g. `(DFI, USD)`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Encode, Decode, Serialize, Deserialize)]
pub struct CurrencyPair {
	pub token: String,
	pub currency: String,
}

impl CurrencyPair {
	pub fn new(token: impl Into<String>, currency: impl Into<String>) -> Self {
		Self { token: token.into(), currency: currency.into() }
	}
}

impl std::fmt::Display for CurrencyPair {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.token, self.currency)
	}
}

/// Chain-wide parameters consumed by the core (§6.5). Loaded once at startup
/// by the embedder; nothing in the consensus crates mutates this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
	pub blocks_per_day: u32,
	pub blocks_per_year: u32,
	pub blocks_per_price_interval: u32,
	pub blocks_collateral_auction: u32,
	pub blocks_collateralization_ratio_calculation: u32,
	/// Monotonic fork-height schedule, keyed by fork name.
	pub fork_heights: std::collections::BTreeMap<String, Height>,
}

impl ChainParams {
	pub fn fork_height(&self, name: &str) -> Height {
		self.fork_heights.get(name).copied().unwrap_or(0)
	}

	pub fn is_active(&self, name: &str, height: Height) -> bool {
		height >= self.fork_height(name)
	}
}

impl Default for ChainParams {
	fn default() -> Self {
		// Conservative defaults suitable for tests and for a freshly
		// initialised regtest-style chain: all forks active from genesis.
		Self {
			blocks_per_day: 2880,
			blocks_per_year: 2880 * 365,
			blocks_per_price_interval: 120,
			blocks_collateral_auction: 120,
			blocks_collateralization_ratio_calculation: 120,
			fork_heights: Default::default(),
		}
	}
}

/// Named fork heights used by the block event pipeline (§4.I).
pub mod forks {
	pub const EUNOS: &str = "eunos";
	pub const FORTCANNING: &str = "fortcanning";
	pub const GRAND_CENTRAL: &str = "grand_central";
	pub const DAKOTA: &str = "dakota";
}

/// Community accounts that fund pool rewards (supplemented from
/// `original_source/src/masternodes/validation.cpp`'s `CommunityAccountType`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Encode, Decode, Serialize, Deserialize)]
pub enum CommunityAccountType {
	IncentiveFunding,
	Loan,
	Options,
	Unallocated,
}

/// The five-kind error taxonomy from §7, implemented as a trait so each
/// crate's own error enum can report which kind it is without every caller
/// matching on every concrete variant.
pub trait ErrorKind {
	fn kind(&self) -> Kind;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
	Parse,
	Validation,
	Authorization,
	Liveness,
	Fatal,
	Internal,
}

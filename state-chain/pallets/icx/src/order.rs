use core_primitives::{Amount, Height, Script, TokenId, TxHash};
use serde::{Deserialize, Serialize};

/// Default order expiry, in blocks, when the caller omits `expiry` (§3.7,
/// `rpc_icxorderbook.cpp`'s `icx_createorder` default).
pub const DEFAULT_ORDER_EXPIRY: u32 = 2880;
/// Minimum (and default) offer expiry, in blocks.
pub const DEFAULT_OFFER_EXPIRY: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
	/// Selling a DFC token (`idToken`) for an asset on `chain`.
	Internal,
	/// Buying a DFC token (`idToken`) using an asset from `chain`.
	External,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
	Open,
	Closed,
	Filled,
	Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
	Open,
	Closed,
	Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HtlcStatus {
	Open,
	Claimed,
	Refunded,
}

/// `Order` (§3.7): one side of a cross-chain swap, `idToken` always naming
/// the DFC-side token regardless of which direction it flows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
	pub order_type: OrderType,
	pub id_token: TokenId,
	pub chain: String,
	pub owner_address: Script,
	pub amount_from: Amount,
	pub amount_to_fill: Amount,
	pub order_price: Amount,
	pub creation_height: Height,
	pub expiry: u32,
	pub close_tx: Option<TxHash>,
	pub close_height: Option<Height>,
	pub status: OrderStatus,
}

impl Order {
	pub fn expire_height(&self) -> Height {
		self.creation_height + self.expiry
	}
}

/// A taker's commitment against an `Order`. For an [`OrderType::External`]
/// order the taker (`owner_address`) escrows `amount` of the order's
/// `id_token` up front, since they are the DFC-token holder in that
/// direction; for [`OrderType::Internal`] orders the DFC side is already
/// held in the order's own escrow and this record only carries the
/// taker's receive destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
	pub order_tx: TxHash,
	pub amount: Amount,
	pub owner_address: Script,
	pub receive_destination: Vec<u8>,
	pub taker_fee: Amount,
	pub creation_height: Height,
	pub expiry: u32,
	pub status: OfferStatus,
}

impl Offer {
	pub fn expire_height(&self) -> Height {
		self.creation_height + self.expiry
	}
}

/// `SubmitDfcHtlc` (§3.7): a hash-timelocked escrow on the DFC side,
/// released either by revealing the preimage of `hash` or, past
/// `refund_height`, by timeout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DfcHtlc {
	pub offer_tx: TxHash,
	pub amount: Amount,
	pub receive_address: Script,
	pub receive_pubkey: Option<Vec<u8>>,
	pub hash: TxHash,
	pub timeout: u32,
	pub creation_height: Height,
	pub status: HtlcStatus,
}

impl DfcHtlc {
	pub fn refund_height(&self) -> Height {
		self.creation_height + self.timeout
	}
}

/// `SubmitExtHtlc` (§3.7): recorded evidence of the matching lock on the
/// external chain. `chain` is out of scope as a collaborator (§1), so this
/// is bookkeeping only; no balance on this chain moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtHtlc {
	pub offer_tx: TxHash,
	pub amount: Amount,
	pub receive_address: Script,
	pub hash: TxHash,
	pub htlc_script_address: String,
	pub owner_pubkey: Vec<u8>,
	pub timeout: u32,
	pub creation_height: Height,
}

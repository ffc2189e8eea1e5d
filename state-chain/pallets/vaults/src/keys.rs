use core_primitives::{TokenId, TxHash};

const VAULT_PREFIX: &[u8] = b"vault/v/";
const COLLATERAL_PREFIX: &[u8] = b"vault/coll/";
const LOAN_PREFIX: &[u8] = b"vault/loan/";
const INTEREST_PREFIX: &[u8] = b"vault/interest/";
const SCHEME_PREFIX: &[u8] = b"vault/scheme/";
pub const AUCTION_PREFIX: &[u8] = b"vault/auction/";
pub const AUCTION_BATCH_PREFIX: &[u8] = b"vault/auction_batch/";
const AUCTION_BID_PREFIX: &[u8] = b"vault/auction_bid/";

pub fn vault_key(id: &TxHash) -> Vec<u8> {
	[VAULT_PREFIX, &id.0].concat()
}

pub fn collateral_key(id: &TxHash) -> Vec<u8> {
	[COLLATERAL_PREFIX, &id.0].concat()
}

pub fn loan_key(id: &TxHash) -> Vec<u8> {
	[LOAN_PREFIX, &id.0].concat()
}

pub fn interest_key(id: &TxHash, token: TokenId) -> Vec<u8> {
	[INTEREST_PREFIX, &id.0, &token.to_be_bytes()].concat()
}

pub fn interest_prefix(id: &TxHash) -> Vec<u8> {
	[INTEREST_PREFIX, &id.0].concat()
}

pub fn scheme_key(identifier: &str) -> Vec<u8> {
	[SCHEME_PREFIX, identifier.as_bytes()].concat()
}

pub fn auction_key(id: &TxHash) -> Vec<u8> {
	[AUCTION_PREFIX, &id.0].concat()
}

pub fn auction_batch_key(id: &TxHash, index: u32) -> Vec<u8> {
	[AUCTION_BATCH_PREFIX, &id.0, &index.to_be_bytes()].concat()
}

pub fn auction_batch_prefix(id: &TxHash) -> Vec<u8> {
	[AUCTION_BATCH_PREFIX, &id.0].concat()
}

pub fn auction_bid_key(id: &TxHash, index: u32) -> Vec<u8> {
	[AUCTION_BID_PREFIX, &id.0, &index.to_be_bytes()].concat()
}

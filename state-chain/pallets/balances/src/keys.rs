//! Key encoding for balance and pool-share rows.
//!
//! Rows are grouped `(owner, tokenId)`: owner bytes are length-prefixed so
//! that distinct owners never share a byte-ordered prefix, then the token
//! id follows big-endian so rows for one owner sort by token id.

use core_primitives::{Script, TokenId};

pub const BALANCE_PREFIX: &[u8] = b"bal/";
const POOL_SHARE_PREFIX: &[u8] = b"poolshare/";

fn owner_key_part(owner: &Script) -> Vec<u8> {
	let bytes = owner.as_bytes();
	let mut out = Vec::with_capacity(4 + bytes.len());
	out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
	out.extend_from_slice(bytes);
	out
}

pub fn balance_key(owner: &Script, token: TokenId) -> Vec<u8> {
	let mut key = BALANCE_PREFIX.to_vec();
	key.extend_from_slice(&owner_key_part(owner));
	key.extend_from_slice(&token.to_be_bytes());
	key
}

pub fn decode_balance_key(key: &[u8]) -> Option<(Script, TokenId)> {
	let rest = key.strip_prefix(BALANCE_PREFIX)?;
	let len = u32::from_be_bytes(rest.get(0..4)?.try_into().ok()?) as usize;
	let owner_bytes = rest.get(4..4 + len)?;
	let token_bytes = rest.get(4 + len..4 + len + 4)?;
	Some((Script::from_bytes(owner_bytes.to_vec()), TokenId::from_be_bytes(token_bytes.try_into().ok()?)))
}

pub fn pool_share_key(owner: &Script, lp_token: TokenId) -> Vec<u8> {
	let mut key = POOL_SHARE_PREFIX.to_vec();
	key.extend_from_slice(&owner_key_part(owner));
	key.extend_from_slice(&lp_token.to_be_bytes());
	key
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn balance_key_round_trips() {
		let owner = Script::from_bytes(b"abc".to_vec());
		let key = balance_key(&owner, 7);
		assert_eq!(decode_balance_key(&key), Some((owner, 7)));
	}
}

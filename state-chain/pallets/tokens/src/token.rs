//! Token registry (§4.C "Token operations").

use crate::keys::{token_by_id_key, token_by_symbol_key, NEXT_TOKEN_ID_KEY};
use crate::TokensError;
use core_kvstore::{KvRead, KvWrite};
use core_primitives::{TokenId, DCT_ID_START, MAX_SYMBOL_LENGTH};
use serde::{Deserialize, Serialize};

/// Flags a token may carry. `DAT` marks a "decentralized asset token"
/// created through governance rather than directly by a user; `LPS` marks
/// an LP token minted by pool creation; `Tradeable` gates swap eligibility;
/// `Finalized` locks the symbol/name against further mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFlags {
	pub dat: bool,
	pub lps: bool,
	pub tradeable: bool,
	pub finalized: bool,
	pub mintable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	pub symbol: String,
	pub name: String,
	pub flags: TokenFlags,
	pub creation_height: u32,
	pub minted: i64,
	pub destroyed: bool,
}

/// A patch applied by `update_token`; `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct TokenPatch {
	pub symbol: Option<String>,
	pub name: Option<String>,
	pub tradeable: Option<bool>,
	pub finalized: Option<bool>,
	pub mintable: Option<bool>,
}

pub struct TokenRegistry<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> TokenRegistry<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		TokenRegistry { store }
	}

	fn next_token_id(&mut self) -> TokenId {
		let next = self
			.store
			.get(NEXT_TOKEN_ID_KEY)
			.and_then(|b| b.try_into().ok())
			.map(|raw: [u8; 4]| TokenId::from_be_bytes(raw))
			.unwrap_or(DCT_ID_START);
		self.store.put(NEXT_TOKEN_ID_KEY.to_vec(), (next + 1).to_be_bytes().to_vec());
		next
	}

	pub fn get_token(&self, id: TokenId) -> Option<Token> {
		self.store.get(&token_by_id_key(id)).and_then(|bytes| serde_json::from_slice(&bytes).ok())
	}

	pub fn get_token_by_symbol(&self, symbol: &str) -> Option<(TokenId, Token)> {
		let id_bytes = self.store.get(&token_by_symbol_key(symbol))?;
		let id = TokenId::from_be_bytes(id_bytes.try_into().ok()?);
		self.get_token(id).map(|t| (id, t))
	}

	fn put_token(&mut self, id: TokenId, token: &Token) {
		let bytes = serde_json::to_vec(token).expect("Token serializes");
		self.store.put(token_by_id_key(id), bytes);
		self.store.put(token_by_symbol_key(&token.symbol), id.to_be_bytes().to_vec());
	}

	/// Registers a new user token with a freshly allocated id ≥
	/// `DCT_ID_START`; the native coin is fixed at id 0 and is never
	/// created through this path.
	pub fn create_token(&mut self, symbol: String, name: String, flags: TokenFlags, height: u32) -> Result<TokenId, TokensError> {
		if symbol.len() > MAX_SYMBOL_LENGTH {
			return Err(TokensError::SymbolTooLong);
		}
		if self.get_token_by_symbol(&symbol).is_some() {
			return Err(TokensError::SymbolTaken);
		}
		let id = self.next_token_id();
		let token = Token { symbol, name, flags, creation_height: height, minted: 0, destroyed: false };
		self.put_token(id, &token);
		Ok(id)
	}

	/// Registers the LP token created alongside a pool, with symbol
	/// `SYMBOL_A-SYMBOL_B` truncated to `MAX_SYMBOL_LENGTH`.
	pub fn create_lp_token(&mut self, symbol_a: &str, symbol_b: &str, height: u32) -> Result<TokenId, TokensError> {
		let mut symbol = format!("{symbol_a}-{symbol_b}");
		symbol.truncate(MAX_SYMBOL_LENGTH);
		let flags = TokenFlags { dat: true, lps: true, tradeable: true, finalized: true, mintable: false };
		self.create_token(symbol, format!("{symbol_a}-{symbol_b} LP Token"), flags, height)
	}

	pub fn update_token(
		&mut self,
		id: TokenId,
		patch: TokenPatch,
		allow_symbol_change: bool,
		allow_finalized: bool,
	) -> Result<(), TokensError> {
		let mut token = self.get_token(id).ok_or(TokensError::UnknownToken)?;
		if token.flags.finalized && !allow_finalized {
			return Err(TokensError::TokenFinalized);
		}
		if let Some(symbol) = patch.symbol {
			if !allow_symbol_change {
				return Err(TokensError::SymbolChangeNotAllowed);
			}
			if symbol.len() > MAX_SYMBOL_LENGTH {
				return Err(TokensError::SymbolTooLong);
			}
			self.store.erase(&token_by_symbol_key(&token.symbol));
			token.symbol = symbol;
		}
		if let Some(name) = patch.name {
			token.name = name;
		}
		if let Some(tradeable) = patch.tradeable {
			token.flags.tradeable = tradeable;
		}
		if let Some(finalized) = patch.finalized {
			token.flags.finalized = finalized;
		}
		if let Some(mintable) = patch.mintable {
			token.flags.mintable = mintable;
		}
		self.put_token(id, &token);
		Ok(())
	}

	pub fn record_mint(&mut self, id: TokenId, amount: i64) -> Result<(), TokensError> {
		let mut token = self.get_token(id).ok_or(TokensError::UnknownToken)?;
		token.minted = token.minted.checked_add(amount).ok_or(TokensError::Overflow)?;
		self.put_token(id, &token);
		Ok(())
	}

	/// (I-C2) Marks a token's pair unusable for further pool activity. Does
	/// not remove historical rows.
	pub fn destroy_token(&mut self, id: TokenId) -> Result<(), TokensError> {
		let mut token = self.get_token(id).ok_or(TokensError::UnknownToken)?;
		token.destroyed = true;
		self.put_token(id, &token);
		Ok(())
	}

	/// Sets `minted` to an absolute value, used by the token-split migration
	/// to reconcile a successor's supply against its holder balances and
	/// pool reserves (§4.H step 8) rather than accumulating a delta.
	pub fn set_minted(&mut self, id: TokenId, minted: i64) -> Result<(), TokensError> {
		let mut token = self.get_token(id).ok_or(TokensError::UnknownToken)?;
		token.minted = minted;
		self.put_token(id, &token);
		Ok(())
	}

	/// The highest existing `/vK` successor suffix for `base_symbol`, or `0`
	/// if none exists yet (§4.H step 2: the next split creates `/v(K+1)`).
	pub fn highest_successor_version(&self, base_symbol: &str) -> u32 {
		let prefix = format!("{base_symbol}/v");
		let mut highest = 0u32;
		self.store.for_each_prefix(crate::keys::TOKEN_BY_SYMBOL_PREFIX, &mut |key, _| {
			if let Some(symbol) = key.strip_prefix(crate::keys::TOKEN_BY_SYMBOL_PREFIX).and_then(|s| std::str::from_utf8(s).ok()) {
				if let Some(version) = symbol.strip_prefix(&prefix).and_then(|v| v.parse::<u32>().ok()) {
					highest = highest.max(version);
				}
			}
			true
		});
		highest
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core_kvstore::MemoryStore;

	#[test]
	fn user_tokens_start_at_dct_id_start() {
		let mut store = MemoryStore::new();
		let mut registry = TokenRegistry::new(&mut store);
		let id = registry.create_token("ABC".into(), "Coin ABC".into(), TokenFlags::default(), 10).unwrap();
		assert_eq!(id, DCT_ID_START);
	}

	#[test]
	fn duplicate_symbol_is_rejected() {
		let mut store = MemoryStore::new();
		let mut registry = TokenRegistry::new(&mut store);
		registry.create_token("ABC".into(), "Coin ABC".into(), TokenFlags::default(), 0).unwrap();
		let err = registry.create_token("ABC".into(), "Other".into(), TokenFlags::default(), 0).unwrap_err();
		assert_eq!(err, TokensError::SymbolTaken);
	}

	#[test]
	fn finalized_token_rejects_mutation_unless_allowed() {
		let mut store = MemoryStore::new();
		let mut registry = TokenRegistry::new(&mut store);
		let id = registry
			.create_token("ABC".into(), "Coin ABC".into(), TokenFlags { finalized: true, ..Default::default() }, 0)
			.unwrap();

		let patch = TokenPatch { name: Some("Renamed".into()), ..Default::default() };
		let err = registry.update_token(id, patch.clone(), false, false).unwrap_err();
		assert_eq!(err, TokensError::TokenFinalized);

		registry.update_token(id, patch, false, true).unwrap();
		assert_eq!(registry.get_token(id).unwrap().name, "Renamed");
	}
}

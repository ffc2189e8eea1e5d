use core_primitives::TokenId;

pub const TOKEN_BY_ID_PREFIX: &[u8] = b"token/id/";
pub const TOKEN_BY_SYMBOL_PREFIX: &[u8] = b"token/sym/";
pub const POOL_PREFIX: &[u8] = b"pool/";
pub const POOL_BY_PAIR_PREFIX: &[u8] = b"pool/by_pair/";
pub const NEXT_TOKEN_ID_KEY: &[u8] = b"token/next_id";

pub fn pool_by_pair_key(token_symbol: &str, currency_symbol: &str) -> Vec<u8> {
	[POOL_BY_PAIR_PREFIX, token_symbol.as_bytes(), b"/", currency_symbol.as_bytes()].concat()
}

pub fn token_by_id_key(id: TokenId) -> Vec<u8> {
	[TOKEN_BY_ID_PREFIX, &id.to_be_bytes()].concat()
}

pub fn token_by_symbol_key(symbol: &str) -> Vec<u8> {
	[TOKEN_BY_SYMBOL_PREFIX, symbol.as_bytes()].concat()
}

pub fn pool_key(lp_token: TokenId) -> Vec<u8> {
	[POOL_PREFIX, &lp_token.to_be_bytes()].concat()
}

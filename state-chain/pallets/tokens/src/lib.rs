//! Token registry and AMM pool accounting (Component C, §4.C).

mod community;
mod error;
mod keys;
mod pool;
mod token;

pub use community::CommunityFunds;
pub use error::TokensError;
pub use pool::{load_pool, Pool, Pools};
pub use token::{Token, TokenFlags, TokenPatch, TokenRegistry};

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, CurrencyPair, Script, TokenId};
use core_traits::PoolApi;
use keys::pool_by_pair_key;

/// Bundles [`TokenRegistry`] and [`Pools`] behind the `PoolApi` seam that
/// the balances and vault crates depend on.
pub struct TokenModule<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> TokenModule<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		TokenModule { store }
	}

	pub fn tokens(&mut self) -> TokenRegistry<'_, S> {
		TokenRegistry::new(self.store)
	}

	pub fn pools(&mut self) -> Pools<'_, S> {
		Pools::new(self.store)
	}

	pub fn community_funds(&mut self) -> CommunityFunds<'_, S> {
		CommunityFunds::new(self.store)
	}

	/// Creates a pool for the named token/currency pair: registers the LP
	/// token, the pool, and the symbol-pair index `execute_swap` and the
	/// other `PoolApi` methods resolve `CurrencyPair`s through.
	pub fn create_pool(
		&mut self,
		token_a: TokenId,
		token_b: TokenId,
		commission: i64,
		reward_pct: i64,
		height: u32,
	) -> Result<TokenId, TokensError> {
		let (symbol_a, symbol_b) = {
			let tokens = self.tokens();
			let token_a_rec = tokens.get_token(token_a).ok_or(TokensError::UnknownToken)?;
			let token_b_rec = tokens.get_token(token_b).ok_or(TokensError::UnknownToken)?;
			(token_a_rec.symbol, token_b_rec.symbol)
		};
		let lp_token = self.tokens().create_lp_token(&symbol_a, &symbol_b, height)?;
		self.pools().create_pool(lp_token, token_a, token_b, commission, reward_pct)?;
		self.store.put(pool_by_pair_key(&symbol_a, &symbol_b), lp_token.to_be_bytes().to_vec());
		Ok(lp_token)
	}

	fn lp_token_for(&self, pair: &CurrencyPair) -> Option<TokenId> {
		let bytes = self.store.get(&pool_by_pair_key(&pair.token, &pair.currency))?;
		Some(TokenId::from_be_bytes(bytes.try_into().ok()?))
	}
}

impl<'s, S: KvRead + KvWrite + ?Sized> PoolApi for TokenModule<'s, S> {
	type Error = TokensError;

	fn pool_exists(&self, pair: &CurrencyPair) -> bool {
		self.lp_token_for(pair).map(|id| load_pool(self.store, id).is_some()).unwrap_or(false)
	}

	fn pool_reserves(&self, pair: &CurrencyPair) -> Option<(Amount, Amount)> {
		let id = self.lp_token_for(pair)?;
		let pool = load_pool(self.store, id)?;
		Some((Amount::from_coin_units(pool.reserve_a), Amount::from_coin_units(pool.reserve_b)))
	}

	fn quote_swap(&self, pair: &CurrencyPair, amount_in: Amount) -> Result<Amount, Self::Error> {
		let (reserve_in, reserve_out) = self.pool_reserves(pair).ok_or(TokensError::UnknownPool)?;
		let denominator = reserve_in.checked_add(amount_in).map_err(|_| TokensError::Overflow)?;
		reserve_out.checked_mul_div(amount_in.raw(), denominator.raw()).map_err(|_| TokensError::Overflow)
	}

	fn execute_swap(&mut self, pair: &CurrencyPair, recipient: &Script, amount_in: Amount) -> Result<Amount, Self::Error> {
		let _ = recipient;
		let lp_token = self.lp_token_for(pair).ok_or(TokensError::UnknownPool)?;
		let pool = self.pools().get_pool(lp_token).ok_or(TokensError::UnknownPool)?;
		let token_in = self
			.tokens()
			.get_token_by_symbol(&pair.token)
			.map(|(id, _)| id)
			.unwrap_or(pool.token_a);
		self.pools().swap(lp_token, token_in, amount_in)
	}

	fn lp_token_id(&self, pair: &CurrencyPair) -> Option<TokenId> {
		self.lp_token_for(pair)
	}

	fn cumulative_reward_index(&self, lp_token: TokenId) -> Amount {
		load_pool(self.store, lp_token).map(|p| Amount::from_coin_units(p.cumulative_reward_index)).unwrap_or(Amount::ZERO)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core_kvstore::MemoryStore;
	use core_primitives::COIN;

	#[test]
	fn create_pool_and_swap_through_the_pool_api_seam() {
		let mut store = MemoryStore::new();
		let mut module = TokenModule::new(&mut store);

		let token_a = module
			.tokens()
			.create_token("AAA".into(), "Token A".into(), TokenFlags { tradeable: true, ..Default::default() }, 0)
			.unwrap();
		let token_b = module
			.tokens()
			.create_token("BBB".into(), "Token B".into(), TokenFlags { tradeable: true, ..Default::default() }, 0)
			.unwrap();
		module.create_pool(token_a, token_b, 0, 0, 0).unwrap();
		module.pools().add_liquidity(
			module.lp_token_for(&CurrencyPair::new("AAA".into(), "BBB".into())).unwrap(),
			Amount::from_coin_units(1000 * COIN),
			Amount::from_coin_units(1000 * COIN),
		).unwrap();

		let pair = CurrencyPair::new("AAA".into(), "BBB".into());
		assert!(module.pool_exists(&pair));
		let out = module.execute_swap(&pair, &Script::from_bytes(b"x".to_vec()), Amount::from_coin_units(10 * COIN)).unwrap();
		assert!(out.raw() > 0);
	}
}

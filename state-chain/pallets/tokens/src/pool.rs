//! Constant-product AMM pools: swap, add/remove liquidity, reward
//! distribution (§4.C).

use crate::keys::pool_key;
use crate::TokensError;
use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, CurrencyPair, TokenId, COIN, MINIMUM_LIQUIDITY};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
	pub token_a: TokenId,
	pub token_b: TokenId,
	pub reserve_a: i64,
	pub reserve_b: i64,
	pub total_liquidity: u128,
	/// Trading commission, in COIN-scaled basis (e.g. `COIN / 200` for 0.5%).
	pub commission: i64,
	/// Accumulated commission not yet distributed or burned.
	pub commission_accumulator_a: i64,
	pub commission_accumulator_b: i64,
	/// Share of the loan-rewards fund this pool receives per block, as a
	/// COIN-scaled fraction.
	pub reward_pct: i64,
	/// Cumulative reward-per-share index, COIN-scaled (§4.C point 2, I-C1).
	pub cumulative_reward_index: i64,
	pub max_price_numerator: i64,
	pub max_price_denominator: i64,
}

/// Reads a pool directly off any `KvRead` handle, without requiring write
/// access. Used by read-only collaborator-trait methods that only ever see
/// a shared reference to the underlying store.
pub fn load_pool(store: &(impl KvRead + ?Sized), lp_token: TokenId) -> Option<Pool> {
	store.get(&pool_key(lp_token)).and_then(|b| serde_json::from_slice(&b).ok())
}

pub struct Pools<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> Pools<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		Pools { store }
	}

	pub fn get_pool(&self, lp_token: TokenId) -> Option<Pool> {
		load_pool(self.store, lp_token)
	}

	pub fn put_pool(&mut self, lp_token: TokenId, pool: &Pool) {
		let bytes = serde_json::to_vec(pool).expect("Pool serializes");
		self.store.put(pool_key(lp_token), bytes);
	}

	pub fn pool_exists(&self, lp_token: TokenId) -> bool {
		self.store.get(&pool_key(lp_token)).is_some()
	}

	/// Visits every pool in ascending `lp_token` order, skipping the
	/// `pool/by_pair/` secondary index that shares the `pool/` prefix.
	/// Used by the block pipeline's reward-distribution step (§4.I step 1).
	pub fn for_each_pool(&self, mut visitor: impl FnMut(TokenId, &Pool) -> bool) {
		self.store.for_each_prefix(crate::keys::POOL_PREFIX, &mut |key, value| {
			if key.starts_with(crate::keys::POOL_BY_PAIR_PREFIX) {
				return true;
			}
			let Some(lp_token_bytes) = key.get(crate::keys::POOL_PREFIX.len()..) else { return true };
			let Ok(lp_token_bytes) = <[u8; 4]>::try_from(lp_token_bytes) else { return true };
			let Ok(pool) = serde_json::from_slice::<Pool>(value) else { return true };
			visitor(TokenId::from_be_bytes(lp_token_bytes), &pool)
		});
	}

	/// Creates a pool for `token_a`/`token_b` under the LP token id that
	/// identifies the pair. Reserves start at zero; the caller must follow
	/// with `add_liquidity`.
	pub fn create_pool(
		&mut self,
		lp_token: TokenId,
		token_a: TokenId,
		token_b: TokenId,
		commission: i64,
		reward_pct: i64,
	) -> Result<(), TokensError> {
		if self.pool_exists(lp_token) {
			return Err(TokensError::PoolAlreadyExists);
		}
		let pool = Pool {
			token_a,
			token_b,
			reserve_a: 0,
			reserve_b: 0,
			total_liquidity: 0,
			commission,
			commission_accumulator_a: 0,
			commission_accumulator_b: 0,
			reward_pct,
			cumulative_reward_index: 0,
			max_price_numerator: i64::MAX,
			max_price_denominator: 1,
		};
		self.put_pool(lp_token, &pool);
		Ok(())
	}

	/// Swaps `amount_in` of `pair.token` for `pair.currency`, per §4.C's
	/// five-step constant-product algorithm. `pair` must name `pool`'s two
	/// tokens in the direction being swapped.
	pub fn swap(&mut self, lp_token: TokenId, token_in: TokenId, amount_in: Amount) -> Result<Amount, TokensError> {
		let mut pool = self.get_pool(lp_token).ok_or(TokensError::UnknownPool)?;
		let a_to_b = token_in == pool.token_a;
		if !a_to_b && token_in != pool.token_b {
			return Err(TokensError::TokenNotInPool);
		}

		let (reserve_in, reserve_out) = if a_to_b { (pool.reserve_a, pool.reserve_b) } else { (pool.reserve_b, pool.reserve_a) };

		let commission = amount_in.checked_mul_coin_scaled(pool.commission).map_err(|_| TokensError::Overflow)?;
		let in_after = amount_in.checked_sub(commission).map_err(|_| TokensError::Overflow)?;

		let reserve_in_prime = (reserve_in as i128) + (in_after.raw() as i128);
		if reserve_in_prime <= 0 {
			return Err(TokensError::InvalidSwap);
		}
		let out_wide = (reserve_out as i128) - ((reserve_in as i128) * (reserve_out as i128) / reserve_in_prime);
		if out_wide < 0 || out_wide > (reserve_out as i128) - 1 {
			return Err(TokensError::InvalidSwap);
		}
		let out = out_wide as i64;

		if out != 0 {
			let price_num = (in_after.raw() as i128) * COIN as i128;
			let max_allowed = (pool.max_price_numerator as i128) * (out as i128);
			if price_num * pool.max_price_denominator as i128 > max_allowed * COIN as i128 {
				return Err(TokensError::PriceExceedsMax);
			}
		}

		if a_to_b {
			pool.reserve_a = reserve_in_prime as i64;
			pool.reserve_b -= out;
			pool.commission_accumulator_a = pool.commission_accumulator_a.saturating_add(commission.raw());
		} else {
			pool.reserve_b = reserve_in_prime as i64;
			pool.reserve_a -= out;
			pool.commission_accumulator_b = pool.commission_accumulator_b.saturating_add(commission.raw());
		}
		self.put_pool(lp_token, &pool);
		Ok(Amount::from_coin_units(out))
	}

	/// Adds liquidity for `amount_a`/`amount_b`, returning the LP tokens to
	/// mint. First deposit seeds `totalLiquidity` at `MINIMUM_LIQUIDITY`,
	/// permanently irredeemable (§4.C).
	pub fn add_liquidity(&mut self, lp_token: TokenId, amount_a: Amount, amount_b: Amount) -> Result<u128, TokensError> {
		let mut pool = self.get_pool(lp_token).ok_or(TokensError::UnknownPool)?;
		let amt_a = amount_a.raw() as u128;
		let amt_b = amount_b.raw() as u128;

		let minted = if pool.total_liquidity == 0 {
			let product = amt_a.checked_mul(amt_b).ok_or(TokensError::Overflow)?;
			let liq = Amount::isqrt_u128(product);
			if liq <= MINIMUM_LIQUIDITY {
				return Err(TokensError::InsufficientLiquidityMinted);
			}
			pool.total_liquidity = MINIMUM_LIQUIDITY;
			liq - MINIMUM_LIQUIDITY
		} else {
			let from_a = amt_a * pool.total_liquidity / pool.reserve_a.max(1) as u128;
			let from_b = amt_b * pool.total_liquidity / pool.reserve_b.max(1) as u128;
			from_a.min(from_b)
		};

		if minted == 0 {
			return Err(TokensError::InsufficientLiquidityMinted);
		}

		pool.reserve_a = pool.reserve_a.checked_add(amount_a.raw()).ok_or(TokensError::Overflow)?;
		pool.reserve_b = pool.reserve_b.checked_add(amount_b.raw()).ok_or(TokensError::Overflow)?;
		pool.total_liquidity = pool.total_liquidity.checked_add(minted).ok_or(TokensError::Overflow)?;
		self.put_pool(lp_token, &pool);
		Ok(minted)
	}

	/// Removes `amount` LP tokens worth of liquidity, returning `(amtA,
	/// amtB)` to transfer back to the owner.
	pub fn remove_liquidity(&mut self, lp_token: TokenId, amount: u128) -> Result<(Amount, Amount), TokensError> {
		let mut pool = self.get_pool(lp_token).ok_or(TokensError::UnknownPool)?;
		if amount == 0 || amount > pool.total_liquidity {
			return Err(TokensError::InsufficientLiquidityHeld);
		}
		let amt_a = (amount * pool.reserve_a as u128 / pool.total_liquidity) as i64;
		let amt_b = (amount * pool.reserve_b as u128 / pool.total_liquidity) as i64;

		pool.reserve_a -= amt_a;
		pool.reserve_b -= amt_b;
		pool.total_liquidity -= amount;
		self.put_pool(lp_token, &pool);
		Ok((Amount::from_coin_units(amt_a), Amount::from_coin_units(amt_b)))
	}

	/// Distributes one block's worth of reward into the pool's cumulative
	/// index (§4.C "Reward distribution", point 2). Returns the amount
	/// actually distributed, which the caller debits from the funding
	/// source (never more than `available`).
	pub fn distribute_reward(&mut self, lp_token: TokenId, reward: Amount, available: Amount) -> Result<Amount, TokensError> {
		let mut pool = self.get_pool(lp_token).ok_or(TokensError::UnknownPool)?;
		if pool.total_liquidity == 0 {
			return Ok(Amount::ZERO);
		}
		let distributed = if reward.raw() > available.raw() { available } else { reward };
		if distributed.is_zero() {
			return Ok(Amount::ZERO);
		}
		let delta = (distributed.raw() as i128) * COIN as i128 / pool.total_liquidity as i128;
		pool.cumulative_reward_index =
			pool.cumulative_reward_index.checked_add(delta as i64).ok_or(TokensError::Overflow)?;
		self.put_pool(lp_token, &pool);
		Ok(distributed)
	}

	pub fn cumulative_reward_index(&self, lp_token: TokenId) -> Amount {
		self.get_pool(lp_token).map(|p| Amount::from_coin_units(p.cumulative_reward_index)).unwrap_or(Amount::ZERO)
	}

	pub fn pair_of(&self, lp_token: TokenId) -> Option<CurrencyPair> {
		self.get_pool(lp_token).map(|p| CurrencyPair::new(p.token_a.to_string(), p.token_b.to_string()))
	}

	/// Rewrites every pool holding `old_token` to reference `new_token` on
	/// that side, scaling its reserve by the split multiplier (§4.H step 6).
	/// Simplified against the source, which dismantles and rebuilds each
	/// pool under a fresh LP token: here the existing pool and LP token are
	/// kept in place and only the old-token side is rewritten, since no
	/// secondary index of per-owner LP holdings exists to replay a
	/// largest-first withdrawal order against.
	pub fn rescale_token(&mut self, old_token: TokenId, new_token: TokenId, multiplier_pct: i64) -> Result<(), TokensError> {
		let mut matches = Vec::new();
		self.store.for_each_prefix(crate::keys::POOL_PREFIX, &mut |key, value| {
			if let Some(lp_bytes) = key.strip_prefix(crate::keys::POOL_PREFIX) {
				if let Ok(raw) = <[u8; 4]>::try_from(lp_bytes) {
					if let Ok(pool) = serde_json::from_slice::<Pool>(value) {
						if pool.token_a == old_token || pool.token_b == old_token {
							matches.push(TokenId::from_be_bytes(raw));
						}
					}
				}
			}
			true
		});
		for lp_token in matches {
			let mut pool = self.get_pool(lp_token).ok_or(TokensError::UnknownPool)?;
			if pool.token_a == old_token {
				pool.token_a = new_token;
				pool.reserve_a = Amount::from_coin_units(pool.reserve_a)
					.checked_apply_split_multiplier(multiplier_pct)
					.map_err(|_| TokensError::Overflow)?
					.raw();
			}
			if pool.token_b == old_token {
				pool.token_b = new_token;
				pool.reserve_b = Amount::from_coin_units(pool.reserve_b)
					.checked_apply_split_multiplier(multiplier_pct)
					.map_err(|_| TokensError::Overflow)?
					.raw();
			}
			self.put_pool(lp_token, &pool);
		}
		Ok(())
	}

	/// Sums the reserve held in `token` across every pool, used to
	/// reconcile `minted_tokens` after a split (§4.H step 8).
	pub fn total_reserve_of(&self, token: TokenId) -> Amount {
		let mut total = 0i64;
		self.store.for_each_prefix(crate::keys::POOL_PREFIX, &mut |key, value| {
			if key.len() == crate::keys::POOL_PREFIX.len() + 4 {
				if let Ok(pool) = serde_json::from_slice::<Pool>(value) {
					if pool.token_a == token {
						total = total.saturating_add(pool.reserve_a);
					}
					if pool.token_b == token {
						total = total.saturating_add(pool.reserve_b);
					}
				}
			}
			true
		});
		Amount::from_coin_units(total)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core_kvstore::MemoryStore;

	fn coin(n: i64) -> Amount {
		Amount::from_coin_units(n * COIN)
	}

	#[test]
	fn first_deposit_seeds_minimum_liquidity() {
		let mut store = MemoryStore::new();
		let mut pools = Pools::new(&mut store);
		pools.create_pool(128, 1, 2, 0, 0).unwrap();
		let minted = pools.add_liquidity(128, coin(100), coin(100)).unwrap();

		let pool = pools.get_pool(128).unwrap();
		assert_eq!(pool.total_liquidity, minted + MINIMUM_LIQUIDITY);
	}

	#[test]
	fn swap_respects_constant_product_direction() {
		let mut store = MemoryStore::new();
		let mut pools = Pools::new(&mut store);
		pools.create_pool(128, 1, 2, 0, 0).unwrap();
		pools.add_liquidity(128, coin(1000), coin(1000)).unwrap();

		let out = pools.swap(128, 1, coin(100)).unwrap();
		assert!(out.raw() > 0 && out.raw() < coin(100).raw());

		let pool = pools.get_pool(128).unwrap();
		assert_eq!(pool.reserve_a, coin(1100).raw());
	}

	#[test]
	fn swap_with_commission_credits_accumulator() {
		let mut store = MemoryStore::new();
		let mut pools = Pools::new(&mut store);
		pools.create_pool(128, 1, 2, COIN / 100, 0).unwrap();
		pools.add_liquidity(128, coin(1000), coin(1000)).unwrap();
		pools.swap(128, 1, coin(100)).unwrap();

		let pool = pools.get_pool(128).unwrap();
		assert_eq!(pool.commission_accumulator_a, coin(1).raw());
	}

	#[test]
	fn remove_liquidity_returns_proportional_reserves() {
		let mut store = MemoryStore::new();
		let mut pools = Pools::new(&mut store);
		pools.create_pool(128, 1, 2, 0, 0).unwrap();
		let minted = pools.add_liquidity(128, coin(1000), coin(1000)).unwrap();

		let (a, b) = pools.remove_liquidity(128, minted / 2).unwrap();
		assert!(a.raw() > 0 && b.raw() > 0);
	}
}

//! Per-(owner, token) balance ledger and LP pool-share checkpoints (§4.B).

mod keys;

#[cfg(test)]
mod tests;

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, ErrorKind, Script, TokenId};
use core_traits::{BalancesApi, PoolApi};
use keys::{balance_key, decode_balance_key, pool_share_key};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancesError {
	#[error("insufficient funds")]
	InsufficientFunds,
	#[error("amount overflow")]
	Overflow,
}

impl ErrorKind for BalancesError {
	fn kind(&self) -> core_primitives::Kind {
		match self {
			BalancesError::InsufficientFunds => core_primitives::Kind::Validation,
			BalancesError::Overflow => core_primitives::Kind::Fatal,
		}
	}
}

/// Checkpoint recording the cumulative reward index a pool-share owner has
/// already been credited up to (§4.C point 4, I-C1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PoolShareCheckpoint {
	pub last_index: Amount,
}

impl PoolShareCheckpoint {
	fn encode(self) -> Vec<u8> {
		self.last_index.raw().to_be_bytes().to_vec()
	}

	fn decode(bytes: &[u8]) -> Option<Self> {
		let raw = i64::from_be_bytes(bytes.try_into().ok()?);
		Some(PoolShareCheckpoint { last_index: Amount::from_coin_units(raw) })
	}
}

/// Balance and pool-share storage, generic over the underlying store so it
/// can run against the in-memory backend in tests or the persistent one in
/// a real node.
pub struct Balances<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> Balances<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		Balances { store }
	}

	/// Iterates balance rows in `(owner, tokenId)` order, starting at `from`
	/// if given, until `visitor` returns `false`.
	pub fn for_each_balance(
		&self,
		from: Option<(&Script, TokenId)>,
		mut visitor: impl FnMut(&Script, TokenId, Amount) -> bool,
	) {
		let prefix = keys::BALANCE_PREFIX;
		let mut started = from.is_none();
		let start_key = from.map(|(owner, token)| balance_key(owner, token));
		self.store.for_each_prefix(prefix, &mut |key, value| {
			if !started {
				if key >= start_key.as_deref().unwrap() {
					started = true;
				} else {
					return true;
				}
			}
			let Some((owner, token)) = decode_balance_key(key) else { return true };
			let raw = i64::from_be_bytes(value.try_into().unwrap_or_default());
			visitor(&owner, token, Amount::from_coin_units(raw))
		});
	}

	fn pool_share(&self, owner: &Script, lp_token: TokenId) -> Option<PoolShareCheckpoint> {
		self.store.get(&pool_share_key(owner, lp_token)).and_then(|b| PoolShareCheckpoint::decode(&b))
	}

	fn set_pool_share(&mut self, owner: &Script, lp_token: TokenId, checkpoint: PoolShareCheckpoint) {
		self.store.put(pool_share_key(owner, lp_token), checkpoint.encode());
	}

	fn erase_pool_share(&mut self, owner: &Script, lp_token: TokenId) {
		self.store.erase(&pool_share_key(owner, lp_token));
	}

	/// Brings `owner`'s pool-share checkpoint forward to the pool's current
	/// cumulative reward index, crediting the accrued reward (I-C1).
	/// `reward_token` is the token the accrued reward is denominated and
	/// credited in.
	pub fn calculate_owner_rewards<P: PoolApi>(
		&mut self,
		owner: &Script,
		lp_token: TokenId,
		reward_token: TokenId,
		pools: &P,
	) -> Result<Amount, BalancesError> {
		let current_index = pools.cumulative_reward_index(lp_token);
		let checkpoint = self.pool_share(owner, lp_token).unwrap_or_default();
		let lp_balance = self.get_balance(owner, lp_token);

		if lp_balance.is_zero() {
			if checkpoint != PoolShareCheckpoint::default() {
				self.erase_pool_share(owner, lp_token);
			}
			return Ok(Amount::ZERO);
		}

		let delta_index =
			current_index.checked_sub(checkpoint.last_index).map_err(|_| BalancesError::Overflow)?;
		let reward = if delta_index.is_zero() {
			Amount::ZERO
		} else {
			lp_balance.checked_mul_coin_scaled(delta_index.raw()).map_err(|_| BalancesError::Overflow)?
		};

		if !reward.is_zero() {
			self.add_balance(owner, reward_token, reward)?;
		}
		self.set_pool_share(owner, lp_token, PoolShareCheckpoint { last_index: current_index });
		Ok(reward)
	}

	/// Moves every `old_token` balance row to `new_token`, scaled by the
	/// split multiplier (§4.H step 5/6, simplified: this also covers LP
	/// token holders, since an LP token is itself a plain balance). Returns
	/// the total minted under `new_token`, for `minted_tokens` reconciliation.
	pub fn rescale_token(&mut self, old_token: TokenId, new_token: TokenId, multiplier_pct: i64) -> Result<Amount, BalancesError> {
		let mut matches = Vec::new();
		self.store.for_each_prefix(keys::BALANCE_PREFIX, &mut |key, value| {
			if let Some((owner, token)) = decode_balance_key(key) {
				if token == old_token {
					let raw = i64::from_be_bytes(value.try_into().unwrap_or_default());
					matches.push((owner, Amount::from_coin_units(raw)));
				}
			}
			true
		});
		let mut total = Amount::ZERO;
		for (owner, amount) in matches {
			self.store.erase(&balance_key(&owner, old_token));
			let scaled = amount.checked_apply_split_multiplier(multiplier_pct).map_err(|_| BalancesError::Overflow)?;
			if !scaled.is_zero() {
				self.store.put(balance_key(&owner, new_token), scaled.raw().to_be_bytes().to_vec());
				total = total.checked_add(scaled).map_err(|_| BalancesError::Overflow)?;
			}
		}
		Ok(total)
	}

	/// Records (or refreshes) the `PoolShare` row a non-zero LP balance
	/// requires (I-B2). Called by the pool-registry crate after minting or
	/// burning LP tokens.
	pub fn touch_pool_share<P: PoolApi>(&mut self, owner: &Script, lp_token: TokenId, pools: &P) {
		let balance = self.get_balance(owner, lp_token);
		if balance.is_zero() {
			self.erase_pool_share(owner, lp_token);
		} else if self.pool_share(owner, lp_token).is_none() {
			self.set_pool_share(owner, lp_token, PoolShareCheckpoint { last_index: pools.cumulative_reward_index(lp_token) });
		}
	}
}

impl<'s, S: KvRead + KvWrite + ?Sized> BalancesApi for Balances<'s, S> {
	type Error = BalancesError;

	fn get_balance(&self, owner: &Script, token: TokenId) -> Amount {
		self.store
			.get(&balance_key(owner, token))
			.and_then(|bytes| bytes.try_into().ok())
			.map(|raw: [u8; 8]| Amount::from_coin_units(i64::from_be_bytes(raw)))
			.unwrap_or(Amount::ZERO)
	}

	fn add_balance(&mut self, owner: &Script, token: TokenId, amount: Amount) -> Result<(), BalancesError> {
		let key = balance_key(owner, token);
		let current = self.get_balance(owner, token);
		let updated = current.checked_add(amount).map_err(|_| BalancesError::Overflow)?;
		if updated.is_zero() {
			self.store.erase(&key);
		} else {
			self.store.put(key, updated.raw().to_be_bytes().to_vec());
		}
		Ok(())
	}

	fn sub_balance(&mut self, owner: &Script, token: TokenId, amount: Amount) -> Result<(), BalancesError> {
		let key = balance_key(owner, token);
		let current = self.get_balance(owner, token);
		let updated = current.checked_sub(amount).map_err(|_| BalancesError::Overflow)?;
		if updated.raw() < 0 {
			return Err(BalancesError::InsufficientFunds);
		}
		if updated.is_zero() {
			self.store.erase(&key);
		} else {
			self.store.put(key, updated.raw().to_be_bytes().to_vec());
		}
		Ok(())
	}
}

//! Deferred-settlement futures engine (Component G, §4.G): the token-futures
//! and DUSD-futures queues, their submission/cancellation, and the
//! block-periodic settlement pass.

mod entry;
mod error;
mod keys;

pub use entry::{DUSDFuturesEntry, TokenFuturesEntry};
pub use error::FuturesError;

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, CurrencyPair, Height, Script, TokenId, COIN, NATIVE_TOKEN_ID};
use core_traits::{AttributeApi, BalancesApi, FuturesApi, OracleApi};

/// A settlement outcome for one queued entry, returned for the pipeline's
/// read-model history and economy-counter bookkeeping. The balance mutation
/// itself is already applied by the settlement call, since (unlike the
/// vault auction's collateral swap) no collaborator beyond [`BalancesApi`]
/// is needed to carry it out.
#[derive(Clone, Debug, PartialEq)]
pub enum FuturesSettlementEffect {
	Minted {
		owner: Script,
		source_token: TokenId,
		source_amount: Amount,
		minted_token: TokenId,
		minted_amount: Amount,
	},
	Unpaid {
		owner: Script,
		source_token: TokenId,
		source_amount: Amount,
	},
}

fn fixed_interval_price_pair<A: AttributeApi>(attrs: &A, token_id: TokenId) -> Option<CurrencyPair> {
	let raw = attrs.get_raw(&format!("v0/token/{token_id}/fixed_interval_price_id"))?;
	let value: pallet_attributes::AttributeValue = serde_json::from_slice(&raw).ok()?;
	match value {
		pallet_attributes::AttributeValue::Raw(bytes) => {
			let text = std::str::from_utf8(&bytes).ok()?;
			let (token, currency) = text.split_once('/')?;
			Some(CurrencyPair::new(token.to_string(), currency.to_string()))
		}
		_ => None,
	}
}

/// `discountPrice`/`premiumPrice` (§4.G step 1-2): the live fixed-interval
/// price of `token_id` scaled by `multiplier_pct` (COIN-scaled), requiring
/// liveness.
fn scaled_live_price<O: OracleApi, A: AttributeApi>(
	oracle: &O,
	attrs: &A,
	token_id: TokenId,
	multiplier_pct: i64,
) -> Option<Amount> {
	let pair = fixed_interval_price_pair(attrs, token_id)?;
	if !oracle.is_live(&pair, 0) {
		return None;
	}
	let price = oracle.active_price(&pair)?;
	price.checked_mul_coin_scaled(multiplier_pct).ok()
}

fn dfip2203_enabled<A: AttributeApi>(attrs: &A, token_id: TokenId) -> bool {
	attrs.get_bool(&format!("v0/token/{token_id}/dfip2203"))
}

pub struct FuturesEngine<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> FuturesEngine<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		FuturesEngine { store }
	}

	pub fn token_entry(&self, height: Height, owner: &Script, ordinal: u32) -> Option<TokenFuturesEntry> {
		self.store.get(&keys::token_entry_key(height, owner, ordinal)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	pub fn dusd_entry(&self, height: Height, owner: &Script, ordinal: u32) -> Option<DUSDFuturesEntry> {
		self.store.get(&keys::dusd_entry_key(height, owner, ordinal)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	/// `listpendingfutureswaps`/`getpendingfutureswaps` (§6.4): every
	/// token-futures entry still sitting in the queue, with the
	/// `submitHeight` its key was queued under.
	pub fn for_each_token_entry(&self, mut visitor: impl FnMut(Height, &TokenFuturesEntry) -> bool) {
		let mut rows = Vec::new();
		self.store.for_each_prefix(keys::TOKEN_QUEUE_TAG, &mut |k, v| {
			if let Some(height) = keys::height_of(keys::TOKEN_QUEUE_TAG, k) {
				if let Ok(entry) = serde_json::from_slice::<TokenFuturesEntry>(v) {
					rows.push((height, entry));
				}
			}
			true
		});
		for (height, entry) in rows {
			if !visitor(height, &entry) {
				break;
			}
		}
	}

	/// `listpendingdusdswaps`/`getpendingdusdswaps` (§6.4): the DUSD-queue
	/// counterpart of [`Self::for_each_token_entry`].
	pub fn for_each_dusd_entry(&self, mut visitor: impl FnMut(Height, &DUSDFuturesEntry) -> bool) {
		let mut rows = Vec::new();
		self.store.for_each_prefix(keys::DUSD_QUEUE_TAG, &mut |k, v| {
			if let Some(height) = keys::height_of(keys::DUSD_QUEUE_TAG, k) {
				if let Ok(entry) = serde_json::from_slice::<DUSDFuturesEntry>(v) {
					rows.push((height, entry));
				}
			}
			true
		});
		for (height, entry) in rows {
			if !visitor(height, &entry) {
				break;
			}
		}
	}

	/// Queues a token↔token future, escrowing `source_amount` from `owner`
	/// via [`BalancesApi`].
	pub fn submit_token_future<B: BalancesApi>(
		&mut self,
		height: Height,
		owner: Script,
		ordinal: u32,
		source_token: TokenId,
		source_amount: Amount,
		destination_token: TokenId,
		balances: &mut B,
	) -> Result<(), FuturesError> {
		balances.sub_balance(&owner, source_token, source_amount).map_err(|_| FuturesError::Overflow)?;
		self.store.put(
			keys::token_entry_key(height, &owner, ordinal),
			serde_json::to_vec(&TokenFuturesEntry { source_token, source_amount, destination_token })
				.expect("TokenFuturesEntry serializes"),
		);
		Ok(())
	}

	/// Withdraws a still-queued token future, reversing the escrow deposit.
	pub fn cancel_token_future<B: BalancesApi>(
		&mut self,
		height: Height,
		owner: Script,
		ordinal: u32,
		balances: &mut B,
	) -> Result<(), FuturesError> {
		let key = keys::token_entry_key(height, &owner, ordinal);
		let entry: TokenFuturesEntry =
			self.store.get(&key).and_then(|b| serde_json::from_slice(&b).ok()).ok_or(FuturesError::EntryNotFound)?;
		balances.add_balance(&owner, entry.source_token, entry.source_amount).map_err(|_| FuturesError::Overflow)?;
		self.store.erase(&key);
		Ok(())
	}

	/// Queues a native-coin-in DUSD future, escrowing `source_amount` of the
	/// native coin from `owner`.
	pub fn submit_dusd_future<B: BalancesApi>(
		&mut self,
		height: Height,
		owner: Script,
		ordinal: u32,
		source_amount: Amount,
		balances: &mut B,
	) -> Result<(), FuturesError> {
		balances
			.sub_balance(&owner, NATIVE_TOKEN_ID, source_amount)
			.map_err(|_| FuturesError::Overflow)?;
		self.store.put(
			keys::dusd_entry_key(height, &owner, ordinal),
			serde_json::to_vec(&DUSDFuturesEntry { source_amount }).expect("DUSDFuturesEntry serializes"),
		);
		Ok(())
	}

	/// Withdraws a still-queued DUSD future, reversing the escrow deposit.
	pub fn cancel_dusd_future<B: BalancesApi>(
		&mut self,
		height: Height,
		owner: Script,
		ordinal: u32,
		balances: &mut B,
	) -> Result<(), FuturesError> {
		let key = keys::dusd_entry_key(height, &owner, ordinal);
		let entry: DUSDFuturesEntry =
			self.store.get(&key).and_then(|b| serde_json::from_slice(&b).ok()).ok_or(FuturesError::EntryNotFound)?;
		balances
			.add_balance(&owner, NATIVE_TOKEN_ID, entry.source_amount)
			.map_err(|_| FuturesError::Overflow)?;
		self.store.erase(&key);
		Ok(())
	}

	/// Drains and settles the token-futures queue (§4.G "Settlement"),
	/// returning the effects for read-model history. No-op if
	/// `params/dfip2203/active` is not set.
	pub fn settle_token_futures<O: OracleApi, A: AttributeApi, B: BalancesApi>(
		&mut self,
		settlement_height: Height,
		dusd_token: TokenId,
		reward_pct: i64,
		oracle: &O,
		attrs: &A,
		balances: &mut B,
	) -> Vec<FuturesSettlementEffect> {
		if !attrs.get_bool("v0/params/dfip2203/active") {
			return Vec::new();
		}
		let discount = COIN.saturating_sub(reward_pct);
		let premium = COIN.saturating_add(reward_pct);

		let mut due = Vec::new();
		self.store.for_each_prefix(keys::TOKEN_QUEUE_TAG, &mut |k, v| {
			if keys::height_of(keys::TOKEN_QUEUE_TAG, k).map(|h| h <= settlement_height).unwrap_or(false) {
				if let Ok(entry) = serde_json::from_slice::<TokenFuturesEntry>(v) {
					due.push((k.to_vec(), entry));
				}
			}
			true
		});

		let mut effects = Vec::with_capacity(due.len());
		for (key, entry) in due {
			let owner = owner_from_token_key(&key);
			let effect = if entry.source_token == dusd_token {
				self.settle_dusd_source(&owner, &entry, premium, oracle, attrs, balances)
			} else if entry.destination_token == dusd_token {
				self.settle_token_source(&owner, &entry, discount, dusd_token, oracle, attrs, balances)
			} else {
				self.refund_unpaid(&owner, entry.source_token, entry.source_amount, balances)
			};
			effects.push(effect);
			self.store.erase(&key);
		}
		effects
	}

	fn settle_dusd_source<O: OracleApi, A: AttributeApi, B: BalancesApi>(
		&mut self,
		owner: &Script,
		entry: &TokenFuturesEntry,
		premium: i64,
		oracle: &O,
		attrs: &A,
		balances: &mut B,
	) -> FuturesSettlementEffect {
		if !dfip2203_enabled(attrs, entry.destination_token) {
			return self.refund_unpaid(owner, entry.source_token, entry.source_amount, balances);
		}
		match scaled_live_price(oracle, attrs, entry.destination_token, premium) {
			Some(premium_price) if premium_price.raw() > 0 => {
				let minted = entry.source_amount.checked_mul_div(COIN, premium_price.raw()).unwrap_or(Amount::ZERO);
				let _ = balances.add_balance(owner, entry.destination_token, minted);
				FuturesSettlementEffect::Minted {
					owner: owner.clone(),
					source_token: entry.source_token,
					source_amount: entry.source_amount,
					minted_token: entry.destination_token,
					minted_amount: minted,
				}
			}
			_ => self.refund_unpaid(owner, entry.source_token, entry.source_amount, balances),
		}
	}

	fn settle_token_source<O: OracleApi, A: AttributeApi, B: BalancesApi>(
		&mut self,
		owner: &Script,
		entry: &TokenFuturesEntry,
		discount: i64,
		dusd_token: TokenId,
		oracle: &O,
		attrs: &A,
		balances: &mut B,
	) -> FuturesSettlementEffect {
		if !dfip2203_enabled(attrs, entry.source_token) {
			return self.refund_unpaid(owner, entry.source_token, entry.source_amount, balances);
		}
		match scaled_live_price(oracle, attrs, entry.source_token, discount) {
			Some(discount_price) => {
				let minted = entry.source_amount.checked_mul_coin_scaled(discount_price.raw()).unwrap_or(Amount::ZERO);
				let _ = balances.add_balance(owner, dusd_token, minted);
				FuturesSettlementEffect::Minted {
					owner: owner.clone(),
					source_token: entry.source_token,
					source_amount: entry.source_amount,
					minted_token: dusd_token,
					minted_amount: minted,
				}
			}
			None => self.refund_unpaid(owner, entry.source_token, entry.source_amount, balances),
		}
	}

	fn refund_unpaid<B: BalancesApi>(
		&mut self,
		owner: &Script,
		source_token: TokenId,
		source_amount: Amount,
		balances: &mut B,
	) -> FuturesSettlementEffect {
		let _ = balances.add_balance(owner, source_token, source_amount);
		FuturesSettlementEffect::Unpaid { owner: owner.clone(), source_token, source_amount }
	}

	/// Drains and settles the DFI→DUSD queue, same gating and key order as
	/// [`Self::settle_token_futures`].
	pub fn settle_dusd_futures<O: OracleApi, A: AttributeApi, B: BalancesApi>(
		&mut self,
		settlement_height: Height,
		dusd_token: TokenId,
		reward_pct: i64,
		oracle: &O,
		attrs: &A,
		balances: &mut B,
	) -> Vec<FuturesSettlementEffect> {
		if !attrs.get_bool("v0/params/dfip2203/active") {
			return Vec::new();
		}
		let discount = COIN.saturating_sub(reward_pct);

		let mut due = Vec::new();
		self.store.for_each_prefix(keys::DUSD_QUEUE_TAG, &mut |k, v| {
			if keys::height_of(keys::DUSD_QUEUE_TAG, k).map(|h| h <= settlement_height).unwrap_or(false) {
				if let Ok(entry) = serde_json::from_slice::<DUSDFuturesEntry>(v) {
					due.push((k.to_vec(), entry));
				}
			}
			true
		});

		let mut effects = Vec::with_capacity(due.len());
		for (key, entry) in due {
			let owner = owner_from_dusd_key(&key);
			let effect = match scaled_live_price(oracle, attrs, NATIVE_TOKEN_ID, discount) {
				Some(discount_price) => {
					let minted =
						entry.source_amount.checked_mul_coin_scaled(discount_price.raw()).unwrap_or(Amount::ZERO);
					let _ = balances.add_balance(&owner, dusd_token, minted);
					FuturesSettlementEffect::Minted {
						owner: owner.clone(),
						source_token: NATIVE_TOKEN_ID,
						source_amount: entry.source_amount,
						minted_token: dusd_token,
						minted_amount: minted,
					}
				}
				None => self.refund_unpaid(&owner, NATIVE_TOKEN_ID, entry.source_amount, balances),
			};
			effects.push(effect);
			self.store.erase(&key);
		}
		effects
	}

	/// The sum of every still-queued amount in both queues belonging to
	/// `owner`, expressed in `token` (only matches entries whose escrowed
	/// side is `token`). Used by `FuturesApi::pending_settlement_value`.
	fn pending_value(&self, owner: &Script, token: TokenId) -> Amount {
		let mut total = Amount::ZERO;
		self.store.for_each_prefix(keys::TOKEN_QUEUE_TAG, &mut |k, v| {
			if owner_from_token_key(k) == *owner {
				if let Ok(entry) = serde_json::from_slice::<TokenFuturesEntry>(v) {
					if entry.source_token == token {
						total = total.checked_add(entry.source_amount).unwrap_or(total);
					}
				}
			}
			true
		});
		if token == NATIVE_TOKEN_ID {
			self.store.for_each_prefix(keys::DUSD_QUEUE_TAG, &mut |k, v| {
				if owner_from_dusd_key(k) == *owner {
					if let Ok(entry) = serde_json::from_slice::<DUSDFuturesEntry>(v) {
						total = total.checked_add(entry.source_amount).unwrap_or(total);
					}
				}
				true
			});
		}
		total
	}

	/// Refunds and erases every queued entry that references `token_id`,
	/// in either role (source or destination) for the token queue, and
	/// (when `token_id == dusd_token`) every entry of the DUSD queue
	/// (§4.H step 1, "refund every affected futures entry of token t").
	/// Returns the number of entries refunded.
	pub fn refund_entries_referencing<B: BalancesApi>(
		&mut self,
		token_id: TokenId,
		dusd_token: TokenId,
		balances: &mut B,
	) -> u32 {
		let mut matched = Vec::new();
		self.store.for_each_prefix(keys::TOKEN_QUEUE_TAG, &mut |k, v| {
			if let Ok(entry) = serde_json::from_slice::<TokenFuturesEntry>(v) {
				if entry.source_token == token_id || entry.destination_token == token_id {
					matched.push((k.to_vec(), entry.source_token, entry.source_amount));
				}
			}
			true
		});
		if token_id == dusd_token || token_id == NATIVE_TOKEN_ID {
			self.store.for_each_prefix(keys::DUSD_QUEUE_TAG, &mut |k, v| {
				if let Ok(entry) = serde_json::from_slice::<DUSDFuturesEntry>(v) {
					matched.push((k.to_vec(), NATIVE_TOKEN_ID, entry.source_amount));
				}
				true
			});
		}

		let count = matched.len() as u32;
		for (key, source_token, source_amount) in matched {
			let owner = if key.starts_with(keys::DUSD_QUEUE_TAG) { owner_from_dusd_key(&key) } else { owner_from_token_key(&key) };
			let _ = balances.add_balance(&owner, source_token, source_amount);
			self.store.erase(&key);
		}
		count
	}
}

fn owner_from_token_key(key: &[u8]) -> Script {
	owner_from_key(keys::TOKEN_QUEUE_TAG, key)
}

fn owner_from_dusd_key(key: &[u8]) -> Script {
	owner_from_key(keys::DUSD_QUEUE_TAG, key)
}

fn owner_from_key(tag: &[u8], key: &[u8]) -> Script {
	let rest = &key[tag.len() + 4..];
	let len = u32::from_be_bytes(rest[0..4].try_into().expect("length prefix")) as usize;
	Script::from_bytes(rest[4..4 + len].to_vec())
}

impl<'s, S: KvRead + KvWrite + ?Sized> FuturesApi for FuturesEngine<'s, S> {
	type Error = FuturesError;

	fn pending_settlement_value(&self, owner: &Script, token: TokenId) -> Amount {
		self.pending_value(owner, token)
	}
}

#[cfg(test)]
mod tests;

//! Oracle feeds and fixed-interval price rotation (Component D, §4.D).

mod aggregate;
mod error;
mod keys;

pub use aggregate::{weighted_median, WeightedFeed, NO_AGGREGATE};
pub use error::OracleError;

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, CurrencyPair, Height, Timestamp};
use core_traits::OracleApi;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct StoredFeed {
	value: i64,
	timestamp: Timestamp,
	weight: u32,
}

/// A pair's rotating price slots (§4.D, I-D1).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FixedIntervalPrice {
	pub active: i64,
	pub next: i64,
	pub timestamp: Timestamp,
}

/// Parameters governing aggregation and liveness, distinct per deployment
/// and normally sourced from the attribute store (§4.E).
#[derive(Clone, Copy, Debug)]
pub struct OracleParams {
	pub freshness_secs: Timestamp,
	pub min_feeders: usize,
	/// Maximum allowed `|next - active| / active`, COIN-scaled.
	pub max_deviation: i64,
	pub blocks_per_price_interval: u32,
}

pub struct Oracle<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> Oracle<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		Oracle { store }
	}

	/// Registers `pair` for aggregation, with `max_deviation` (COIN-scaled
	/// fraction) as its liveness tolerance (§4.D).
	pub fn register_pair(&mut self, pair: &CurrencyPair, max_deviation: i64) {
		self.store.put(keys::registered_pair_key(pair), max_deviation.to_be_bytes().to_vec());
	}

	pub fn is_registered(&self, pair: &CurrencyPair) -> bool {
		self.store.get(&keys::registered_pair_key(pair)).is_some()
	}

	fn max_deviation(&self, pair: &CurrencyPair) -> Option<i64> {
		let bytes = self.store.get(&keys::registered_pair_key(pair))?;
		Some(i64::from_be_bytes(bytes.try_into().ok()?))
	}

	/// Records (or overwrites) a feeder's latest observation for `pair`.
	pub fn submit_feed(
		&mut self,
		pair: &CurrencyPair,
		feeder: &str,
		value: Amount,
		timestamp: Timestamp,
		weight: u32,
	) -> Result<(), OracleError> {
		if !self.is_registered(pair) {
			return Err(OracleError::PairNotRegistered);
		}
		if weight == 0 {
			return Err(OracleError::ZeroWeight);
		}
		let feed = StoredFeed { value: value.raw(), timestamp, weight };
		self.store.put(keys::feed_key(pair, feeder), serde_json::to_vec(&feed).expect("StoredFeed serializes"));
		Ok(())
	}

	fn live_feeds(&self, pair: &CurrencyPair, block_time: Timestamp, freshness_secs: Timestamp) -> Vec<WeightedFeed> {
		let mut feeds = Vec::new();
		self.store.for_each_prefix(&keys::feed_prefix(pair), &mut |_k, v| {
			if let Ok(feed) = serde_json::from_slice::<StoredFeed>(v) {
				if block_time.saturating_sub(feed.timestamp) <= freshness_secs {
					feeds.push(WeightedFeed { value: Amount::from_coin_units(feed.value), weight: feed.weight });
				}
			}
			true
		});
		feeds
	}

	pub fn price(&self, pair: &CurrencyPair) -> FixedIntervalPrice {
		self.store
			.get(&keys::price_key(pair))
			.and_then(|b| serde_json::from_slice(&b).ok())
			.unwrap_or_default()
	}

	fn put_price(&mut self, pair: &CurrencyPair, price: FixedIntervalPrice) {
		self.store.put(keys::price_key(pair), serde_json::to_vec(&price).expect("FixedIntervalPrice serializes"));
	}

	/// Rotates every registered pair's price slots if `height` is a
	/// multiple of `params.blocks_per_price_interval` (§4.D, I-D1).
	/// No-op otherwise.
	pub fn rotate_all(&mut self, height: Height, block_time: Timestamp, params: OracleParams) {
		if params.blocks_per_price_interval == 0 || height % params.blocks_per_price_interval != 0 {
			return;
		}
		let pairs = self.registered_pairs();
		for pair in pairs {
			self.rotate_one(&pair, block_time, params);
		}
	}

	fn registered_pairs(&self) -> Vec<CurrencyPair> {
		let mut pairs = Vec::new();
		self.store.for_each_prefix(keys::REGISTERED_PAIR_PREFIX, &mut |k, _v| {
			if let Some(rest) = k.strip_prefix(keys::REGISTERED_PAIR_PREFIX) {
				if let Some((token, currency)) = std::str::from_utf8(rest).ok().and_then(|s| s.split_once('/')) {
					pairs.push(CurrencyPair::new(token.to_string(), currency.to_string()));
				}
			}
			true
		});
		pairs
	}

	fn rotate_one(&mut self, pair: &CurrencyPair, block_time: Timestamp, params: OracleParams) {
		let live = self.live_feeds(pair, block_time, params.freshness_secs);
		let new_aggregate = weighted_median(live, params.min_feeders);

		let mut price = self.price(pair);
		price.active = if price.next > 0 { price.next } else { price.active };
		price.next = new_aggregate.raw();
		price.timestamp = block_time;
		self.put_price(pair, price);
	}
}

impl<'s, S: KvRead + KvWrite + ?Sized> OracleApi for Oracle<'s, S> {
	type Error = OracleError;

	fn active_price(&self, pair: &CurrencyPair) -> Option<Amount> {
		let price = self.price(pair);
		(price.active > 0).then(|| Amount::from_coin_units(price.active))
	}

	fn next_price(&self, pair: &CurrencyPair) -> Option<Amount> {
		let price = self.price(pair);
		(price.next > 0).then(|| Amount::from_coin_units(price.next))
	}

	fn is_live(&self, pair: &CurrencyPair, _at_height: Height) -> bool {
		let price = self.price(pair);
		if price.active <= 0 || price.next <= 0 {
			return false;
		}
		let Some(max_deviation) = self.max_deviation(pair) else { return false };
		// |next - active| / active <= maxDeviation, both COIN-scaled.
		let deviation_scaled = (price.next - price.active).unsigned_abs() as i128 * core_primitives::COIN as i128
			/ price.active as i128;
		deviation_scaled <= max_deviation as i128
	}
}

#[cfg(test)]
mod tests;

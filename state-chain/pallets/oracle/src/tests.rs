use crate::{Oracle, OracleParams};
use core_kvstore::MemoryStore;
use core_primitives::{Amount, CurrencyPair, COIN};
use core_traits::OracleApi;

fn pair() -> CurrencyPair {
	CurrencyPair::new("BTC".into(), "USD".into())
}

fn params() -> OracleParams {
	OracleParams { freshness_secs: 60, min_feeders: 2, max_deviation: COIN / 10, blocks_per_price_interval: 120 }
}

#[test]
fn rotation_only_happens_on_the_interval_boundary() {
	let mut store = MemoryStore::new();
	let mut oracle = Oracle::new(&mut store);
	oracle.register_pair(&pair(), COIN / 10);
    oracle.submit_feed(&pair(), "a", Amount::from_coin_units(100), 1000, 1).unwrap();
    oracle.submit_feed(&pair(), "b", Amount::from_coin_units(110), 1000, 1).unwrap();

	oracle.rotate_all(119, 1000, params());
	assert_eq!(oracle.price(&pair()).next, 0);

	oracle.rotate_all(120, 1000, params());
	assert!(oracle.price(&pair()).next > 0);
}

#[test]
fn stale_feeds_are_excluded_from_aggregation() {
	let mut store = MemoryStore::new();
	let mut oracle = Oracle::new(&mut store);
	oracle.register_pair(&pair(), COIN / 10);
	oracle.submit_feed(&pair(), "a", Amount::from_coin_units(100), 0, 1).unwrap();
	oracle.submit_feed(&pair(), "b", Amount::from_coin_units(100), 0, 1).unwrap();

	// block_time far beyond freshness window -> both feeds stale -> below min_feeders
	oracle.rotate_all(120, 10_000, params());
	assert_eq!(oracle.price(&pair()).next, crate::NO_AGGREGATE.raw());
}

#[test]
fn liveness_requires_two_positive_rotations_within_deviation() {
	let mut store = MemoryStore::new();
	let mut oracle = Oracle::new(&mut store);
	oracle.register_pair(&pair(), COIN / 10);
	oracle.submit_feed(&pair(), "a", Amount::from_coin_units(1000 * COIN), 0, 1).unwrap();
	oracle.submit_feed(&pair(), "b", Amount::from_coin_units(1000 * COIN), 0, 1).unwrap();

	oracle.rotate_all(0, 0, params());
	assert!(!oracle.is_live(&pair(), 0));

	oracle.rotate_all(120, 0, params());
	assert!(oracle.is_live(&pair(), 120));
	assert_eq!(oracle.active_price(&pair()), Some(Amount::from_coin_units(1000 * COIN)));
}

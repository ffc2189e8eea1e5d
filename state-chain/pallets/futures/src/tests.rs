use crate::{FuturesEngine, FuturesSettlementEffect};
use core_kvstore::MemoryStore;
use core_primitives::{Amount, CurrencyPair, Script, COIN, NATIVE_TOKEN_ID};
use core_traits::BalancesApi;
use pallet_attributes::AttributeStore;
use pallet_balances::Balances;
use pallet_oracle::{Oracle, OracleParams};

const DUSD_TOKEN: u32 = 1;
const TSLA_TOKEN: u32 = 2;

fn owner() -> Script {
	Script::from("bob")
}

fn activate_dfip2203(attrs_store: &mut MemoryStore) {
	let mut attrs = AttributeStore::new(attrs_store);
	attrs.set_external("v0/params/dfip2203/active", "true", 0, None).unwrap();
	attrs.set_external("v0/token/1/dfip2203", "true", 0, None).unwrap();
	attrs.set_external("v0/token/2/dfip2203", "true", 0, None).unwrap();
	attrs.set_external("v0/token/1/fixed_interval_price_id", "DUSD/USD", 0, None).unwrap();
	attrs.set_external("v0/token/2/fixed_interval_price_id", "TSLA/USD", 0, None).unwrap();
}

fn priced_oracle(store: &mut MemoryStore, tsla_price: i64) {
	let mut oracle = Oracle::new(store);
	let dusd = CurrencyPair::new("DUSD", "USD");
	let tsla = CurrencyPair::new("TSLA", "USD");
	let params = OracleParams { freshness_secs: 3600, min_feeders: 1, max_deviation: COIN, blocks_per_price_interval: 1 };
	oracle.register_pair(&dusd, COIN);
	oracle.register_pair(&tsla, tsla_price);
	for height in [0u32, 1u32] {
		oracle.submit_feed(&dusd, "f1", Amount::from_coin_units(COIN), 1_000, 1).unwrap();
		oracle.submit_feed(&tsla, "f1", Amount::from_coin_units(tsla_price), 1_000, 1).unwrap();
		oracle.rotate_all(height, 1_000, params);
	}
}

#[test]
fn submit_then_cancel_refunds_the_escrowed_source() {
	let mut futures_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	let mut balances = Balances::new(&mut balances_store);
	balances.add_balance(&owner(), DUSD_TOKEN, Amount::from_coin_units(100 * COIN)).unwrap();

	let mut engine = FuturesEngine::new(&mut futures_store);
	engine
		.submit_token_future(105, owner(), 0, DUSD_TOKEN, Amount::from_coin_units(100 * COIN), TSLA_TOKEN, &mut balances)
		.unwrap();
	assert_eq!(balances.get_balance(&owner(), DUSD_TOKEN), Amount::ZERO);
	assert!(engine.token_entry(105, &owner(), 0).is_some());

	engine.cancel_token_future(105, owner(), 0, &mut balances).unwrap();
	assert_eq!(balances.get_balance(&owner(), DUSD_TOKEN), Amount::from_coin_units(100 * COIN));
	assert!(engine.token_entry(105, &owner(), 0).is_none());
}

#[test]
fn settlement_mints_the_destination_token_at_the_premium_price() {
	let mut futures_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	activate_dfip2203(&mut attrs_store);
	priced_oracle(&mut oracle_store, 10 * COIN);

	let mut balances = Balances::new(&mut balances_store);
	balances.add_balance(&owner(), DUSD_TOKEN, Amount::from_coin_units(100 * COIN)).unwrap();

	let mut engine = FuturesEngine::new(&mut futures_store);
	engine
		.submit_token_future(105, owner(), 0, DUSD_TOKEN, Amount::from_coin_units(100 * COIN), TSLA_TOKEN, &mut balances)
		.unwrap();

	let attrs = AttributeStore::new(&mut attrs_store);
	let oracle = Oracle::new(&mut oracle_store);
	let effects = engine.settle_token_futures(120, DUSD_TOKEN, COIN / 20, &oracle, &attrs, &mut balances);

	assert_eq!(effects.len(), 1);
	match &effects[0] {
		FuturesSettlementEffect::Minted { minted_token, minted_amount, .. } => {
			assert_eq!(*minted_token, TSLA_TOKEN);
			// 100 / (10.00 * 1.05) = 9.52380952 (truncated toward zero)
			assert_eq!(*minted_amount, Amount::from_coin_units(952_380_952));
		}
		other => panic!("expected Minted, got {other:?}"),
	}
	assert_eq!(balances.get_balance(&owner(), TSLA_TOKEN), Amount::from_coin_units(952_380_952));
	assert!(engine.token_entry(105, &owner(), 0).is_none());
}

#[test]
fn settlement_mints_dusd_at_the_discount_price_for_a_non_dusd_source() {
	let mut futures_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	activate_dfip2203(&mut attrs_store);
	priced_oracle(&mut oracle_store, 10 * COIN);

	let mut balances = Balances::new(&mut balances_store);
	balances.add_balance(&owner(), TSLA_TOKEN, Amount::from_coin_units(10 * COIN)).unwrap();

	let mut engine = FuturesEngine::new(&mut futures_store);
	engine
		.submit_token_future(105, owner(), 0, TSLA_TOKEN, Amount::from_coin_units(10 * COIN), DUSD_TOKEN, &mut balances)
		.unwrap();

	let attrs = AttributeStore::new(&mut attrs_store);
	let oracle = Oracle::new(&mut oracle_store);
	let effects = engine.settle_token_futures(120, DUSD_TOKEN, COIN / 20, &oracle, &attrs, &mut balances);

	assert_eq!(effects.len(), 1);
	match &effects[0] {
		FuturesSettlementEffect::Minted { minted_token, minted_amount, .. } => {
			assert_eq!(*minted_token, DUSD_TOKEN);
			// 10 TSLA * (10.00 * 0.95) = 95 DUSD
			assert_eq!(*minted_amount, Amount::from_coin_units(95 * COIN));
		}
		other => panic!("expected Minted, got {other:?}"),
	}
	assert_eq!(balances.get_balance(&owner(), DUSD_TOKEN), Amount::from_coin_units(95 * COIN));
}

#[test]
fn settlement_refunds_an_unpaid_intent_when_no_live_price_exists() {
	let mut futures_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	// No oracle pair registered at all: the destination feed is never live.
	activate_dfip2203(&mut attrs_store);

	let mut balances = Balances::new(&mut balances_store);
	balances.add_balance(&owner(), DUSD_TOKEN, Amount::from_coin_units(100 * COIN)).unwrap();

	let mut engine = FuturesEngine::new(&mut futures_store);
	engine
		.submit_token_future(105, owner(), 0, DUSD_TOKEN, Amount::from_coin_units(100 * COIN), TSLA_TOKEN, &mut balances)
		.unwrap();

	let attrs = AttributeStore::new(&mut attrs_store);
	let oracle = Oracle::new(&mut oracle_store);
	let effects = engine.settle_token_futures(120, DUSD_TOKEN, COIN / 20, &oracle, &attrs, &mut balances);

	assert_eq!(effects.len(), 1);
	assert!(matches!(effects[0], FuturesSettlementEffect::Unpaid { .. }));
	assert_eq!(balances.get_balance(&owner(), DUSD_TOKEN), Amount::from_coin_units(100 * COIN));
	assert!(engine.token_entry(105, &owner(), 0).is_none());
}

#[test]
fn settlement_only_drains_entries_due_by_the_settlement_height() {
	let mut futures_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	activate_dfip2203(&mut attrs_store);
	priced_oracle(&mut oracle_store, 10 * COIN);

	let mut balances = Balances::new(&mut balances_store);
	balances.add_balance(&owner(), DUSD_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();

	let mut engine = FuturesEngine::new(&mut futures_store);
	engine
		.submit_token_future(105, owner(), 0, DUSD_TOKEN, Amount::from_coin_units(100 * COIN), TSLA_TOKEN, &mut balances)
		.unwrap();
	engine
		.submit_token_future(200, owner(), 0, DUSD_TOKEN, Amount::from_coin_units(100 * COIN), TSLA_TOKEN, &mut balances)
		.unwrap();

	let attrs = AttributeStore::new(&mut attrs_store);
	let oracle = Oracle::new(&mut oracle_store);
	let effects = engine.settle_token_futures(120, DUSD_TOKEN, COIN / 20, &oracle, &attrs, &mut balances);

	assert_eq!(effects.len(), 1);
	assert!(engine.token_entry(105, &owner(), 0).is_none());
	assert!(engine.token_entry(200, &owner(), 0).is_some());
}

#[test]
fn dusd_future_submit_cancel_round_trips_the_native_coin_escrow() {
	let mut futures_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	let mut balances = Balances::new(&mut balances_store);
	balances.add_balance(&owner(), NATIVE_TOKEN_ID, Amount::from_coin_units(50 * COIN)).unwrap();

	let mut engine = FuturesEngine::new(&mut futures_store);
	engine.submit_dusd_future(105, owner(), 0, Amount::from_coin_units(50 * COIN), &mut balances).unwrap();
	assert_eq!(balances.get_balance(&owner(), NATIVE_TOKEN_ID), Amount::ZERO);

	engine.cancel_dusd_future(105, owner(), 0, &mut balances).unwrap();
	assert_eq!(balances.get_balance(&owner(), NATIVE_TOKEN_ID), Amount::from_coin_units(50 * COIN));
}

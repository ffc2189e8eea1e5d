use crate::{AuctionSettlementEffect, LoanScheme, VaultEngine, VaultsError};
use core_kvstore::MemoryStore;
use core_primitives::{Amount, ChainParams, CurrencyPair, Script, TxHash, COIN};
use core_traits::BalancesApi;
use pallet_attributes::AttributeStore;
use pallet_balances::Balances;
use pallet_oracle::{Oracle, OracleParams};

const COLLATERAL_TOKEN: u32 = 1;
const LOAN_TOKEN: u32 = 2;

fn chain_params() -> ChainParams {
	ChainParams {
		blocks_per_day: 1440,
		blocks_per_year: 525_600,
		blocks_per_price_interval: 1,
		blocks_collateral_auction: 720,
		blocks_collateralization_ratio_calculation: 120,
		fork_heights: Default::default(),
	}
}

fn priced_oracle(store: &mut MemoryStore, dfi_price: i64, dusd_price: i64) {
	let mut oracle = Oracle::new(store);
	let dfi = CurrencyPair::new("DFI", "USD");
	let dusd = CurrencyPair::new("DUSD", "USD");
	let params = OracleParams { freshness_secs: 3600, min_feeders: 1, max_deviation: COIN, blocks_per_price_interval: 1 };
	oracle.register_pair(&dfi, COIN);
	oracle.register_pair(&dusd, COIN);
	for height in [0u32, 1u32] {
		oracle.submit_feed(&dfi, "f1", Amount::from_coin_units(dfi_price), 1_000, 1).unwrap();
		oracle.submit_feed(&dusd, "f1", Amount::from_coin_units(dusd_price), 1_000, 1).unwrap();
		oracle.rotate_all(height, 1_000, params);
	}
}

fn linked_attributes(store: &mut MemoryStore) {
	let mut attrs = AttributeStore::new(store);
	attrs.set_external("v0/token/1/fixed_interval_price_id", "DFI/USD", 0, None).unwrap();
	attrs.set_external("v0/token/2/fixed_interval_price_id", "DUSD/USD", 0, None).unwrap();
}

fn owner() -> Script {
	Script::from("alice")
}

#[test]
fn take_loan_succeeds_when_ratio_clears_the_scheme_minimum() {
	let mut vault_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	priced_oracle(&mut oracle_store, COIN, COIN);
	linked_attributes(&mut attrs_store);

	let vault_id = TxHash([1u8; 32]);
	let mut engine = VaultEngine::new(&mut vault_store);
	engine.put_scheme(LoanScheme {
		identifier: "MIN150".to_string(),
		min_collateral_ratio: 150,
		interest_rate: 0,
		activation_height: None,
		deleted_at: None,
	});
	engine.create_vault(vault_id, owner(), "MIN150".to_string()).unwrap();
	engine.add_collateral(&vault_id, COLLATERAL_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();

	let oracle = Oracle::new(&mut oracle_store);
	let attrs = AttributeStore::new(&mut attrs_store);
	let mut balances = Balances::new(&mut balances_store);
	let params = chain_params();

	engine
		.take_loan(&vault_id, LOAN_TOKEN, Amount::from_coin_units(100 * COIN), 0, 10, &params, &oracle, &attrs, &mut balances)
		.unwrap();

	assert_eq!(balances.get_balance(&owner(), LOAN_TOKEN), Amount::from_coin_units(100 * COIN));
	assert_eq!(engine.loans(&vault_id).get(&LOAN_TOKEN).copied(), Some(Amount::from_coin_units(100 * COIN)));
}

#[test]
fn take_loan_rejects_when_ratio_would_fall_below_minimum() {
	let mut vault_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	priced_oracle(&mut oracle_store, COIN, COIN);
	linked_attributes(&mut attrs_store);

	let vault_id = TxHash([2u8; 32]);
	let mut engine = VaultEngine::new(&mut vault_store);
	engine.put_scheme(LoanScheme {
		identifier: "MIN150".to_string(),
		min_collateral_ratio: 150,
		interest_rate: 0,
		activation_height: None,
		deleted_at: None,
	});
	engine.create_vault(vault_id, owner(), "MIN150".to_string()).unwrap();
	engine.add_collateral(&vault_id, COLLATERAL_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();

	let oracle = Oracle::new(&mut oracle_store);
	let attrs = AttributeStore::new(&mut attrs_store);
	let mut balances = Balances::new(&mut balances_store);
	let params = chain_params();

	let err = engine
		.take_loan(&vault_id, LOAN_TOKEN, Amount::from_coin_units(150 * COIN), 0, 10, &params, &oracle, &attrs, &mut balances)
		.unwrap_err();
	assert_eq!(err, VaultsError::InsufficientCollateralization);
}

#[test]
fn payback_loan_erases_the_interest_row_once_the_balance_reaches_zero() {
	let mut vault_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	priced_oracle(&mut oracle_store, COIN, COIN);
	linked_attributes(&mut attrs_store);

	let vault_id = TxHash([3u8; 32]);
	let mut engine = VaultEngine::new(&mut vault_store);
	engine.put_scheme(LoanScheme {
		identifier: "MIN150".to_string(),
		min_collateral_ratio: 150,
		interest_rate: 0,
		activation_height: None,
		deleted_at: None,
	});
	engine.create_vault(vault_id, owner(), "MIN150".to_string()).unwrap();
	engine.add_collateral(&vault_id, COLLATERAL_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();

	{
		let oracle = Oracle::new(&mut oracle_store);
		let attrs = AttributeStore::new(&mut attrs_store);
		let mut balances = Balances::new(&mut balances_store);
		let params = chain_params();
		engine
			.take_loan(&vault_id, LOAN_TOKEN, Amount::from_coin_units(100 * COIN), 0, 10, &params, &oracle, &attrs, &mut balances)
			.unwrap();
	}

	let mut balances = Balances::new(&mut balances_store);
	let params = chain_params();
	engine.payback_loan(&vault_id, LOAN_TOKEN, Amount::from_coin_units(100 * COIN), 0, 20, &params, &mut balances).unwrap();

	assert!(engine.loans(&vault_id).is_empty());
	assert_eq!(balances.get_balance(&owner(), LOAN_TOKEN), Amount::ZERO);
}

#[test]
fn sweep_liquidations_moves_an_undercollateralized_vault_into_a_single_auction_batch() {
	let mut vault_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	priced_oracle(&mut oracle_store, COIN, COIN);
	linked_attributes(&mut attrs_store);

	let vault_id = TxHash([4u8; 32]);
	let mut engine = VaultEngine::new(&mut vault_store);
	engine.put_scheme(LoanScheme {
		identifier: "MIN150".to_string(),
		min_collateral_ratio: 150,
		interest_rate: 0,
		activation_height: None,
		deleted_at: None,
	});
	engine.create_vault(vault_id, owner(), "MIN150".to_string()).unwrap();
	engine.add_collateral(&vault_id, COLLATERAL_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();
	{
		let oracle = Oracle::new(&mut oracle_store);
		let attrs = AttributeStore::new(&mut attrs_store);
		let mut balances = Balances::new(&mut balances_store);
		let params = chain_params();
		engine
			.take_loan(&vault_id, LOAN_TOKEN, Amount::from_coin_units(100 * COIN), 0, 10, &params, &oracle, &attrs, &mut balances)
			.unwrap();
	}

	// Crash the collateral price so 200 DFI backing 100 DUSD no longer
	// clears the 150% minimum.
	priced_oracle(&mut oracle_store, COIN / 2, COIN);

	let oracle = Oracle::new(&mut oracle_store);
	let attrs = AttributeStore::new(&mut attrs_store);
	let liquidated = engine.sweep_liquidations(&[vault_id], 20, 720, COIN / 20, &oracle, &attrs);

	assert_eq!(liquidated, vec![vault_id]);
	assert!(engine.get_vault(&vault_id).unwrap().is_under_liquidation);
	let auction = engine.get_auction(&vault_id).unwrap();
	assert_eq!(auction.batch_count, 1);
	assert!(engine.loans(&vault_id).is_empty());
	assert!(engine.collaterals(&vault_id).is_empty());
}

#[test]
fn settling_a_won_auction_batch_reports_refund_and_burn_amounts() {
	let mut vault_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	priced_oracle(&mut oracle_store, COIN, COIN);
	linked_attributes(&mut attrs_store);

	let vault_id = TxHash([5u8; 32]);
	let mut engine = VaultEngine::new(&mut vault_store);
	engine.put_scheme(LoanScheme {
		identifier: "MIN150".to_string(),
		min_collateral_ratio: 150,
		interest_rate: 0,
		activation_height: None,
		deleted_at: None,
	});
	engine.create_vault(vault_id, owner(), "MIN150".to_string()).unwrap();
	engine.add_collateral(&vault_id, COLLATERAL_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();
	{
		let oracle = Oracle::new(&mut oracle_store);
		let attrs = AttributeStore::new(&mut attrs_store);
		let mut balances = Balances::new(&mut balances_store);
		let params = chain_params();
		engine
			.take_loan(&vault_id, LOAN_TOKEN, Amount::from_coin_units(100 * COIN), 0, 10, &params, &oracle, &attrs, &mut balances)
			.unwrap();
	}
	priced_oracle(&mut oracle_store, COIN / 2, COIN);
	{
		let oracle = Oracle::new(&mut oracle_store);
		let attrs = AttributeStore::new(&mut attrs_store);
		engine.sweep_liquidations(&[vault_id], 20, 720, COIN / 20, &oracle, &attrs);
	}

	let bidder = Script::from("bob");
	let mut balances = Balances::new(&mut balances_store);
	balances.add_balance(&bidder, LOAN_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();
	engine.place_bid(&vault_id, 0, bidder.clone(), Amount::from_coin_units(110 * COIN), &mut balances, COIN / 100).unwrap();

	let params = chain_params();
	let effects = engine.settle_auction(&vault_id, 740, 0, &params);
	assert_eq!(effects.len(), 1);
	match &effects[0] {
		AuctionSettlementEffect::Won { winner, bid_token, refund_to_vault, burn_amount, .. } => {
			assert_eq!(*winner, bidder);
			assert_eq!(*bid_token, LOAN_TOKEN);
			// floor = 100 COIN * (1 + penalty 5%) = 105 COIN; bid was 110 COIN.
			assert_eq!(*refund_to_vault, Amount::from_coin_units(5 * COIN));
			assert_eq!(*burn_amount, Amount::from_coin_units(5 * COIN));
		}
		other => panic!("expected a Won effect, got {other:?}"),
	}
	assert!(!engine.get_vault(&vault_id).unwrap().is_under_liquidation);
}

#[test]
fn settling_an_unwon_auction_batch_returns_collateral_and_reseeds_the_loan() {
	let mut vault_store = MemoryStore::new();
	let mut oracle_store = MemoryStore::new();
	let mut attrs_store = MemoryStore::new();
	let mut balances_store = MemoryStore::new();
	priced_oracle(&mut oracle_store, COIN, COIN);
	linked_attributes(&mut attrs_store);

	let vault_id = TxHash([6u8; 32]);
	let mut engine = VaultEngine::new(&mut vault_store);
	engine.put_scheme(LoanScheme {
		identifier: "MIN150".to_string(),
		min_collateral_ratio: 150,
		interest_rate: 0,
		activation_height: None,
		deleted_at: None,
	});
	engine.create_vault(vault_id, owner(), "MIN150".to_string()).unwrap();
	engine.add_collateral(&vault_id, COLLATERAL_TOKEN, Amount::from_coin_units(200 * COIN)).unwrap();
	{
		let oracle = Oracle::new(&mut oracle_store);
		let attrs = AttributeStore::new(&mut attrs_store);
		let mut balances = Balances::new(&mut balances_store);
		let params = chain_params();
		engine
			.take_loan(&vault_id, LOAN_TOKEN, Amount::from_coin_units(100 * COIN), 0, 10, &params, &oracle, &attrs, &mut balances)
			.unwrap();
	}
	priced_oracle(&mut oracle_store, COIN / 2, COIN);
	{
		let oracle = Oracle::new(&mut oracle_store);
		let attrs = AttributeStore::new(&mut attrs_store);
		engine.sweep_liquidations(&[vault_id], 20, 720, COIN / 20, &oracle, &attrs);
	}

	let params = chain_params();
	let effects = engine.settle_auction(&vault_id, 740, 0, &params);
	assert_eq!(effects.len(), 1);
	match &effects[0] {
		AuctionSettlementEffect::Unwon { returned_collaterals, reseeded_loan_token, reseeded_loan_amount, .. } => {
			assert_eq!(returned_collaterals.get(&COLLATERAL_TOKEN).copied(), Some(Amount::from_coin_units(200 * COIN)));
			assert_eq!(*reseeded_loan_token, LOAN_TOKEN);
			assert_eq!(*reseeded_loan_amount, Amount::from_coin_units(100 * COIN));
		}
		other => panic!("expected an Unwon effect, got {other:?}"),
	}
	assert!(!engine.get_vault(&vault_id).unwrap().is_under_liquidation);
	assert_eq!(engine.collaterals(&vault_id).get(&COLLATERAL_TOKEN).copied(), Some(Amount::from_coin_units(200 * COIN)));
}

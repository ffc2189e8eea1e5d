use crate::execute_token_split;
use core_kvstore::MemoryStore;
use core_primitives::{Amount, Script, TokenId, TxHash, COIN};
use core_traits::BalancesApi;
use pallet_attributes::AttributeStore;
use pallet_balances::Balances;
use pallet_futures::FuturesEngine;
use pallet_tokens::{Pools, TokenFlags, TokenRegistry};
use pallet_vaults::{LoanScheme, VaultEngine};

const DUSD_TOKEN: TokenId = 1;

struct Harness {
	tokens: MemoryStore,
	balances: MemoryStore,
	attrs: MemoryStore,
	futures: MemoryStore,
	vaults: MemoryStore,
	old_token: TokenId,
}

fn setup() -> Harness {
	let mut tokens = MemoryStore::new();
	let old_token =
		TokenRegistry::new(&mut tokens).create_token("GLD".into(), "Gold".into(), TokenFlags { dat: true, tradeable: true, ..Default::default() }, 0).unwrap();
	Harness { tokens, balances: MemoryStore::new(), attrs: MemoryStore::new(), futures: MemoryStore::new(), vaults: MemoryStore::new(), old_token }
}

#[test]
fn old_token_is_renamed_v1_and_the_new_token_keeps_the_original_symbol() {
	let mut h = setup();
	let report = execute_token_split(
		&mut h.tokens,
		&mut h.balances,
		&mut h.attrs,
		&mut h.futures,
		&mut h.vaults,
		h.old_token,
		DUSD_TOKEN,
		2 * COIN,
		200,
		&[],
	)
	.unwrap();

	let registry = TokenRegistry::new(&mut h.tokens);
	let old = registry.get_token(h.old_token).unwrap();
	assert_eq!(old.symbol, "GLD/v1");
	assert!(old.destroyed);

	let new = registry.get_token(report.new_token).unwrap();
	assert_eq!(new.symbol, "GLD");
	assert!(!new.destroyed);
	assert_eq!(report.renamed_old_symbol, "GLD/v1");
}

#[test]
fn a_second_split_of_the_same_symbol_allocates_v2() {
	let mut h = setup();
	let first =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 200, &[])
			.unwrap();

	let second = execute_token_split(
		&mut h.tokens,
		&mut h.balances,
		&mut h.attrs,
		&mut h.futures,
		&mut h.vaults,
		first.new_token,
		DUSD_TOKEN,
		2 * COIN,
		300,
		&[],
	)
	.unwrap();

	assert_eq!(second.renamed_old_symbol, "GLD/v2");
	let new = TokenRegistry::new(&mut h.tokens).get_token(second.new_token).unwrap();
	assert_eq!(new.symbol, "GLD");
}

#[test]
fn attribute_paths_under_the_old_token_are_rewritten_to_the_new_one() {
	let mut h = setup();
	{
		let mut attrs = AttributeStore::new(&mut h.attrs);
		attrs.set_external(&format!("v0/token/{}/loan_collateral_factor", h.old_token), "0.8", 0, None).unwrap();
	}

	let report =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 200, &[])
			.unwrap();

	let attrs = AttributeStore::new(&mut h.attrs);
	assert!(attrs.get_raw(&format!("v0/token/{}/loan_collateral_factor", h.old_token)).is_none());
	assert!(attrs.get_raw(&format!("v0/token/{}/loan_collateral_factor", report.new_token)).is_some());
	assert!(attrs.get_raw(&format!("v0/token/{}/ascendant", report.new_token)).is_some());
	assert!(attrs.get_raw(&format!("v0/token/{}/descendant", h.old_token)).is_some());
}

#[test]
fn lock_flags_flip_from_the_old_token_to_the_new_one() {
	let mut h = setup();
	{
		let mut attrs = AttributeStore::new(&mut h.attrs);
		attrs.set_internal(&format!("v0/locks/token/{}", h.old_token), pallet_attributes::AttributeValue::Bool(true));
	}

	let report =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 200, &[])
			.unwrap();

	assert!(!AttributeStore::new(&mut h.attrs).get_bool(&format!("v0/locks/token/{}", h.old_token)));
	assert!(AttributeStore::new(&mut h.attrs).get_bool(&format!("v0/locks/token/{}", report.new_token)));
}

#[test]
fn pending_futures_entries_referencing_the_split_token_are_refunded() {
	let mut h = setup();
	{
		let mut balances = Balances::new(&mut h.balances);
		balances.add_balance(&Script::from("bob"), h.old_token, Amount::from_coin_units(10 * COIN)).unwrap();
		let mut futures = FuturesEngine::new(&mut h.futures);
		futures.submit_token_future(105, Script::from("bob"), 0, h.old_token, Amount::from_coin_units(10 * COIN), DUSD_TOKEN, &mut balances).unwrap();
	}
	assert_eq!(Balances::new(&mut h.balances).get_balance(&Script::from("bob"), h.old_token), Amount::ZERO);

	let report =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 200, &[])
			.unwrap();

	assert_eq!(report.refunded_futures_entries, 1);
	assert_eq!(Balances::new(&mut h.balances).get_balance(&Script::from("bob"), h.old_token), Amount::from_coin_units(10 * COIN));
}

#[test]
fn holder_balances_double_for_a_two_to_one_split() {
	let mut h = setup();
	Balances::new(&mut h.balances).add_balance(&Script::from("alice"), h.old_token, Amount::from_coin_units(100 * COIN)).unwrap();

	let report =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 200, &[])
			.unwrap();

	let balances = Balances::new(&mut h.balances);
	assert_eq!(balances.get_balance(&Script::from("alice"), h.old_token), Amount::ZERO);
	assert_eq!(balances.get_balance(&Script::from("alice"), report.new_token), Amount::from_coin_units(200 * COIN));
	assert_eq!(report.total_minted, Amount::from_coin_units(200 * COIN));
}

#[test]
fn a_negative_multiplier_divides_holder_balances() {
	let mut h = setup();
	Balances::new(&mut h.balances).add_balance(&Script::from("alice"), h.old_token, Amount::from_coin_units(100 * COIN)).unwrap();

	// m = -4 means "divide by 4".
	let report =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, -4 * COIN, 200, &[])
			.unwrap();

	let balances = Balances::new(&mut h.balances);
	assert_eq!(balances.get_balance(&Script::from("alice"), report.new_token), Amount::from_coin_units(25 * COIN));
}

#[test]
fn pool_reserves_on_the_split_token_side_are_rescaled_and_fold_into_minted_tokens() {
	let mut h = setup();
	let other_token = TokenRegistry::new(&mut h.tokens)
		.create_token("SLV".into(), "Silver".into(), TokenFlags { dat: true, tradeable: true, ..Default::default() }, 0)
		.unwrap();
	let lp_token = {
		let mut tokens = TokenRegistry::new(&mut h.tokens);
		tokens.create_lp_token("GLD", "SLV", 0).unwrap()
	};
	{
		let mut pools = Pools::new(&mut h.tokens);
		pools.create_pool(lp_token, h.old_token, other_token, 0, 0).unwrap();
		pools.add_liquidity(lp_token, Amount::from_coin_units(500 * COIN), Amount::from_coin_units(500 * COIN)).unwrap();
	}
	Balances::new(&mut h.balances).add_balance(&Script::from("alice"), h.old_token, Amount::from_coin_units(100 * COIN)).unwrap();

	let report =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 200, &[])
			.unwrap();

	let pool = Pools::new(&mut h.tokens).get_pool(lp_token).unwrap();
	assert_eq!(pool.token_a, report.new_token);
	assert_eq!(pool.reserve_a, Amount::from_coin_units(1000 * COIN).raw());
	// 100 (holders) * 2 + 500 (pool reserve) * 2 = 1200
	assert_eq!(report.total_minted, Amount::from_coin_units(1200 * COIN));
}

#[test]
fn vault_collateral_and_loans_on_the_split_token_are_rescaled() {
	let mut h = setup();
	let vault_id = TxHash([7u8; 32]);
	{
		let mut vaults = VaultEngine::new(&mut h.vaults);
		vaults.create_vault(vault_id, Script::from("carol"), "DEFAULT".into()).unwrap();
		vaults.put_scheme(LoanScheme {
			identifier: "DEFAULT".into(),
			min_collateral_ratio: 150,
			interest_rate: 0,
			activation_height: None,
			deleted_at: None,
		});
		vaults.add_collateral(&vault_id, h.old_token, Amount::from_coin_units(100 * COIN)).unwrap();
	}

	let report = execute_token_split(
		&mut h.tokens,
		&mut h.balances,
		&mut h.attrs,
		&mut h.futures,
		&mut h.vaults,
		h.old_token,
		DUSD_TOKEN,
		2 * COIN,
		200,
		&[vault_id],
	)
	.unwrap();

	assert_eq!(report.vaults_considered, 1);
	let vaults = VaultEngine::new(&mut h.vaults);
	let collaterals = vaults.collaterals(&vault_id);
	assert_eq!(collaterals.get(&h.old_token), None);
	assert_eq!(collaterals.get(&report.new_token), Some(&Amount::from_coin_units(200 * COIN)));
}

#[test]
fn splitting_an_already_destroyed_token_is_rejected() {
	let mut h = setup();
	execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 200, &[]).unwrap();

	let err =
		execute_token_split(&mut h.tokens, &mut h.balances, &mut h.attrs, &mut h.futures, &mut h.vaults, h.old_token, DUSD_TOKEN, 2 * COIN, 300, &[])
			.unwrap_err();
	assert_eq!(err, crate::SplitsError::AlreadyDestroyed);
}

use crate::{Balances, BalancesError};
use core_kvstore::MemoryStore;
use core_primitives::{Amount, CurrencyPair, Script, TokenId};
use core_traits::{BalancesApi, PoolApi};

struct StubPools {
	index: Amount,
}

impl PoolApi for StubPools {
	type Error = BalancesError;

	fn pool_exists(&self, _pair: &CurrencyPair) -> bool {
		true
	}

	fn pool_reserves(&self, _pair: &CurrencyPair) -> Option<(Amount, Amount)> {
		None
	}

	fn quote_swap(&self, _pair: &CurrencyPair, _amount_in: Amount) -> Result<Amount, Self::Error> {
		Ok(Amount::ZERO)
	}

	fn execute_swap(&mut self, _pair: &CurrencyPair, _recipient: &Script, _amount_in: Amount) -> Result<Amount, Self::Error> {
		Ok(Amount::ZERO)
	}

	fn lp_token_id(&self, _pair: &CurrencyPair) -> Option<TokenId> {
		Some(128)
	}

	fn cumulative_reward_index(&self, _lp_token: TokenId) -> Amount {
		self.index
	}
}

fn owner(name: &str) -> Script {
	Script::from_bytes(name.as_bytes().to_vec())
}

#[test]
fn add_then_sub_to_zero_erases_the_row() {
	let mut store = MemoryStore::new();
	let mut balances = Balances::new(&mut store);
	let alice = owner("alice");

	balances.add_balance(&alice, 0, Amount::from_coin_units(500)).unwrap();
	assert_eq!(balances.get_balance(&alice, 0), Amount::from_coin_units(500));

	balances.sub_balance(&alice, 0, Amount::from_coin_units(500)).unwrap();
	assert_eq!(balances.get_balance(&alice, 0), Amount::ZERO);
	assert_eq!(store.len(), 0);
}

#[test]
fn sub_balance_rejects_overdraw() {
	let mut store = MemoryStore::new();
	let mut balances = Balances::new(&mut store);
	let alice = owner("alice");

	balances.add_balance(&alice, 0, Amount::from_coin_units(100)).unwrap();
	let err = balances.sub_balance(&alice, 0, Amount::from_coin_units(200)).unwrap_err();
	assert_eq!(err, BalancesError::InsufficientFunds);
}

#[test]
fn for_each_balance_is_ordered_by_owner_then_token() {
	let mut store = MemoryStore::new();
	let mut balances = Balances::new(&mut store);
	let alice = owner("alice");
	let bob = owner("bob");

	balances.add_balance(&bob, 1, Amount::from_coin_units(1)).unwrap();
	balances.add_balance(&alice, 2, Amount::from_coin_units(1)).unwrap();
	balances.add_balance(&alice, 1, Amount::from_coin_units(1)).unwrap();

	let mut seen = vec![];
	balances.for_each_balance(None, |owner, token, amount| {
		seen.push((owner.clone(), token, amount));
		true
	});

	assert_eq!(seen[0].0, alice);
	assert_eq!(seen[0].1, 1);
	assert_eq!(seen[1].1, 2);
	assert_eq!(seen[2].0, bob);
}

#[test]
fn calculate_owner_rewards_credits_delta_and_updates_checkpoint() {
	let mut store = MemoryStore::new();
	let alice = owner("alice");

	let pools = StubPools { index: Amount::from_coin_units(core_primitives::COIN) };
	{
		let mut balances = Balances::new(&mut store);
		balances.add_balance(&alice, 128, Amount::from_coin_units(10 * core_primitives::COIN)).unwrap();
		balances.touch_pool_share(&alice, 128, &pools);
	}

	let pools_after = StubPools { index: Amount::from_coin_units(2 * core_primitives::COIN) };
	let mut balances = Balances::new(&mut store);
	let reward = balances.calculate_owner_rewards(&alice, 128, 0, &pools_after).unwrap();
	// delta index is 1 COIN (100%), lp balance is 10 COIN -> reward == 10 COIN
	assert_eq!(reward, Amount::from_coin_units(10 * core_primitives::COIN));
	assert_eq!(balances.get_balance(&alice, 0), reward);

	let reward_again = balances.calculate_owner_rewards(&alice, 128, 0, &pools_after).unwrap();
	assert_eq!(reward_again, Amount::ZERO);
}

use crate::{accounts, futures, icx, vaults, Pagination, Snapshot};
use chain_pipeline::ChainState;
use core_kvstore::Overlay;
use core_primitives::{Amount, Script, TokenId, TxHash};
use core_traits::BalancesApi;

fn owner(byte: u8) -> Script {
	Script(vec![byte; 20])
}

#[test]
fn list_accounts_sees_balances_written_through_an_overlay() {
	let mut state = ChainState::new();
	{
		let mut overlay = Overlay::new(&state.balances);
		pallet_balances::Balances::new(&mut overlay).add_balance(&owner(1), 0, Amount::from_coin_units(500)).unwrap();
		overlay.into_changes().flush(&mut state.balances);
	}

	let snapshot = Snapshot::new(&state);
	let rows = accounts::list_accounts(&snapshot, &Pagination::default());
	assert_eq!(rows, vec![(owner(1), 0u32 as TokenId, Amount::from_coin_units(500))]);

	let one_account = accounts::get_account(&snapshot, &owner(1));
	assert_eq!(one_account, vec![(0, Amount::from_coin_units(500))]);
}

#[test]
fn get_token_balances_sums_across_every_owner() {
	let mut state = ChainState::new();
	{
		let mut overlay = Overlay::new(&state.balances);
		let mut ledger = pallet_balances::Balances::new(&mut overlay);
		ledger.add_balance(&owner(1), 5, Amount::from_coin_units(100)).unwrap();
		ledger.add_balance(&owner(2), 5, Amount::from_coin_units(250)).unwrap();
		overlay.into_changes().flush(&mut state.balances);
	}

	let snapshot = Snapshot::new(&state);
	let totals = accounts::get_token_balances(&snapshot);
	assert_eq!(totals.get(&5), Some(&Amount::from_coin_units(350)));
}

#[test]
fn list_vaults_and_get_vault_reflect_a_created_vault() {
	let mut state = ChainState::new();
	let vault_id = TxHash([7; 32]);
	{
		let mut overlay = Overlay::new(&state.vaults);
		pallet_vaults::VaultEngine::new(&mut overlay).create_vault(vault_id, owner(9), "DEFAULT".to_string()).unwrap();
		chain_pipeline::vault_index::record_vault(&mut overlay, vault_id);
		overlay.into_changes().flush(&mut state.vaults);
	}

	let snapshot = Snapshot::new(&state);
	let listed = vaults::list_vaults(&snapshot, &Pagination::default());
	assert_eq!(listed.len(), 1);
	assert_eq!(listed[0].0, vault_id);

	let detail = vaults::get_vault(&snapshot, &vault_id).unwrap();
	assert_eq!(detail.vault.owner, owner(9));
	assert!(detail.collaterals.is_empty());
	// No price feed registered, so valuation can't be produced.
	assert!(detail.assets.is_none());
}

#[test]
fn get_vault_reports_not_found_for_an_unknown_id() {
	let state = ChainState::new();
	let snapshot = Snapshot::new(&state);
	let err = vaults::get_vault(&snapshot, &TxHash([0; 32])).unwrap_err();
	assert_eq!(err, crate::QueriesError::VaultNotFound);
}

#[test]
fn list_pending_futures_reflects_a_submitted_entry() {
	let mut state = ChainState::new();
	{
		let mut futures_overlay = Overlay::new(&state.futures);
		let mut balances_overlay = Overlay::new(&state.balances);
		let mut ledger = pallet_balances::Balances::new(&mut balances_overlay);
		ledger.add_balance(&owner(3), 1, Amount::from_coin_units(1_000)).unwrap();
		pallet_futures::FuturesEngine::new(&mut futures_overlay)
			.submit_token_future(100, owner(3), 0, 1, Amount::from_coin_units(1_000), 2, &mut ledger)
			.unwrap();
		futures_overlay.into_changes().flush(&mut state.futures);
		balances_overlay.into_changes().flush(&mut state.balances);
	}

	let snapshot = Snapshot::new(&state);
	let pending = futures::list_pending_futures(&snapshot, &Pagination::default());
	assert_eq!(pending.len(), 1);
	assert_eq!(pending[0].0, 100);
	assert_eq!(pending[0].1.source_token, 1);
}

#[test]
fn icx_list_orders_and_get_order_round_trip() {
	let mut state = ChainState::new();
	let order_id = TxHash([11; 32]);
	{
		let mut icx_overlay = Overlay::new(&state.icx);
		let mut balances_overlay = Overlay::new(&state.balances);
		let mut ledger = pallet_balances::Balances::new(&mut balances_overlay);
		ledger.add_balance(&owner(4), 1, Amount::from_coin_units(10_000)).unwrap();
		pallet_icx::IcxEngine::new(&mut icx_overlay)
			.create_order(
				order_id,
				pallet_icx::OrderType::Internal,
				1,
				"BTC".to_string(),
				owner(4),
				Amount::from_coin_units(10_000),
				Amount::from_coin_units(1),
				50,
				0,
				&mut ledger,
			)
			.unwrap();
		icx_overlay.into_changes().flush(&mut state.icx);
		balances_overlay.into_changes().flush(&mut state.balances);
	}

	let snapshot = Snapshot::new(&state);
	assert!(icx::get_order(&snapshot, &order_id).is_some());
	let orders = icx::list_orders(&snapshot, &Pagination::default());
	assert_eq!(orders.len(), 1);
	assert_eq!(orders[0].0, order_id);
}

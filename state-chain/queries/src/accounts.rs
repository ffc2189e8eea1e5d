//! Accounts RPC family (§6.4): `listaccounts`, `getaccount`,
//! `gettokenbalances`, `listcommunitybalances`.

use crate::{Pagination, Snapshot};
use core_kvstore::Overlay;
use core_primitives::{Amount, CommunityAccountType, Script, TokenId};
use std::collections::BTreeMap;

/// `listaccounts`: every non-zero `(owner, token)` balance row, paginated in
/// `(owner, tokenId)` order.
pub fn list_accounts(snapshot: &Snapshot<'_>, pagination: &Pagination<(Script, TokenId)>) -> Vec<(Script, TokenId, Amount)> {
	let mut overlay = Overlay::new(snapshot.balances);
	let ledger = pallet_balances::Balances::new(&mut overlay);
	let from = pagination.start.as_ref().map(|(owner, token)| (owner, *token));
	let mut rows = Vec::new();
	let mut skip_start = !pagination.including_start;
	ledger.for_each_balance(from, |owner, token, amount| {
		if skip_start {
			skip_start = false;
			if pagination.start.as_ref().map(|(o, t)| o == owner && *t == token).unwrap_or(false) {
				return true;
			}
		}
		rows.push((owner.clone(), token, amount));
		rows.len() < pagination.limit
	});
	pagination.take(rows)
}

/// `getaccount`: every non-zero balance held by one owner.
pub fn get_account(snapshot: &Snapshot<'_>, owner: &Script) -> Vec<(TokenId, Amount)> {
	let mut overlay = Overlay::new(snapshot.balances);
	let ledger = pallet_balances::Balances::new(&mut overlay);
	let mut rows = Vec::new();
	ledger.for_each_balance(Some((owner, 0)), |row_owner, token, amount| {
		if row_owner != owner {
			return false;
		}
		if !amount.is_zero() {
			rows.push((token, amount));
		}
		true
	});
	rows
}

/// `gettokenbalances`: total balance of each token summed across every
/// account, the chain-wide view `sendtokenstoaddress` callers check supply
/// against.
pub fn get_token_balances(snapshot: &Snapshot<'_>) -> BTreeMap<TokenId, Amount> {
	let mut overlay = Overlay::new(snapshot.balances);
	let ledger = pallet_balances::Balances::new(&mut overlay);
	let mut totals: BTreeMap<TokenId, Amount> = BTreeMap::new();
	ledger.for_each_balance(None, |_owner, token, amount| {
		let entry = totals.entry(token).or_insert(Amount::ZERO);
		*entry = entry.checked_add(amount).unwrap_or(*entry);
		true
	});
	totals
}

/// `listcommunitybalances`: the four named community-fund balances (§4.C
/// "Community/incentive fund accounting").
pub fn list_community_balances(snapshot: &Snapshot<'_>) -> BTreeMap<CommunityAccountType, Amount> {
	const ACCOUNTS: [CommunityAccountType; 4] = [
		CommunityAccountType::IncentiveFunding,
		CommunityAccountType::Loan,
		CommunityAccountType::Options,
		CommunityAccountType::Unallocated,
	];
	let mut overlay = Overlay::new(snapshot.tokens);
	let mut module = pallet_tokens::TokenModule::new(&mut overlay);
	ACCOUNTS.into_iter().map(|account| (account, module.community_funds().balance(account))).collect()
}

//! Community/incentive fund balances that feed pool reward distribution
//! (§4.C point 3, supplementing the distilled spec with the fund types the
//! original chain tracks for `listcommunitybalances`).

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, CommunityAccountType};

fn fund_key(account: CommunityAccountType) -> Vec<u8> {
	[b"community/".as_slice(), account.as_str().as_bytes()].concat()
}

pub struct CommunityFunds<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> CommunityFunds<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		CommunityFunds { store }
	}

	pub fn balance(&self, account: CommunityAccountType) -> Amount {
		self.store
			.get(&fund_key(account))
			.and_then(|b| b.try_into().ok())
			.map(|raw: [u8; 8]| Amount::from_coin_units(i64::from_be_bytes(raw)))
			.unwrap_or(Amount::ZERO)
	}

	pub fn credit(&mut self, account: CommunityAccountType, amount: Amount) {
		let updated = self.balance(account).checked_add(amount).unwrap_or(Amount::ZERO);
		self.store.put(fund_key(account), updated.raw().to_be_bytes().to_vec());
	}

	/// Debits at most the fund's current balance; shortfalls are logged and
	/// the fund is left at zero rather than going negative (§4.C point 3).
	pub fn debit_up_to(&mut self, account: CommunityAccountType, requested: Amount) -> Amount {
		let available = self.balance(account);
		let debited = if requested.raw() > available.raw() {
			tracing::warn!(?account, requested = %requested, available = %available, "community fund shortfall");
			available
		} else {
			requested
		};
		let remaining = available.checked_sub(debited).unwrap_or(Amount::ZERO);
		self.store.put(fund_key(account), remaining.raw().to_be_bytes().to_vec());
		debited
	}
}

impl CommunityAccountType {
	fn as_str(self) -> &'static str {
		match self {
			CommunityAccountType::IncentiveFunding => "incentive_funding",
			CommunityAccountType::Loan => "loan",
			CommunityAccountType::Options => "options",
			CommunityAccountType::Unallocated => "unallocated",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core_kvstore::MemoryStore;

	#[test]
	fn debit_up_to_never_goes_negative() {
		let mut store = MemoryStore::new();
		let mut funds = CommunityFunds::new(&mut store);
		funds.credit(CommunityAccountType::Loan, Amount::from_coin_units(50));

		let debited = funds.debit_up_to(CommunityAccountType::Loan, Amount::from_coin_units(200));
		assert_eq!(debited, Amount::from_coin_units(50));
		assert_eq!(funds.balance(CommunityAccountType::Loan), Amount::ZERO);
	}
}

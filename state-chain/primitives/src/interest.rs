//! `InterestAmount`: signed 128-bit fixed-point interest accounting (§3.1, §4.F).

use codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Fixed-point scale for [`InterestAmount`]: printed with up to 24 decimal
/// places so that `interestPerBlock` (which divides an annual rate by
/// `blocksPerYear`) does not lose all precision for small loans.
pub const INTEREST_PRECISION: u128 = 1_000_000_000_000_000_000_000_000;

/// A signed 128-bit fixed-point amount, represented as a magnitude plus an
/// explicit sign so that component-wise addition near zero never silently
/// wraps (§3.5's `VaultInterest` invariant is defined component-wise on this
/// representation).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, Serialize, Deserialize)]
pub struct InterestAmount {
	pub negative: bool,
	pub magnitude: u128,
}

impl InterestAmount {
	pub const ZERO: InterestAmount = InterestAmount { negative: false, magnitude: 0 };

	pub fn from_signed(value: i128) -> Self {
		if value < 0 {
			InterestAmount { negative: true, magnitude: value.unsigned_abs() }
		} else {
			InterestAmount { negative: false, magnitude: value as u128 }
		}
	}

	pub fn to_signed(self) -> i128 {
		if self.negative {
			-(self.magnitude as i128)
		} else {
			self.magnitude as i128
		}
	}

	pub fn is_zero(self) -> bool {
		self.magnitude == 0
	}

	pub fn add(self, rhs: InterestAmount) -> InterestAmount {
		Self::from_signed(self.to_signed().saturating_add(rhs.to_signed()))
	}

	pub fn sub(self, rhs: InterestAmount) -> InterestAmount {
		Self::from_signed(self.to_signed().saturating_sub(rhs.to_signed()))
	}

	pub fn scale_by(self, numerator: u128, denominator: u128) -> InterestAmount {
		if denominator == 0 {
			return Self::ZERO;
		}
		InterestAmount { negative: self.negative, magnitude: self.magnitude * numerator / denominator }
	}

	/// `interestPerBlock` for a loan balance, scheme rate, and token rate,
	/// all COIN-scaled percentages, over `blocks_per_year` (§4.F).
	pub fn per_block(balance: i128, scheme_rate: i64, token_rate: i64, blocks_per_year: u32) -> InterestAmount {
		let rate = scheme_rate as i128 + token_rate as i128;
		let numerator = balance * rate;
		let denominator = crate::COIN as i128 * blocks_per_year as i128 * 100;
		if denominator == 0 {
			return Self::ZERO;
		}
		Self::from_signed(numerator / denominator)
	}

	/// Applies a token-split multiplier (§4.H) to an interest snapshot, using
	/// the same positive-multiply/negative-divide convention as
	/// [`crate::Amount::checked_apply_split_multiplier`].
	pub fn apply_split_multiplier(self, multiplier: i64) -> InterestAmount {
		if multiplier > 0 {
			self.scale_by(multiplier as u128, crate::COIN as u128)
		} else if multiplier < 0 {
			self.scale_by(crate::COIN as u128, multiplier.unsigned_abs() as u128)
		} else {
			Self::ZERO
		}
	}

	/// Clamp the magnitude so that a negative `InterestAmount` can never
	/// exceed the remaining principal when folded into a liquidated loan
	/// (§4.F "Negative net interest... clamped against the principal").
	pub fn clamp_against_principal(self, principal: u128) -> InterestAmount {
		if self.negative && self.magnitude > principal {
			InterestAmount { negative: true, magnitude: principal }
		} else {
			self
		}
	}
}

impl std::fmt::Display for InterestAmount {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let whole = self.magnitude / INTEREST_PRECISION;
		let frac = self.magnitude % INTEREST_PRECISION;
		if self.negative && (whole != 0 || frac != 0) {
			write!(f, "-")?;
		}
		write!(f, "{}.{:024}", whole, frac)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn component_wise_add_matches_signed_add() {
		let a = InterestAmount::from_signed(-5);
		let b = InterestAmount::from_signed(3);
		assert_eq!(a.add(b).to_signed(), -2);
	}

	#[test]
	fn clamp_limits_negative_interest_to_principal() {
		let debt = InterestAmount::from_signed(-1_000);
		assert_eq!(debt.clamp_against_principal(400).magnitude, 400);
		let small_debt = InterestAmount::from_signed(-100);
		assert_eq!(small_debt.clamp_against_principal(400).magnitude, 100);
	}
}

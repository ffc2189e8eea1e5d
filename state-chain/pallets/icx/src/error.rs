use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcxError {
	#[error("order does not exist")]
	OrderNotFound,
	#[error("order is not open")]
	OrderNotOpen,
	#[error("offer does not exist")]
	OfferNotFound,
	#[error("offer is not open")]
	OfferNotOpen,
	#[error("DFC HTLC does not exist")]
	DfcHtlcNotFound,
	#[error("DFC HTLC is not open")]
	DfcHtlcNotOpen,
	#[error("offer amount exceeds the order's remaining amountToFill")]
	AmountExceedsOrderRemainder,
	#[error("seed does not hash to the HTLC's hash lock")]
	SeedMismatch,
	#[error("amount overflow in order book escrow")]
	Overflow,
}

impl ErrorKind for IcxError {
	fn kind(&self) -> Kind {
		match self {
			IcxError::OrderNotFound
			| IcxError::OrderNotOpen
			| IcxError::OfferNotFound
			| IcxError::OfferNotOpen
			| IcxError::DfcHtlcNotFound
			| IcxError::DfcHtlcNotOpen
			| IcxError::AmountExceedsOrderRemainder
			| IcxError::SeedMismatch => Kind::Validation,
			IcxError::Overflow => Kind::Fatal,
		}
	}
}

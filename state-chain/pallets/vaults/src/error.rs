use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultsError {
	#[error("vault does not exist")]
	VaultNotFound,
	#[error("a vault already exists at this id")]
	VaultAlreadyExists,
	#[error("loan scheme does not exist")]
	SchemeNotFound,
	#[error("a required price feed is not live")]
	NoLivePrice,
	#[error("collateralization ratio would fall below the scheme minimum")]
	InsufficientCollateralization,
	#[error("vault is already under liquidation")]
	AlreadyInLiquidation,
	#[error("vault is not under liquidation")]
	NotInLiquidation,
	#[error("auction batch does not exist")]
	AuctionBatchNotFound,
	#[error("bid does not clear the required floor")]
	BidTooLow,
	#[error("amount overflow in vault arithmetic")]
	Overflow,
}

impl ErrorKind for VaultsError {
	fn kind(&self) -> Kind {
		match self {
			VaultsError::VaultNotFound
			| VaultsError::VaultAlreadyExists
			| VaultsError::SchemeNotFound
			| VaultsError::AuctionBatchNotFound => Kind::Validation,
			VaultsError::NoLivePrice => Kind::Liveness,
			VaultsError::InsufficientCollateralization
			| VaultsError::AlreadyInLiquidation
			| VaultsError::NotInLiquidation
			| VaultsError::BidTooLow => Kind::Validation,
			VaultsError::Overflow => Kind::Fatal,
		}
	}
}

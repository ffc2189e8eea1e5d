use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokensError {
	#[error("symbol exceeds the maximum length")]
	SymbolTooLong,
	#[error("symbol is already registered")]
	SymbolTaken,
	#[error("unknown token")]
	UnknownToken,
	#[error("token is finalized and cannot be mutated")]
	TokenFinalized,
	#[error("symbol change is not permitted for this update")]
	SymbolChangeNotAllowed,
	#[error("pool already exists")]
	PoolAlreadyExists,
	#[error("unknown pool")]
	UnknownPool,
	#[error("token is not part of this pool")]
	TokenNotInPool,
	#[error("swap would produce an invalid output")]
	InvalidSwap,
	#[error("swap price exceeds the configured maximum")]
	PriceExceedsMax,
	#[error("insufficient liquidity minted")]
	InsufficientLiquidityMinted,
	#[error("insufficient liquidity held")]
	InsufficientLiquidityHeld,
	#[error("arithmetic overflow")]
	Overflow,
}

impl ErrorKind for TokensError {
	fn kind(&self) -> Kind {
		match self {
			TokensError::SymbolTooLong
			| TokensError::SymbolTaken
			| TokensError::UnknownToken
			| TokensError::TokenFinalized
			| TokensError::SymbolChangeNotAllowed
			| TokensError::PoolAlreadyExists
			| TokensError::UnknownPool
			| TokensError::TokenNotInPool
			| TokensError::InvalidSwap
			| TokensError::PriceExceedsMax
			| TokensError::InsufficientLiquidityMinted
			| TokensError::InsufficientLiquidityHeld => Kind::Validation,
			TokensError::Overflow => Kind::Fatal,
		}
	}
}

use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitsError {
	#[error("token to split does not exist")]
	TokenNotFound,
	#[error("token is already destroyed")]
	AlreadyDestroyed,
	#[error("arithmetic overflow while rescaling")]
	Overflow,
	#[error("split multiplier must be non-zero")]
	ZeroMultiplier,
}

impl ErrorKind for SplitsError {
	fn kind(&self) -> Kind {
		match self {
			SplitsError::TokenNotFound | SplitsError::AlreadyDestroyed | SplitsError::ZeroMultiplier => {
				Kind::Validation
			}
			SplitsError::Overflow => Kind::Fatal,
		}
	}
}

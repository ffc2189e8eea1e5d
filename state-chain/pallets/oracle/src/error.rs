use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
	#[error("currency pair is not registered")]
	PairNotRegistered,
	#[error("feed weight must be non-zero")]
	ZeroWeight,
}

impl ErrorKind for OracleError {
	fn kind(&self) -> Kind {
		match self {
			OracleError::PairNotRegistered | OracleError::ZeroWeight => Kind::Validation,
		}
	}
}

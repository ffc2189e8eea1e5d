use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuturesError {
	#[error("DFIP2203/2206F is not currently active")]
	NotActive,
	#[error("no queued entry at this key")]
	EntryNotFound,
	#[error("amount overflow in futures escrow")]
	Overflow,
}

impl ErrorKind for FuturesError {
	fn kind(&self) -> Kind {
		match self {
			FuturesError::NotActive => Kind::Validation,
			FuturesError::EntryNotFound => Kind::Validation,
			FuturesError::Overflow => Kind::Fatal,
		}
	}
}

//! Errors for wire decoding, the governance/split schedule, and dispatch.

use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
	#[error("payload is shorter than the fields being decoded")]
	TruncatedPayload,
	#[error("payload has bytes left over after decoding its known fields")]
	TrailingBytes,
	#[error("payload is not valid UTF-8 where a string was expected")]
	InvalidUtf8,
	#[error("payload does not start with the DfTx marker")]
	BadMarker,
	#[error("type byte does not match a known custom transaction type")]
	UnknownMessageType,
	#[error("this custom transaction type is recognised but not dispatched by this build")]
	UnsupportedMessageType,
	#[error("transaction is not authorized for the message it carries")]
	NotAuthorized,
}

impl ErrorKind for PipelineError {
	fn kind(&self) -> Kind {
		match self {
			PipelineError::TruncatedPayload
			| PipelineError::TrailingBytes
			| PipelineError::InvalidUtf8
			| PipelineError::BadMarker
			| PipelineError::UnknownMessageType
			| PipelineError::UnsupportedMessageType => Kind::Parse,
			PipelineError::NotAuthorized => Kind::Authorization,
		}
	}
}

/// The applier wraps whichever pallet crate's error the dispatched message
/// produced, so a failure keeps its original `ErrorKind` for the
/// errored-transaction bookkeeping (§4.J step 4).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApplierError {
	#[error(transparent)]
	Wire(#[from] PipelineError),
	#[error("balances: {0}")]
	Balances(#[from] pallet_balances::BalancesError),
	#[error("tokens: {0}")]
	Tokens(#[from] pallet_tokens::TokensError),
	#[error("oracle: {0}")]
	Oracle(#[from] pallet_oracle::OracleError),
	#[error("attributes: {0}")]
	Attributes(#[from] pallet_attributes::AttributesError),
	#[error("vaults: {0}")]
	Vaults(#[from] pallet_vaults::VaultsError),
	#[error("futures: {0}")]
	Futures(#[from] pallet_futures::FuturesError),
	#[error("icx: {0}")]
	Icx(#[from] pallet_icx::IcxError),
	#[error("splits: {0}")]
	Splits(#[from] pallet_splits::SplitsError),
}

impl ErrorKind for ApplierError {
	fn kind(&self) -> Kind {
		match self {
			ApplierError::Wire(e) => e.kind(),
			ApplierError::Balances(e) => e.kind(),
			ApplierError::Tokens(e) => e.kind(),
			ApplierError::Oracle(e) => e.kind(),
			ApplierError::Attributes(e) => e.kind(),
			ApplierError::Vaults(e) => e.kind(),
			ApplierError::Futures(e) => e.kind(),
			ApplierError::Icx(e) => e.kind(),
			ApplierError::Splits(e) => e.kind(),
		}
	}
}

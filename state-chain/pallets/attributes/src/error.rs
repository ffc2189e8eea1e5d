use core_primitives::{ErrorKind, Kind};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributesError {
	#[error("malformed attribute path")]
	MalformedPath,
	#[error("unknown attribute type")]
	UnknownType,
	#[error("unknown attribute key")]
	UnknownKey,
	#[error("malformed attribute value")]
	MalformedValue,
	#[error("value out of the allowed range")]
	OutOfRange,
	#[error("attribute is not active yet")]
	NotYetActive,
	#[error("live/* attributes cannot be set from user input")]
	LiveAttributeReadOnly,
	#[error("referenced token or pool does not exist")]
	DanglingReference,
}

impl ErrorKind for AttributesError {
	fn kind(&self) -> Kind {
		match self {
			AttributesError::NotYetActive | AttributesError::LiveAttributeReadOnly => Kind::Authorization,
			_ => Kind::Validation,
		}
	}
}

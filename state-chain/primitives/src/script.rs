//! `Script`: opaque account identity / authorization predicate (§3.1).

use codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// An opaque byte string serving as account identity. Authorization is
/// delegated to the `UtxoView` collaborator (out of scope here, §1); this
/// type only needs to be orderable and hashable so it can key the balance
/// and vault-owner maps.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Encode, Decode, Serialize, Deserialize)]
pub struct Script(pub Vec<u8>);

impl Script {
	pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
		Script(bytes.into())
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl std::fmt::Display for Script {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for byte in &self.0 {
			write!(f, "{:02x}", byte)?;
		}
		Ok(())
	}
}

impl From<&str> for Script {
	fn from(value: &str) -> Self {
		Script(value.as_bytes().to_vec())
	}
}

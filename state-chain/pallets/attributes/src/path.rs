//! `v0/<typeName>/<id>/<key>[/<subKey>]` path grammar (§4.E).

use crate::AttributesError;

/// A parsed attribute path. `id` and `sub_key` stay as strings since some
/// legs are free-form numeric ids (token ids, heights) while others are a
/// fixed vocabulary (`foundation`, `splits`, `economy`...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeKey {
	pub type_name: String,
	pub id: String,
	pub key: String,
	pub sub_key: Option<String>,
}

impl AttributeKey {
	pub fn is_live(&self) -> bool {
		self.type_name == "live"
	}

	pub fn is_economy(&self) -> bool {
		self.type_name == "live" && self.id == "economy"
	}
}

pub fn parse_path(path: &str) -> Result<AttributeKey, AttributesError> {
	let mut legs = path.split('/');
	if legs.next() != Some("v0") {
		return Err(AttributesError::MalformedPath);
	}
	let type_name = legs.next().ok_or(AttributesError::MalformedPath)?.to_string();
	let id = legs.next().ok_or(AttributesError::MalformedPath)?.to_string();
	let key = legs.next().ok_or(AttributesError::MalformedPath)?.to_string();
	let sub_key = legs.next().map(str::to_string);
	if legs.next().is_some() {
		return Err(AttributesError::MalformedPath);
	}

	const KNOWN_TYPES: &[&str] =
		&["token", "poolpairs", "oracles", "locks", "params", "attributes", "live", "evm"];
	if !KNOWN_TYPES.contains(&type_name.as_str()) {
		return Err(AttributesError::UnknownType);
	}

	Ok(AttributeKey { type_name, id, key, sub_key })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_a_four_leg_path() {
		let key = parse_path("v0/token/128/loan_collateral_factor").unwrap();
		assert_eq!(key.type_name, "token");
		assert_eq!(key.id, "128");
		assert_eq!(key.key, "loan_collateral_factor");
		assert_eq!(key.sub_key, None);
	}

	#[test]
	fn parses_a_five_leg_path_with_subkey() {
		let key = parse_path("v0/poolpairs/5/token_a_fee_pct").unwrap();
		assert_eq!(key.sub_key, None);
		let key = parse_path("v0/evm/block/finalized").unwrap();
		assert_eq!(key.type_name, "evm");
		assert_eq!(key.id, "block");
		assert_eq!(key.key, "finalized");
	}

	#[test]
	fn rejects_wrong_version_and_unknown_type() {
		assert_eq!(parse_path("v1/token/1/x"), Err(AttributesError::MalformedPath));
		assert_eq!(parse_path("v0/nonsense/1/x"), Err(AttributesError::UnknownType));
	}
}

//! Typed attribute values and the `Parse` stage of §4.E's pipeline.

use crate::path::AttributeKey;
use crate::AttributesError;
use core_primitives::{Script, COIN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
	Bool(bool),
	/// COIN-scaled, clamped to `[0, COIN]` by `parse_value`.
	Percentage(i64),
	Amount(i64),
	U32(u32),
	/// The stored (persisted) representation of a set-of-script attribute.
	ScriptSet(BTreeSet<Script>),
	/// A `+addr`/`-addr` request to mutate a `ScriptSet` attribute (§4.E).
	/// Never persisted directly; `apply` merges it into the stored set.
	ScriptSetDelta(ScriptSetDelta),
	/// `tokenId/multiplier` pairs, multiplier COIN-scaled.
	OracleSplit(Vec<(u32, i64)>),
	Raw(Vec<u8>),
}

/// A delta to a `ScriptSet` attribute, distinguished from a full
/// replacement because set attributes are additive/subtractive in the
/// original chain's RPC surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScriptSetDelta {
	Add(Script),
	Remove(Script),
}

fn known_bool_keys(key: &AttributeKey) -> bool {
	matches!(
		(key.type_name.as_str(), key.id.as_str(), key.key.as_str()),
		("token", _, "dex_in_fee_pct_enabled")
			| ("token", _, "loan_collateral_enabled")
			| ("token", _, "loan_minting_enabled")
			| ("token", _, "dfip2203")
			| ("evm", _, "finalized")
			| ("params", "dfip2203", "active")
			| ("params", "feature", _)
	)
}

fn known_percentage_keys(key: &AttributeKey) -> bool {
	matches!(
		(key.type_name.as_str(), key.id.as_str(), key.key.as_str()),
		("token", _, "loan_collateral_factor")
			| ("token", _, "loan_minting_interest")
			| ("token", _, "dfip2203_reward_pct")
			| ("poolpairs", _, "token_a_fee_pct")
			| ("poolpairs", _, "token_b_fee_pct")
			| ("poolpairs", _, "reward_pct")
			| ("params", "dfip2203", "reward_pct")
			| ("params", "icx", "takerfee_pct")
	)
}

/// `params/dfip2203/{start_block,block_period}` (§4.G), the only `params`
/// paths that carry a raw block count rather than a flag or percentage.
fn known_u32_keys(key: &AttributeKey) -> bool {
	matches!(
		(key.type_name.as_str(), key.id.as_str(), key.key.as_str()),
		("params", "dfip2203", "start_block") | ("params", "dfip2203", "block_period")
	)
}

/// Parses raw RPC input for `path` into a typed [`AttributeValue`] (§4.E
/// "Parse").
pub fn parse_value(key: &AttributeKey, raw: &str) -> Result<AttributeValue, AttributesError> {
	if key.type_name == "evm" && key.id == "block" {
		return match key.key.as_str() {
			"finalized" => parse_bool(raw).map(AttributeValue::Bool),
			"gaslimit" | "gastargetfactor" | "rbfincrementminpct" => {
				raw.parse::<u32>().map(AttributeValue::U32).map_err(|_| AttributesError::MalformedValue)
			}
			_ => Err(AttributesError::UnknownKey),
		};
	}

	if known_bool_keys(key) {
		return parse_bool(raw).map(AttributeValue::Bool);
	}
	if known_percentage_keys(key) {
		return parse_percentage(raw).map(AttributeValue::Percentage);
	}
	if known_u32_keys(key) {
		return raw.parse::<u32>().map(AttributeValue::U32).map_err(|_| AttributesError::MalformedValue);
	}
	if key.type_name == "locks" {
		return raw.parse::<i64>().map(AttributeValue::Amount).map_err(|_| AttributesError::MalformedValue);
	}
	if key.type_name == "oracles" && key.id == "splits" {
		return parse_oracle_split(raw);
	}
	if let Some(delta) = parse_script_set_delta(raw) {
		return Ok(AttributeValue::ScriptSetDelta(delta));
	}

	Ok(AttributeValue::Raw(raw.as_bytes().to_vec()))
}

fn parse_bool(raw: &str) -> Result<bool, AttributesError> {
	match raw {
		"true" => Ok(true),
		"false" => Ok(false),
		_ => Err(AttributesError::MalformedValue),
	}
}

fn parse_percentage(raw: &str) -> Result<i64, AttributesError> {
	let (numeric, had_percent) = match raw.strip_suffix('%') {
		Some(rest) => (rest, true),
		None => (raw, false),
	};
	let value: f64 = numeric.parse().map_err(|_| AttributesError::MalformedValue)?;
	let scaled = if had_percent { value / 100.0 } else { value };
	let fixed = (scaled * COIN as f64).round() as i64;
	if !(0..=COIN).contains(&fixed) {
		return Err(AttributesError::OutOfRange);
	}
	Ok(fixed)
}

fn parse_script_set_delta(raw: &str) -> Option<ScriptSetDelta> {
	if let Some(addr) = raw.strip_prefix('+') {
		Some(ScriptSetDelta::Add(Script::from(addr)))
	} else if let Some(addr) = raw.strip_prefix('-') {
		Some(ScriptSetDelta::Remove(Script::from(addr)))
	} else {
		None
	}
}

fn parse_oracle_split(raw: &str) -> Result<AttributeValue, AttributesError> {
	let mut pairs = Vec::new();
	for entry in raw.split(',') {
		let (token, multiplier) = entry.split_once('/').ok_or(AttributesError::MalformedValue)?;
		let token_id: u32 = token.parse().map_err(|_| AttributesError::MalformedValue)?;
		let multiplier: f64 = multiplier.parse().map_err(|_| AttributesError::MalformedValue)?;
		pairs.push((token_id, (multiplier * COIN as f64).round() as i64));
	}
	Ok(AttributeValue::OracleSplit(pairs))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::path::parse_path;

	#[test]
	fn percentage_accepts_percent_suffix_and_clamps_range() {
		let key = parse_path("v0/poolpairs/5/token_a_fee_pct").unwrap();
		assert_eq!(parse_value(&key, "1.5%").unwrap(), AttributeValue::Percentage(COIN * 15 / 1000));
		assert!(parse_value(&key, "101%").is_err());
	}

	#[test]
	fn bool_rejects_anything_but_true_or_false() {
		let key = parse_path("v0/token/5/dfip2203").unwrap();
		assert_eq!(parse_value(&key, "true").unwrap(), AttributeValue::Bool(true));
		assert!(parse_value(&key, "yes").is_err());
	}

	#[test]
	fn oracle_split_parses_token_multiplier_pairs() {
		let key = parse_path("v0/oracles/splits/200/1").unwrap();
		let value = parse_value(&key, "15/2.0,16/0.5").unwrap();
		assert_eq!(value, AttributeValue::OracleSplit(vec![(15, 2 * COIN), (16, COIN / 2)]));
	}
}

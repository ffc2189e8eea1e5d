//! Attribute storage and the `Validate`/`Apply` stages (§4.E).

use crate::path::{parse_path, AttributeKey};
use crate::value::{parse_value, AttributeValue, ScriptSetDelta};
use crate::AttributesError;
use core_kvstore::{KvRead, KvWrite};
use core_primitives::{CurrencyPair, Height, TokenId};
use core_traits::AttributeApi;
use std::collections::BTreeSet;

/// A cross-subsystem side effect that setting an attribute requires. The
/// attribute store records the raw value itself; dispatching these to
/// `pallet-tokens`, `pallet-oracle`, and `pallet-vaults` is the pipeline's
/// job (§4.E "Apply performs cross-subsystem effects").
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeEffect {
	PoolFeeChanged { lp_token: TokenId, side: PoolFeeSide, fee_pct: i64 },
	PoolRewardPctChanged { lp_token: TokenId, reward_pct: i64 },
	OracleFeedLinked { token_id: TokenId, pair: CurrencyPair },
	Dfip2203Disabled { token_id: TokenId },
	LoanMintingInterestChanged { token_id: TokenId, new_rate_pct: i64 },
	LoanCollateralFactorChanged { token_id: TokenId, factor_pct: i64 },
	SplitScheduled { activation_height: Height, token_id: TokenId, multiplier_pct: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolFeeSide {
	A,
	B,
}

fn raw_key(path: &str) -> Vec<u8> {
	[b"attr/".as_slice(), path.as_bytes()].concat()
}

pub struct AttributeStore<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> AttributeStore<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		AttributeStore { store }
	}

	pub fn get_raw(&self, path: &str) -> Option<Vec<u8>> {
		self.store.get(&raw_key(path))
	}

	fn put_encoded(&mut self, path: &str, value: &AttributeValue) {
		let bytes = serde_json::to_vec(value).expect("AttributeValue serializes");
		self.store.put(raw_key(path), bytes);
	}

	fn get_decoded(&self, path: &str) -> Option<AttributeValue> {
		self.get_raw(path).and_then(|b| serde_json::from_slice(&b).ok())
	}

	pub fn is_feature_enabled(&self, name: &str) -> bool {
		matches!(self.get_decoded(&format!("v0/params/feature/{name}")), Some(AttributeValue::Bool(true)))
	}

	/// Writes directly to a `live/economy/*` path, bypassing `Parse` and
	/// `Validate`. Only the vault engine's internal bookkeeping (negative
	/// interest, batch-rounding excess) and similar internal writers may
	/// call this; it is never reachable from `SetGovVariable` input.
	pub fn set_internal_economy_counter(&mut self, subkey: &str, amount: i64) {
		self.put_encoded(&format!("v0/live/economy/{subkey}"), &AttributeValue::Amount(amount));
	}

	/// Writes an arbitrary path directly, bypassing `Parse`/`Validate`.
	/// Used by chain logic that is not itself a `SetGovVariable` (token
	/// split ascendant/descendant links, lock flips).
	pub fn set_internal(&mut self, path: &str, value: AttributeValue) {
		self.put_encoded(path, &value);
	}

	/// Moves every attribute under `v0/token/<old_token>/...` to the
	/// equivalent path under `v0/token/<new_token>/...` (§4.H step 3,
	/// "token attribute keys with matching typeId"). Paths that reference
	/// the old id only as a `subId` (e.g. `oracles/splits/<h>/<old>`) are
	/// left as historical record rather than rewritten.
	pub fn rewrite_token_id(&mut self, old_token: TokenId, new_token: TokenId) {
		let old_prefix = raw_key(&format!("v0/token/{old_token}/"));
		let mut moves = Vec::new();
		self.store.for_each_prefix(&old_prefix, &mut |key, value| {
			moves.push((key.to_vec(), value.to_vec()));
			true
		});
		for (key, value) in moves {
			let suffix = String::from_utf8_lossy(&key[old_prefix.len()..]).into_owned();
			let new_key = raw_key(&format!("v0/token/{new_token}/{suffix}"));
			self.store.put(new_key, value);
			self.store.erase(&key);
		}
	}

	/// Parses, validates, and applies a user-submitted `(path, raw)` pair,
	/// returning the side effect (if any) the pipeline must dispatch.
	pub fn set_external(
		&mut self,
		path: &str,
		raw: &str,
		current_height: Height,
		activation_height: Option<Height>,
	) -> Result<Option<AttributeEffect>, AttributesError> {
		let key = parse_path(path)?;
		if key.is_live() {
			return Err(AttributesError::LiveAttributeReadOnly);
		}
		if let Some(activation) = activation_height {
			if current_height < activation {
				return Err(AttributesError::NotYetActive);
			}
		}

		let value = parse_value(&key, raw)?;
		self.apply(path, &key, value)
	}

	fn apply(&mut self, path: &str, key: &AttributeKey, value: AttributeValue) -> Result<Option<AttributeEffect>, AttributesError> {
		if let AttributeValue::ScriptSetDelta(delta) = value {
			let mut current = match self.get_decoded(path) {
				Some(AttributeValue::ScriptSet(existing)) => existing,
				_ => BTreeSet::new(),
			};
			match delta {
				ScriptSetDelta::Add(script) => {
					current.insert(script);
				}
				ScriptSetDelta::Remove(script) => {
					current.remove(&script);
				}
			}
			self.put_encoded(path, &AttributeValue::ScriptSet(current));
			return Ok(None);
		}

		self.put_encoded(path, &value);

		let token_id: Option<TokenId> = key.id.parse().ok();
		let effect = match (key.type_name.as_str(), key.key.as_str(), &value) {
			("poolpairs", "token_a_fee_pct", AttributeValue::Percentage(pct)) => token_id.map(|id| {
				AttributeEffect::PoolFeeChanged { lp_token: id, side: PoolFeeSide::A, fee_pct: *pct }
			}),
			("poolpairs", "token_b_fee_pct", AttributeValue::Percentage(pct)) => token_id.map(|id| {
				AttributeEffect::PoolFeeChanged { lp_token: id, side: PoolFeeSide::B, fee_pct: *pct }
			}),
			("poolpairs", "reward_pct", AttributeValue::Percentage(pct)) => {
				token_id.map(|id| AttributeEffect::PoolRewardPctChanged { lp_token: id, reward_pct: *pct })
			}
			("token", "fixed_interval_price_id", AttributeValue::Raw(bytes)) => (|| {
				let raw = std::str::from_utf8(bytes).ok()?;
				let (token_sym, currency_sym) = raw.split_once('/')?;
				let id = token_id?;
				Some(AttributeEffect::OracleFeedLinked {
					token_id: id,
					pair: CurrencyPair::new(token_sym.to_string(), currency_sym.to_string()),
				})
			})(),
			("token", "dfip2203", AttributeValue::Bool(false)) => {
				token_id.map(|id| AttributeEffect::Dfip2203Disabled { token_id: id })
			}
			("token", "loan_minting_interest", AttributeValue::Percentage(pct)) => {
				token_id.map(|id| AttributeEffect::LoanMintingInterestChanged { token_id: id, new_rate_pct: *pct })
			}
			("token", "loan_collateral_factor", AttributeValue::Percentage(pct)) => {
				token_id.map(|id| AttributeEffect::LoanCollateralFactorChanged { token_id: id, factor_pct: *pct })
			}
			("oracles", "splits", _) => key.sub_key.as_ref().and_then(|sub| {
				let activation_height: Height = key.id.parse().ok()?;
				let token_id: TokenId = sub.parse().ok()?;
				let multiplier_pct = match &value {
					AttributeValue::OracleSplit(pairs) => pairs.first().map(|(_, m)| *m).unwrap_or(0),
					_ => 0,
				};
				Some(AttributeEffect::SplitScheduled { activation_height, token_id, multiplier_pct })
			}),
			_ => None,
		};
		Ok(effect)
	}

	/// Exports every stored path to a JSON object, honoring the `hide_live`
	/// filter used by the public RPC surface (§4.E "Import/Export").
	pub fn export_json(&self, hide_live: bool) -> serde_json::Value {
		let mut map = serde_json::Map::new();
		self.store.for_each_prefix(b"attr/", &mut |key, value| {
			if let Some(path) = key.strip_prefix(b"attr/") {
				if let Ok(path) = std::str::from_utf8(path) {
					if hide_live && path.starts_with("v0/live/") {
						return true;
					}
					if let Ok(decoded) = serde_json::from_slice::<AttributeValue>(value) {
						map.insert(path.to_string(), attribute_value_to_json(&decoded));
					}
				}
			}
			true
		});
		serde_json::Value::Object(map)
	}

	/// Imports a JSON object of path→value, applying each through the same
	/// `Parse`/`Apply` pipeline as a single `SetGovVariable` entry (height
	/// gating is the caller's responsibility, since a bulk import typically
	/// runs at genesis with every activation already reached).
	pub fn import_json(&mut self, object: &serde_json::Map<String, serde_json::Value>) -> Result<(), AttributesError> {
		for (path, value) in object {
			let raw = match value {
				serde_json::Value::String(s) => s.clone(),
				other => other.to_string(),
			};
			let key = parse_path(path)?;
			let parsed = parse_value(&key, &raw)?;
			self.apply(path, &key, parsed)?;
		}
		Ok(())
	}
}

fn attribute_value_to_json(value: &AttributeValue) -> serde_json::Value {
	match value {
		AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
		AttributeValue::Percentage(p) => serde_json::Value::from(*p),
		AttributeValue::Amount(a) => serde_json::Value::from(*a),
		AttributeValue::U32(u) => serde_json::Value::from(*u),
		AttributeValue::ScriptSet(set) => {
			serde_json::Value::Array(set.iter().map(|s| serde_json::Value::String(s.to_string())).collect())
		}
		AttributeValue::OracleSplit(pairs) => serde_json::Value::Array(
			pairs.iter().map(|(id, m)| serde_json::Value::String(format!("{id}/{m}"))).collect(),
		),
		AttributeValue::Raw(bytes) => {
			serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
		}
	}
}

impl<'s, S: KvRead + KvWrite + ?Sized> AttributeApi for AttributeStore<'s, S> {
	type Error = AttributesError;

	fn get_raw(&self, path: &str) -> Option<Vec<u8>> {
		self.get_raw(path)
	}

	fn get_bool(&self, path: &str) -> bool {
		matches!(self.get_decoded(path), Some(AttributeValue::Bool(true)))
	}
}

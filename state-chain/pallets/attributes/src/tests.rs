use crate::store::{AttributeEffect, AttributeStore, PoolFeeSide};
use crate::value::{AttributeValue, ScriptSetDelta};
use crate::AttributesError;
use core_kvstore::MemoryStore;
use core_traits::AttributeApi;

#[test]
fn set_external_parses_validates_and_applies_a_percentage() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	let effect = store.set_external("v0/poolpairs/5/token_a_fee_pct", "1%", 100, None).unwrap();
	assert_eq!(
		effect,
		Some(AttributeEffect::PoolFeeChanged {
			lp_token: 5,
			side: PoolFeeSide::A,
			fee_pct: core_primitives::COIN / 100,
		})
	);
	assert_eq!(
		store.get_raw("v0/poolpairs/5/token_a_fee_pct"),
		Some(serde_json::to_vec(&AttributeValue::Percentage(core_primitives::COIN / 100)).unwrap())
	);
}

#[test]
fn set_external_rejects_live_paths() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	let err = store.set_external("v0/live/economy/dfi_pooled", "1000", 100, None).unwrap_err();
	assert_eq!(err, AttributesError::LiveAttributeReadOnly);
}

#[test]
fn set_external_rejects_before_activation_height() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	let err = store.set_external("v0/token/1/dfip2203", "true", 100, Some(200)).unwrap_err();
	assert_eq!(err, AttributesError::NotYetActive);

	assert!(store.set_external("v0/token/1/dfip2203", "true", 300, Some(200)).is_ok());
}

#[test]
fn script_set_delta_adds_then_removes_from_the_persisted_set() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	store.set_external("v0/attributes/foundation/members", "+alice", 0, None).unwrap();
	store.set_external("v0/attributes/foundation/members", "+bob", 0, None).unwrap();

	let raw = store.get_raw("v0/attributes/foundation/members").unwrap();
	let decoded: AttributeValue = serde_json::from_slice(&raw).unwrap();
	match decoded {
		AttributeValue::ScriptSet(set) => {
			assert_eq!(set.len(), 2);
		}
		other => panic!("unexpected value {other:?}"),
	}

	store.set_external("v0/attributes/foundation/members", "-alice", 0, None).unwrap();
	let raw = store.get_raw("v0/attributes/foundation/members").unwrap();
	let decoded: AttributeValue = serde_json::from_slice(&raw).unwrap();
	match decoded {
		AttributeValue::ScriptSet(set) => {
			assert_eq!(set.len(), 1);
			assert!(set.contains(&core_primitives::Script::from("bob")));
		}
		other => panic!("unexpected value {other:?}"),
	}
}

#[test]
fn internal_economy_counter_bypasses_parse_and_is_readable_with_hide_live_off() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	store.set_internal_economy_counter("dfi_pooled", 42);

	let exported = store.export_json(false);
	assert_eq!(exported.get("v0/live/economy/dfi_pooled").unwrap(), &serde_json::json!(42));

	let hidden = store.export_json(true);
	assert!(hidden.get("v0/live/economy/dfi_pooled").is_none());
}

#[test]
fn get_bool_reads_through_the_attribute_api_seam() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	assert!(!AttributeApi::get_bool(&store, "v0/token/1/dfip2203"));
	store.set_external("v0/token/1/dfip2203", "true", 0, None).unwrap();
	assert!(AttributeApi::get_bool(&store, "v0/token/1/dfip2203"));
}

#[test]
fn import_json_round_trips_with_export() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	let mut object = serde_json::Map::new();
	object.insert("v0/token/1/loan_minting_interest".to_string(), serde_json::json!("2%"));
	object.insert("v0/poolpairs/5/reward_pct".to_string(), serde_json::json!("10%"));

	store.import_json(&object).unwrap();

	let exported = store.export_json(false);
	assert_eq!(
		exported.get("v0/token/1/loan_minting_interest").unwrap(),
		&serde_json::json!(core_primitives::COIN / 50)
	);
	assert_eq!(
		exported.get("v0/poolpairs/5/reward_pct").unwrap(),
		&serde_json::json!(core_primitives::COIN / 10)
	);
}

#[test]
fn oracle_feed_link_effect_carries_the_resolved_pair() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	let effect = store.set_external("v0/token/9/fixed_interval_price_id", "TSLA/USD", 0, None).unwrap();
	assert_eq!(
		effect,
		Some(AttributeEffect::OracleFeedLinked {
			token_id: 9,
			pair: core_primitives::CurrencyPair::new("TSLA", "USD"),
		})
	);
}

#[test]
fn split_scheduled_effect_is_derived_from_id_and_subkey() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	let effect = store.set_external("v0/oracles/splits/500/9", "9/2.0", 0, None).unwrap();
	assert_eq!(
		effect,
		Some(AttributeEffect::SplitScheduled { activation_height: 500, token_id: 9, multiplier_pct: 2 * core_primitives::COIN })
	);
}

#[test]
fn unknown_path_shape_is_rejected_before_parsing_the_value() {
	let mut backing = MemoryStore::new();
	let mut store = AttributeStore::new(&mut backing);

	let err = store.set_external("v0/nonsense/1/whatever", "true", 0, None).unwrap_err();
	assert_eq!(err, AttributesError::UnknownType);
}

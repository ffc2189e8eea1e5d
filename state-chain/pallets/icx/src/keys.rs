use core_primitives::{Height, TxHash};

const ORDER_PREFIX: &[u8] = b"icx/order/";
const OFFER_PREFIX: &[u8] = b"icx/offer/";
const DFC_HTLC_PREFIX: &[u8] = b"icx/dfchtlc/";
const EXT_HTLC_PREFIX: &[u8] = b"icx/exthtlc/";

const ORDER_EXPIRY_PREFIX: &[u8] = b"icx/expiry/order/";
const OFFER_EXPIRY_PREFIX: &[u8] = b"icx/expiry/offer/";
const DFC_HTLC_EXPIRY_PREFIX: &[u8] = b"icx/expiry/dfchtlc/";

pub fn order_key(id: &TxHash) -> Vec<u8> {
	[ORDER_PREFIX, &id.0].concat()
}

pub fn offer_key(id: &TxHash) -> Vec<u8> {
	[OFFER_PREFIX, &id.0].concat()
}

pub fn dfc_htlc_key(id: &TxHash) -> Vec<u8> {
	[DFC_HTLC_PREFIX, &id.0].concat()
}

pub fn ext_htlc_key(id: &TxHash) -> Vec<u8> {
	[EXT_HTLC_PREFIX, &id.0].concat()
}

fn expiry_index_key(prefix: &[u8], height: Height, id: &TxHash) -> Vec<u8> {
	let mut out = prefix.to_vec();
	out.extend_from_slice(&height.to_be_bytes());
	out.extend_from_slice(&id.0);
	out
}

pub fn order_expiry_key(height: Height, id: &TxHash) -> Vec<u8> {
	expiry_index_key(ORDER_EXPIRY_PREFIX, height, id)
}

pub fn offer_expiry_key(height: Height, id: &TxHash) -> Vec<u8> {
	expiry_index_key(OFFER_EXPIRY_PREFIX, height, id)
}

pub fn dfc_htlc_expiry_key(height: Height, id: &TxHash) -> Vec<u8> {
	expiry_index_key(DFC_HTLC_EXPIRY_PREFIX, height, id)
}

pub const ORDER_EXPIRY_TAG: &[u8] = ORDER_EXPIRY_PREFIX;
pub const OFFER_EXPIRY_TAG: &[u8] = OFFER_EXPIRY_PREFIX;
pub const DFC_HTLC_EXPIRY_TAG: &[u8] = DFC_HTLC_EXPIRY_PREFIX;

pub(crate) const ORDER_TAG: &[u8] = ORDER_PREFIX;
pub(crate) const OFFER_TAG: &[u8] = OFFER_PREFIX;
pub(crate) const DFC_HTLC_TAG: &[u8] = DFC_HTLC_PREFIX;
pub(crate) const EXT_HTLC_TAG: &[u8] = EXT_HTLC_PREFIX;

/// Extracts the `TxHash` suffixing a flat (non-height-indexed) record key.
pub(crate) fn record_id(tag: &[u8], key: &[u8]) -> Option<TxHash> {
	let rest = key.strip_prefix(tag)?;
	let id_bytes: [u8; 32] = rest.try_into().ok()?;
	Some(TxHash(id_bytes))
}

/// Extracts the big-endian height prefixing every key in an expiry index,
/// and the `TxHash` it points at.
pub fn expiry_entry(tag: &[u8], key: &[u8]) -> Option<(Height, TxHash)> {
	let rest = key.strip_prefix(tag)?;
	let height_bytes: [u8; 4] = rest.get(0..4)?.try_into().ok()?;
	let id_bytes: [u8; 32] = rest.get(4..36)?.try_into().ok()?;
	Some((Height::from_be_bytes(height_bytes), TxHash(id_bytes)))
}

use core_primitives::{Height, Script};

const TOKEN_QUEUE_PREFIX: &[u8] = b"futures/token/";
const DUSD_QUEUE_PREFIX: &[u8] = b"futures/dusd/";

fn owner_segment(owner: &Script) -> Vec<u8> {
	let bytes = owner.as_bytes();
	let mut out = (bytes.len() as u32).to_be_bytes().to_vec();
	out.extend_from_slice(bytes);
	out
}

pub fn token_entry_key(height: Height, owner: &Script, ordinal: u32) -> Vec<u8> {
	let mut out = TOKEN_QUEUE_PREFIX.to_vec();
	out.extend_from_slice(&height.to_be_bytes());
	out.extend(owner_segment(owner));
	out.extend_from_slice(&ordinal.to_be_bytes());
	out
}

pub fn dusd_entry_key(height: Height, owner: &Script, ordinal: u32) -> Vec<u8> {
	let mut out = DUSD_QUEUE_PREFIX.to_vec();
	out.extend_from_slice(&height.to_be_bytes());
	out.extend(owner_segment(owner));
	out.extend_from_slice(&ordinal.to_be_bytes());
	out
}

pub const TOKEN_QUEUE_TAG: &[u8] = TOKEN_QUEUE_PREFIX;
pub const DUSD_QUEUE_TAG: &[u8] = DUSD_QUEUE_PREFIX;

/// Extracts the big-endian `submitHeight` prefixing every key in a queue.
pub fn height_of(tag: &[u8], key: &[u8]) -> Option<Height> {
	let rest = key.strip_prefix(tag)?;
	let bytes: [u8; 4] = rest.get(0..4)?.try_into().ok()?;
	Some(Height::from_be_bytes(bytes))
}

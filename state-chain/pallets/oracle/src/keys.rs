use core_primitives::CurrencyPair;

pub const REGISTERED_PAIR_PREFIX: &[u8] = b"oracle/registered/";
const FEED_PREFIX: &[u8] = b"oracle/feed/";
const PRICE_PREFIX: &[u8] = b"oracle/price/";

fn pair_segment(pair: &CurrencyPair) -> String {
	format!("{}/{}", pair.token, pair.currency)
}

pub fn registered_pair_key(pair: &CurrencyPair) -> Vec<u8> {
	[REGISTERED_PAIR_PREFIX, pair_segment(pair).as_bytes()].concat()
}

pub fn feed_prefix(pair: &CurrencyPair) -> Vec<u8> {
	[FEED_PREFIX, pair_segment(pair).as_bytes(), b"/"].concat()
}

pub fn feed_key(pair: &CurrencyPair, feeder: &str) -> Vec<u8> {
	[feed_prefix(pair).as_slice(), feeder.as_bytes()].concat()
}

pub fn price_key(pair: &CurrencyPair) -> Vec<u8> {
	[PRICE_PREFIX, pair_segment(pair).as_bytes()].concat()
}

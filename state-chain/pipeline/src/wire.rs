//! Bespoke little-endian, length-prefixed codec for custom transaction
//! payloads (§6.3). Distinct from the SCALE codec the KV-store key/value
//! layer uses: this is the OP_RETURN-style wire format a wallet or indexer
//! would encode a message into, not the persisted state representation.

use core_primitives::{Amount, Script, TokenId, TxHash};

use crate::error::PipelineError;

/// Reads fields off a borrowed payload buffer in the order they were
/// written, erroring on truncation rather than panicking.
pub struct Reader<'a> {
	buf: &'a [u8],
	pos: usize,
}

impl<'a> Reader<'a> {
	pub fn new(buf: &'a [u8]) -> Self {
		Reader { buf, pos: 0 }
	}

	pub fn remaining(&self) -> usize {
		self.buf.len() - self.pos
	}

	fn take(&mut self, len: usize) -> Result<&'a [u8], PipelineError> {
		if self.remaining() < len {
			return Err(PipelineError::TruncatedPayload);
		}
		let slice = &self.buf[self.pos..self.pos + len];
		self.pos += len;
		Ok(slice)
	}

	pub fn u8(&mut self) -> Result<u8, PipelineError> {
		Ok(self.take(1)?[0])
	}

	pub fn bool(&mut self) -> Result<bool, PipelineError> {
		Ok(self.u8()? != 0)
	}

	pub fn u32(&mut self) -> Result<u32, PipelineError> {
		Ok(u32::from_le_bytes(self.take(4)?.try_into().expect("len checked")))
	}

	pub fn i64(&mut self) -> Result<i64, PipelineError> {
		Ok(i64::from_le_bytes(self.take(8)?.try_into().expect("len checked")))
	}

	pub fn amount(&mut self) -> Result<Amount, PipelineError> {
		Ok(Amount::from_coin_units(self.i64()?))
	}

	pub fn token_id(&mut self) -> Result<TokenId, PipelineError> {
		self.u32()
	}

	pub fn tx_hash(&mut self) -> Result<TxHash, PipelineError> {
		Ok(TxHash(self.take(32)?.try_into().expect("len checked")))
	}

	/// Length-prefixed byte string (u32 length, little-endian).
	pub fn var_bytes(&mut self) -> Result<Vec<u8>, PipelineError> {
		let len = self.u32()? as usize;
		Ok(self.take(len)?.to_vec())
	}

	pub fn string(&mut self) -> Result<String, PipelineError> {
		String::from_utf8(self.var_bytes()?).map_err(|_| PipelineError::InvalidUtf8)
	}

	pub fn script(&mut self) -> Result<Script, PipelineError> {
		Ok(Script::from_bytes(self.var_bytes()?))
	}

	pub fn opt_bytes(&mut self) -> Result<Option<Vec<u8>>, PipelineError> {
		if self.bool()? {
			Ok(Some(self.var_bytes()?))
		} else {
			Ok(None)
		}
	}

	/// Errors if the payload has trailing bytes after decoding, the wire
	/// format's equivalent of a length-prefixed struct "being exact".
	pub fn finish(self) -> Result<(), PipelineError> {
		if self.remaining() != 0 {
			return Err(PipelineError::TrailingBytes);
		}
		Ok(())
	}
}

/// Mirrors [`Reader`] for tests and for any embedder that needs to build a
/// payload rather than just decode one.
#[derive(Default)]
pub struct Writer {
	buf: Vec<u8>,
}

impl Writer {
	pub fn new() -> Self {
		Writer::default()
	}

	pub fn u8(&mut self, value: u8) -> &mut Self {
		self.buf.push(value);
		self
	}

	pub fn bool(&mut self, value: bool) -> &mut Self {
		self.u8(value as u8)
	}

	pub fn u32(&mut self, value: u32) -> &mut Self {
		self.buf.extend_from_slice(&value.to_le_bytes());
		self
	}

	pub fn i64(&mut self, value: i64) -> &mut Self {
		self.buf.extend_from_slice(&value.to_le_bytes());
		self
	}

	pub fn amount(&mut self, value: Amount) -> &mut Self {
		self.i64(value.raw())
	}

	pub fn token_id(&mut self, value: TokenId) -> &mut Self {
		self.u32(value)
	}

	pub fn tx_hash(&mut self, value: &TxHash) -> &mut Self {
		self.buf.extend_from_slice(&value.0);
		self
	}

	pub fn var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
		self.u32(bytes.len() as u32);
		self.buf.extend_from_slice(bytes);
		self
	}

	pub fn string(&mut self, value: &str) -> &mut Self {
		self.var_bytes(value.as_bytes())
	}

	pub fn script(&mut self, value: &Script) -> &mut Self {
		self.var_bytes(value.as_bytes())
	}

	pub fn opt_bytes(&mut self, value: &Option<Vec<u8>>) -> &mut Self {
		match value {
			Some(bytes) => {
				self.bool(true);
				self.var_bytes(bytes);
			}
			None => {
				self.bool(false);
			}
		}
		self
	}

	pub fn into_vec(self) -> Vec<u8> {
		self.buf
	}
}

/// The 4-byte ASCII marker every custom transaction's payload starts with
/// (§6.3), ahead of the single type byte.
pub const MARKER: &[u8; 4] = b"DfTx";

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_every_field_kind() {
		let mut w = Writer::new();
		w.u8(7).bool(true).u32(42).i64(-9).amount(Amount::from_coin_units(123)).token_id(5);
		w.tx_hash(&TxHash::zero());
		w.var_bytes(b"hello");
		w.string("world");
		w.script(&Script::from_bytes(b"abc".to_vec()));
		w.opt_bytes(&Some(b"x".to_vec()));
		w.opt_bytes(&None);
		let bytes = w.into_vec();

		let mut r = Reader::new(&bytes);
		assert_eq!(r.u8().unwrap(), 7);
		assert!(r.bool().unwrap());
		assert_eq!(r.u32().unwrap(), 42);
		assert_eq!(r.i64().unwrap(), -9);
		assert_eq!(r.amount().unwrap(), Amount::from_coin_units(123));
		assert_eq!(r.token_id().unwrap(), 5);
		assert_eq!(r.tx_hash().unwrap(), TxHash::zero());
		assert_eq!(r.var_bytes().unwrap(), b"hello".to_vec());
		assert_eq!(r.string().unwrap(), "world");
		assert_eq!(r.script().unwrap(), Script::from_bytes(b"abc".to_vec()));
		assert_eq!(r.opt_bytes().unwrap(), Some(b"x".to_vec()));
		assert_eq!(r.opt_bytes().unwrap(), None);
		r.finish().unwrap();
	}

	#[test]
	fn truncated_payload_errors_instead_of_panicking() {
		let mut r = Reader::new(&[1, 2]);
		assert_eq!(r.u32(), Err(PipelineError::TruncatedPayload));
	}

	#[test]
	fn trailing_bytes_after_finish_is_an_error() {
		let r = Reader::new(&[1, 2, 3]);
		assert_eq!(r.finish(), Err(PipelineError::TrailingBytes));
	}
}

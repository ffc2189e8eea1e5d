//! Cross-chain atomic swap order book (§3.7): orders, offers, and the
//! DFC/external HTLC pair that settles them.
//!
//! Escrow follows the same convention `pallet-futures` uses for its
//! queues: funds are debited from the relevant owner at the point they
//! commit (order creation for an internal order, offer creation for an
//! external one) and credited back on cancellation, expiry, or HTLC claim,
//! rather than being moved into a separate ledger account. A DFC HTLC does
//! not re-debit anything: it earmarks part of an already-escrowed order or
//! offer, and only the claim/refund path touches balances.

mod error;
mod keys;
mod order;

pub use error::IcxError;
pub use order::{
	DfcHtlc, ExtHtlc, HtlcStatus, Offer, OfferStatus, Order, OrderStatus, OrderType, DEFAULT_OFFER_EXPIRY,
	DEFAULT_ORDER_EXPIRY,
};

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{Amount, CommunityAccountType, Height, Script, TokenId, TxHash};
use core_traits::{AttributeApi, BalancesApi};
use sha2::{Digest, Sha256};

fn taker_fee_pct<A: AttributeApi>(attrs: &A) -> i64 {
	attrs
		.get_raw("v0/params/icx/takerfee_pct")
		.and_then(|raw| serde_json::from_slice::<pallet_attributes::AttributeValue>(&raw).ok())
		.and_then(|value| match value {
			pallet_attributes::AttributeValue::Percentage(pct) => Some(pct),
			_ => None,
		})
		.unwrap_or(0)
}

fn hash_seed(seed: &[u8]) -> TxHash {
	let digest = Sha256::digest(seed);
	let mut bytes = [0u8; 32];
	bytes.copy_from_slice(&digest);
	TxHash(bytes)
}

/// Outcome of one expiry sweep pass, for the pipeline's history bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpirySweepReport {
	pub orders_expired: u32,
	pub offers_expired: u32,
	pub htlcs_refunded: u32,
}

pub struct IcxEngine<'s, S: KvRead + KvWrite + ?Sized> {
	store: &'s mut S,
}

impl<'s, S: KvRead + KvWrite + ?Sized> IcxEngine<'s, S> {
	pub fn new(store: &'s mut S) -> Self {
		IcxEngine { store }
	}

	pub fn get_order(&self, id: &TxHash) -> Option<Order> {
		self.store.get(&keys::order_key(id)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	pub fn get_offer(&self, id: &TxHash) -> Option<Offer> {
		self.store.get(&keys::offer_key(id)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	pub fn get_dfc_htlc(&self, id: &TxHash) -> Option<DfcHtlc> {
		self.store.get(&keys::dfc_htlc_key(id)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	pub fn get_ext_htlc(&self, id: &TxHash) -> Option<ExtHtlc> {
		self.store.get(&keys::ext_htlc_key(id)).and_then(|b| serde_json::from_slice(&b).ok())
	}

	/// `icx_listorders` (§6.4). Visits every order ever created, in no
	/// particular order; `visitor` returning `false` stops the walk early,
	/// the same short-circuit convention `Pools::for_each_pool` uses.
	pub fn for_each_order(&self, mut visitor: impl FnMut(TxHash, &Order) -> bool) {
		let mut ids = Vec::new();
		self.store.for_each_prefix(keys::ORDER_TAG, &mut |k, _| {
			if let Some(id) = keys::record_id(keys::ORDER_TAG, k) {
				ids.push(id);
			}
			true
		});
		for id in ids {
			if let Some(order) = self.get_order(&id) {
				if !visitor(id, &order) {
					break;
				}
			}
		}
	}

	/// `icx_listorders`'s offer-side counterpart: every offer ever made
	/// against any order.
	pub fn for_each_offer(&self, mut visitor: impl FnMut(TxHash, &Offer) -> bool) {
		let mut ids = Vec::new();
		self.store.for_each_prefix(keys::OFFER_TAG, &mut |k, _| {
			if let Some(id) = keys::record_id(keys::OFFER_TAG, k) {
				ids.push(id);
			}
			true
		});
		for id in ids {
			if let Some(offer) = self.get_offer(&id) {
				if !visitor(id, &offer) {
					break;
				}
			}
		}
	}

	/// `icx_listhtlcs` (§6.4), DFC side.
	pub fn for_each_dfc_htlc(&self, mut visitor: impl FnMut(TxHash, &DfcHtlc) -> bool) {
		let mut ids = Vec::new();
		self.store.for_each_prefix(keys::DFC_HTLC_TAG, &mut |k, _| {
			if let Some(id) = keys::record_id(keys::DFC_HTLC_TAG, k) {
				ids.push(id);
			}
			true
		});
		for id in ids {
			if let Some(htlc) = self.get_dfc_htlc(&id) {
				if !visitor(id, &htlc) {
					break;
				}
			}
		}
	}

	/// `icx_listhtlcs` (§6.4), external-chain side.
	pub fn for_each_ext_htlc(&self, mut visitor: impl FnMut(TxHash, &ExtHtlc) -> bool) {
		let mut ids = Vec::new();
		self.store.for_each_prefix(keys::EXT_HTLC_TAG, &mut |k, _| {
			if let Some(id) = keys::record_id(keys::EXT_HTLC_TAG, k) {
				ids.push(id);
			}
			true
		});
		for id in ids {
			if let Some(htlc) = self.get_ext_htlc(&id) {
				if !visitor(id, &htlc) {
					break;
				}
			}
		}
	}

	fn put_order(&mut self, id: &TxHash, order: &Order) {
		self.store.put(keys::order_key(id), serde_json::to_vec(order).expect("Order serializes"));
	}

	fn put_offer(&mut self, id: &TxHash, offer: &Offer) {
		self.store.put(keys::offer_key(id), serde_json::to_vec(offer).expect("Offer serializes"));
	}

	/// `ICXCreateOrder` (§3.7). For an [`OrderType::Internal`] order this
	/// escrows `amount_from` of `id_token` from `owner_address`; an
	/// [`OrderType::External`] order escrows nothing yet, since its DFC side
	/// arrives later via [`Self::make_offer`].
	#[allow(clippy::too_many_arguments)]
	pub fn create_order<B: BalancesApi>(
		&mut self,
		id: TxHash,
		order_type: OrderType,
		id_token: TokenId,
		chain: String,
		owner_address: Script,
		amount_from: Amount,
		order_price: Amount,
		creation_height: Height,
		expiry: u32,
		balances: &mut B,
	) -> Result<(), IcxError> {
		if order_type == OrderType::Internal {
			balances.sub_balance(&owner_address, id_token, amount_from).map_err(|_| IcxError::Overflow)?;
		}
		let order = Order {
			order_type,
			id_token,
			chain,
			owner_address,
			amount_from,
			amount_to_fill: amount_from,
			order_price,
			creation_height,
			expiry,
			close_tx: None,
			close_height: None,
			status: OrderStatus::Open,
		};
		self.store.put(keys::order_expiry_key(order.expire_height(), &id), Vec::new());
		self.put_order(&id, &order);
		Ok(())
	}

	/// `ICXMakeOffer` (§3.7). Against an [`OrderType::External`] order the
	/// taker (`owner_address`) escrows `amount` of the order's `id_token`,
	/// since they hold the DFC side in that direction; against an
	/// [`OrderType::Internal`] order nothing is escrowed here, since the
	/// order already holds it.
	#[allow(clippy::too_many_arguments)]
	pub fn make_offer<A: AttributeApi, B: BalancesApi>(
		&mut self,
		id: TxHash,
		order_tx: TxHash,
		amount: Amount,
		owner_address: Script,
		receive_destination: Vec<u8>,
		creation_height: Height,
		expiry: u32,
		attrs: &A,
		balances: &mut B,
	) -> Result<(), IcxError> {
		let order = self.get_order(&order_tx).ok_or(IcxError::OrderNotFound)?;
		if order.status != OrderStatus::Open {
			return Err(IcxError::OrderNotOpen);
		}
		if amount > order.amount_to_fill {
			return Err(IcxError::AmountExceedsOrderRemainder);
		}
		if order.order_type == OrderType::External {
			balances.sub_balance(&owner_address, order.id_token, amount).map_err(|_| IcxError::Overflow)?;
		}
		let taker_fee = amount.checked_mul_coin_scaled(taker_fee_pct(attrs)).map_err(|_| IcxError::Overflow)?;
		let offer =
			Offer { order_tx, amount, owner_address, receive_destination, taker_fee, creation_height, expiry, status: OfferStatus::Open };
		self.store.put(keys::offer_expiry_key(offer.expire_height(), &id), Vec::new());
		self.put_offer(&id, &offer);
		Ok(())
	}

	/// `ICXSubmitDFCHTLC` (§3.7): locks the DFC side of a fill under a hash
	/// lock. Earmarks against the order's or offer's existing escrow; no
	/// balance moves until [`Self::claim_dfc_htlc`] or the timeout refund.
	#[allow(clippy::too_many_arguments)]
	pub fn submit_dfc_htlc(
		&mut self,
		id: TxHash,
		offer_tx: TxHash,
		amount: Amount,
		receive_address: Script,
		receive_pubkey: Option<Vec<u8>>,
		hash: TxHash,
		timeout: u32,
		creation_height: Height,
	) -> Result<(), IcxError> {
		let offer = self.get_offer(&offer_tx).ok_or(IcxError::OfferNotFound)?;
		if offer.status != OfferStatus::Open {
			return Err(IcxError::OfferNotOpen);
		}
		let htlc = DfcHtlc { offer_tx, amount, receive_address, receive_pubkey, hash, timeout, creation_height, status: HtlcStatus::Open };
		self.store.put(keys::dfc_htlc_expiry_key(htlc.refund_height(), &id), Vec::new());
		self.store.put(keys::dfc_htlc_key(&id), serde_json::to_vec(&htlc).expect("DfcHtlc serializes"));
		Ok(())
	}

	/// `ICXSubmitEXTHTLC` (§3.7): records the matching lock on the external
	/// chain. Pure bookkeeping; no balance on this chain is touched.
	#[allow(clippy::too_many_arguments)]
	pub fn submit_ext_htlc(
		&mut self,
		id: TxHash,
		offer_tx: TxHash,
		amount: Amount,
		receive_address: Script,
		hash: TxHash,
		htlc_script_address: String,
		owner_pubkey: Vec<u8>,
		timeout: u32,
		creation_height: Height,
	) -> Result<(), IcxError> {
		if self.get_offer(&offer_tx).is_none() {
			return Err(IcxError::OfferNotFound);
		}
		let htlc = ExtHtlc { offer_tx, amount, receive_address, hash, htlc_script_address, owner_pubkey, timeout, creation_height };
		self.store.put(keys::ext_htlc_key(&id), serde_json::to_vec(&htlc).expect("ExtHtlc serializes"));
		Ok(())
	}

	/// `ICXClaimDFCHTLC` (§3.7): reveals `seed`, releases the DFC HTLC's
	/// amount (minus the offer's taker fee, credited to the community
	/// fund's `Unallocated` account) to `receive_address`, and reduces the
	/// order's remaining `amount_to_fill`.
	pub fn claim_dfc_htlc<B: BalancesApi, SC: KvRead + KvWrite + ?Sized>(
		&mut self,
		htlc_id: &TxHash,
		seed: &[u8],
		balances: &mut B,
		community_store: &mut SC,
	) -> Result<(), IcxError> {
		let mut htlc = self.get_dfc_htlc(htlc_id).ok_or(IcxError::DfcHtlcNotFound)?;
		if htlc.status != HtlcStatus::Open {
			return Err(IcxError::DfcHtlcNotOpen);
		}
		if hash_seed(seed) != htlc.hash {
			return Err(IcxError::SeedMismatch);
		}
		let offer = self.get_offer(&htlc.offer_tx).ok_or(IcxError::OfferNotFound)?;
		let mut order = self.get_order(&offer.order_tx).ok_or(IcxError::OrderNotFound)?;

		let payout = htlc.amount.checked_sub(offer.taker_fee).map_err(|_| IcxError::Overflow)?;
		balances.add_balance(&htlc.receive_address, order.id_token, payout).map_err(|_| IcxError::Overflow)?;
		if !offer.taker_fee.is_zero() {
			pallet_tokens::CommunityFunds::new(community_store).credit(CommunityAccountType::Unallocated, offer.taker_fee);
		}

		order.amount_to_fill = order.amount_to_fill.checked_sub(htlc.amount).unwrap_or(Amount::ZERO);
		if order.amount_to_fill.is_zero() {
			order.status = OrderStatus::Filled;
		}
		self.put_order(&offer.order_tx, &order);

		htlc.status = HtlcStatus::Claimed;
		self.store.put(keys::dfc_htlc_key(htlc_id), serde_json::to_vec(&htlc).expect("DfcHtlc serializes"));
		Ok(())
	}

	/// `ICXCloseOrder` (§3.7, scenario 6). Refunds the order's remaining
	/// escrow (internal orders only; external orders hold none) to
	/// `owner_address` and marks the order `Closed`.
	pub fn close_order<B: BalancesApi>(
		&mut self,
		id: &TxHash,
		close_tx: TxHash,
		height: Height,
		balances: &mut B,
	) -> Result<(), IcxError> {
		let mut order = self.get_order(id).ok_or(IcxError::OrderNotFound)?;
		if order.status != OrderStatus::Open {
			return Err(IcxError::OrderNotOpen);
		}
		self.refund_order_remainder(&order, balances)?;
		order.status = OrderStatus::Closed;
		order.close_tx = Some(close_tx);
		order.close_height = Some(height);
		self.put_order(id, &order);
		Ok(())
	}

	/// `ICXCloseOffer` (§3.7). Refunds an external-order offer's escrow to
	/// its owner and marks it `Closed`.
	pub fn close_offer<B: BalancesApi>(&mut self, id: &TxHash, balances: &mut B) -> Result<(), IcxError> {
		let mut offer = self.get_offer(id).ok_or(IcxError::OfferNotFound)?;
		if offer.status != OfferStatus::Open {
			return Err(IcxError::OfferNotOpen);
		}
		self.refund_offer_escrow(&offer, balances)?;
		offer.status = OfferStatus::Closed;
		self.put_offer(id, &offer);
		Ok(())
	}

	fn refund_order_remainder<B: BalancesApi>(&self, order: &Order, balances: &mut B) -> Result<(), IcxError> {
		if order.order_type == OrderType::Internal && !order.amount_to_fill.is_zero() {
			balances
				.add_balance(&order.owner_address, order.id_token, order.amount_to_fill)
				.map_err(|_| IcxError::Overflow)?;
		}
		Ok(())
	}

	fn refund_offer_escrow<B: BalancesApi>(&self, offer: &Offer, balances: &mut B) -> Result<(), IcxError> {
		if let Some(order) = self.get_order(&offer.order_tx) {
			if order.order_type == OrderType::External {
				balances.add_balance(&offer.owner_address, order.id_token, offer.amount).map_err(|_| IcxError::Overflow)?;
			}
		}
		Ok(())
	}

	/// `process_cross_chain_order_events` (§4.I step 2): expires every
	/// order, offer, and in-flight DFC HTLC whose deadline equals `height`,
	/// refunding escrow the same way the matching `Close*` operation would.
	pub fn sweep_expirations<B: BalancesApi>(&mut self, height: Height, balances: &mut B) -> ExpirySweepReport {
		let mut report = ExpirySweepReport::default();

		let mut due_orders = Vec::new();
		self.store.for_each_prefix(keys::ORDER_EXPIRY_TAG, &mut |k, _| {
			if let Some((h, id)) = keys::expiry_entry(keys::ORDER_EXPIRY_TAG, k) {
				if h == height {
					due_orders.push((k.to_vec(), id));
				}
			}
			true
		});
		for (index_key, id) in due_orders {
			self.store.erase(&index_key);
			if let Some(mut order) = self.get_order(&id) {
				if order.status == OrderStatus::Open {
					let _ = self.refund_order_remainder(&order, balances);
					order.status = OrderStatus::Expired;
					self.put_order(&id, &order);
					report.orders_expired += 1;
				}
			}
		}

		let mut due_offers = Vec::new();
		self.store.for_each_prefix(keys::OFFER_EXPIRY_TAG, &mut |k, _| {
			if let Some((h, id)) = keys::expiry_entry(keys::OFFER_EXPIRY_TAG, k) {
				if h == height {
					due_offers.push((k.to_vec(), id));
				}
			}
			true
		});
		for (index_key, id) in due_offers {
			self.store.erase(&index_key);
			if let Some(mut offer) = self.get_offer(&id) {
				if offer.status == OfferStatus::Open {
					let _ = self.refund_offer_escrow(&offer, balances);
					offer.status = OfferStatus::Expired;
					self.put_offer(&id, &offer);
					report.offers_expired += 1;
				}
			}
		}

		let mut due_htlcs = Vec::new();
		self.store.for_each_prefix(keys::DFC_HTLC_EXPIRY_TAG, &mut |k, _| {
			if let Some((h, id)) = keys::expiry_entry(keys::DFC_HTLC_EXPIRY_TAG, k) {
				if h == height {
					due_htlcs.push((k.to_vec(), id));
				}
			}
			true
		});
		for (index_key, id) in due_htlcs {
			self.store.erase(&index_key);
			if let Some(mut htlc) = self.get_dfc_htlc(&id) {
				if htlc.status == HtlcStatus::Open {
					htlc.status = HtlcStatus::Refunded;
					self.store.put(keys::dfc_htlc_key(&id), serde_json::to_vec(&htlc).expect("DfcHtlc serializes"));
					report.htlcs_refunded += 1;
				}
			}
		}

		report
	}
}

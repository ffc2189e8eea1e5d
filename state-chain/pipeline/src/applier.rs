//! The transaction applier (§4.J): decodes one transaction's payload,
//! checks the authorization set its message names, dispatches into the
//! component engine that owns the mutation, and reports success/failure
//! for the caller's account-history bookkeeping.

use core_kvstore::{KvRead, KvWrite};
use core_primitives::{ChainParams, CommunityAccountType, Height};
use core_traits::{BalancesApi, HistoryEvent, HistoryWriter, UtxoView};

use crate::error::{ApplierError, PipelineError};
use crate::message::{decode_message, CustomTxType, Message};
use crate::wire::{Reader, MARKER};

#[allow(clippy::too_many_arguments)]
pub fn apply_transaction<STk, SBal, SOrc, SAttr, SFut, SVault, SIcx>(
	payload: &[u8],
	authorizer: &impl UtxoView,
	height: Height,
	// Position of this transaction within its block; used only to
	// disambiguate `SetGovVariableHeight` entries queued in the same block
	// (the pending queue is keyed by `(activation_height, ordinal)`, and
	// every transaction in a block shares the same `height`).
	txn_index: u32,
	chain_params: &ChainParams,
	tokens_store: &mut STk,
	balances_store: &mut SBal,
	oracle_store: &mut SOrc,
	attrs_store: &mut SAttr,
	futures_store: &mut SFut,
	vaults_store: &mut SVault,
	icx_store: &mut SIcx,
	history: &mut impl HistoryWriter,
) -> Result<CustomTxType, ApplierError>
where
	STk: KvRead + KvWrite + ?Sized,
	SBal: KvRead + KvWrite + ?Sized,
	SOrc: KvRead + KvWrite + ?Sized,
	SAttr: KvRead + KvWrite + ?Sized,
	SFut: KvRead + KvWrite + ?Sized,
	SVault: KvRead + KvWrite + ?Sized,
	SIcx: KvRead + KvWrite + ?Sized,
{
	if payload.len() < 5 || &payload[0..4] != MARKER {
		return Err(ApplierError::Wire(PipelineError::BadMarker));
	}
	let tx_type = CustomTxType::from_byte(payload[4]).ok_or(ApplierError::Wire(PipelineError::UnknownMessageType))?;
	let message = decode_message(tx_type, Reader::new(&payload[5..]), height)?;

	let mut balances = pallet_balances::Balances::new(balances_store);

	match message {
		Message::Unsupported(_) => return Err(ApplierError::Wire(PipelineError::UnsupportedMessageType)),

		Message::CreateToken { symbol, name, flags } => {
			let mut tokens = pallet_tokens::TokenRegistry::new(tokens_store);
			let token_flags = pallet_tokens::TokenFlags {
				dat: flags.dat,
				lps: false,
				tradeable: flags.tradeable,
				finalized: false,
				mintable: flags.mintable,
			};
			tokens.create_token(symbol, name, token_flags, height)?;
		}

		Message::UpdateToken { token, symbol, name, tradeable, mintable } => {
			let patch = pallet_tokens::TokenPatch { symbol, name, tradeable, finalized: None, mintable };
			let mut tokens = pallet_tokens::TokenRegistry::new(tokens_store);
			tokens.update_token(token, patch, true, false)?;
		}

		Message::MintToken { token, amount, to } => {
			if !authorizer.is_input_owner(&to) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			let mut tokens = pallet_tokens::TokenRegistry::new(tokens_store);
			let minted = tokens.get_token(token).map(|t| t.minted).unwrap_or(0);
			tokens.set_minted(token, minted.saturating_add(amount.raw()))?;
			balances.add_balance(&to, token, amount)?;
			history.record(HistoryEvent::BalanceChanged { owner: to.clone(), token, new_balance: balances.get_balance(&to, token) });
		}

		Message::BurnToken { token, amount, from } => {
			if !authorizer.is_input_owner(&from) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			balances.sub_balance(&from, token, amount)?;
			let mut tokens = pallet_tokens::TokenRegistry::new(tokens_store);
			let minted = tokens.get_token(token).map(|t| t.minted).unwrap_or(0);
			tokens.set_minted(token, minted.saturating_sub(amount.raw()))?;
		}

		Message::CreatePoolPair { token_a, token_b, commission, reward_pct } => {
			let mut module = pallet_tokens::TokenModule::new(tokens_store);
			module.create_pool(token_a, token_b, commission, reward_pct, height)?;
		}

		Message::PoolSwap { from, from_token, from_amount, to, to_token } => {
			if !authorizer.is_input_owner(&from) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			balances.sub_balance(&from, from_token, from_amount)?;
			let mut module = pallet_tokens::TokenModule::new(tokens_store);
			let mut found_lp = None;
			module.pools().for_each_pool(|lp, pool| {
				let matches = (pool.token_a == from_token && pool.token_b == to_token)
					|| (pool.token_a == to_token && pool.token_b == from_token);
				if matches {
					found_lp = Some(lp);
					return false;
				}
				true
			});
			let lp_token = found_lp.ok_or(pallet_tokens::TokensError::UnknownPool)?;
			let amount_out = module.pools().swap(lp_token, from_token, from_amount)?;
			balances.add_balance(&to, to_token, amount_out)?;
			history.record(HistoryEvent::SwapExecuted {
				pair: core_primitives::CurrencyPair::new(from_token.to_string(), to_token.to_string()),
				amount_in: from_amount,
				amount_out,
			});
		}

		Message::AddPoolLiquidity { lp_token, provider, token_a, amount_a, token_b, amount_b } => {
			if !authorizer.is_input_owner(&provider) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			balances.sub_balance(&provider, token_a, amount_a)?;
			balances.sub_balance(&provider, token_b, amount_b)?;
			let minted = pallet_tokens::Pools::new(tokens_store).add_liquidity(lp_token, amount_a, amount_b)?;
			balances.add_balance(&provider, lp_token, core_primitives::Amount::from_coin_units(minted as i64))?;
		}

		Message::RemovePoolLiquidity { lp_token, provider, amount } => {
			if !authorizer.is_input_owner(&provider) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			balances.sub_balance(&provider, lp_token, core_primitives::Amount::from_coin_units(amount as i64))?;
			let (out_a, out_b) = pallet_tokens::Pools::new(tokens_store).remove_liquidity(lp_token, amount)?;
			let pool = pallet_tokens::load_pool(tokens_store, lp_token).ok_or(pallet_tokens::TokensError::UnknownPool)?;
			balances.add_balance(&provider, pool.token_a, out_a)?;
			balances.add_balance(&provider, pool.token_b, out_b)?;
		}

		Message::UtxosToAccount { to, token, amount } => {
			balances.add_balance(&to, token, amount)?;
		}

		Message::AccountToUtxos { from, token, amount } => {
			if !authorizer.is_input_owner(&from) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			balances.sub_balance(&from, token, amount)?;
		}

		Message::AccountToAccount { from, to, token, amount } => {
			if !authorizer.is_input_owner(&from) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			balances.sub_balance(&from, token, amount)?;
			balances.add_balance(&to, token, amount)?;
		}

		Message::AnyAccountsToAccounts { from, to } => {
			for leg in &from {
				if !authorizer.is_input_owner(&leg.owner) {
					return Err(ApplierError::Wire(PipelineError::NotAuthorized));
				}
			}
			for leg in &from {
				balances.sub_balance(&leg.owner, leg.token, leg.amount)?;
			}
			for leg in &to {
				balances.add_balance(&leg.owner, leg.token, leg.amount)?;
			}
		}

		Message::SetGovVariable { path, raw } => {
			let mut attrs = pallet_attributes::AttributeStore::new(attrs_store);
			let effect = attrs.set_external(&path, &raw, height, None)?;
			dispatch_attribute_effect(effect, tokens_store, oracle_store, attrs_store);
		}

		Message::SetGovVariableHeight { path, raw, activation_height } => {
			if height >= activation_height {
				let mut attrs = pallet_attributes::AttributeStore::new(attrs_store);
				let effect = attrs.set_external(&path, &raw, height, Some(activation_height))?;
				dispatch_attribute_effect(effect, tokens_store, oracle_store, attrs_store);
			} else {
				let mut queue = crate::gov_queue::GovQueue::new(attrs_store);
				queue.queue_height_var(activation_height, txn_index, path, raw);
			}
		}

		Message::CreateVault { vault_id, owner, scheme_id } => {
			pallet_vaults::VaultEngine::new(vaults_store).create_vault(vault_id, owner, scheme_id)?;
			crate::vault_index::record_vault(vaults_store, vault_id);
		}

		Message::DepositToVault { vault_id, from, token, amount } => {
			if !authorizer.is_input_owner(&from) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			balances.sub_balance(&from, token, amount)?;
			pallet_vaults::VaultEngine::new(vaults_store).add_collateral(&vault_id, token, amount)?;
		}

		Message::WithdrawFromVault { vault_id, to, token, amount } => {
			if !authorizer.is_owner_at(1, &to) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			let oracle = pallet_oracle::Oracle::new(oracle_store);
			let attrs = pallet_attributes::AttributeStore::new(attrs_store);
			pallet_vaults::VaultEngine::new(vaults_store).withdraw_collateral(&vault_id, token, amount, height, &oracle, &attrs)?;
			balances.add_balance(&to, token, amount)?;
		}

		Message::TakeLoan { vault_id, loans } => {
			let oracle = pallet_oracle::Oracle::new(oracle_store);
			let attrs = pallet_attributes::AttributeStore::new(attrs_store);
			let mut vaults = pallet_vaults::VaultEngine::new(vaults_store);
			for (token, amount) in loans {
				let token_interest_rate = loan_minting_interest(&attrs, token);
				vaults.take_loan(&vault_id, token, amount, token_interest_rate, height, chain_params, &oracle, &attrs, &mut balances)?;
			}
		}

		Message::PaybackLoan { vault_id, payments } => {
			let attrs = pallet_attributes::AttributeStore::new(attrs_store);
			let mut vaults = pallet_vaults::VaultEngine::new(vaults_store);
			for (token, amount) in payments {
				let token_interest_rate = loan_minting_interest(&attrs, token);
				vaults.payback_loan(&vault_id, token, amount, token_interest_rate, height, chain_params, &mut balances)?;
			}
		}

		Message::AuctionBid { vault_id, batch_index, bidder, bid } => {
			if !authorizer.is_input_owner(&bidder) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			let attrs = pallet_attributes::AttributeStore::new(attrs_store);
			let min_increment_pct = auction_min_increment_pct(&attrs);
			pallet_vaults::VaultEngine::new(vaults_store).place_bid(&vault_id, batch_index, bidder, bid, &mut balances, min_increment_pct)?;
		}

		Message::FutureSwap { owner, ordinal, source_token, source_amount, destination_token } => {
			if !authorizer.is_input_owner(&owner) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			let attrs = pallet_attributes::AttributeStore::new(attrs_store);
			if !attrs.get_bool("v0/params/dfip2203/active") {
				return Err(ApplierError::Futures(pallet_futures::FuturesError::NotActive));
			}
			let mut futures = pallet_futures::FuturesEngine::new(futures_store);
			match destination_token {
				Some(destination) => {
					futures.submit_token_future(height, owner, ordinal, source_token, source_amount, destination, &mut balances)?;
				}
				None => {
					futures.submit_dusd_future(height, owner, ordinal, source_amount, &mut balances)?;
				}
			}
		}

		Message::FutureSwapRefund { owner, ordinal, entry_height, is_dusd } => {
			if !authorizer.is_input_owner(&owner) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			let mut futures = pallet_futures::FuturesEngine::new(futures_store);
			if is_dusd {
				futures.cancel_dusd_future(entry_height, owner, ordinal, &mut balances)?;
			} else {
				futures.cancel_token_future(entry_height, owner, ordinal, &mut balances)?;
			}
		}

		Message::IcxCreateOrder { id, is_external, id_token, chain, owner_address, amount_from, order_price, expiry } => {
			if !authorizer.is_input_owner(&owner_address) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			let order_type = if is_external { pallet_icx::OrderType::External } else { pallet_icx::OrderType::Internal };
			let expiry = if expiry == 0 { pallet_icx::DEFAULT_ORDER_EXPIRY } else { expiry };
			pallet_icx::IcxEngine::new(icx_store)
				.create_order(id, order_type, id_token, chain, owner_address, amount_from, order_price, height, expiry, &mut balances)?;
		}

		Message::IcxMakeOffer { id, order_tx, amount, owner_address, receive_destination, expiry } => {
			if !authorizer.is_input_owner(&owner_address) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			let attrs = pallet_attributes::AttributeStore::new(attrs_store);
			let expiry = if expiry == 0 { pallet_icx::DEFAULT_OFFER_EXPIRY } else { expiry };
			pallet_icx::IcxEngine::new(icx_store)
				.make_offer(id, order_tx, amount, owner_address, receive_destination, height, expiry, &attrs, &mut balances)?;
		}

		Message::IcxSubmitDfcHtlc { id, offer_tx, amount, receive_address, receive_pubkey, hash, timeout } => {
			pallet_icx::IcxEngine::new(icx_store)
				.submit_dfc_htlc(id, offer_tx, amount, receive_address, receive_pubkey, hash, timeout, height)?;
		}

		Message::IcxSubmitExtHtlc { id, offer_tx, amount, receive_address, hash, htlc_script_address, owner_pubkey, timeout } => {
			pallet_icx::IcxEngine::new(icx_store)
				.submit_ext_htlc(id, offer_tx, amount, receive_address, hash, htlc_script_address, owner_pubkey, timeout, height)?;
		}

		Message::IcxClaimDfcHtlc { htlc_id, seed } => {
			pallet_icx::IcxEngine::new(icx_store).claim_dfc_htlc(&htlc_id, &seed, &mut balances, tokens_store)?;
		}

		Message::IcxCloseOrder { id, close_tx } => {
			let order = pallet_icx::IcxEngine::new(icx_store).get_order(&id).ok_or(pallet_icx::IcxError::OrderNotFound)?;
			if !authorizer.is_input_owner(&order.owner_address) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			pallet_icx::IcxEngine::new(icx_store).close_order(&id, close_tx, height, &mut balances)?;
		}

		Message::IcxCloseOffer { id } => {
			let offer = pallet_icx::IcxEngine::new(icx_store).get_offer(&id).ok_or(pallet_icx::IcxError::OfferNotFound)?;
			if !authorizer.is_input_owner(&offer.owner_address) {
				return Err(ApplierError::Wire(PipelineError::NotAuthorized));
			}
			pallet_icx::IcxEngine::new(icx_store).close_offer(&id, &mut balances)?;
		}
	}

	Ok(tx_type)
}

pub(crate) fn loan_minting_interest<A: core_traits::AttributeApi>(attrs: &A, token: core_primitives::TokenId) -> i64 {
	percentage_attribute(attrs, &format!("v0/token/{token}/loan_minting_interest"))
}

/// §4.F "Auction batching": the minimum percentage a new bid must clear the
/// prior one by. Defaults to zero (any strictly higher bid clears) when
/// governance hasn't set `v0/params/auction/min_increment_pct`.
fn auction_min_increment_pct<A: core_traits::AttributeApi>(attrs: &A) -> i64 {
	percentage_attribute(attrs, "v0/params/auction/min_increment_pct")
}

pub(crate) fn percentage_attribute<A: core_traits::AttributeApi>(attrs: &A, path: &str) -> i64 {
	attrs
		.get_raw(path)
		.and_then(|raw| serde_json::from_slice::<pallet_attributes::AttributeValue>(&raw).ok())
		.and_then(|value| match value {
			pallet_attributes::AttributeValue::Percentage(pct) => Some(pct),
			_ => None,
		})
		.unwrap_or(0)
}

/// Fans a [`pallet_attributes::AttributeEffect`] out to the subsystem it
/// names (§4.E "Apply performs cross-subsystem effects"). `SplitScheduled`
/// is queued rather than dispatched immediately: the split itself runs at
/// `activation_height`, in `process_token_splits` (§4.I step 9).
pub(crate) fn dispatch_attribute_effect<STk, SOrc, SAttr>(
	effect: Option<pallet_attributes::AttributeEffect>,
	tokens_store: &mut STk,
	oracle_store: &mut SOrc,
	attrs_store: &mut SAttr,
) where
	STk: KvRead + KvWrite + ?Sized,
	SOrc: KvRead + KvWrite + ?Sized,
	SAttr: KvRead + KvWrite + ?Sized,
{
	use pallet_attributes::AttributeEffect;
	match effect {
		// `Pool.commission`/`Pool.reward_pct` are plain fields read by
		// `swap`/`distribute_reward` at use time, not re-read from the
		// attribute store; the write has to land on the pool row itself.
		// The pool model keeps a single symmetric commission rather than
		// separate per-side rates, so either `PoolFeeSide` sets the same
		// field.
		Some(AttributeEffect::PoolFeeChanged { lp_token, fee_pct, .. }) => {
			let mut pools = pallet_tokens::Pools::new(tokens_store);
			if let Some(mut pool) = pools.get_pool(lp_token) {
				pool.commission = fee_pct;
				pools.put_pool(lp_token, &pool);
			}
		}
		Some(AttributeEffect::PoolRewardPctChanged { lp_token, reward_pct }) => {
			let mut pools = pallet_tokens::Pools::new(tokens_store);
			if let Some(mut pool) = pools.get_pool(lp_token) {
				pool.reward_pct = reward_pct;
				pools.put_pool(lp_token, &pool);
			}
		}
		Some(AttributeEffect::OracleFeedLinked { pair, .. }) => {
			pallet_oracle::Oracle::new(oracle_store).register_pair(&pair, core_primitives::CENT);
		}
		Some(AttributeEffect::SplitScheduled { activation_height, token_id, multiplier_pct }) => {
			crate::gov_queue::GovQueue::new(attrs_store).queue_split(activation_height, token_id, multiplier_pct);
		}
		Some(AttributeEffect::Dfip2203Disabled { .. })
		| Some(AttributeEffect::LoanMintingInterestChanged { .. })
		| Some(AttributeEffect::LoanCollateralFactorChanged { .. })
		| None => {
			let _ = tokens_store;
		}
	}
}

//! The custom transaction catalog (§4.J, §6.3): the `CustomTxType` tag a
//! payload's second byte carries, and the decoded [`Message`] each type
//! produces for [`crate::applier::apply_transaction`] to dispatch.
//!
//! Type bytes below are this crate's own assignment (ASCII letters, in
//! catalog order); no original byte table survived the distillation that
//! produced the specification, which is explicit that an implementation
//! should pick a self-consistent scheme and validate against its own test
//! vectors rather than guess at upstream magic numbers.

use core_primitives::{Amount, Height, Script, TokenId, TxHash};

use crate::error::PipelineError;
use crate::wire::Reader;

macro_rules! custom_tx_types {
	($($variant:ident = $byte:expr),+ $(,)?) => {
		#[derive(Clone, Copy, Debug, PartialEq, Eq)]
		pub enum CustomTxType {
			$($variant),+
		}

		impl CustomTxType {
			pub fn from_byte(byte: u8) -> Option<Self> {
				match byte {
					$($byte => Some(CustomTxType::$variant),)+
					_ => None,
				}
			}

			pub fn to_byte(self) -> u8 {
				match self {
					$(CustomTxType::$variant => $byte,)+
				}
			}
		}
	};
}

custom_tx_types! {
	CreateMasternode = b'M',
	ResignMasternode = b'm',
	CreateToken = b'T',
	UpdateToken = b't',
	MintToken = b'N',
	BurnToken = b'n',
	CreatePoolPair = b'p',
	UpdatePoolPair = b'u',
	PoolSwap = b's',
	PoolSwapV2 = b'i',
	AddPoolLiquidity = b'l',
	RemovePoolLiquidity = b'r',
	UtxosToAccount = b'U',
	AccountToUtxos = b'b',
	AccountToAccount = b'B',
	AnyAccountsToAccounts = b'a',
	SetGovVariable = b'G',
	SetGovVariableHeight = b'j',
	CreateVault = b'V',
	CloseVault = b'e',
	UpdateVault = b'v',
	DepositToVault = b'D',
	WithdrawFromVault = b'J',
	PaybackLoan = b'H',
	PaybackLoanV2 = b'k',
	TakeLoan = b'X',
	AuctionBid = b'I',
	FutureSwap = b'Q',
	FutureSwapRefund = b'q',
	TransferDomain = b'w',
	ICXCreateOrder = b'1',
	ICXMakeOffer = b'2',
	ICXSubmitDFCHTLC = b'3',
	ICXSubmitEXTHTLC = b'4',
	ICXClaimDFCHTLC = b'5',
	ICXCloseOrder = b'6',
	ICXCloseOffer = b'7',
	TokenSplit = b'P',
	TokenLockRelease = b'L',
	ProposalFeeRedistribution = b'Z',
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenFlagsWire {
	pub dat: bool,
	pub tradeable: bool,
	pub mintable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccountLeg {
	pub owner: Script,
	pub token: TokenId,
	pub amount: Amount,
}

/// One decoded custom transaction, ready for `apply_transaction` to
/// dispatch. Variants line up with the component this crate built
/// (B/C/D/E/F/G/H/I); [`Message::Unsupported`] carries every catalog entry
/// that names an out-of-scope collaborator (the masternode registry, the
/// EVM bridge, proposal tallying) or a direct-tx duplicate of a path the
/// governance/split machinery already covers.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
	CreateToken { symbol: String, name: String, flags: TokenFlagsWire },
	UpdateToken { token: TokenId, symbol: Option<String>, name: Option<String>, tradeable: Option<bool>, mintable: Option<bool> },
	MintToken { token: TokenId, amount: Amount, to: Script },
	BurnToken { token: TokenId, amount: Amount, from: Script },
	CreatePoolPair { token_a: TokenId, token_b: TokenId, commission: i64, reward_pct: i64 },
	PoolSwap { from: Script, from_token: TokenId, from_amount: Amount, to: Script, to_token: TokenId },
	AddPoolLiquidity { lp_token: TokenId, provider: Script, token_a: TokenId, amount_a: Amount, token_b: TokenId, amount_b: Amount },
	RemovePoolLiquidity { lp_token: TokenId, provider: Script, amount: u128 },
	UtxosToAccount { to: Script, token: TokenId, amount: Amount },
	AccountToUtxos { from: Script, token: TokenId, amount: Amount },
	AccountToAccount { from: Script, to: Script, token: TokenId, amount: Amount },
	AnyAccountsToAccounts { from: Vec<AccountLeg>, to: Vec<AccountLeg> },
	SetGovVariable { path: String, raw: String },
	SetGovVariableHeight { path: String, raw: String, activation_height: Height },
	CreateVault { vault_id: TxHash, owner: Script, scheme_id: String },
	DepositToVault { vault_id: TxHash, from: Script, token: TokenId, amount: Amount },
	WithdrawFromVault { vault_id: TxHash, to: Script, token: TokenId, amount: Amount },
	TakeLoan { vault_id: TxHash, loans: Vec<(TokenId, Amount)> },
	PaybackLoan { vault_id: TxHash, payments: Vec<(TokenId, Amount)> },
	AuctionBid { vault_id: TxHash, batch_index: u32, bidder: Script, bid: Amount },
	FutureSwap { owner: Script, ordinal: u32, source_token: TokenId, source_amount: Amount, destination_token: Option<TokenId> },
	FutureSwapRefund { owner: Script, ordinal: u32, entry_height: Height, is_dusd: bool },
	IcxCreateOrder {
		id: TxHash,
		is_external: bool,
		id_token: TokenId,
		chain: String,
		owner_address: Script,
		amount_from: Amount,
		order_price: Amount,
		expiry: u32,
	},
	IcxMakeOffer {
		id: TxHash,
		order_tx: TxHash,
		amount: Amount,
		owner_address: Script,
		receive_destination: Vec<u8>,
		expiry: u32,
	},
	IcxSubmitDfcHtlc {
		id: TxHash,
		offer_tx: TxHash,
		amount: Amount,
		receive_address: Script,
		receive_pubkey: Option<Vec<u8>>,
		hash: TxHash,
		timeout: u32,
	},
	IcxSubmitExtHtlc {
		id: TxHash,
		offer_tx: TxHash,
		amount: Amount,
		receive_address: Script,
		hash: TxHash,
		htlc_script_address: String,
		owner_pubkey: Vec<u8>,
		timeout: u32,
	},
	IcxClaimDfcHtlc { htlc_id: TxHash, seed: Vec<u8> },
	IcxCloseOrder { id: TxHash, close_tx: TxHash },
	IcxCloseOffer { id: TxHash },
	Unsupported(CustomTxType),
}

/// Decodes the payload body (everything after the marker and type byte)
/// into a [`Message`]. `height` is the enclosing transaction's block
/// height, needed only to fill `creation_height`-style fields the pallet
/// engines record.
pub fn decode_message(tx_type: CustomTxType, mut r: Reader<'_>, height: Height) -> Result<Message, PipelineError> {
	use CustomTxType::*;
	let r = &mut r;
	let msg = match tx_type {
		CreateToken => {
			let symbol = r.string()?;
			let name = r.string()?;
			let dat = r.bool()?;
			let tradeable = r.bool()?;
			let mintable = r.bool()?;
			Message::CreateToken { symbol, name, flags: TokenFlagsWire { dat, tradeable, mintable } }
		}
		UpdateToken => {
			let token = r.token_id()?;
			let symbol = r.bool()?.then(|| r.string()).transpose()?;
			let name = r.bool()?.then(|| r.string()).transpose()?;
			let tradeable = r.bool()?.then(|| r.bool()).transpose()?;
			let mintable = r.bool()?.then(|| r.bool()).transpose()?;
			Message::UpdateToken { token, symbol, name, tradeable, mintable }
		}
		MintToken => Message::MintToken { token: r.token_id()?, amount: r.amount()?, to: r.script()? },
		BurnToken => Message::BurnToken { token: r.token_id()?, amount: r.amount()?, from: r.script()? },
		CreatePoolPair => Message::CreatePoolPair {
			token_a: r.token_id()?,
			token_b: r.token_id()?,
			commission: r.i64()?,
			reward_pct: r.i64()?,
		},
		PoolSwap | PoolSwapV2 => {
			let from = r.script()?;
			let from_token = r.token_id()?;
			let from_amount = r.amount()?;
			let to = r.script()?;
			let to_token = r.token_id()?;
			if tx_type == PoolSwapV2 {
				// Composite-swap route hint: a list of intermediate pool ids.
				// Direct two-pool routing only is implemented (§ non-goals);
				// the hint is decoded so the payload is consumed exactly,
				// but otherwise ignored.
				let hops = r.u32()?;
				for _ in 0..hops {
					let _ = r.token_id()?;
				}
			}
			Message::PoolSwap { from, from_token, from_amount, to, to_token }
		}
		AddPoolLiquidity => Message::AddPoolLiquidity {
			lp_token: r.token_id()?,
			provider: r.script()?,
			token_a: r.token_id()?,
			amount_a: r.amount()?,
			token_b: r.token_id()?,
			amount_b: r.amount()?,
		},
		RemovePoolLiquidity => {
			let lp_token = r.token_id()?;
			let provider = r.script()?;
			let amount = r.i64()? as u128;
			Message::RemovePoolLiquidity { lp_token, provider, amount }
		}
		UtxosToAccount => Message::UtxosToAccount { to: r.script()?, token: r.token_id()?, amount: r.amount()? },
		AccountToUtxos => Message::AccountToUtxos { from: r.script()?, token: r.token_id()?, amount: r.amount()? },
		AccountToAccount => {
			Message::AccountToAccount { from: r.script()?, to: r.script()?, token: r.token_id()?, amount: r.amount()? }
		}
		AnyAccountsToAccounts => {
			let from = read_legs(r)?;
			let to = read_legs(r)?;
			Message::AnyAccountsToAccounts { from, to }
		}
		SetGovVariable => Message::SetGovVariable { path: r.string()?, raw: r.string()? },
		SetGovVariableHeight => {
			let path = r.string()?;
			let raw = r.string()?;
			let activation_height = r.u32()?;
			Message::SetGovVariableHeight { path, raw, activation_height }
		}
		CreateVault => Message::CreateVault { vault_id: r.tx_hash()?, owner: r.script()?, scheme_id: r.string()? },
		DepositToVault => {
			Message::DepositToVault { vault_id: r.tx_hash()?, from: r.script()?, token: r.token_id()?, amount: r.amount()? }
		}
		WithdrawFromVault => {
			Message::WithdrawFromVault { vault_id: r.tx_hash()?, to: r.script()?, token: r.token_id()?, amount: r.amount()? }
		}
		TakeLoan => {
			let vault_id = r.tx_hash()?;
			let loans = read_amount_list(r)?;
			Message::TakeLoan { vault_id, loans }
		}
		PaybackLoan | PaybackLoanV2 => {
			let vault_id = r.tx_hash()?;
			let payments = read_amount_list(r)?;
			Message::PaybackLoan { vault_id, payments }
		}
		AuctionBid => Message::AuctionBid {
			vault_id: r.tx_hash()?,
			batch_index: r.u32()?,
			bidder: r.script()?,
			bid: r.amount()?,
		},
		FutureSwap => {
			let owner = r.script()?;
			let ordinal = r.u32()?;
			let source_token = r.token_id()?;
			let source_amount = r.amount()?;
			let destination_token = r.bool()?.then(|| r.token_id()).transpose()?;
			Message::FutureSwap { owner, ordinal, source_token, source_amount, destination_token }
		}
		FutureSwapRefund => {
			let owner = r.script()?;
			let ordinal = r.u32()?;
			let entry_height = r.u32()?;
			let is_dusd = r.bool()?;
			Message::FutureSwapRefund { owner, ordinal, entry_height, is_dusd }
		}
		ICXCreateOrder => Message::IcxCreateOrder {
			id: r.tx_hash()?,
			is_external: r.bool()?,
			id_token: r.token_id()?,
			chain: r.string()?,
			owner_address: r.script()?,
			amount_from: r.amount()?,
			order_price: r.amount()?,
			expiry: r.u32()?,
		},
		ICXMakeOffer => Message::IcxMakeOffer {
			id: r.tx_hash()?,
			order_tx: r.tx_hash()?,
			amount: r.amount()?,
			owner_address: r.script()?,
			receive_destination: r.var_bytes()?,
			expiry: r.u32()?,
		},
		ICXSubmitDFCHTLC => Message::IcxSubmitDfcHtlc {
			id: r.tx_hash()?,
			offer_tx: r.tx_hash()?,
			amount: r.amount()?,
			receive_address: r.script()?,
			receive_pubkey: r.opt_bytes()?,
			hash: r.tx_hash()?,
			timeout: r.u32()?,
		},
		ICXSubmitEXTHTLC => Message::IcxSubmitExtHtlc {
			id: r.tx_hash()?,
			offer_tx: r.tx_hash()?,
			amount: r.amount()?,
			receive_address: r.script()?,
			hash: r.tx_hash()?,
			htlc_script_address: r.string()?,
			owner_pubkey: r.var_bytes()?,
			timeout: r.u32()?,
		},
		ICXClaimDFCHTLC => Message::IcxClaimDfcHtlc { htlc_id: r.tx_hash()?, seed: r.var_bytes()? },
		ICXCloseOrder => Message::IcxCloseOrder { id: r.tx_hash()?, close_tx: r.tx_hash()? },
		ICXCloseOffer => Message::IcxCloseOffer { id: r.tx_hash()? },
		other @ (CreateMasternode | ResignMasternode | UpdatePoolPair | TransferDomain | TokenSplit
		| TokenLockRelease | ProposalFeeRedistribution | CloseVault | UpdateVault) => {
			let _ = height;
			return Ok(Message::Unsupported(other));
		}
	};
	r.finish()?;
	Ok(msg)
}

fn read_legs(r: &mut Reader<'_>) -> Result<Vec<AccountLeg>, PipelineError> {
	let count = r.u32()?;
	let mut legs = Vec::with_capacity(count as usize);
	for _ in 0..count {
		legs.push(AccountLeg { owner: r.script()?, token: r.token_id()?, amount: r.amount()? });
	}
	Ok(legs)
}

fn read_amount_list(r: &mut Reader<'_>) -> Result<Vec<(TokenId, Amount)>, PipelineError> {
	let count = r.u32()?;
	let mut list = Vec::with_capacity(count as usize);
	for _ in 0..count {
		list.push((r.token_id()?, r.amount()?));
	}
	Ok(list)
}

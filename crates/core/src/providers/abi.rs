//! Minimal ABI codec for the ERC-4626 vault, its ERC-20 asset and the faucet token.
//!
//! Only the handful of static signatures the engine uses are supported:
//! 32-byte words for `uint256`/`address` and one dynamic `string` return.

use primitive_types::U256;
use sha3::{Digest, Keccak256};

use crate::errors::CoreError;
use crate::models::chain::{Address, CallValue, LogEntry, TxHash, ViewCall, WriteCall};
use crate::models::event::EventKind;

const WORD: usize = 32;

pub const DEPOSIT_EVENT: &str = "Deposit(address,address,uint256,uint256)";
pub const WITHDRAW_EVENT: &str = "Withdraw(address,address,address,uint256,uint256)";

fn keccak(text: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(text.as_bytes()));
    out
}

/// First four bytes of the keccak hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak(signature);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `topic0` of an event kind, `0x`-prefixed.
pub fn event_topic(kind: EventKind) -> String {
    let signature = match kind {
        EventKind::Inflow => DEPOSIT_EVENT,
        EventKind::Outflow => WITHDRAW_EVENT,
    };
    format!("0x{}", hex::encode(keccak(signature)))
}

fn uint_word(value: U256) -> String {
    let mut buf = [0u8; WORD];
    value.to_big_endian(&mut buf);
    hex::encode(buf)
}

fn address_word(address: &Address) -> String {
    format!("{:0>64}", address.hex_digits())
}

fn calldata(signature: &str, words: &[String]) -> String {
    let mut out = format!("0x{}", hex::encode(selector(signature)));
    for word in words {
        out.push_str(word);
    }
    out
}

pub fn encode_view(call: &ViewCall) -> String {
    match call {
        ViewCall::Asset => calldata("asset()", &[]),
        ViewCall::TotalAssets => calldata("totalAssets()", &[]),
        ViewCall::TotalSupply => calldata("totalSupply()", &[]),
        ViewCall::ConvertToAssets(shares) => calldata("convertToAssets(uint256)", &[uint_word(*shares)]),
        ViewCall::ConvertToShares(assets) => calldata("convertToShares(uint256)", &[uint_word(*assets)]),
        ViewCall::BalanceOf(account) => calldata("balanceOf(address)", &[address_word(account)]),
        ViewCall::Allowance { owner, spender } => calldata(
            "allowance(address,address)",
            &[address_word(owner), address_word(spender)],
        ),
        ViewCall::MaxWithdraw(owner) => calldata("maxWithdraw(address)", &[address_word(owner)]),
        ViewCall::Decimals => calldata("decimals()", &[]),
        ViewCall::Symbol => calldata("symbol()", &[]),
        ViewCall::PreviewDeposit(assets) => calldata("previewDeposit(uint256)", &[uint_word(*assets)]),
        ViewCall::PreviewRedeem(shares) => calldata("previewRedeem(uint256)", &[uint_word(*shares)]),
        ViewCall::PreviewWithdraw(assets) => calldata("previewWithdraw(uint256)", &[uint_word(*assets)]),
        ViewCall::RemainingCooldown(account) => {
            calldata("remainingCooldown(address)", &[address_word(account)])
        }
    }
}

pub fn encode_write(call: &WriteCall) -> String {
    match call {
        WriteCall::Approve { spender, amount } => calldata(
            "approve(address,uint256)",
            &[address_word(spender), uint_word(*amount)],
        ),
        WriteCall::Deposit { assets, receiver } => calldata(
            "deposit(uint256,address)",
            &[uint_word(*assets), address_word(receiver)],
        ),
        WriteCall::Withdraw {
            assets,
            receiver,
            owner,
        } => calldata(
            "withdraw(uint256,address,address)",
            &[uint_word(*assets), address_word(receiver), address_word(owner)],
        ),
        WriteCall::MintFaucet => calldata("mintFaucet()", &[]),
    }
}

pub fn decode_hex(data: &str) -> Result<Vec<u8>, CoreError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    Ok(hex::decode(digits)?)
}

fn word_at(bytes: &[u8], index: usize) -> Result<&[u8], CoreError> {
    let start = index * WORD;
    bytes
        .get(start..start + WORD)
        .ok_or_else(|| CoreError::Decode(format!("return data too short for word {index}")))
}

fn decode_uint(word: &[u8]) -> U256 {
    U256::from_big_endian(word)
}

fn decode_address(word: &[u8]) -> Result<Address, CoreError> {
    format!("0x{}", hex::encode(&word[WORD - 20..])).parse()
}

/// ABI `string`, falling back to a NUL-padded `bytes32` for old tokens.
fn decode_string(bytes: &[u8]) -> Result<String, CoreError> {
    if bytes.len() == WORD {
        let trimmed: Vec<u8> = bytes.iter().copied().take_while(|b| *b != 0).collect();
        return Ok(String::from_utf8_lossy(&trimmed).into_owned());
    }
    let offset = decode_uint(word_at(bytes, 0)?);
    if offset > U256::from(bytes.len()) {
        return Err(CoreError::Decode("string offset out of range".into()));
    }
    let offset = offset.low_u64() as usize;
    let len_word = bytes
        .get(offset..offset + WORD)
        .ok_or_else(|| CoreError::Decode("string length missing".into()))?;
    let len = decode_uint(len_word);
    if len > U256::from(bytes.len()) {
        return Err(CoreError::Decode("string length out of range".into()));
    }
    let start = offset + WORD;
    let body = bytes
        .get(start..start + len.low_u64() as usize)
        .ok_or_else(|| CoreError::Decode("string body truncated".into()))?;
    Ok(String::from_utf8_lossy(body).into_owned())
}

/// Decode the return data of `call`.
pub fn decode_return(call: &ViewCall, data: &str) -> Result<CallValue, CoreError> {
    let bytes = decode_hex(data)?;
    if bytes.is_empty() {
        return Err(CoreError::Decode(format!(
            "{} returned no data (not a contract, or call reverted)",
            call.name()
        )));
    }
    match call {
        ViewCall::Asset => Ok(CallValue::Address(decode_address(word_at(&bytes, 0)?)?)),
        ViewCall::Symbol => Ok(CallValue::Text(decode_string(&bytes)?)),
        _ => Ok(CallValue::Uint(decode_uint(word_at(&bytes, 0)?))),
    }
}

/// Decode a raw log into a [`LogEntry`].
///
/// Deposit: topics `[sig, caller, owner]`; Withdraw: `[sig, caller, receiver, owner]`.
/// Data is `(assets, shares)` for both.
pub fn decode_log(
    address: &str,
    topics: &[String],
    data: &str,
    transaction_hash: Option<&str>,
    block_number: Option<u64>,
    log_index: Option<u64>,
) -> Result<LogEntry, CoreError> {
    let topic0 = topics
        .first()
        .ok_or_else(|| CoreError::Decode("log without topics".into()))?
        .to_ascii_lowercase();
    let kind = EventKind::ALL
        .into_iter()
        .find(|k| event_topic(*k) == topic0)
        .ok_or_else(|| CoreError::Decode(format!("unknown event topic {topic0}")))?;

    let topic_address = |index: usize| -> Result<Address, CoreError> {
        let topic = topics
            .get(index)
            .ok_or_else(|| CoreError::Decode(format!("{kind} log missing topic {index}")))?;
        let bytes = decode_hex(topic)?;
        if bytes.len() != WORD {
            return Err(CoreError::Decode(format!("topic {index} is not 32 bytes")));
        }
        decode_address(&bytes)
    };

    let (initiator, owner, beneficiary) = match kind {
        EventKind::Inflow => (topic_address(1)?, topic_address(2)?, None),
        EventKind::Outflow => (topic_address(1)?, topic_address(3)?, Some(topic_address(2)?)),
    };

    let body = decode_hex(data)?;
    Ok(LogEntry {
        address: address.parse()?,
        kind,
        initiator,
        owner,
        beneficiary,
        asset_amount: decode_uint(word_at(&body, 0)?),
        share_amount: decode_uint(word_at(&body, 1)?),
        transaction_id: TxHash(transaction_hash.unwrap_or_default().to_string()),
        block_height: block_number,
        log_position: log_index,
    })
}

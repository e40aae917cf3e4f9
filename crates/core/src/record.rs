//! Decoding of `block_stats` rows.
//!
//! Rows are stored the way the node reports them: every numeric field except the block number
//! and timestamp is a `0x`-prefixed hex quantity. Gas and transaction counters must fit in a
//! `u64`; fee and value fields are unbounded.

use num_bigint::BigUint;
use strum::Display;
use thiserror::Error;

/// Hex-encoded columns of a `block_stats` row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BlockField {
    BaseFee,
    Burned,
    GasTarget,
    GasUsed,
    PriorityFee,
    Rewards,
    Tips,
    Transactions,
    Type2Transactions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("empty hex string")]
    Empty,

    #[error("hex string without 0x prefix")]
    MissingPrefix,

    #[error("hex string \"0x\"")]
    NoDigits,

    #[error("hex number with leading zero digits")]
    LeadingZero,

    #[error("invalid hex string")]
    InvalidDigit,

    #[error("hex number > 64 bits")]
    Overflow,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("block {block_number}: couldn't decode {field}: {kind}")]
pub struct DecodeError {
    pub block_number: u64,
    pub field: BlockField,
    pub kind: DecodeErrorKind,
}

/// A `block_stats` row as it is persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawBlockStats {
    pub number: u64,
    pub timestamp: u64,
    pub base_fee: String,
    pub burned: String,
    pub gas_target: String,
    pub gas_used: String,
    pub priority_fee: String,
    pub rewards: String,
    pub tips: String,
    pub transactions: String,
    pub type2_transactions: String,
}

/// A decoded block. Monetary values are in wei.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRecord {
    pub number: u64,
    pub timestamp: u64,
    pub base_fee: BigUint,
    pub burned: BigUint,
    pub gas_target: u64,
    pub gas_used: u64,
    pub priority_fee: BigUint,
    pub rewards: BigUint,
    pub tips: BigUint,
    pub transactions: u64,
    pub type2_transactions: u64,
}

impl BlockRecord {
    /// Gas used as a percentage of the block gas limit (twice the target).
    pub fn utilization_percent(&self) -> f64 {
        utilization_percent(self.gas_used, self.gas_target)
    }
}

pub fn utilization_percent(gas_used: u64, gas_target: u64) -> f64 {
    if gas_target == 0 {
        return 0.0;
    }
    gas_used as f64 / (gas_target as f64 * 2.0) * 100.0
}

impl RawBlockStats {
    pub fn decode(&self) -> Result<BlockRecord, DecodeError> {
        let big = |field: BlockField, input: &str| {
            decode_big(input).map_err(|kind| self.decode_error(field, kind))
        };
        let small = |field: BlockField, input: &str| {
            decode_u64(input).map_err(|kind| self.decode_error(field, kind))
        };

        Ok(BlockRecord {
            number: self.number,
            timestamp: self.timestamp,
            base_fee: big(BlockField::BaseFee, &self.base_fee)?,
            burned: big(BlockField::Burned, &self.burned)?,
            gas_target: small(BlockField::GasTarget, &self.gas_target)?,
            gas_used: small(BlockField::GasUsed, &self.gas_used)?,
            priority_fee: big(BlockField::PriorityFee, &self.priority_fee)?,
            rewards: big(BlockField::Rewards, &self.rewards)?,
            tips: big(BlockField::Tips, &self.tips)?,
            transactions: small(BlockField::Transactions, &self.transactions)?,
            type2_transactions: small(BlockField::Type2Transactions, &self.type2_transactions)?,
        })
    }

    fn decode_error(&self, field: BlockField, kind: DecodeErrorKind) -> DecodeError {
        DecodeError {
            block_number: self.number,
            field,
            kind,
        }
    }
}

impl TryFrom<&RawBlockStats> for BlockRecord {
    type Error = DecodeError;

    fn try_from(raw: &RawBlockStats) -> Result<Self, Self::Error> {
        raw.decode()
    }
}

impl From<&BlockRecord> for RawBlockStats {
    fn from(record: &BlockRecord) -> Self {
        Self {
            number: record.number,
            timestamp: record.timestamp,
            base_fee: format!("{:#x}", record.base_fee),
            burned: format!("{:#x}", record.burned),
            gas_target: format!("{:#x}", record.gas_target),
            gas_used: format!("{:#x}", record.gas_used),
            priority_fee: format!("{:#x}", record.priority_fee),
            rewards: format!("{:#x}", record.rewards),
            tips: format!("{:#x}", record.tips),
            transactions: format!("{:#x}", record.transactions),
            type2_transactions: format!("{:#x}", record.type2_transactions),
        }
    }
}

fn hex_digits(input: &str) -> Result<&str, DecodeErrorKind> {
    if input.is_empty() {
        return Err(DecodeErrorKind::Empty);
    }
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or(DecodeErrorKind::MissingPrefix)?;
    if digits.is_empty() {
        return Err(DecodeErrorKind::NoDigits);
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(DecodeErrorKind::LeadingZero);
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeErrorKind::InvalidDigit);
    }
    Ok(digits)
}

/// Decodes an unbounded hex quantity.
pub fn decode_big(input: &str) -> Result<BigUint, DecodeErrorKind> {
    let digits = hex_digits(input)?;
    BigUint::parse_bytes(digits.as_bytes(), 16).ok_or(DecodeErrorKind::InvalidDigit)
}

/// Decodes a hex quantity that must fit in 64 bits.
pub fn decode_u64(input: &str) -> Result<u64, DecodeErrorKind> {
    let digits = hex_digits(input)?;
    if digits.len() > 16 {
        return Err(DecodeErrorKind::Overflow);
    }
    u64::from_str_radix(digits, 16).map_err(|_| DecodeErrorKind::InvalidDigit)
}

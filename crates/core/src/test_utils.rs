//! Builders for synthetic blocks, shared by the test suites of every crate in the workspace.

use crate::record::{BlockRecord, RawBlockStats};
use num_bigint::BigUint;

pub const TEST_GAS_TARGET: u64 = 15_000_000;

pub struct BlockBuilder {
    record: BlockRecord,
}

impl BlockBuilder {
    /// A 12-second-slot block with the mainnet gas target and no fees or transactions.
    pub fn new(number: u64) -> Self {
        Self {
            record: BlockRecord {
                number,
                timestamp: 1_600_000_000 + number * 12,
                base_fee: BigUint::default(),
                burned: BigUint::default(),
                gas_target: TEST_GAS_TARGET,
                gas_used: 0,
                priority_fee: BigUint::default(),
                rewards: BigUint::default(),
                tips: BigUint::default(),
                transactions: 0,
                type2_transactions: 0,
            },
        }
    }

    /// Sets gas used so that the block is `percent` full.
    pub fn utilization(mut self, percent: u64) -> Self {
        self.record.gas_used = self.record.gas_target * 2 * percent / 100;
        self
    }

    pub fn gas(mut self, gas_used: u64, gas_target: u64) -> Self {
        self.record.gas_used = gas_used;
        self.record.gas_target = gas_target;
        self
    }

    pub fn fees(mut self, base_fee: u64, priority_fee: u64) -> Self {
        self.record.base_fee = base_fee.into();
        self.record.priority_fee = priority_fee.into();
        self
    }

    pub fn burned(mut self, burned: impl Into<BigUint>) -> Self {
        self.record.burned = burned.into();
        self
    }

    pub fn rewards(mut self, rewards: impl Into<BigUint>) -> Self {
        self.record.rewards = rewards.into();
        self
    }

    pub fn tips(mut self, tips: impl Into<BigUint>) -> Self {
        self.record.tips = tips.into();
        self
    }

    pub fn txs(mut self, transactions: u64, type2_transactions: u64) -> Self {
        self.record.transactions = transactions;
        self.record.type2_transactions = type2_transactions;
        self
    }

    pub fn build(self) -> BlockRecord {
        self.record
    }

    pub fn raw(self) -> RawBlockStats {
        RawBlockStats::from(&self.record)
    }
}

/// Blocks numbered from `first`, one per utilization value.
pub fn blocks_with_utilization(first: u64, utilization: &[u64]) -> Vec<BlockRecord> {
    utilization
        .iter()
        .enumerate()
        .map(|(i, percent)| {
            let number = first + i as u64;
            BlockBuilder::new(number)
                .utilization(*percent)
                .fees(number * 1_000_000_000, 2_000_000_000)
                .burned(number * 10_000_000_000_000_000)
                .rewards(2_000_000_000_000_000_000u64)
                .tips(number * 1_000_000_000_000_000)
                .txs(100 + number, 50)
                .build()
        })
        .collect()
}

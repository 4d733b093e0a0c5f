//! JSON rendering of chain values for socket clients.
//!
//! Game clients parse numbers as doubles, so every chain integer is
//! emitted as a base-10 string, no matter how deeply it is nested.
//! Addresses are checksummed, hashes and byte strings are 0x-hex.

use alloy::primitives::{Address, Bytes, Log, B256, U256};
use serde_json::{json, Value};

use crate::blockchain::types::ChainReceipt;

/// Conversion into a client-safe JSON value.
pub trait Normalize {
    fn normalize(&self) -> Value;
}

impl Normalize for U256 {
    fn normalize(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Normalize for u128 {
    fn normalize(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Normalize for u64 {
    fn normalize(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Normalize for bool {
    fn normalize(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Normalize for String {
    fn normalize(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Normalize for Address {
    fn normalize(&self) -> Value {
        Value::String(self.to_checksum(None))
    }
}

impl Normalize for B256 {
    fn normalize(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Normalize for Bytes {
    fn normalize(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: Normalize> Normalize for [T] {
    fn normalize(&self) -> Value {
        Value::Array(self.iter().map(Normalize::normalize).collect())
    }
}

impl<T: Normalize> Normalize for Vec<T> {
    fn normalize(&self) -> Value {
        self.as_slice().normalize()
    }
}

impl<T: Normalize> Normalize for Option<T> {
    fn normalize(&self) -> Value {
        self.as_ref().map_or(Value::Null, Normalize::normalize)
    }
}

impl Normalize for Log {
    fn normalize(&self) -> Value {
        json!({
            "address": self.address.normalize(),
            "topics": self.data.topics().normalize(),
            "data": self.data.data.normalize(),
        })
    }
}

impl Normalize for ChainReceipt {
    fn normalize(&self) -> Value {
        json!({
            "transactionHash": self.transaction_hash.normalize(),
            "transactionIndex": self.transaction_index.normalize(),
            "blockHash": self.block_hash.normalize(),
            "blockNumber": self.block_number.normalize(),
            "from": self.from.normalize(),
            "to": self.to.normalize(),
            "gasUsed": self.gas_used.normalize(),
            "cumulativeGasUsed": self.cumulative_gas_used.normalize(),
            "effectiveGasPrice": self.effective_gas_price.normalize(),
            "status": self.status,
            "logs": self.logs.normalize(),
        })
    }
}

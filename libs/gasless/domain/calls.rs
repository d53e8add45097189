//! Call entries batched into proxy-wallet and Safe transactions

use ethers::types::{Address, Bytes, U256};

/// Call kind understood by the proxy wallet's `proxy(...)` entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyCallType {
    Call,
    DelegateCall,
}

impl ProxyCallType {
    pub fn code(self) -> u8 {
        match self {
            ProxyCallType::Call => 1,
            ProxyCallType::DelegateCall => 2,
        }
    }
}

/// One call inside a proxy-wallet batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCall {
    pub call_type: ProxyCallType,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl ProxyCall {
    /// Plain CALL with no native value attached.
    pub fn call(to: Address, data: Bytes) -> Self {
        Self {
            call_type: ProxyCallType::Call,
            to,
            value: U256::zero(),
            data,
        }
    }
}

/// Safe execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Call,
    DelegateCall,
}

impl OperationType {
    pub fn code(self) -> u8 {
        match self {
            OperationType::Call => 0,
            OperationType::DelegateCall => 1,
        }
    }
}

/// One call executed by a Safe, either directly or through multiSend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeCall {
    pub to: Address,
    pub data: Bytes,
    pub operation: OperationType,
    pub value: U256,
}

impl SafeCall {
    pub fn call(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            operation: OperationType::Call,
            value: U256::zero(),
        }
    }
}

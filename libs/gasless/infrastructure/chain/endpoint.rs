//! Single RPC endpoint abstraction

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockId, Bytes, Transaction, TransactionReceipt, H256, U256};

/// Read-only RPC surface the gateway fails over across.
#[async_trait]
pub trait RpcEndpoint: Send + Sync {
    fn url(&self) -> &str;

    async fn call(
        &self,
        tx: &TypedTransaction,
        block: Option<BlockId>,
    ) -> Result<Bytes, ProviderError>;

    async fn balance(&self, address: Address, block: Option<BlockId>)
        -> Result<U256, ProviderError>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, ProviderError>;

    async fn receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>, ProviderError>;

    async fn transaction(&self, hash: H256) -> Result<Option<Transaction>, ProviderError>;
}

/// HTTP JSON-RPC endpoint backed by an ethers provider.
pub struct HttpEndpoint {
    url: String,
    provider: Provider<Http>,
}

impl HttpEndpoint {
    pub fn dial(url: &str) -> Result<Self, String> {
        let provider = Provider::<Http>::try_from(url).map_err(|e| e.to_string())?;
        Ok(Self {
            url: url.to_string(),
            provider,
        })
    }
}

#[async_trait]
impl RpcEndpoint for HttpEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    async fn call(
        &self,
        tx: &TypedTransaction,
        block: Option<BlockId>,
    ) -> Result<Bytes, ProviderError> {
        self.provider.call(tx, block).await
    }

    async fn balance(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<U256, ProviderError> {
        self.provider.get_balance(address, block).await
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, ProviderError> {
        self.provider.estimate_gas(tx, None).await
    }

    async fn receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.provider.get_transaction_receipt(hash).await
    }

    async fn transaction(&self, hash: H256) -> Result<Option<Transaction>, ProviderError> {
        self.provider.get_transaction(hash).await
    }
}

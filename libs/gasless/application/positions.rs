//! Redeem, split and merge through the relay
//!
//! Each batch becomes one relay transaction: the calls are encoded, wrapped
//! for the client's proxy wallet or Safe, signed, submitted and followed
//! on-chain until mined.

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256};
use std::sync::Arc;
use tracing::{info, Instrument};

use super::context::ClientContext;
use super::error::{GaslessError, Result};
use crate::domain::{ProxyCall, RelayWalletType, SafeCall};
use crate::infrastructure::encoding::{
    decode_uint, encode_balance_of, encode_erc20_approve, encode_merge_positions, encode_redeem_neg_risk,
    encode_redeem_positions, encode_set_approval_for_all, encode_split_position, BINARY_INDEX_SETS,
};
use crate::infrastructure::relay::{wait_for_receipt, GasLimit, RelayOutcome, RelayTransaction};

/// One position operation inside a relay batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionAction {
    /// Conditional-tokens `redeemPositions` over both binary outcomes
    Redeem { condition_id: H256 },
    /// Neg-risk adapter redeem with one amount per outcome
    RedeemNegRisk { condition_id: H256, amounts: Vec<U256> },
    Split { condition_id: H256, amount: U256, neg_risk: bool },
    Merge { condition_id: H256, amount: U256, neg_risk: bool },
    /// Unlimited USDC allowance for `spender`
    ApproveCollateral { spender: Address },
    /// ERC1155 `setApprovalForAll(operator, true)` on the CTF
    ApproveOutcomeTokens { operator: Address },
}

impl PositionAction {
    fn label(&self) -> &'static str {
        match self {
            PositionAction::Redeem { .. } => "redeem",
            PositionAction::RedeemNegRisk { .. } => "redeem-neg-risk",
            PositionAction::Split { .. } => "split",
            PositionAction::Merge { .. } => "merge",
            PositionAction::ApproveCollateral { .. } => "approve-collateral",
            PositionAction::ApproveOutcomeTokens { .. } => "approve-tokens",
        }
    }
}

/// What happened to a relayed batch.
#[derive(Debug, Clone)]
pub struct RelayExecution {
    pub wallet_type: RelayWalletType,
    pub nonce: U256,
    pub transaction_id: Option<String>,
    pub transaction_hash: Option<H256>,
    /// `None` when the relay accepted the batch without a hash yet
    pub receipt: Option<TransactionReceipt>,
    /// Proxy batches only
    pub gas_limit: Option<GasLimit>,
}

pub struct PositionActions {
    ctx: Arc<ClientContext>,
}

impl PositionActions {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }

    pub async fn redeem(&self, condition_ids: &[H256]) -> Result<RelayExecution> {
        let actions: Vec<PositionAction> = condition_ids
            .iter()
            .map(|&condition_id| PositionAction::Redeem { condition_id })
            .collect();
        self.execute(&actions, "redeem").await
    }

    /// `amounts[i]` holds the per-outcome amounts for `condition_ids[i]`.
    pub async fn redeem_neg_risk(&self, condition_ids: &[H256], amounts: &[Vec<U256>]) -> Result<RelayExecution> {
        if condition_ids.len() != amounts.len() {
            return Err(GaslessError::Validation(format!(
                "{} condition ids but {} amount lists",
                condition_ids.len(),
                amounts.len()
            )));
        }
        let actions: Vec<PositionAction> = condition_ids
            .iter()
            .zip(amounts)
            .map(|(&condition_id, amounts)| PositionAction::RedeemNegRisk {
                condition_id,
                amounts: amounts.clone(),
            })
            .collect();
        self.execute(&actions, "redeem neg-risk").await
    }

    pub async fn split(&self, condition_id: H256, amount: U256, neg_risk: bool) -> Result<RelayExecution> {
        self.execute(&[PositionAction::Split { condition_id, amount, neg_risk }], "split")
            .await
    }

    pub async fn merge(&self, condition_id: H256, amount: U256, neg_risk: bool) -> Result<RelayExecution> {
        self.execute(&[PositionAction::Merge { condition_id, amount, neg_risk }], "merge")
            .await
    }

    /// Grant both exchanges and the neg-risk adapter the allowances trading needs.
    pub async fn approve_trading(&self) -> Result<RelayExecution> {
        let contracts = self.ctx.contracts();
        let operators = [contracts.exchange, contracts.neg_risk_exchange, contracts.neg_risk_adapter];

        let mut actions: Vec<PositionAction> = operators
            .iter()
            .map(|&spender| PositionAction::ApproveCollateral { spender })
            .collect();
        actions.extend(
            operators
                .iter()
                .map(|&operator| PositionAction::ApproveOutcomeTokens { operator }),
        );
        self.execute(&actions, "approve trading").await
    }

    /// Outcome-token balance of the client's wallet.
    pub async fn position_balance(&self, token_id: U256) -> Result<U256> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.ctx.contracts().ctf)
            .data(encode_balance_of(self.ctx.wallet_address(), token_id))
            .into();
        let data = self.ctx.gateway().call_contract(&tx, None).await?;
        Ok(decode_uint(&data)?)
    }

    /// Relay-side record of an earlier submission.
    pub async fn relay_status(&self, transaction_id: &str) -> Result<Vec<RelayTransaction>> {
        let records = self.ctx.relay().get_transaction(transaction_id).await?;
        let settled = records
            .iter()
            .filter(|tx| tx.relay_state().is_final_success())
            .count();
        info!(
            "Relay transaction {}: {} records, {} mined or confirmed",
            transaction_id,
            records.len(),
            settled
        );
        Ok(records)
    }

    /// Target contract and call data for each action.
    pub fn encode_actions(&self, actions: &[PositionAction]) -> Result<Vec<(Address, Bytes)>> {
        let contracts = self.ctx.contracts();
        let binary: Vec<U256> = BINARY_INDEX_SETS.iter().map(|&i| U256::from(i)).collect();

        actions
            .iter()
            .map(|action| -> Result<(Address, Bytes)> {
                let encoded = match action {
                    PositionAction::Redeem { condition_id } => (
                        contracts.ctf,
                        encode_redeem_positions(contracts.collateral, *condition_id, &binary),
                    ),
                    PositionAction::RedeemNegRisk { condition_id, amounts } => (
                        contracts.neg_risk_adapter,
                        encode_redeem_neg_risk(*condition_id, amounts)?,
                    ),
                    PositionAction::Split { condition_id, amount, neg_risk } => {
                        let (target, collateral) = partition_target(contracts, *neg_risk);
                        (target, encode_split_position(collateral, *condition_id, &binary, *amount)?)
                    }
                    PositionAction::Merge { condition_id, amount, neg_risk } => {
                        let (target, collateral) = partition_target(contracts, *neg_risk);
                        (target, encode_merge_positions(collateral, *condition_id, &binary, *amount)?)
                    }
                    PositionAction::ApproveCollateral { spender } => {
                        (contracts.collateral, encode_erc20_approve(*spender, U256::MAX))
                    }
                    PositionAction::ApproveOutcomeTokens { operator } => {
                        (contracts.ctf, encode_set_approval_for_all(*operator, true))
                    }
                };
                Ok(encoded)
            })
            .collect()
    }

    /// Encode, wrap, sign, submit and poll one batch of actions.
    pub async fn execute(&self, actions: &[PositionAction], metadata: &str) -> Result<RelayExecution> {
        let span = self.ctx.observability().span().clone();
        self.execute_inner(actions, metadata).instrument(span).await
    }

    async fn execute_inner(&self, actions: &[PositionAction], metadata: &str) -> Result<RelayExecution> {
        let wallet_type = self.ctx.relay_wallet_type()?;
        if actions.is_empty() {
            return Err(GaslessError::Validation("empty position batch".to_string()));
        }

        let calls = self.encode_actions(actions)?;
        let wallet = self.ctx.wallet_address();
        info!(
            "Relaying {} position actions ({}) through {} wallet {:?}",
            actions.len(),
            actions.iter().map(PositionAction::label).collect::<Vec<_>>().join(", "),
            wallet_type,
            wallet
        );

        let (outcome, nonce, gas_limit) = match wallet_type {
            RelayWalletType::Proxy => {
                let (relay, nonce) = self.ctx.proxy_relay_and_nonce().await?;
                let proxy_calls: Vec<ProxyCall> =
                    calls.into_iter().map(|(to, data)| ProxyCall::call(to, data)).collect();
                let (body, gas_limit) = self
                    .ctx
                    .builder()
                    .build_proxy_envelope(&proxy_calls, wallet, nonce, relay, metadata)
                    .await?;
                (self.ctx.relay().submit(&body).await?, nonce, Some(gas_limit))
            }
            RelayWalletType::Safe => {
                let nonce = self
                    .ctx
                    .relay()
                    .get_relay_nonce(self.ctx.signer_address(), RelayWalletType::Safe)
                    .await?;
                let safe_calls: Vec<SafeCall> =
                    calls.into_iter().map(|(to, data)| SafeCall::call(to, data)).collect();
                let body = self
                    .ctx
                    .builder()
                    .build_safe_envelope(&safe_calls, wallet, nonce, metadata)
                    .await?;
                (self.ctx.relay().submit(&body).await?, nonce, None)
            }
        };

        match outcome {
            RelayOutcome::Submitted {
                transaction_hash,
                transaction_id,
            } => {
                let receipt = wait_for_receipt(
                    self.ctx.gateway(),
                    transaction_hash,
                    self.ctx.config().poll_settings(),
                )
                .await?;
                Ok(RelayExecution {
                    wallet_type,
                    nonce,
                    transaction_id,
                    transaction_hash: Some(transaction_hash),
                    receipt: Some(receipt),
                    gas_limit,
                })
            }
            RelayOutcome::Pending { transaction_id, .. } => Ok(RelayExecution {
                wallet_type,
                nonce,
                transaction_id,
                transaction_hash: None,
                receipt: None,
                gas_limit,
            }),
            RelayOutcome::Failed { state, reason } => Err(GaslessError::RelayRejected { state, reason }),
        }
    }
}

/// Regular markets split on the CTF with USDC; neg-risk markets go through
/// the adapter, which is also the collateral argument.
fn partition_target(
    contracts: &crate::infrastructure::ContractAddresses,
    neg_risk: bool,
) -> (Address, Address) {
    if neg_risk {
        (contracts.neg_risk_adapter, contracts.neg_risk_adapter)
    } else {
        (contracts.ctf, contracts.collateral)
    }
}

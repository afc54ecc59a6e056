//! Trait definitions for the external system boundary.
//!
//! The orchestrator only talks to the chain through [`Network`] so it can be
//! unit tested with mocks.

use {
    crate::{artifact::ContractFactory, record::Confirmation},
    alloy::primitives::{Address, Bytes, TxHash, U256},
    anyhow::Result,
};

/// A submitted creation transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingContract {
    pub contract: String,
    pub transaction_hash: TxHash,
}

/// Receipt of a confirmed, successful transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Capabilities of the chain a deployment runs against. All transactions are
/// sent from a single signing account.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Loads the factory producing creation code for `contract`.
    async fn contract_factory(&self, contract: &str) -> Result<ContractFactory>;

    /// Submits a creation transaction without waiting for it to be mined.
    async fn deploy(&self, contract: &str, creation_code: Bytes) -> Result<PendingContract>;

    /// Waits until the creation transaction is included and returns the new
    /// contract's address. Fails if the transaction reverted.
    async fn wait_for_confirmation(&self, pending: &PendingContract) -> Result<Confirmation>;

    /// Calls the ERC-20 `transfer(to, amount)` function of `token` and waits
    /// for the transaction to be confirmed.
    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>;
}

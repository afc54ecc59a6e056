use {
    alloy::primitives::{TxHash, U256},
    std::{path::PathBuf, time::Duration},
    thiserror::Error,
};

/// Boxed error coming out of the network collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("failed to persist deployment manifest {path:?}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The deployment plan, the artifacts or the manifest do not describe
/// something that can be deployed. Raised before any transaction is
/// submitted for the affected contract.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("{contract} depends on {dependency}, which has not been deployed")]
    MissingDependency {
        contract: String,
        dependency: String,
    },
    #[error("{0} has not been deployed")]
    NotDeployed(String),
    #[error("{contract} takes {expected} constructor arguments but {actual} were given")]
    ArgumentCount {
        contract: String,
        expected: usize,
        actual: usize,
    },
    #[error("constructor argument #{index} of {contract} is invalid: {reason}")]
    InvalidArgument {
        contract: String,
        index: usize,
        reason: String,
    },
    #[error("{0} has no creation bytecode (abstract contract or interface?)")]
    EmptyBytecode(String),
    /// The compiled artifact is missing or unreadable. Nothing was submitted,
    /// so this is not a [`DeploymentError`]. Bytecode the node refuses to
    /// execute surfaces as [`DeploymentError::Rejected`] instead.
    #[error("no contract factory for {contract}")]
    ContractFactory {
        contract: String,
        #[source]
        source: BoxError,
    },
    #[error("network {0:?} is not configured in the deployment plan")]
    UnknownNetwork(String),
    #[error("network {0:?} has no node url; pass --node-url")]
    MissingNodeUrl(String),
    #[error("network {network:?} expects chain id {expected} but the node reports {actual}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },
    #[error("invalid deployment plan {path:?}: {reason}")]
    Plan { path: PathBuf, reason: String },
    #[error("invalid deployment manifest {path:?}: {reason}")]
    Manifest { path: PathBuf, reason: String },
    #[error("{contract} is marked for reuse but the {network:?} manifest has no entry for it")]
    NotInManifest { contract: String, network: String },
    #[error("invalid amount {amount:?}: {reason}")]
    InvalidAmount { amount: String, reason: String },
}

/// Creating a contract on chain failed. Deployments confirmed before the
/// failure stay valid.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("the network rejected the deployment of {contract}")]
    Rejected {
        contract: String,
        #[source]
        source: BoxError,
    },
    #[error("deployment of {contract} in transaction {transaction} was not confirmed")]
    Unconfirmed {
        contract: String,
        transaction: TxHash,
        #[source]
        source: BoxError,
    },
    #[error(
        "deployment of {contract} in transaction {transaction} was not confirmed within {timeout:?}"
    )]
    Timeout {
        contract: String,
        transaction: TxHash,
        timeout: Duration,
    },
}

/// A post-deployment transfer was rejected or reverted.
#[derive(Debug, Error)]
#[error("transfer of {amount} from {from} to {to} failed")]
pub struct TransferError {
    pub from: String,
    pub to: String,
    pub amount: U256,
    #[source]
    pub source: BoxError,
}

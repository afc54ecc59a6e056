use {
    crate::{
        error::{ConfigurationError, DeploymentError, Error, TransferError},
        manifest::ManifestStore,
        plan::{ArgSpec, ContractSpec, DeploymentPlan, Source, TransferSpec},
        record::{ConstructorArg, DeploymentRecord},
        traits::{Network, TransactionReceipt},
    },
    alloy::primitives::{U256, utils::format_units},
    chain::Chain,
    std::{sync::Arc, time::Duration},
};

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Deploys contracts one after the other through a single signing account.
///
/// Every step is awaited before the next one starts, so the account's nonces
/// are used in plan order and later contracts can take the addresses of
/// earlier ones as constructor arguments.
pub struct Orchestrator {
    network: Arc<dyn Network>,
    chain: Option<Chain>,
    confirmation_timeout: Duration,
    manifest: Option<ManifestStore>,
    records: Vec<DeploymentRecord>,
}

impl Orchestrator {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self {
            network,
            chain: None,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            manifest: None,
            records: Vec::new(),
        }
    }

    /// Chain used to render block explorer links in the logs.
    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Persists every record to the manifest and resolves reused contracts
    /// from it.
    pub fn with_manifest(mut self, manifest: ManifestStore) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// All records produced so far, including those of runs that failed
    /// half way.
    pub fn records(&self) -> &[DeploymentRecord] {
        &self.records
    }

    pub fn record(&self, contract: &str) -> Option<&DeploymentRecord> {
        self.records.iter().rev().find(|record| record.name == contract)
    }

    /// Runs the contract specs and then the transfers of a plan.
    pub async fn execute(&mut self, plan: &DeploymentPlan) -> Result<Vec<DeploymentRecord>, Error> {
        let records = self.run(&plan.contracts).await?;
        for transfer in &plan.transfers {
            self.execute_transfer(transfer).await?;
        }
        Ok(records)
    }

    /// Handles the specs in order and returns one record per spec. Stops at
    /// the first error; records confirmed before it remain available through
    /// [`Orchestrator::records`].
    pub async fn run(&mut self, specs: &[ContractSpec]) -> Result<Vec<DeploymentRecord>, Error> {
        let start = self.records.len();
        for spec in specs {
            // Reused entries already carry their provenance in the manifest.
            let persist = !matches!(spec.source, Source::Manifest);
            let record = match &spec.source {
                Source::Deploy(args) => {
                    let args = self.resolve_args(&spec.name, args)?;
                    self.deploy_contract(&spec.name, args).await?
                }
                Source::Existing(address) => {
                    tracing::info!(contract = %spec.name, %address, "using existing contract");
                    DeploymentRecord::existing(&spec.name, *address)
                }
                Source::Manifest => {
                    let record = self.reuse_from_manifest(&spec.name)?;
                    tracing::info!(
                        contract = %spec.name,
                        address = ?record.address(),
                        "reusing contract from manifest"
                    );
                    record
                }
            };
            // Confirmed on chain from here on, whether or not persisting works.
            self.records.push(record);
            if let (true, Some(manifest), Some(record)) =
                (persist, &mut self.manifest, self.records.last())
            {
                manifest.record(record).await?;
            }
        }
        Ok(self.records[start..].to_vec())
    }

    /// Submits the creation transaction for `contract` and waits for it to be
    /// confirmed.
    pub async fn deploy_contract(
        &self,
        contract: &str,
        constructor_args: Vec<ConstructorArg>,
    ) -> Result<DeploymentRecord, Error> {
        let factory = self
            .network
            .contract_factory(contract)
            .await
            .map_err(|err| ConfigurationError::ContractFactory {
                contract: contract.to_string(),
                source: err.into(),
            })?;
        let creation_code = factory.creation_code(&constructor_args)?;
        tracing::debug!(contract, args = ?constructor_args, "deploying contract");

        let pending = self
            .network
            .deploy(contract, creation_code)
            .await
            .map_err(|err| DeploymentError::Rejected {
                contract: contract.to_string(),
                source: err.into(),
            })?;
        tracing::info!(
            contract,
            transaction = %pending.transaction_hash,
            "deployment submitted, waiting for confirmation"
        );

        let mut record =
            DeploymentRecord::pending(contract, constructor_args, pending.transaction_hash);
        let confirmation = tokio::time::timeout(
            self.confirmation_timeout,
            self.network.wait_for_confirmation(&pending),
        )
        .await
        .map_err(|_| DeploymentError::Timeout {
            contract: contract.to_string(),
            transaction: pending.transaction_hash,
            timeout: self.confirmation_timeout,
        })?
        .map_err(|err| DeploymentError::Unconfirmed {
            contract: contract.to_string(),
            transaction: pending.transaction_hash,
            source: err.into(),
        })?;
        record.confirm(confirmation);

        tracing::info!(
            contract,
            address = %confirmation.address,
            block = ?confirmation.block_number,
            explorer = ?self.chain.and_then(|chain| chain.contract_url(confirmation.address)),
            "{contract} deployed to {}",
            confirmation.address
        );
        Ok(record)
    }

    /// Transfers `amount` base units of the `from` token contract to the `to`
    /// contract. A failed transfer leaves earlier deployments untouched.
    pub async fn transfer_funds(
        &self,
        from: &DeploymentRecord,
        to: &DeploymentRecord,
        amount: U256,
    ) -> Result<TransactionReceipt, Error> {
        let token = from
            .address()
            .ok_or_else(|| ConfigurationError::NotDeployed(from.name.clone()))?;
        let recipient = to
            .address()
            .ok_or_else(|| ConfigurationError::NotDeployed(to.name.clone()))?;

        let receipt = self
            .network
            .transfer(token, recipient, amount)
            .await
            .map_err(|err| TransferError {
                from: from.name.clone(),
                to: to.name.clone(),
                amount,
                source: err.into(),
            })?;
        tracing::info!(
            from = %from.name,
            to = %to.name,
            %amount,
            transaction = %receipt.transaction_hash,
            "funds transferred"
        );
        Ok(receipt)
    }

    async fn execute_transfer(
        &self,
        transfer: &TransferSpec,
    ) -> Result<TransactionReceipt, Error> {
        let from = self
            .record(&transfer.from)
            .ok_or_else(|| ConfigurationError::NotDeployed(transfer.from.clone()))?;
        let to = self
            .record(&transfer.to)
            .ok_or_else(|| ConfigurationError::NotDeployed(transfer.to.clone()))?;
        let receipt = self.transfer_funds(from, to, transfer.amount).await?;
        if let Ok(formatted) = format_units(transfer.amount, transfer.decimals) {
            tracing::info!("{formatted} {} funded to {}", from.name, to.name);
        }
        Ok(receipt)
    }

    fn resolve_args(
        &self,
        contract: &str,
        args: &[ArgSpec],
    ) -> Result<Vec<ConstructorArg>, ConfigurationError> {
        args.iter()
            .map(|arg| match arg {
                ArgSpec::Literal(value) => Ok(ConstructorArg::Literal(value.clone())),
                ArgSpec::Contract(dependency) => self
                    .record(dependency)
                    .and_then(DeploymentRecord::address)
                    .map(ConstructorArg::Address)
                    .ok_or_else(|| ConfigurationError::MissingDependency {
                        contract: contract.to_string(),
                        dependency: dependency.clone(),
                    }),
            })
            .collect()
    }

    fn reuse_from_manifest(&self, contract: &str) -> Result<DeploymentRecord, ConfigurationError> {
        let manifest = self.manifest.as_ref().map(ManifestStore::manifest);
        manifest
            .and_then(|manifest| manifest.address_of(contract))
            .map(|address| DeploymentRecord::existing(contract, address))
            .ok_or_else(|| ConfigurationError::NotInManifest {
                contract: contract.to_string(),
                network: manifest
                    .map(|manifest| manifest.network.clone())
                    .unwrap_or_default(),
            })
    }
}

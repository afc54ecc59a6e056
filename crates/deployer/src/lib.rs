pub mod arguments;
pub mod artifact;
pub mod error;
pub mod manifest;
pub mod onchain;
pub mod orchestrator;
pub mod plan;
pub mod record;
pub mod traits;

use {
    crate::{
        artifact::ArtifactStore,
        error::ConfigurationError,
        manifest::ManifestStore,
        onchain::Onchain,
        orchestrator::Orchestrator,
        plan::{DeploymentPlan, NetworkConfig},
        record::{DeploymentRecord, DeploymentState},
    },
    anyhow::Result,
    chain::Chain,
    std::sync::Arc,
};

pub use error::Error;

pub async fn run(args: arguments::Arguments) -> Result<()> {
    let plan = DeploymentPlan::load(&args.plan).await?;
    let network = plan.network(&args.network)?;
    let node_url = args
        .node_url
        .clone()
        .or_else(|| network.node_url.clone())
        .ok_or_else(|| ConfigurationError::MissingNodeUrl(args.network.clone()))?;

    let artifacts = plan.artifacts.iter().fold(
        ArtifactStore::new(&args.artifacts),
        |store, (contract, path)| store.with_override(contract, path),
    );
    let onchain = Onchain::new(
        node_url,
        args.private_key.clone(),
        artifacts,
        args.confirmations,
    );

    let chain_id = onchain.chain_id().await?;
    check_chain_id(&args.network, network, chain_id)?;
    let chain = Chain::try_from(chain_id).ok();
    tracing::info!(
        network = %args.network,
        chain_id,
        chain = chain.map(|chain| chain.name()),
        deployer = %args.private_key.address(),
        "deployment has started"
    );

    let manifest = ManifestStore::load(&args.manifest_dir, &args.network, Some(chain_id)).await?;
    let mut orchestrator = Orchestrator::new(Arc::new(onchain))
        .with_confirmation_timeout(args.confirmation_timeout)
        .with_manifest(manifest);
    if let Some(chain) = chain {
        orchestrator = orchestrator.with_chain(chain);
    }

    let result = orchestrator.execute(&plan).await;
    for line in orchestrator.records().iter().filter_map(summary) {
        tracing::info!("{line}");
    }
    result?;
    tracing::info!("deployment finished");
    Ok(())
}

/// One line of the final report, `None` for records without an address.
fn summary(record: &DeploymentRecord) -> Option<String> {
    let address = record.address()?;
    Some(match record.state {
        DeploymentState::Existing { .. } => format!("{} uses existing {address}", record.name),
        _ => format!("{} deployed to {address}", record.name),
    })
}

/// The chain id the node reports must match the one configured for the
/// network, or the one implied by a well known network name.
fn check_chain_id(
    name: &str,
    network: &NetworkConfig,
    actual: u64,
) -> Result<(), ConfigurationError> {
    let expected = network
        .chain_id
        .or_else(|| Chain::from_network_name(name).ok().map(|chain| chain.id()));
    match expected {
        Some(expected) if expected != actual => Err(ConfigurationError::ChainIdMismatch {
            network: name.to_string(),
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::record::Confirmation,
        alloy::primitives::{Address, B256},
    };

    #[test]
    fn summary_tells_deployed_from_existing_contracts() {
        let mut deployed = DeploymentRecord::pending("Usdc", vec![], B256::repeat_byte(1));
        assert_eq!(summary(&deployed), None);

        deployed.confirm(Confirmation {
            address: Address::repeat_byte(1),
            transaction_hash: B256::repeat_byte(1),
            block_number: Some(1),
        });
        assert_eq!(
            summary(&deployed).unwrap(),
            format!("Usdc deployed to {}", Address::repeat_byte(1))
        );

        let existing = DeploymentRecord::existing("Usdc", Address::repeat_byte(2));
        assert_eq!(
            summary(&existing).unwrap(),
            format!("Usdc uses existing {}", Address::repeat_byte(2))
        );
    }

    #[test]
    fn chain_id_from_plan_wins() {
        let network = NetworkConfig {
            node_url: None,
            chain_id: Some(1337),
        };
        assert!(check_chain_id("localhost", &network, 1337).is_ok());
        assert!(matches!(
            check_chain_id("localhost", &network, 31337),
            Err(ConfigurationError::ChainIdMismatch {
                expected: 1337,
                actual: 31337,
                ..
            })
        ));
    }

    #[test]
    fn chain_id_from_well_known_name() {
        let network = NetworkConfig::default();
        assert!(check_chain_id("polygon_mumbai", &network, 80001).is_ok());
        assert!(check_chain_id("polygon_mumbai", &network, 137).is_err());
        // Unknown names can't be checked.
        assert!(check_chain_id("staging", &network, 5).is_ok());
    }
}

//! Versioned record of what has been deployed on a network.
//!
//! The manifest lives at `<dir>/<network>.json` and replaces hand-maintained
//! address lists. It is updated after every confirmed deployment so progress
//! survives a failure later in the run.

use {
    crate::{
        error::{ConfigurationError, Error},
        record::{ConstructorArg, DeploymentRecord, DeploymentState},
    },
    alloy::primitives::{Address, TxHash},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        io,
        path::{Path, PathBuf},
    },
};

pub const VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: u32,
    pub network: String,
    pub chain_id: Option<u64>,
    pub contracts: BTreeMap<String, Entry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub address: Address,
    #[serde(default)]
    pub constructor_args: Vec<ConstructorArg>,
    pub transaction_hash: Option<TxHash>,
    pub block_number: Option<u64>,
    pub deployed_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new(network: impl Into<String>, chain_id: Option<u64>) -> Self {
        Self {
            version: VERSION,
            network: network.into(),
            chain_id,
            contracts: BTreeMap::new(),
        }
    }

    pub fn address_of(&self, contract: &str) -> Option<Address> {
        self.contracts.get(contract).map(|entry| entry.address)
    }

    /// Stores the record's address, replacing any earlier entry with the same
    /// name. Pending records have no address and are ignored. An existing
    /// contract at an already recorded address keeps the recorded entry.
    pub fn insert(&mut self, record: &DeploymentRecord, at: DateTime<Utc>) {
        let Some(address) = record.address() else {
            return;
        };
        if matches!(record.state, DeploymentState::Existing { .. })
            && self.address_of(&record.name) == Some(address)
        {
            return;
        }
        self.contracts.insert(
            record.name.clone(),
            Entry {
                address,
                constructor_args: record.constructor_args.clone(),
                transaction_hash: record.transaction_hash(),
                block_number: record.block_number(),
                deployed_at: at,
            },
        );
    }
}

/// A manifest together with the file it is persisted to.
#[derive(Clone, Debug)]
pub struct ManifestStore {
    path: PathBuf,
    manifest: Manifest,
}

impl ManifestStore {
    pub fn path_for(dir: &Path, network: &str) -> PathBuf {
        dir.join(format!("{network}.json"))
    }

    /// Reads the manifest of `network` from `dir`. A missing file yields an
    /// empty manifest.
    pub async fn load(
        dir: &Path,
        network: &str,
        chain_id: Option<u64>,
    ) -> Result<Self, ConfigurationError> {
        let path = Self::path_for(dir, network);
        let invalid = |reason: String| ConfigurationError::Manifest {
            path: path.clone(),
            reason,
        };

        let manifest = match tokio::fs::read_to_string(&path).await {
            Ok(data) => {
                let manifest: Manifest =
                    serde_json::from_str(&data).map_err(|err| invalid(err.to_string()))?;
                if manifest.version != VERSION {
                    return Err(invalid(format!(
                        "unsupported version {}, expected {VERSION}",
                        manifest.version
                    )));
                }
                if manifest.network != network {
                    return Err(invalid(format!(
                        "manifest belongs to network {:?}",
                        manifest.network
                    )));
                }
                if let (Some(recorded), Some(expected)) = (manifest.chain_id, chain_id) {
                    if recorded != expected {
                        return Err(invalid(format!(
                            "manifest was written for chain id {recorded}, network has {expected}"
                        )));
                    }
                }
                manifest
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(?path, "no deployment manifest yet");
                Manifest::new(network, chain_id)
            }
            Err(err) => return Err(invalid(err.to_string())),
        };

        Ok(Self { path, manifest })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds the record and writes the manifest back to disk.
    pub async fn record(&mut self, record: &DeploymentRecord) -> Result<(), Error> {
        self.manifest.insert(record, Utc::now());
        self.save().await.map_err(|source| Error::Persistence {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_string_pretty(&self.manifest)?;
        // Write to a sibling file first so an interrupted write never leaves
        // a truncated manifest behind.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::record::Confirmation,
        alloy::primitives::B256,
    };

    fn confirmed(name: &str, address: Address) -> DeploymentRecord {
        let mut record = DeploymentRecord::pending(
            name,
            vec![ConstructorArg::Literal("1".to_string())],
            B256::repeat_byte(9),
        );
        record.confirm(Confirmation {
            address,
            transaction_hash: B256::repeat_byte(9),
            block_number: Some(42),
        });
        record
    }

    #[tokio::test]
    async fn missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::load(dir.path(), "polygon_mumbai", Some(80001))
            .await
            .unwrap();
        assert_eq!(store.manifest(), &Manifest::new("polygon_mumbai", Some(80001)));
        assert_eq!(store.path(), dir.path().join("polygon_mumbai.json"));
    }

    #[tokio::test]
    async fn records_are_persisted_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_dir = dir.path().join("deployments");
        let mut store = ManifestStore::load(&manifest_dir, "localhost", None)
            .await
            .unwrap();

        store
            .record(&confirmed("Usdc", Address::repeat_byte(1)))
            .await
            .unwrap();
        store
            .record(&DeploymentRecord::existing("Oracle", Address::repeat_byte(2)))
            .await
            .unwrap();

        let reloaded = ManifestStore::load(&manifest_dir, "localhost", None)
            .await
            .unwrap();
        assert_eq!(reloaded.manifest(), store.manifest());

        let usdc = &reloaded.manifest().contracts["Usdc"];
        assert_eq!(usdc.address, Address::repeat_byte(1));
        assert_eq!(usdc.transaction_hash, Some(B256::repeat_byte(9)));
        assert_eq!(usdc.block_number, Some(42));
        assert_eq!(
            usdc.constructor_args,
            vec![ConstructorArg::Literal("1".to_string())]
        );
        assert_eq!(
            reloaded.manifest().address_of("Oracle"),
            Some(Address::repeat_byte(2))
        );
        assert_eq!(reloaded.manifest().contracts["Oracle"].transaction_hash, None);
    }

    #[tokio::test]
    async fn later_record_replaces_earlier_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ManifestStore::load(dir.path(), "localhost", None)
            .await
            .unwrap();
        store
            .record(&confirmed("Usdc", Address::repeat_byte(1)))
            .await
            .unwrap();
        store
            .record(&confirmed("Usdc", Address::repeat_byte(3)))
            .await
            .unwrap();
        assert_eq!(store.manifest().contracts.len(), 1);
        assert_eq!(
            store.manifest().address_of("Usdc"),
            Some(Address::repeat_byte(3))
        );
    }

    #[tokio::test]
    async fn existing_contract_keeps_recorded_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ManifestStore::load(dir.path(), "localhost", None)
            .await
            .unwrap();
        store
            .record(&confirmed("Usdc", Address::repeat_byte(1)))
            .await
            .unwrap();
        let recorded = store.manifest().contracts["Usdc"].clone();

        store
            .record(&DeploymentRecord::existing("Usdc", Address::repeat_byte(1)))
            .await
            .unwrap();
        assert_eq!(store.manifest().contracts["Usdc"], recorded);

        // Pinning a different address does replace the entry.
        store
            .record(&DeploymentRecord::existing("Usdc", Address::repeat_byte(5)))
            .await
            .unwrap();
        let usdc = &store.manifest().contracts["Usdc"];
        assert_eq!(usdc.address, Address::repeat_byte(5));
        assert_eq!(usdc.transaction_hash, None);
    }

    #[tokio::test]
    async fn rejects_foreign_or_unknown_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let path = ManifestStore::path_for(dir.path(), "polygon_mumbai");

        let mut manifest = Manifest::new("sepolia", None);
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();
        assert!(matches!(
            ManifestStore::load(dir.path(), "polygon_mumbai", None).await,
            Err(ConfigurationError::Manifest { .. })
        ));

        manifest.network = "polygon_mumbai".to_string();
        manifest.version = VERSION + 1;
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();
        assert!(matches!(
            ManifestStore::load(dir.path(), "polygon_mumbai", None).await,
            Err(ConfigurationError::Manifest { .. })
        ));

        manifest.version = VERSION;
        manifest.chain_id = Some(1);
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();
        assert!(matches!(
            ManifestStore::load(dir.path(), "polygon_mumbai", Some(80001)).await,
            Err(ConfigurationError::Manifest { .. })
        ));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ManifestStore::load(dir.path(), "polygon_mumbai", None).await,
            Err(ConfigurationError::Manifest { .. })
        ));
    }
}

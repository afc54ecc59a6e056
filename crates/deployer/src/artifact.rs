//! Compiled contract artifacts and the factories built from them.
//!
//! Artifacts use the Hardhat layout: one JSON file per contract at
//! `<root>/contracts/<Name>.sol/<Name>.json` with at least the
//! `contractName`, `abi` and `bytecode` fields.

use {
    crate::{error::ConfigurationError, record::ConstructorArg},
    alloy::{
        dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
        json_abi::{JsonAbi, Param},
        primitives::Bytes,
    },
    anyhow::{Context, Result},
    serde::Deserialize,
    std::{
        collections::HashMap,
        path::{Path, PathBuf},
    },
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

/// Produces creation code for one contract.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractFactory {
    pub name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

impl ContractFactory {
    pub fn new(name: impl Into<String>, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            abi,
            bytecode,
        }
    }

    pub fn from_artifact_json(json: &str) -> Result<Self> {
        let artifact: HardhatArtifact =
            serde_json::from_str(json).context("malformed contract artifact")?;
        Ok(Self::new(
            artifact.contract_name,
            artifact.abi,
            artifact.bytecode,
        ))
    }

    pub fn constructor_inputs(&self) -> &[Param] {
        self.abi
            .constructor()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default()
    }

    /// Returns the creation bytecode followed by the ABI encoded constructor
    /// arguments.
    pub fn creation_code(&self, args: &[ConstructorArg]) -> Result<Bytes, ConfigurationError> {
        if self.bytecode.is_empty() {
            return Err(ConfigurationError::EmptyBytecode(self.name.clone()));
        }

        let inputs = self.constructor_inputs();
        if inputs.len() != args.len() {
            return Err(ConfigurationError::ArgumentCount {
                contract: self.name.clone(),
                expected: inputs.len(),
                actual: args.len(),
            });
        }

        let values = inputs
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (param, arg))| self.encode_argument(index, param, arg))
            .collect::<Result<Vec<_>, _>>()?;

        let mut code = self.bytecode.to_vec();
        if let Some(constructor) = self.abi.constructor() {
            let encoded = constructor.abi_encode_input(&values).map_err(|err| {
                ConfigurationError::InvalidArgument {
                    contract: self.name.clone(),
                    index: 0,
                    reason: err.to_string(),
                }
            })?;
            code.extend_from_slice(&encoded);
        }
        Ok(code.into())
    }

    fn encode_argument(
        &self,
        index: usize,
        param: &Param,
        arg: &ConstructorArg,
    ) -> Result<DynSolValue, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidArgument {
            contract: self.name.clone(),
            index,
            reason,
        };
        let ty = param.resolve().map_err(|err| invalid(err.to_string()))?;
        match arg {
            ConstructorArg::Address(address) => match ty {
                DynSolType::Address => Ok(DynSolValue::Address(*address)),
                ty => Err(invalid(format!(
                    "parameter {:?} has type {ty} but a contract address was given",
                    param.name
                ))),
            },
            ConstructorArg::Literal(value) => ty.coerce_str(value).map_err(|err| {
                invalid(format!(
                    "cannot use {value:?} as {ty} for parameter {:?}: {err}",
                    param.name
                ))
            }),
        }
    }
}

/// Locates artifacts on disk and turns them into factories.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    overrides: HashMap<String, PathBuf>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            overrides: HashMap::new(),
        }
    }

    /// Uses an explicit artifact file for `contract` instead of the default
    /// location.
    pub fn with_override(mut self, contract: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(contract.into(), path.into());
        self
    }

    pub fn path(&self, contract: &str) -> PathBuf {
        match self.overrides.get(contract) {
            Some(path) => path.clone(),
            None => self
                .root
                .join("contracts")
                .join(format!("{contract}.sol"))
                .join(format!("{contract}.json")),
        }
    }

    pub async fn load(&self, contract: &str) -> Result<ContractFactory> {
        let path = self.path(contract);
        let factory = read_artifact(&path).await?;
        anyhow::ensure!(
            factory.name == contract,
            "artifact {path:?} contains {} instead of {contract}",
            factory.name
        );
        Ok(factory)
    }
}

async fn read_artifact(path: &Path) -> Result<ContractFactory> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read artifact {path:?}"))?;
    ContractFactory::from_artifact_json(&json).with_context(|| format!("in artifact {path:?}"))
}

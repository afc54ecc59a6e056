use {
    crate::error::ConfigurationError,
    alloy::primitives::{Address, U256, utils::parse_units},
    std::{
        collections::{BTreeMap, HashSet},
        path::{Path, PathBuf},
    },
    url::Url,
};

/// Where a contract's address comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Deploy a new instance with the given constructor arguments.
    Deploy(Vec<ArgSpec>),
    /// Use an instance that already exists at a fixed address.
    Existing(Address),
    /// Use the address recorded for this contract in the network's manifest.
    Manifest,
}

/// A constructor argument as written in the plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgSpec {
    /// The address of a contract handled earlier in the same plan.
    Contract(String),
    Literal(String),
}

impl ArgSpec {
    pub fn contract(name: impl Into<String>) -> Self {
        Self::Contract(name.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractSpec {
    pub name: String,
    pub source: Source,
}

impl ContractSpec {
    pub fn deploy(name: impl Into<String>, args: Vec<ArgSpec>) -> Self {
        Self {
            name: name.into(),
            source: Source::Deploy(args),
        }
    }

    pub fn existing(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            source: Source::Existing(address),
        }
    }

    pub fn reuse(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Source::Manifest,
        }
    }

    /// Names of the contracts whose addresses this spec needs.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        let args = match &self.source {
            Source::Deploy(args) => args.as_slice(),
            Source::Existing(_) | Source::Manifest => &[],
        };
        args.iter().filter_map(|arg| match arg {
            ArgSpec::Contract(name) => Some(name.as_str()),
            ArgSpec::Literal(_) => None,
        })
    }
}

/// Token transfer from one contract of the plan to another, executed after all
/// contracts are deployed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferSpec {
    /// The token contract whose `transfer` function gets called.
    pub from: String,
    /// The recipient contract.
    pub to: String,
    /// Amount in the token's base units.
    pub amount: U256,
    pub decimals: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub node_url: Option<Url>,
    pub chain_id: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub networks: BTreeMap<String, NetworkConfig>,
    pub contracts: Vec<ContractSpec>,
    pub transfers: Vec<TransferSpec>,
    /// Artifact files that don't follow the default layout.
    pub artifacts: BTreeMap<String, PathBuf>,
}

impl DeploymentPlan {
    /// Load the deployment plan from a TOML file.
    pub async fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| ConfigurationError::Plan {
                path: path.to_owned(),
                reason: err.to_string(),
            })?;
        Self::from_toml(path, &data)
    }

    /// Parses and validates a plan. `path` is only used in error messages.
    pub fn from_toml(path: &Path, data: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::Plan {
            path: path.to_owned(),
            reason,
        };
        let plan: file::Plan = toml::de::from_str(data).map_err(|err| invalid(err.to_string()))?;

        let mut seen = HashSet::new();
        let mut contracts = Vec::with_capacity(plan.contracts.len());
        let mut artifacts = BTreeMap::new();
        for contract in plan.contracts {
            if contract.name.is_empty() {
                return Err(invalid("contract with empty name".to_string()));
            }
            if !seen.insert(contract.name.clone()) {
                return Err(invalid(format!("contract {} listed twice", contract.name)));
            }
            let spec = contract.to_spec().map_err(invalid)?;
            let missing = spec
                .dependencies()
                .find(|dependency| !contracts_contain(&contracts, dependency));
            if let Some(dependency) = missing {
                return Err(invalid(format!(
                    "{} depends on {dependency}, which is not listed before it",
                    spec.name
                )));
            }
            if let Some(artifact) = contract.artifact {
                artifacts.insert(spec.name.clone(), artifact);
            }
            contracts.push(spec);
        }

        let transfers = plan
            .transfers
            .into_iter()
            .map(|transfer| {
                for name in [&transfer.from, &transfer.to] {
                    if !seen.contains(name) {
                        return Err(invalid(format!(
                            "transfer references unknown contract {name}"
                        )));
                    }
                }
                let amount = transfer.amount.to_string();
                Ok(TransferSpec {
                    amount: parse_amount(&amount, transfer.decimals)?,
                    from: transfer.from,
                    to: transfer.to,
                    decimals: transfer.decimals,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            networks: plan
                .networks
                .into_iter()
                .map(|(name, network)| {
                    (
                        name,
                        NetworkConfig {
                            node_url: network.node_url,
                            chain_id: network.chain_id,
                        },
                    )
                })
                .collect(),
            contracts,
            transfers,
            artifacts,
        })
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigurationError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownNetwork(name.to_string()))
    }
}

fn contracts_contain(contracts: &[ContractSpec], name: &str) -> bool {
    contracts.iter().any(|contract| contract.name == name)
}

/// Converts a human readable token amount into base units. Amounts that
/// can't be represented exactly with `decimals` are rejected rather than
/// rounded.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidAmount {
        amount: amount.to_string(),
        reason,
    };
    let trimmed = amount.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid("expected a non-negative decimal number".to_string()));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > usize::from(decimals) {
            return Err(invalid(format!(
                "more than {decimals} decimal places would be rounded"
            )));
        }
    }
    parse_units(trimmed, decimals)
        .map(|units| units.get_absolute())
        .map_err(|err| invalid(err.to_string()))
}

mod file {
    use {
        alloy::primitives::Address,
        serde::Deserialize,
        std::{collections::BTreeMap, fmt, path::PathBuf},
        url::Url,
    };

    #[derive(Deserialize)]
    #[serde(rename_all = "kebab-case", deny_unknown_fields)]
    pub struct Plan {
        #[serde(default)]
        pub networks: BTreeMap<String, Network>,
        #[serde(default)]
        pub contracts: Vec<Contract>,
        #[serde(default)]
        pub transfers: Vec<Transfer>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "kebab-case", deny_unknown_fields)]
    pub struct Network {
        pub node_url: Option<Url>,
        pub chain_id: Option<u64>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "kebab-case", deny_unknown_fields)]
    pub struct Contract {
        pub name: String,
        #[serde(default)]
        pub args: Vec<Arg>,
        pub address: Option<Address>,
        #[serde(default)]
        pub reuse: bool,
        pub artifact: Option<PathBuf>,
    }

    impl Contract {
        pub fn to_spec(&self) -> Result<super::ContractSpec, String> {
            let source = match (self.address, self.reuse) {
                (Some(_), true) => {
                    return Err(format!(
                        "{} sets both `address` and `reuse`",
                        self.name
                    ));
                }
                (Some(address), false) => super::Source::Existing(address),
                (None, true) => super::Source::Manifest,
                (None, false) => super::Source::Deploy(
                    self.args.iter().map(Arg::to_spec).collect(),
                ),
            };
            if !self.args.is_empty() && !matches!(source, super::Source::Deploy(_)) {
                return Err(format!(
                    "{} is not deployed by this plan but has constructor arguments",
                    self.name
                ));
            }
            Ok(super::ContractSpec {
                name: self.name.clone(),
                source,
            })
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub enum Arg {
        Contract { contract: String },
        Literal(Literal),
    }

    impl Arg {
        fn to_spec(&self) -> super::ArgSpec {
            match self {
                Self::Contract { contract } => super::ArgSpec::Contract(contract.clone()),
                Self::Literal(literal) => super::ArgSpec::Literal(literal.to_string()),
            }
        }
    }

    /// TOML integers are signed 64 bit, larger values have to be quoted.
    #[derive(Deserialize)]
    #[serde(untagged)]
    pub enum Literal {
        String(String),
        Integer(i64),
        Bool(bool),
    }

    impl fmt::Display for Literal {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::String(value) => f.write_str(value),
                Self::Integer(value) => write!(f, "{value}"),
                Self::Bool(value) => write!(f, "{value}"),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "kebab-case", deny_unknown_fields)]
    pub struct Transfer {
        pub from: String,
        pub to: String,
        pub amount: Literal,
        #[serde(default)]
        pub decimals: u8,
    }
}

use {alloy::primitives::Address, thiserror::Error};

/// Represents each chain the deployer knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum Chain {
    Mainnet = 1,
    Sepolia = 11155111,
    Gnosis = 100,
    Polygon = 137,
    PolygonMumbai = 80001,
    PolygonAmoy = 80002,
    ArbitrumOne = 42161,
    Base = 8453,
    Hardhat = 31337,
}

impl Chain {
    /// Returns the chain ID
    pub fn id(&self) -> u64 {
        *self as u64
    }

    /// Returns the human readable name of the chain.
    pub fn name(&self) -> &'static str {
        // https://chainid.network/chains.json
        match &self {
            Self::Mainnet => "Ethereum / Mainnet",
            Self::Sepolia => "Ethereum / Sepolia",
            Self::Gnosis => "xDAI",
            Self::Polygon => "Polygon",
            Self::PolygonMumbai => "Polygon / Mumbai",
            Self::PolygonAmoy => "Polygon / Amoy",
            Self::ArbitrumOne => "Arbitrum One",
            Self::Base => "Base",
            Self::Hardhat => "Hardhat / Local",
        }
    }

    /// Resolves the network names used by Hardhat-style configurations
    /// (`--network polygon_mumbai`). Both `_` and `-` are accepted as
    /// separators.
    pub fn from_network_name(name: &str) -> Result<Self, Error> {
        let chain = match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "mainnet" | "ethereum" => Self::Mainnet,
            "sepolia" => Self::Sepolia,
            "gnosis" | "xdai" => Self::Gnosis,
            "polygon" | "matic" => Self::Polygon,
            "polygon_mumbai" | "mumbai" => Self::PolygonMumbai,
            "polygon_amoy" | "amoy" => Self::PolygonAmoy,
            "arbitrum" | "arbitrum_one" => Self::ArbitrumOne,
            "base" => Self::Base,
            "hardhat" | "localhost" => Self::Hardhat,
            _ => return Err(Error::UnknownNetworkName(name.to_string())),
        };
        Ok(chain)
    }

    /// Base URL of the block explorer, `None` for local development chains.
    pub fn explorer(&self) -> Option<&'static str> {
        match self {
            Self::Mainnet => Some("https://etherscan.io"),
            Self::Sepolia => Some("https://sepolia.etherscan.io"),
            Self::Gnosis => Some("https://gnosisscan.io"),
            Self::Polygon => Some("https://polygonscan.com"),
            Self::PolygonMumbai => Some("https://mumbai.polygonscan.com"),
            Self::PolygonAmoy => Some("https://amoy.polygonscan.com"),
            Self::ArbitrumOne => Some("https://arbiscan.io"),
            Self::Base => Some("https://basescan.org"),
            Self::Hardhat => None,
        }
    }

    /// Link to the verified source code page of a contract.
    pub fn contract_url(&self, address: Address) -> Option<String> {
        self.explorer()
            .map(|explorer| format!("{explorer}/address/{address}#code"))
    }
}

impl TryFrom<u64> for Chain {
    type Error = Error;

    /// Initializes `Chain` from a chain ID, returns error if the chain id is
    /// not supported
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let chain = match value {
            x if x == Self::Mainnet as u64 => Self::Mainnet,
            x if x == Self::Sepolia as u64 => Self::Sepolia,
            x if x == Self::Gnosis as u64 => Self::Gnosis,
            x if x == Self::Polygon as u64 => Self::Polygon,
            x if x == Self::PolygonMumbai as u64 => Self::PolygonMumbai,
            x if x == Self::PolygonAmoy as u64 => Self::PolygonAmoy,
            x if x == Self::ArbitrumOne as u64 => Self::ArbitrumOne,
            x if x == Self::Base as u64 => Self::Base,
            x if x == Self::Hardhat as u64 => Self::Hardhat,
            _ => Err(Error::ChainIdNotSupported(value))?,
        };
        Ok(chain)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("chain id {0} not supported")]
    ChainIdNotSupported(u64),
    #[error("unknown network name {0:?}")]
    UnknownNetworkName(String),
}

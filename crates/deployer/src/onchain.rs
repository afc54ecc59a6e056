use {
    crate::{
        artifact::{ArtifactStore, ContractFactory},
        record::Confirmation,
        traits::{Network, PendingContract, TransactionReceipt},
    },
    alloy::{
        network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
        primitives::{Address, Bytes, U256},
        providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
        rpc::{client::ClientBuilder, types::TransactionRequest},
        signers::local::PrivateKeySigner,
        sol,
    },
    anyhow::{Context, Result, ensure},
    url::Url,
};

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// [`Network`] backed by a JSON-RPC node. Transactions are signed locally
/// with a single private key.
pub struct Onchain {
    provider: DynProvider,
    artifacts: ArtifactStore,
    confirmations: u64,
}

impl Onchain {
    pub fn new(
        url: Url,
        signer: PrivateKeySigner,
        artifacts: ArtifactStore,
        confirmations: u64,
    ) -> Self {
        let rpc = ClientBuilder::default().http(url);
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::new(signer))
            .connect_client(rpc)
            .erased();
        Self {
            provider,
            artifacts,
            confirmations,
        }
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("could not query chain id")
    }
}

#[async_trait::async_trait]
impl Network for Onchain {
    async fn contract_factory(&self, contract: &str) -> Result<ContractFactory> {
        self.artifacts.load(contract).await
    }

    async fn deploy(&self, contract: &str, creation_code: Bytes) -> Result<PendingContract> {
        let tx = TransactionRequest::default().with_deploy_code(creation_code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .with_context(|| format!("failed to submit creation transaction for {contract}"))?;
        Ok(PendingContract {
            contract: contract.to_string(),
            transaction_hash: *pending.tx_hash(),
        })
    }

    async fn wait_for_confirmation(&self, pending: &PendingContract) -> Result<Confirmation> {
        let receipt =
            PendingTransactionBuilder::new(self.provider.root().clone(), pending.transaction_hash)
                .with_required_confirmations(self.confirmations)
                .get_receipt()
                .await
                .context("failed to fetch receipt")?;
        deployment_confirmation(&pending.contract, &receipt)
    }

    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        let receipt = IERC20::new(token, self.provider.clone())
            .transfer(to, amount)
            .send()
            .await
            .context("failed to submit transfer")?
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .context("failed to fetch receipt")?;
        transfer_receipt(&receipt)
    }
}

/// A creation transaction only counts as deployed if it succeeded and
/// created a contract.
fn deployment_confirmation(contract: &str, receipt: &impl ReceiptResponse) -> Result<Confirmation> {
    ensure!(
        receipt.status(),
        "creation transaction {} of {contract} reverted",
        receipt.transaction_hash()
    );
    let address = receipt
        .contract_address()
        .context("receipt of a creation transaction has no contract address")?;
    Ok(Confirmation {
        address,
        transaction_hash: receipt.transaction_hash(),
        block_number: receipt.block_number(),
    })
}

fn transfer_receipt(receipt: &impl ReceiptResponse) -> Result<TransactionReceipt> {
    ensure!(
        receipt.status(),
        "transfer {} reverted",
        receipt.transaction_hash()
    );
    Ok(TransactionReceipt {
        transaction_hash: receipt.transaction_hash(),
        block_number: receipt.block_number(),
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{
            primitives::{B256, address},
            rpc::types::TransactionReceipt as RpcReceipt,
            sol_types::SolCall,
        },
        serde_json::json,
    };

    fn receipt(status: bool, contract_address: Option<Address>) -> RpcReceipt {
        let status = if status { "0x1" } else { "0x0" };
        serde_json::from_value(json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": B256::repeat_byte(0x11),
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x22),
            "blockNumber": "0x2a",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            "to": null,
            "contractAddress": contract_address,
        }))
        .unwrap()
    }

    #[test]
    fn successful_creation_is_confirmed_at_created_address() {
        let created = Address::repeat_byte(0xcc);
        let confirmation = deployment_confirmation("Usdc", &receipt(true, Some(created))).unwrap();
        assert_eq!(
            confirmation,
            Confirmation {
                address: created,
                transaction_hash: B256::repeat_byte(0x11),
                block_number: Some(42),
            }
        );
    }

    #[test]
    fn reverted_creation_is_an_error() {
        let err = deployment_confirmation("Usdc", &receipt(false, Some(Address::repeat_byte(0xcc))))
            .unwrap_err();
        assert!(err.to_string().contains("reverted"));
    }

    #[test]
    fn creation_without_contract_address_is_an_error() {
        assert!(deployment_confirmation("Usdc", &receipt(true, None)).is_err());
    }

    #[test]
    fn transfer_receipt_requires_success() {
        let ok = transfer_receipt(&receipt(true, None)).unwrap();
        assert_eq!(ok.transaction_hash, B256::repeat_byte(0x11));
        assert_eq!(ok.block_number, Some(42));
        assert!(transfer_receipt(&receipt(false, None)).is_err());
    }

    #[test]
    fn transfer_uses_erc20_selector() {
        let call = IERC20::transferCall {
            to: Address::repeat_byte(0xbb),
            amount: U256::from(1_000_000u64),
        };
        let data = call.abi_encode();
        assert_eq!(data[..4], [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 2 * 32);
        assert_eq!(U256::from_be_slice(&data[36..]), U256::from(1_000_000u64));
    }

    // Runs against a local development node, e.g. `anvil` or `npx hardhat
    // node`, listening on port 8545 with the default funded accounts.
    #[tokio::test]
    #[ignore]
    async fn local_node_deploys_and_confirms() {
        // Hardhat's first default account.
        let signer: PrivateKeySigner =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let deployer = signer.address();
        let onchain = Onchain::new(
            "http://127.0.0.1:8545".parse().unwrap(),
            signer,
            ArtifactStore::new("artifacts"),
            1,
        );
        assert_eq!(onchain.chain_id().await.unwrap(), 31337);

        // Init code returning a runtime that always returns 42.
        let runtime = const_hex::decode("602a60005260206000f3").unwrap();
        let mut creation_code = const_hex::decode("600a600c600039600a6000f3").unwrap();
        creation_code.extend_from_slice(&runtime);

        let nonce = onchain
            .provider
            .get_transaction_count(deployer)
            .await
            .unwrap();
        let pending = onchain
            .deploy("Answer", creation_code.into())
            .await
            .unwrap();
        let confirmation = onchain.wait_for_confirmation(&pending).await.unwrap();
        assert_eq!(confirmation.address, deployer.create(nonce));
        assert_eq!(confirmation.transaction_hash, pending.transaction_hash);
        assert!(confirmation.block_number.is_some());
        assert_eq!(
            onchain
                .provider
                .get_code_at(confirmation.address)
                .await
                .unwrap(),
            Bytes::from(runtime)
        );

        // Init code that reverts straight away. Depending on the node it is
        // rejected while estimating gas or mined as a failed transaction.
        let reverting = Bytes::from_static(&[0x60, 0x00, 0x60, 0x00, 0xfd]);
        let result = match onchain.deploy("Reverts", reverting).await {
            Ok(pending) => onchain.wait_for_confirmation(&pending).await.map(|_| ()),
            Err(err) => Err(err),
        };
        assert!(result.is_err());
    }
}

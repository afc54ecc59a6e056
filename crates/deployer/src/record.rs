use {
    alloy::primitives::{Address, TxHash},
    serde::{Deserialize, Serialize},
};

/// A constructor argument after references to other contracts have been
/// resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstructorArg {
    /// Address of a contract that was deployed or supplied earlier in the
    /// same run.
    Address(Address),
    /// Value as written in the plan, coerced to the ABI parameter type when
    /// the creation code is encoded.
    Literal(String),
}

/// Result of a deployment transaction being included on chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeploymentState {
    /// The creation transaction has been submitted but not yet confirmed.
    Pending { transaction_hash: TxHash },
    Confirmed(Confirmation),
    /// The contract was not deployed by this run, its address was supplied by
    /// the plan or taken from the manifest.
    Existing { address: Address },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub name: String,
    pub constructor_args: Vec<ConstructorArg>,
    pub state: DeploymentState,
}

impl DeploymentRecord {
    pub fn pending(
        name: impl Into<String>,
        constructor_args: Vec<ConstructorArg>,
        transaction_hash: TxHash,
    ) -> Self {
        Self {
            name: name.into(),
            constructor_args,
            state: DeploymentState::Pending { transaction_hash },
        }
    }

    pub fn existing(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            constructor_args: Vec::new(),
            state: DeploymentState::Existing { address },
        }
    }

    /// Moves a pending record to confirmed. Records can only be confirmed
    /// once; confirming a record in any other state leaves it untouched and
    /// returns `false`.
    pub fn confirm(&mut self, confirmation: Confirmation) -> bool {
        match self.state {
            DeploymentState::Pending { .. } => {
                self.state = DeploymentState::Confirmed(confirmation);
                true
            }
            _ => false,
        }
    }

    /// The on-chain address, `None` while the deployment is pending.
    pub fn address(&self) -> Option<Address> {
        match &self.state {
            DeploymentState::Pending { .. } => None,
            DeploymentState::Confirmed(confirmation) => Some(confirmation.address),
            DeploymentState::Existing { address } => Some(*address),
        }
    }

    pub fn transaction_hash(&self) -> Option<TxHash> {
        match &self.state {
            DeploymentState::Pending { transaction_hash } => Some(*transaction_hash),
            DeploymentState::Confirmed(confirmation) => Some(confirmation.transaction_hash),
            DeploymentState::Existing { .. } => None,
        }
    }

    pub fn block_number(&self) -> Option<u64> {
        match &self.state {
            DeploymentState::Confirmed(confirmation) => confirmation.block_number,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::B256};

    #[test]
    fn pending_record_is_confirmed_once() {
        let hash = B256::repeat_byte(1);
        let mut record = DeploymentRecord::pending("Usdc", vec![], hash);
        assert_eq!(record.address(), None);
        assert_eq!(record.transaction_hash(), Some(hash));

        let confirmation = Confirmation {
            address: Address::repeat_byte(2),
            transaction_hash: hash,
            block_number: Some(7),
        };
        assert!(record.confirm(confirmation));
        assert_eq!(record.address(), Some(Address::repeat_byte(2)));
        assert_eq!(record.block_number(), Some(7));

        let other = Confirmation {
            address: Address::repeat_byte(3),
            ..confirmation
        };
        assert!(!record.confirm(other));
        assert_eq!(record.address(), Some(Address::repeat_byte(2)));
    }

    #[test]
    fn existing_record_has_address_but_no_transaction() {
        let mut record = DeploymentRecord::existing("Usdc", Address::repeat_byte(4));
        assert_eq!(record.address(), Some(Address::repeat_byte(4)));
        assert_eq!(record.transaction_hash(), None);
        assert!(!record.confirm(Confirmation {
            address: Address::repeat_byte(5),
            transaction_hash: B256::ZERO,
            block_number: None,
        }));
    }

    #[test]
    fn constructor_args_serialize_tagged() {
        let args = vec![
            ConstructorArg::Address(Address::repeat_byte(0x11)),
            ConstructorArg::Literal("1000000".to_string()),
        ];
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "address": "0x1111111111111111111111111111111111111111" },
                { "literal": "1000000" },
            ])
        );
    }
}

//! Local transaction signing (EIP-155 legacy transactions)

use arena_core::{Address, U256};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Bytes, TransactionRequest, H160, U256 as EthU256};

use crate::error::ArenaError;

/// Fields of a transaction awaiting a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
    pub nonce: u64,
    pub gas: u64,
    pub gas_price: U256,
}

fn to_eth_u256(value: U256) -> EthU256 {
    EthU256::from_big_endian(&value.to_be_bytes::<32>())
}

/// Wallet bound to one chain id
#[derive(Debug, Clone)]
pub struct TxSigner {
    wallet: LocalWallet,
    address: Address,
}

impl TxSigner {
    /// Parse a hex private key (with or without `0x`)
    pub fn from_private_key(key: &str, chain_id: u64) -> Result<Self, ArenaError> {
        let wallet: LocalWallet = key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|_| ArenaError::InvalidArgument("private key is not a valid secp256k1 key".to_string()))?;
        let wallet = wallet.with_chain_id(chain_id);
        let address = Address::from_slice(wallet.address().as_bytes());
        Ok(Self { wallet, address })
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    /// RLP-encoded signed transaction, ready for `eth_sendRawTransaction`
    pub fn sign(&self, tx: &UnsignedTx) -> Result<Vec<u8>, ArenaError> {
        let request = TransactionRequest::new()
            .from(H160::from_slice(self.address.as_slice()))
            .to(H160::from_slice(tx.to.as_slice()))
            .data(Bytes::from(tx.data.clone()))
            .value(to_eth_u256(tx.value))
            .nonce(tx.nonce)
            .gas(tx.gas)
            .gas_price(to_eth_u256(tx.gas_price))
            .chain_id(self.chain_id());
        let typed: TypedTransaction = request.into();

        let signature = self
            .wallet
            .sign_transaction_sync(&typed)
            .map_err(|e| ArenaError::InvalidArgument(format!("signing failed: {}", e)))?;
        Ok(typed.rlp_signed(&signature).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Transaction;

    const ANVIL_KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn test_address_derivation() {
        let signer = TxSigner::from_private_key(ANVIL_KEY_0, 10143).unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
        assert_eq!(signer.chain_id(), 10143);

        let signer = TxSigner::from_private_key(ANVIL_KEY_1, 10143).unwrap();
        assert_eq!(
            signer.address(),
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_key() {
        let err = TxSigner::from_private_key("0x1234", 1).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(!err.to_string().contains("1234"));
    }

    #[test]
    fn test_signed_tx_recovers_sender() {
        let signer = TxSigner::from_private_key(ANVIL_KEY_0, 10143).unwrap();
        let raw = signer
            .sign(&UnsignedTx {
                to: Address::repeat_byte(0x33),
                data: vec![0xde, 0xad, 0xbe, 0xef],
                value: U256::from(5u64),
                nonce: 7,
                gas: 1_500_000,
                gas_price: U256::from(50_000_000_000u64),
            })
            .unwrap();

        let tx: Transaction = ethers::utils::rlp::decode(&raw).unwrap();
        assert_eq!(tx.nonce, EthU256::from(7u64));
        assert_eq!(tx.gas, EthU256::from(1_500_000u64));
        assert_eq!(tx.input.to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);
        let sender = tx.recover_from().unwrap();
        assert_eq!(sender.as_bytes(), signer.address().as_slice());
    }
}

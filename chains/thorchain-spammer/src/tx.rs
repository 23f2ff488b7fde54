//! Amino-JSON style transaction signing.

use crate::coins::Coin;
use crate::error::SendError;
use crate::msgs::Msg;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use core_logic::WalletError;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

const PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: String,
}

impl StdFee {
    pub fn gas_only(gas: u64) -> Self {
        Self {
            amount: Vec::new(),
            gas: gas.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKey {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    pub pub_key: PubKey,
    pub signature: String,
    pub account_number: String,
    pub sequence: String,
}

/// A signed transaction, ready for `POST /txs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdTx {
    pub msg: Vec<Msg>,
    pub fee: StdFee,
    pub signatures: Vec<StdSignature>,
    pub memo: String,
}

/// Everything that goes into the sign bytes besides the messages.
#[derive(Debug, Clone, Copy)]
pub struct SignMeta<'a> {
    pub chain_id: &'a str,
    pub account_number: u64,
    pub sequence: i64,
    pub fee: &'a StdFee,
    pub memo: &'a str,
}

pub struct TxSigner {
    secp: Secp256k1<All>,
    secret: SecretKey,
    public: PublicKey,
}

impl std::fmt::Debug for TxSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxSigner")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl TxSigner {
    /// Parses a 32 byte secp256k1 key given as hex, with or without `0x`.
    pub fn from_hex(key: &str) -> Result<Self, WalletError> {
        let trimmed = key.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed).map_err(|_| WalletError::InvalidKeyFormat)?;
        if bytes.len() != 32 {
            return Err(WalletError::InvalidKeyLength {
                length: trimmed.len(),
            });
        }

        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&bytes).map_err(|_| WalletError::InvalidKeyFormat)?;
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self {
            secp,
            secret,
            public,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Canonical sign bytes: a key-sorted JSON document.
    pub fn sign_bytes(msgs: &[Msg], meta: &SignMeta<'_>) -> Result<Vec<u8>, SendError> {
        // serde_json::Value keeps object keys sorted
        let doc = json!({
            "account_number": meta.account_number.to_string(),
            "chain_id": meta.chain_id,
            "fee": meta.fee,
            "memo": meta.memo,
            "msgs": msgs,
            "sequence": meta.sequence.to_string(),
        });
        serde_json::to_vec(&doc).map_err(|e| SendError::Encoding(e.to_string()))
    }

    pub fn sign(&self, msgs: Vec<Msg>, meta: &SignMeta<'_>) -> Result<StdTx, SendError> {
        if meta.sequence < 0 {
            return Err(SendError::Signing(format!(
                "refusing to sign with negative sequence {}",
                meta.sequence
            )));
        }

        let bytes = Self::sign_bytes(&msgs, meta)?;
        let digest: [u8; 32] = Sha256::digest(&bytes).into();
        let signature = self
            .secp
            .sign_ecdsa(&Message::from_digest(digest), &self.secret);

        Ok(StdTx {
            msg: msgs,
            fee: meta.fee.clone(),
            signatures: vec![StdSignature {
                pub_key: PubKey {
                    kind: PUBKEY_TYPE.to_string(),
                    value: STANDARD.encode(self.public.serialize()),
                },
                signature: STANDARD.encode(signature.serialize_compact()),
                account_number: meta.account_number.to_string(),
                sequence: meta.sequence.to_string(),
            }],
            memo: meta.memo.to_string(),
        })
    }
}

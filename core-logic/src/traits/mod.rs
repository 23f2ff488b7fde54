use crate::error::WalletError;
use crate::utils::wallet_manager::DecryptedKey;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpammerStats {
    pub success: u64,
    pub failed: u64,
    pub resyncs: u64,
}

impl SpammerStats {
    pub fn merge(&mut self, other: &SpammerStats) {
        self.success += other.success;
        self.failed += other.failed;
        self.resyncs += other.resyncs;
    }
}

#[async_trait]
pub trait Spammer: Send + Sync {
    /// Human readable label used in worker spans
    fn label(&self) -> &str;

    /// Run the send loop until the token is cancelled
    async fn start(
        &mut self,
        cancellation_token: tokio_util::sync::CancellationToken,
    ) -> Result<SpammerStats>;
}

/// A signing identity as listed by a keystore, without key material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub name: String,
    pub address: String,
}

#[async_trait]
pub trait Keystore: Send + Sync {
    /// All identities the keystore knows about, in a stable order.
    async fn list_identities(&self) -> Result<Vec<Identity>, WalletError>;

    /// Decrypt the private key of `name` with the shared password.
    async fn decrypt_key(&self, name: &str, password: &str)
        -> Result<Arc<DecryptedKey>, WalletError>;
}

#![allow(dead_code)]

use async_trait::async_trait;
use core_logic::traits::{Identity, Keystore};
use core_logic::{DecryptedKey, NetworkError, RateLimiter, SpamStats, WalletError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thorchain_spammer::{
    AccountState, ChainClient, Coin, Msg, SpamContext, StdTx, ThorConfig, TxReceipt,
};

pub const PASSWORD: &str = "correct horse";

/// In-memory chain that accepts a transaction only when its sequence
/// matches the sender's, like the real ante handler.
#[derive(Default)]
pub struct MockChain {
    accounts: Mutex<HashMap<String, AccountState>>,
    accepted: Mutex<Vec<StdTx>>,
    rejected: AtomicUsize,
    query_delay: Mutex<Duration>,
    failing_queries: Mutex<HashSet<usize>>,
    queries: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fund(&self, address: &str, coins: Vec<Coin>, sequence: i64) {
        let mut accounts = self.accounts.lock().unwrap();
        let account_number = accounts.len() as u64;
        accounts.insert(
            address.to_string(),
            AccountState {
                address: address.to_string(),
                coins,
                account_number,
                sequence,
            },
        );
    }

    /// Simulates transactions sent from the same account by someone else.
    pub fn set_sequence(&self, address: &str, sequence: i64) {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(address) {
            account.sequence = sequence;
        }
    }

    pub fn sequence(&self, address: &str) -> i64 {
        self.accounts.lock().unwrap()[address].sequence
    }

    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = delay;
    }

    /// Makes the `nth` account query from now on time out (1 is the next one).
    pub fn fail_query(&self, nth: usize) {
        let ordinal = self.queries() + nth;
        self.failing_queries.lock().unwrap().insert(ordinal);
    }

    pub fn accepted(&self) -> Vec<StdTx> {
        self.accepted.lock().unwrap().clone()
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn sender(tx: &StdTx) -> &str {
    match &tx.msg[0] {
        Msg::Send { from_address, .. } => from_address,
        Msg::Trade { sender, .. } => sender,
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_account(&self, address: &str) -> Result<AccountState, NetworkError> {
        let ordinal = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.query_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_queries.lock().unwrap().remove(&ordinal) {
            return Err(NetworkError::Timeout {
                timeout_ms: 10_000,
                endpoint: format!("auth/accounts/{}", address),
            });
        }

        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| NetworkError::AccountNotFound {
                address: address.to_string(),
            })
    }

    async fn submit(&self, tx: &StdTx) -> Result<TxReceipt, NetworkError> {
        let claimed: i64 = tx.signatures[0].sequence.parse().unwrap();
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(sender(tx))
            .ok_or_else(|| NetworkError::AccountNotFound {
                address: sender(tx).to_string(),
            })?;

        if account.sequence != claimed {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(NetworkError::SubmitRejected {
                code: 4,
                log: format!(
                    "signature verification failed: expected sequence {}, got {}",
                    account.sequence, claimed
                ),
            });
        }

        account.sequence += 1;
        let mut accepted = self.accepted.lock().unwrap();
        accepted.push(tx.clone());
        Ok(TxReceipt {
            hash: format!("{:064X}", accepted.len()),
        })
    }
}

#[derive(Default)]
pub struct MockKeystore {
    identities: Vec<Identity>,
    keys: HashMap<String, String>,
}

impl MockKeystore {
    pub fn add(&mut self, name: &str, address: &str, key_hex: String) {
        self.identities.push(Identity {
            name: name.to_string(),
            address: address.to_string(),
        });
        self.keys.insert(name.to_string(), key_hex);
    }
}

#[async_trait]
impl Keystore for MockKeystore {
    async fn list_identities(&self) -> Result<Vec<Identity>, WalletError> {
        Ok(self.identities.clone())
    }

    async fn decrypt_key(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Arc<DecryptedKey>, WalletError> {
        let key = self.keys.get(name).ok_or_else(|| WalletError::NotFound {
            name: name.to_string(),
            total: self.keys.len(),
        })?;
        if password != PASSWORD {
            return Err(WalletError::DecryptionFailed {
                name: name.to_string(),
                reason: "aead::Error".to_string(),
            });
        }
        Ok(Arc::new(DecryptedKey {
            private_key: key.clone(),
        }))
    }
}

/// A valid secp256k1 secret for test account `i`
pub fn key_hex(i: usize) -> String {
    format!("{:064x}", i + 1)
}

pub fn address(name: &str) -> String {
    format!("thor1{}", name)
}

/// Adds `name` to the keystore and funds it on the chain.
pub fn add_funded(
    chain: &MockChain,
    keystore: &mut MockKeystore,
    name: &str,
    coins: Vec<Coin>,
    sequence: i64,
) {
    let index = keystore.identities.len();
    keystore.add(name, &address(name), key_hex(index));
    chain.fund(&address(name), coins, sequence);
}

pub fn rune(amount: i64) -> Vec<Coin> {
    vec![Coin::new("RUNE", amount)]
}

pub fn test_config(rate_limit_ms: u64, resync_threshold: u64, block_time_ms: u64) -> ThorConfig {
    ThorConfig {
        chain_id: Some("thorchain-mocknet".to_string()),
        spam_password: Some(PASSWORD.to_string()),
        rate_limit_ms,
        resync_threshold,
        block_time_ms,
        ..ThorConfig::default()
    }
}

pub fn context(chain: &Arc<MockChain>, config: &ThorConfig) -> Arc<SpamContext> {
    let client: Arc<dyn ChainClient> = chain.clone();
    Arc::new(SpamContext::new(
        client,
        RateLimiter::from_millis(config.rate_limit_ms).unwrap(),
        Arc::new(SpamStats::new()),
    ))
}

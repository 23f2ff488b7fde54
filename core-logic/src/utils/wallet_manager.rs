use crate::error::WalletError;
use crate::security::{EncryptedComponents, SecurityUtils};
use crate::traits::{Identity, Keystore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DecryptedKey {
    /// Hex encoded secp256k1 secret key
    pub private_key: String,
}

impl fmt::Debug for DecryptedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedKey")
            .field("private_key", &"***REDACTED***")
            .finish()
    }
}

/// On-disk layout of one key file.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    name: String,
    address: String,
    encrypted: EncryptedComponents,
}

#[derive(Debug)]
struct KeyEntry {
    identity: Identity,
    path: PathBuf,
}

/// Directory-backed keystore: one encrypted JSON file per identity.
pub struct WalletManager {
    root: PathBuf,
    entries: Vec<KeyEntry>,
    cache: Mutex<HashMap<String, Arc<DecryptedKey>>>,
}

impl WalletManager {
    /// Scans `dir` for `*.json` key files. Files that cannot be parsed are
    /// skipped with a warning.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, WalletError> {
        let root = dir.as_ref().to_path_buf();
        let read = fs::read_dir(&root).map_err(|e| WalletError::KeystoreUnavailable {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = read
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::read_key_file(&path) {
                Ok(file) => entries.push(KeyEntry {
                    identity: Identity {
                        name: file.name,
                        address: file.address,
                    },
                    path,
                }),
                Err(e) => warn!("Skipping key file: {}", e),
            }
        }

        info!("Found {} key files in {:?}", entries.len(), root);

        Ok(Self {
            root,
            entries,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the number of available keys
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Encrypts `private_key_hex` and writes it as `<dir>/<name>.json`.
    /// The ciphertext is the bare hex key.
    pub fn write_key_file(
        dir: impl AsRef<Path>,
        name: &str,
        address: &str,
        private_key_hex: &str,
        password: &str,
    ) -> Result<PathBuf, WalletError> {
        let encrypted = SecurityUtils::encrypt_components(private_key_hex, password).map_err(|e| {
            WalletError::DecryptionFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        let file = KeyFile {
            name: name.to_string(),
            address: address.to_string(),
            encrypted,
        };
        let path = dir.as_ref().join(format!("{}.json", name));
        let body = serde_json::to_string_pretty(&file).map_err(|e| WalletError::MalformedKeystore {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, body).map_err(|e| WalletError::KeystoreUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }

    fn read_key_file(path: &Path) -> Result<KeyFile, WalletError> {
        let malformed = |reason: String| WalletError::MalformedKeystore {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))
    }

    fn entry(&self, name: &str) -> Result<&KeyEntry, WalletError> {
        self.entries
            .iter()
            .find(|e| e.identity.name == name)
            .ok_or_else(|| WalletError::NotFound {
                name: name.to_string(),
                total: self.entries.len(),
            })
    }
}

#[async_trait]
impl Keystore for WalletManager {
    async fn list_identities(&self) -> Result<Vec<Identity>, WalletError> {
        Ok(self.entries.iter().map(|e| e.identity.clone()).collect())
    }

    async fn decrypt_key(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Arc<DecryptedKey>, WalletError> {
        {
            let cache = self.cache.lock().await;
            if let Some(key) = cache.get(name) {
                return Ok(Arc::clone(key));
            }
        }

        let entry = self.entry(name)?;
        let file = Self::read_key_file(&entry.path)?;
        let failed = |reason: String| WalletError::DecryptionFailed {
            name: name.to_string(),
            reason,
        };

        let mut plaintext =
            SecurityUtils::decrypt(&file.encrypted, password).map_err(|e| failed(e.to_string()))?;
        let key = DecryptedKey {
            private_key: plaintext.trim().to_string(),
        };
        plaintext.zeroize();
        debug!("Decrypted key '{}'", name);

        let key = Arc::new(key);
        self.cache
            .lock()
            .await
            .insert(name.to_string(), Arc::clone(&key));
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_and_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        WalletManager::write_key_file(dir.path(), "spam1", "thor1aaa", "11".repeat(32).as_str(), "pw")
            .unwrap();
        WalletManager::write_key_file(dir.path(), "other", "thor1bbb", "22".repeat(32).as_str(), "pw")
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let manager = WalletManager::open(dir.path()).unwrap();
        assert_eq!(manager.count(), 2);

        let ids = manager.list_identities().await.unwrap();
        // sorted by file name
        assert_eq!(ids[0].name, "other");
        assert_eq!(ids[1].address, "thor1aaa");

        let key = manager.decrypt_key("spam1", "pw").await.unwrap();
        assert_eq!(key.private_key, "11".repeat(32));
        assert_eq!(format!("{:?}", key), "DecryptedKey { private_key: \"***REDACTED***\" }");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        WalletManager::write_key_file(dir.path(), "spam1", "thor1aaa", "ab", "pw").unwrap();
        let manager = WalletManager::open(dir.path()).unwrap();

        let err = manager.decrypt_key("spam1", "nope").await.unwrap_err();
        assert!(matches!(err, WalletError::DecryptionFailed { .. }));

        let err = manager.decrypt_key("ghost", "pw").await.unwrap_err();
        assert_eq!(
            err,
            WalletError::NotFound {
                name: "ghost".to_string(),
                total: 1
            }
        );
    }

    #[tokio::test]
    async fn test_plaintext_is_the_bare_hex_key() {
        let dir = tempfile::tempdir().unwrap();
        let key_hex = "11".repeat(32);
        let file = KeyFile {
            name: "spam1".to_string(),
            address: "thor1aaa".to_string(),
            encrypted: SecurityUtils::encrypt_components(&key_hex, "pw").unwrap(),
        };
        fs::write(
            dir.path().join("spam1.json"),
            serde_json::to_string(&file).unwrap(),
        )
        .unwrap();

        let manager = WalletManager::open(dir.path()).unwrap();
        let key = manager.decrypt_key("spam1", "pw").await.unwrap();
        assert_eq!(key.private_key, key_hex);

        // Files written by the manager use the same layout
        let written = WalletManager::write_key_file(dir.path(), "spam2", "thor1bbb", &key_hex, "pw")
            .unwrap();
        let raw: KeyFile = serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(SecurityUtils::decrypt(&raw.encrypted, "pw").unwrap(), key_hex);
    }

    #[test]
    fn test_malformed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let manager = WalletManager::open(dir.path()).unwrap();
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_missing_directory() {
        let err = WalletManager::open("/definitely/not/here").err().unwrap();
        assert!(matches!(err, WalletError::KeystoreUnavailable { .. }));
    }
}

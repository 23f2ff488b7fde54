use crate::error::SecurityError;
use aes_gcm::{
    aead::{Aead, NewAead}, // NewAead for 0.9/0.4
    Aes256Gcm,
    Nonce,
};
use serde::{Deserialize, Serialize};

const TAG_LEN: usize = 16;
const IV_LEN: usize = 12;
const SALT_LEN: usize = 16;

/// Hex-encoded pieces of an AES-256-GCM payload, as stored in key files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedComponents {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
    pub tag: String,
}

pub struct SecurityUtils;

impl SecurityUtils {
    pub fn decrypt_components(
        ciphertext_hex: &str,
        iv_hex: &str,
        salt_hex: &str,
        tag_hex: &str,
        password: &str,
    ) -> Result<String, SecurityError> {
        let ciphertext = decode_hex("ciphertext", ciphertext_hex)?;
        let iv = decode_hex("iv", iv_hex)?;
        let salt = decode_hex("salt", salt_hex)?;
        let mut tag = decode_hex("tag", tag_hex)?;

        if iv.len() != IV_LEN {
            return Err(crypto_failed(format!(
                "iv must be {} bytes, got {}",
                IV_LEN,
                iv.len()
            )));
        }

        let key = Self::derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new(&key.into());
        let nonce = Nonce::from_slice(&iv);

        let mut full_payload = ciphertext;
        full_payload.append(&mut tag);

        let plaintext = cipher
            .decrypt(nonce, full_payload.as_ref())
            .map_err(|_| crypto_failed("wrong password or corrupted payload"))?;

        String::from_utf8(plaintext).map_err(|_| crypto_failed("plaintext is not valid UTF-8"))
    }

    pub fn decrypt(components: &EncryptedComponents, password: &str) -> Result<String, SecurityError> {
        Self::decrypt_components(
            &components.ciphertext,
            &components.iv,
            &components.salt,
            &components.tag,
            password,
        )
    }

    /// Encrypts `plaintext` with a fresh random salt and IV.
    pub fn encrypt_components(
        plaintext: &str,
        password: &str,
    ) -> Result<EncryptedComponents, SecurityError> {
        if password.is_empty() {
            return Err(SecurityError::PasswordRequired);
        }

        let salt: [u8; SALT_LEN] = rand::random();
        let iv: [u8; IV_LEN] = rand::random();

        let key = Self::derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new(&key.into());

        let mut sealed = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| crypto_failed(format!("encryption failed: {}", e)))?;
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(EncryptedComponents {
            ciphertext: hex::encode(sealed),
            iv: hex::encode(iv),
            salt: hex::encode(salt),
            tag: hex::encode(tag),
        })
    }

    // Scrypt with N=16384, r=8, p=1 (same as Node.js crypto.scryptSync defaults)
    fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32], SecurityError> {
        let params = scrypt::Params::new(14, 8, 1, 32)
            .map_err(|e| crypto_failed(format!("invalid scrypt params: {}", e)))?;
        let mut key = [0u8; 32];
        scrypt::scrypt(password.as_bytes(), salt, &params, &mut key)
            .map_err(|e| crypto_failed(format!("scrypt failed: {}", e)))?;
        Ok(key)
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, SecurityError> {
    hex::decode(value).map_err(|e| crypto_failed(format!("invalid {} hex: {}", field, e)))
}

fn crypto_failed(reason: impl Into<String>) -> SecurityError {
    SecurityError::CryptographyFailed {
        reason: reason.into(),
    }
}

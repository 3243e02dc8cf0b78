//! Symmetric sealing for per-site relay credentials.
//!
//! The Telegram bot token is stored only in sealed form. The sealing key is
//! derived from the server-wide secret plus a fixed context string, and the
//! output carries a version tag so the scheme can be re-keyed later:
//! `v1:<nonce b64>:<ciphertext b64>`.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

const VERSION_V1: &str = "v1";
const KEY_CONTEXT: &str = "quill.telegram.bot-token";
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum SecretboxError {
    #[error("malformed sealed value")]
    Malformed,
    #[error("unsupported seal version: {0}")]
    UnsupportedVersion(String),
    #[error("decryption failed")]
    Decrypt,
    #[error("encryption failed")]
    Encrypt,
}

fn derive_key(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(KEY_CONTEXT.as_bytes());
    hasher.finalize().into()
}

pub fn seal(secret: &str, plaintext: &str) -> Result<String, SecretboxError> {
    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| SecretboxError::Encrypt)?;

    Ok(format!(
        "{VERSION_V1}:{}:{}",
        BASE64.encode(nonce_bytes),
        BASE64.encode(ciphertext)
    ))
}

pub fn open(secret: &str, sealed: &str) -> Result<String, SecretboxError> {
    let mut parts = sealed.splitn(3, ':');
    let version = parts.next().ok_or(SecretboxError::Malformed)?;
    let nonce_b64 = parts.next().ok_or(SecretboxError::Malformed)?;
    let ciphertext_b64 = parts.next().ok_or(SecretboxError::Malformed)?;

    if version != VERSION_V1 {
        return Err(SecretboxError::UnsupportedVersion(version.to_string()));
    }

    let nonce_bytes = BASE64
        .decode(nonce_b64)
        .map_err(|_| SecretboxError::Malformed)?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(SecretboxError::Malformed);
    }
    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|_| SecretboxError::Malformed)?;

    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| SecretboxError::Decrypt)?;

    String::from_utf8(plaintext).map_err(|_| SecretboxError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let sealed = seal("server-secret", "123456:bot-token-value").unwrap();
        let opened = open("server-secret", &sealed).unwrap();
        assert_eq!(opened, "123456:bot-token-value");
    }

    #[test]
    fn test_sealed_format_versioned() {
        let sealed = seal("server-secret", "token").unwrap();
        assert!(sealed.starts_with("v1:"));
        assert_eq!(sealed.split(':').count(), 3);
    }

    #[test]
    fn test_nonce_randomized_per_seal() {
        let a = seal("server-secret", "token").unwrap();
        let b = seal("server-secret", "token").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sealed = seal("secret-a", "token").unwrap();
        assert!(matches!(
            open("secret-b", &sealed),
            Err(SecretboxError::Decrypt)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let sealed = seal("server-secret", "token").unwrap();
        let mut parts: Vec<String> = sealed.split(':').map(String::from).collect();
        parts[2] = BASE64.encode(b"garbage-ciphertext");
        assert!(open("server-secret", &parts.join(":")).is_err());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let sealed = seal("server-secret", "token").unwrap();
        let rekeyed = sealed.replacen("v1:", "v9:", 1);
        assert!(matches!(
            open("server-secret", &rekeyed),
            Err(SecretboxError::UnsupportedVersion(v)) if v == "v9"
        ));
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(matches!(open("s", "v1:only-two"), Err(SecretboxError::Malformed)));
        assert!(matches!(open("s", "not sealed"), Err(SecretboxError::Malformed)));
        assert!(matches!(open("s", "v1:!!!:!!!"), Err(SecretboxError::Malformed)));
    }
}

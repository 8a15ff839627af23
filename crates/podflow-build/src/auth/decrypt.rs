//! 認証情報の復号
//!
//! settings.yaml のパスワードは `{...}` で囲まれていれば暗号化されています。
//! 中身は `nonce(12 bytes) || ciphertext` の Base64 で、AES-256-GCM の
//! マスターキー（32 bytes、Base64）で復号します。囲まれていない値は平文です。

use aes_gcm::aead::{Aead, AeadCore, OsRng};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use podflow_config::{ProxyEntry, ServerEntry};
use thiserror::Error;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// 復号リクエスト。proxies は空でも必ず渡す
#[derive(Debug, Clone, Default)]
pub struct DecryptionRequest {
    pub servers: Vec<ServerEntry>,
    pub proxies: Vec<ProxyEntry>,
}

/// 復号済みのコピー
#[derive(Debug, Clone, Default)]
pub struct DecryptionResult {
    pub servers: Vec<ServerEntry>,
    pub proxies: Vec<ProxyEntry>,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecryptError(String);

/// 復号を担当するコラボレータ
pub trait SettingsDecrypter {
    fn decrypt(&self, request: DecryptionRequest) -> Result<DecryptionResult, DecryptError>;
}

/// 値が暗号化されているか
pub fn is_encrypted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('{') && value.ends_with('}')
}

/// AES-256-GCM による復号
pub struct AesGcmDecrypter {
    key: Option<[u8; KEY_SIZE]>,
}

impl AesGcmDecrypter {
    /// Base64 のマスターキーから作成。None なら平文のみ扱える
    pub fn new(master_key: Option<&str>) -> Result<Self, DecryptError> {
        let key = match master_key {
            Some(encoded) => Some(decode_key(encoded)?),
            None => None,
        };
        Ok(Self { key })
    }

    fn cipher(&self) -> Result<Aes256Gcm, DecryptError> {
        let key = self.key.as_ref().ok_or_else(|| {
            DecryptError(
                "encrypted value found but no master key is configured (PODFLOW_MASTER_KEY)"
                    .to_string(),
            )
        })?;
        Aes256Gcm::new_from_slice(key)
            .map_err(|e| DecryptError(format!("cipher init failed: {}", e)))
    }

    /// 1 つの値を復号。暗号化されていなければそのまま返す
    pub fn decrypt_value(&self, value: &str) -> Result<String, DecryptError> {
        if !is_encrypted(value) {
            return Ok(value.to_string());
        }

        let payload = STANDARD
            .decode(&value[1..value.len() - 1])
            .map_err(|e| DecryptError(format!("invalid base64: {}", e)))?;
        if payload.len() <= NONCE_SIZE {
            return Err(DecryptError("encrypted value is too short".to_string()));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DecryptError("decryption failed (wrong master key?)".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| DecryptError(format!("invalid UTF-8 in decrypted value: {}", e)))
    }

    /// 値を暗号化して `{...}` 形式で返す
    pub fn encrypt_value(&self, plaintext: &str) -> Result<String, DecryptError> {
        let cipher = self.cipher()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| DecryptError(format!("encryption failed: {}", e)))?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(format!("{{{}}}", STANDARD.encode(payload)))
    }

    fn decrypt_option(&self, value: &Option<String>) -> Result<Option<String>, DecryptError> {
        value.as_deref().map(|v| self.decrypt_value(v)).transpose()
    }
}

impl SettingsDecrypter for AesGcmDecrypter {
    fn decrypt(&self, request: DecryptionRequest) -> Result<DecryptionResult, DecryptError> {
        let servers = request
            .servers
            .into_iter()
            .map(|server| {
                Ok(ServerEntry {
                    password: self.decrypt_option(&server.password)?,
                    passphrase: self.decrypt_option(&server.passphrase)?,
                    ..server
                })
            })
            .collect::<Result<Vec<_>, DecryptError>>()?;

        let proxies = request
            .proxies
            .into_iter()
            .map(|proxy| {
                Ok(ProxyEntry {
                    password: self.decrypt_option(&proxy.password)?,
                    ..proxy
                })
            })
            .collect::<Result<Vec<_>, DecryptError>>()?;

        Ok(DecryptionResult { servers, proxies })
    }
}

fn decode_key(encoded: &str) -> Result<[u8; KEY_SIZE], DecryptError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| DecryptError(format!("invalid master key: {}", e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        DecryptError(format!(
            "master key must be {} bytes, got {}",
            KEY_SIZE,
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master_key() -> String {
        STANDARD.encode([7u8; KEY_SIZE])
    }

    fn server(password: &str) -> ServerEntry {
        ServerEntry {
            id: "registry.example.com".to_string(),
            username: Some("builder".to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_encrypted() {
        assert!(is_encrypted("{abc}"));
        assert!(!is_encrypted("abc"));
        assert!(!is_encrypted("{"));
        assert!(!is_encrypted("{abc"));
    }

    #[test]
    fn test_plaintext_passes_through_without_key() {
        let decrypter = AesGcmDecrypter::new(None).unwrap();
        let result = decrypter
            .decrypt(DecryptionRequest {
                servers: vec![server("plain")],
                proxies: vec![],
            })
            .unwrap();
        assert_eq!(result.servers[0].password.as_deref(), Some("plain"));
        assert_eq!(result.servers[0].username.as_deref(), Some("builder"));
    }

    #[test]
    fn test_encrypted_value_is_decrypted() {
        let key = master_key();
        let decrypter = AesGcmDecrypter::new(Some(&key)).unwrap();
        let encrypted = decrypter.encrypt_value("s3cret").unwrap();
        assert!(is_encrypted(&encrypted));

        let proxy = ProxyEntry {
            id: "corp".to_string(),
            active: true,
            protocol: "http".to_string(),
            host: "proxy.example.com".to_string(),
            port: 3128,
            username: Some("proxy-user".to_string()),
            password: Some(encrypted.clone()),
            non_proxy_hosts: None,
        };

        let result = decrypter
            .decrypt(DecryptionRequest {
                servers: vec![server(&encrypted)],
                proxies: vec![proxy],
            })
            .unwrap();
        assert_eq!(result.servers[0].password.as_deref(), Some("s3cret"));
        assert_eq!(result.proxies[0].password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_encrypted_value_without_key_fails() {
        let with_key = AesGcmDecrypter::new(Some(&master_key())).unwrap();
        let encrypted = with_key.encrypt_value("s3cret").unwrap();

        let without_key = AesGcmDecrypter::new(None).unwrap();
        let err = without_key.decrypt_value(&encrypted).unwrap_err();
        assert!(err.to_string().contains("master key"));
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = AesGcmDecrypter::new(Some(&master_key()))
            .unwrap()
            .encrypt_value("s3cret")
            .unwrap();
        let other = AesGcmDecrypter::new(Some(&STANDARD.encode([9u8; KEY_SIZE]))).unwrap();
        assert!(other.decrypt_value(&encrypted).is_err());
    }

    #[test]
    fn test_invalid_master_key() {
        assert!(AesGcmDecrypter::new(Some("not base64!")).is_err());
        assert!(AesGcmDecrypter::new(Some(&STANDARD.encode([1u8; 16]))).is_err());
    }
}

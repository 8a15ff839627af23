//! レジストリ名から認証情報を解決

use super::decrypt::{DecryptionRequest, SettingsDecrypter};
use crate::error::AuthError;
use podflow_config::{ProxyEntry, ServerEntry, Settings};
use tracing::debug;

/// 認証情報ストア
pub trait CredentialStore {
    /// ID が完全一致するサーバー
    fn server(&self, id: &str) -> Option<&ServerEntry>;

    fn servers(&self) -> &[ServerEntry];

    fn proxies(&self) -> &[ProxyEntry];
}

impl CredentialStore for Settings {
    fn server(&self, id: &str) -> Option<&ServerEntry> {
        Settings::server(self, id)
    }

    fn servers(&self) -> &[ServerEntry] {
        &self.servers
    }

    fn proxies(&self) -> &[ProxyEntry] {
        &self.proxies
    }
}

/// 1 回の認証パスの間だけ使う認証情報
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub registry: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("registry", &self.registry)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// ストアと復号コラボレータから認証情報を取り出す
pub struct CredentialResolver<'a> {
    store: &'a dyn CredentialStore,
    decrypter: &'a dyn SettingsDecrypter,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(store: &'a dyn CredentialStore, decrypter: &'a dyn SettingsDecrypter) -> Self {
        Self { store, decrypter }
    }

    /// レジストリ名と ID が一致するサーバーの認証情報を返す
    ///
    /// ユーザー名・パスワードのどちらかが欠けていれば
    /// [`AuthError::CredentialNotFound`]。部分的な結果は返さない。
    pub fn resolve(&self, registry: &str) -> Result<CredentialRecord, AuthError> {
        let not_found = || AuthError::CredentialNotFound {
            registry: registry.to_string(),
        };

        let Some(server) = self.store.server(registry) else {
            debug!(
                known_ids = ?self.store.servers().iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
                "No server entry with id {}",
                registry
            );
            return Err(not_found());
        };

        let request = DecryptionRequest {
            servers: vec![server.clone()],
            proxies: self.store.proxies().to_vec(),
        };
        let result = self
            .decrypter
            .decrypt(request)
            .map_err(|e| AuthError::Decryption {
                registry: registry.to_string(),
                message: e.to_string(),
            })?;

        let decrypted = result
            .servers
            .into_iter()
            .find(|s| s.id == registry)
            .ok_or_else(not_found)?;

        match (non_blank(decrypted.username), non_blank(decrypted.password)) {
            (Some(username), Some(password)) => Ok(CredentialRecord {
                registry: registry.to_string(),
                username,
                password,
            }),
            _ => {
                debug!("Server entry {} has no username or password", registry);
                Err(not_found())
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::decrypt::{AesGcmDecrypter, DecryptError, DecryptionResult};
    use std::cell::RefCell;

    fn settings(yaml: &str) -> Settings {
        serde_yaml::from_str(yaml).unwrap()
    }

    /// 受け取ったリクエストを記録し、そのまま返す
    #[derive(Default)]
    struct RecordingDecrypter {
        requests: RefCell<Vec<DecryptionRequest>>,
    }

    impl SettingsDecrypter for RecordingDecrypter {
        fn decrypt(&self, request: DecryptionRequest) -> Result<DecryptionResult, DecryptError> {
            self.requests.borrow_mut().push(request.clone());
            Ok(DecryptionResult {
                servers: request.servers,
                proxies: request.proxies,
            })
        }
    }

    #[test]
    fn test_resolve_plain_credentials() {
        let store = settings(
            "servers:\n  - id: x.example.com\n    username: u\n    password: p\n",
        );
        let decrypter = AesGcmDecrypter::new(None).unwrap();
        let record = CredentialResolver::new(&store, &decrypter)
            .resolve("x.example.com")
            .unwrap();

        assert_eq!(record.registry, "x.example.com");
        assert_eq!(record.username, "u");
        assert_eq!(record.password, "p");
        assert!(!format!("{:?}", record).contains("\"p\""));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let store = settings(
            "servers:\n  - id: x.example.com\n    username: u\n    password: p\n",
        );
        let decrypter = AesGcmDecrypter::new(None).unwrap();
        let resolver = CredentialResolver::new(&store, &decrypter);

        assert_eq!(
            resolver.resolve("x.example.com").unwrap(),
            resolver.resolve("x.example.com").unwrap()
        );
    }

    #[test]
    fn test_no_partial_matching() {
        let store = settings(
            "servers:\n  - id: registry.example.com\n    username: u\n    password: p\n",
        );
        let decrypter = AesGcmDecrypter::new(None).unwrap();
        let resolver = CredentialResolver::new(&store, &decrypter);

        for registry in ["registry.example", "REGISTRY.EXAMPLE.COM", "registry.example.com:443"] {
            assert!(matches!(
                resolver.resolve(registry),
                Err(AuthError::CredentialNotFound { .. })
            ));
        }
    }

    #[test]
    fn test_missing_password_is_not_found() {
        let store = settings(
            "servers:\n  - id: a.example.com\n    username: u\n  - id: b.example.com\n    username: '  '\n    password: p\n",
        );
        let decrypter = AesGcmDecrypter::new(None).unwrap();
        let resolver = CredentialResolver::new(&store, &decrypter);

        match resolver.resolve("a.example.com") {
            Err(AuthError::CredentialNotFound { registry }) => assert_eq!(registry, "a.example.com"),
            other => panic!("Expected CredentialNotFound, got {:?}", other),
        }
        assert!(matches!(
            resolver.resolve("b.example.com"),
            Err(AuthError::CredentialNotFound { .. })
        ));
    }

    #[test]
    fn test_request_includes_proxies() {
        let store = settings(
            r#"
servers:
  - id: x.example.com
    username: u
    password: p
  - id: y.example.com
    username: v
    password: q
proxies:
  - id: corp
    host: proxy.example.com
"#,
        );
        let decrypter = RecordingDecrypter::default();
        CredentialResolver::new(&store, &decrypter)
            .resolve("x.example.com")
            .unwrap();

        let requests = decrypter.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].servers.len(), 1);
        assert_eq!(requests[0].servers[0].id, "x.example.com");
        assert_eq!(requests[0].proxies.len(), 1);
    }

    #[test]
    fn test_request_with_empty_proxies() {
        let store = settings("servers:\n  - id: x.example.com\n    username: u\n    password: p\n");
        let decrypter = RecordingDecrypter::default();
        CredentialResolver::new(&store, &decrypter)
            .resolve("x.example.com")
            .unwrap();

        assert!(decrypter.requests.borrow()[0].proxies.is_empty());
    }

    #[test]
    fn test_decryption_failure() {
        let store = settings(
            "servers:\n  - id: x.example.com\n    username: u\n    password: '{AAAAAAAAAAAAAAAAAAAAAAAA}'\n",
        );
        let decrypter = AesGcmDecrypter::new(None).unwrap();
        assert!(matches!(
            CredentialResolver::new(&store, &decrypter).resolve("x.example.com"),
            Err(AuthError::Decryption { .. })
        ));
    }
}

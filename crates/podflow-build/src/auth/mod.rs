//! レジストリ認証処理
//!
//! 既存の認証ファイル（REGISTRY_AUTH_FILE → ${XDG_RUNTIME_DIR}/containers/auth.json
//! → ~/.docker/config.json）から認証済みレジストリを調べ、未認証のものだけ
//! settings.yaml の認証情報でログインします。

pub mod coordinator;
pub mod credentials;
pub mod decrypt;
pub mod env;
pub mod locator;
pub mod login;
pub mod parser;

pub use coordinator::{AuthReport, Authenticator};
pub use credentials::{CredentialRecord, CredentialResolver, CredentialStore};
pub use decrypt::{
    AesGcmDecrypter, DecryptError, DecryptionRequest, DecryptionResult, SettingsDecrypter,
};
pub use env::{Env, StaticEnv, SystemEnv};
pub use locator::{AuthFileCandidate, AuthFileLocator, AuthFileSource};
pub use login::{LoginOrchestrator, RegistryLogin};
pub use parser::parse_auth_file;

//! レジストリへのログイン

use super::credentials::CredentialRecord;
use crate::error::{AuthError, CommandError};
use tracing::info;

/// ログイン処理の委譲先（通常は podman login）
pub trait RegistryLogin {
    fn login(&self, registry: &str, username: &str, password: &str) -> Result<(), CommandError>;
}

/// 解決済みの認証情報でログインする
///
/// 失敗はリトライせずそのまま返す。
pub struct LoginOrchestrator<'a> {
    delegate: &'a dyn RegistryLogin,
}

impl<'a> LoginOrchestrator<'a> {
    pub fn new(delegate: &'a dyn RegistryLogin) -> Self {
        Self { delegate }
    }

    pub fn login(&self, record: &CredentialRecord) -> Result<(), AuthError> {
        self.delegate
            .login(&record.registry, &record.username, &record.password)
            .map_err(|source| AuthError::LoginFailed {
                registry: record.registry.clone(),
                source,
            })?;
        info!("Logged in to {} as {}", record.registry, record.username);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// 呼び出しを記録するログイン
    #[derive(Default)]
    pub(crate) struct RecordingLogin {
        pub calls: RefCell<Vec<(String, String, String)>>,
        /// このレジストリへのログインを失敗させる
        pub fail_for: Option<String>,
    }

    impl RecordingLogin {
        pub fn failing_for(registry: &str) -> Self {
            Self {
                fail_for: Some(registry.to_string()),
                ..Default::default()
            }
        }

        pub fn registries(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.0.clone()).collect()
        }
    }

    impl RegistryLogin for RecordingLogin {
        fn login(&self, registry: &str, username: &str, password: &str) -> Result<(), CommandError> {
            self.calls.borrow_mut().push((
                registry.to_string(),
                username.to_string(),
                password.to_string(),
            ));
            if self.fail_for.as_deref() == Some(registry) {
                return Err(CommandError::Failed {
                    command: format!("podman login {}", registry),
                    exit_code: 125,
                    stderr: "unauthorized: authentication required".to_string(),
                });
            }
            Ok(())
        }
    }
}

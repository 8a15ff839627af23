//! 認証パス全体の制御
//!
//! 入力チェック → 認証ファイル探索 → 解析 → 差分 → 解決とログイン、の順に
//! 1 回だけ実行します。どこかで失敗すればその時点で中断し、
//! 残りのレジストリは試しません。

use super::credentials::{CredentialResolver, CredentialStore};
use super::decrypt::SettingsDecrypter;
use super::env::Env;
use super::locator::AuthFileLocator;
use super::login::{LoginOrchestrator, RegistryLogin};
use super::parser::parse_auth_file;
use crate::error::AuthError;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// 認証パスの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthReport {
    /// 参照した認証ファイル（無ければ None）
    pub auth_file: Option<PathBuf>,
    /// 既に認証済みだったレジストリ（要求順）
    pub already_authenticated: Vec<String>,
    /// 今回ログインしたレジストリ（要求順）
    pub logged_in: Vec<String>,
}

/// レジストリ認証のファサード
///
/// 1 回の `authenticate` で消費される。
pub struct Authenticator<'a> {
    env: &'a dyn Env,
    store: &'a dyn CredentialStore,
    decrypter: &'a dyn SettingsDecrypter,
    login: &'a dyn RegistryLogin,
}

impl<'a> Authenticator<'a> {
    pub fn new(
        env: &'a dyn Env,
        store: &'a dyn CredentialStore,
        decrypter: &'a dyn SettingsDecrypter,
        login: &'a dyn RegistryLogin,
    ) -> Self {
        Self {
            env,
            store,
            decrypter,
            login,
        }
    }

    /// 未認証のレジストリにログインする
    ///
    /// `registries` が None または空なら [`AuthError::NoRegistriesConfigured`]。
    pub fn authenticate(self, registries: Option<&[String]>) -> Result<AuthReport, AuthError> {
        info!("Checking authentication status...");

        let registries = match registries {
            Some(registries) if !registries.is_empty() => registries,
            _ => {
                error!(
                    "No registries have been configured but authentication is not skipped. \
                     If you want to skip authentication, run again with 'skip.auth' set to true"
                );
                return Err(AuthError::NoRegistriesConfigured);
            }
        };

        let auth_file = AuthFileLocator::new(self.env).locate();
        let authenticated = match &auth_file {
            Some(path) => self.read_authenticated(path)?,
            None => {
                info!("Authentication file not (yet) present. Authenticating...");
                BTreeSet::new()
            }
        };

        debug!("Checking unauthenticated registries...");
        let (already_authenticated, unauthenticated) = diff(registries, &authenticated);

        let mut report = AuthReport {
            auth_file,
            already_authenticated,
            logged_in: Vec::new(),
        };

        if unauthenticated.is_empty() {
            info!("All registries are already authenticated");
            return Ok(report);
        }

        info!(
            "Authenticating registries: {}",
            unauthenticated.join(", ")
        );

        let resolver = CredentialResolver::new(self.store, self.decrypter);
        let orchestrator = LoginOrchestrator::new(self.login);
        for registry in unauthenticated {
            debug!("Authenticating {}", registry);
            let record = resolver.resolve(&registry).inspect_err(|e| error!("{}", e))?;
            orchestrator.login(&record).inspect_err(|e| error!("{}", e))?;
            report.logged_in.push(registry);
        }

        Ok(report)
    }

    fn read_authenticated(&self, path: &Path) -> Result<BTreeSet<String>, AuthError> {
        let authenticated = parse_auth_file(path).inspect_err(|e| {
            error!("Failed to parse registry authentication file: {}", e);
        })?;

        if authenticated.is_empty() {
            debug!("No authenticated registries were found.");
        } else {
            debug!(
                "Authenticated registries found: {}",
                authenticated
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(authenticated)
    }
}

/// 要求順を保ったまま、認証済み・未認証に分ける（重複は最初のみ）
fn diff(registries: &[String], authenticated: &BTreeSet<String>) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    registries
        .iter()
        .filter(|r| seen.insert(r.as_str()))
        .cloned()
        .partition(|r| authenticated.contains(r))
}

//! 認証情報ストア（settings.yaml）
//!
//! レジストリ ID ごとのユーザー名・パスワードとプロキシ設定を保持します。
//! パスワードは `{...}` 形式で暗号化されている場合があり、復号は
//! 呼び出し側（podflow-build の decrypter）が担当します。

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// settings.yaml の内容
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub servers: Vec<ServerEntry>,

    #[serde(default)]
    pub proxies: Vec<ProxyEntry>,
}

/// サーバー（レジストリ）ごとの認証情報
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerEntry {
    /// レジストリ名と一致させる ID
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub passphrase: Option<String>,
    #[serde(default)]
    pub private_key: Option<PathBuf>,
}

// パスワードはログに出さない
impl std::fmt::Debug for ServerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerEntry")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .field("private_key", &self.private_key)
            .finish()
    }
}

/// プロキシ設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyEntry {
    pub id: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub non_proxy_hosts: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Settings {
    /// settings.yaml を読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// ID が完全一致するサーバーを取得
    pub fn server(&self, id: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.id == id)
    }
}

/// settings.yaml を探して読み込む
///
/// 1. 引数で明示されたパス（存在しなければエラー）
/// 2. 環境変数 PODFLOW_SETTINGS
/// 3. ~/.config/podflow/settings.yaml
///
/// 2, 3 が見つからない場合は空の Settings を返します。
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        tracing::debug!("Loading settings from {}", path.display());
        return Settings::load(path);
    }

    match find_settings_file() {
        Some(path) => {
            tracing::debug!("Loading settings from {}", path.display());
            Settings::load(&path)
        }
        None => {
            tracing::debug!("No settings file found, continuing without stored credentials");
            Ok(Settings::default())
        }
    }
}

/// settings.yaml の場所を探す
pub fn find_settings_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PODFLOW_SETTINGS") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    crate::config_home()
        .map(|dir| dir.join("settings.yaml"))
        .filter(|path| path.exists())
}

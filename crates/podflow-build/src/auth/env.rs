//! 環境変数・ホームディレクトリへのアクセス
//!
//! 認証ファイルの探索はプロセス環境に依存するため、テストでは
//! [`StaticEnv`] を注入して実際の環境を変更せずに済むようにしています。

use std::collections::HashMap;
use std::path::PathBuf;

/// 環境の参照
pub trait Env {
    /// 環境変数の値。未設定または空文字列なら None
    fn var(&self, key: &str) -> Option<String>;

    /// ユーザーのホームディレクトリ
    fn home_dir(&self) -> Option<PathBuf>;
}

/// 実際のプロセス環境
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Env for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// 固定値の環境
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_env() {
        let env = StaticEnv::new()
            .with_var("XDG_RUNTIME_DIR", "/run/user/1000")
            .with_var("REGISTRY_AUTH_FILE", "")
            .with_home("/home/builder");

        assert_eq!(env.var("XDG_RUNTIME_DIR").as_deref(), Some("/run/user/1000"));
        // 空文字列は未設定扱い
        assert_eq!(env.var("REGISTRY_AUTH_FILE"), None);
        assert_eq!(env.var("HOME"), None);
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/builder")));
    }
}

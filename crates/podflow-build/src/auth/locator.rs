//! 認証ファイルの探索
//!
//! 以下の優先順位で最初に存在するファイルを使用:
//! 1. 環境変数 REGISTRY_AUTH_FILE（設定されていればこれ以外は見ない）
//! 2. ${XDG_RUNTIME_DIR}/containers/auth.json
//! 3. ~/.docker/config.json

use super::env::Env;
use std::path::PathBuf;
use tracing::debug;

/// 認証ファイルを直接指定する環境変数
pub const REGISTRY_AUTH_FILE: &str = "REGISTRY_AUTH_FILE";

/// ランタイムディレクトリを示す環境変数
pub const XDG_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";

/// 認証ファイル候補の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFileSource {
    /// REGISTRY_AUTH_FILE
    ExplicitEnvOverride,
    /// ${XDG_RUNTIME_DIR}/containers/auth.json
    RuntimeDirDefault,
    /// ~/.docker/config.json
    BuildToolConfigFallback,
}

impl AuthFileSource {
    fn label(&self) -> &'static str {
        match self {
            AuthFileSource::ExplicitEnvOverride => "custom",
            AuthFileSource::RuntimeDirDefault => "default",
            AuthFileSource::BuildToolConfigFallback => "Docker",
        }
    }
}

/// 認証ファイル候補
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFileCandidate {
    pub source: AuthFileSource,
    pub path: PathBuf,
}

/// 認証ファイルを探す
pub struct AuthFileLocator<'a> {
    env: &'a dyn Env,
}

impl<'a> AuthFileLocator<'a> {
    pub fn new(env: &'a dyn Env) -> Self {
        Self { env }
    }

    /// 評価順の候補一覧
    ///
    /// REGISTRY_AUTH_FILE が設定されていればその 1 件のみ。
    pub fn candidates(&self) -> Vec<AuthFileCandidate> {
        if let Some(candidate) = self.explicit_override() {
            return vec![candidate];
        }

        [self.runtime_dir_default(), self.docker_config()]
            .into_iter()
            .flatten()
            .collect()
    }

    fn explicit_override(&self) -> Option<AuthFileCandidate> {
        self.env
            .var(REGISTRY_AUTH_FILE)
            .map(|path| AuthFileCandidate {
                source: AuthFileSource::ExplicitEnvOverride,
                path: PathBuf::from(path),
            })
    }

    fn runtime_dir_default(&self) -> Option<AuthFileCandidate> {
        self.env
            .var(XDG_RUNTIME_DIR)
            .map(|dir| AuthFileCandidate {
                source: AuthFileSource::RuntimeDirDefault,
                path: PathBuf::from(dir).join("containers").join("auth.json"),
            })
    }

    fn docker_config(&self) -> Option<AuthFileCandidate> {
        self.env.home_dir().map(|home| AuthFileCandidate {
            source: AuthFileSource::BuildToolConfigFallback,
            path: home.join(".docker").join("config.json"),
        })
    }

    /// 最初に存在する通常ファイルの候補を返す。どれも無ければ None（エラーではない）
    pub fn locate_candidate(&self) -> Option<AuthFileCandidate> {
        let candidates = self.candidates();
        let found = candidates.iter().find(|c| c.path.is_file()).cloned();

        match &found {
            Some(candidate) => debug!(
                "Found {} registry authentication file at: {}",
                candidate.source.label(),
                candidate.path.display()
            ),
            None => match candidates.first() {
                Some(c) if c.source == AuthFileSource::ExplicitEnvOverride => debug!(
                    "{} points to {}, which is not a file",
                    REGISTRY_AUTH_FILE,
                    c.path.display()
                ),
                _ => debug!("No registry authentication file found"),
            },
        }

        found
    }

    /// 有効な認証ファイルのパス
    pub fn locate(&self) -> Option<PathBuf> {
        self.locate_candidate().map(|c| c.path)
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// 外部コマンド（podman / buildah）の実行エラー
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{program} を起動できません: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("コマンドが失敗しました (exit code {exit_code}): {command}\n{stderr}")]
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

/// レジストリ認証のエラー
///
/// どれも認証パス全体を即座に中断させる。
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("レジストリが設定されていませんが、認証はスキップされていません")]
    NoRegistriesConfigured,

    #[error("認証ファイルの形式が不正です: {path}\n理由: {message}")]
    MalformedAuthFile { path: PathBuf, message: String },

    #[error("認証ファイルを読み込めません: {path}\n理由: {source}")]
    AuthFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("レジストリ '{registry}' の認証情報が見つかりません")]
    CredentialNotFound { registry: String },

    #[error("レジストリ '{registry}' の認証情報を復号できません: {message}")]
    Decryption { registry: String, message: String },

    #[error("レジストリ '{registry}' へのログインに失敗しました: {source}")]
    LoginFailed {
        registry: String,
        #[source]
        source: CommandError,
    },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Config(#[from] podflow_config::ConfigError),

    #[error("無効なタグ '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("ディレクトリを作成できません: {path}\n理由: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Auth(AuthError::NoRegistriesConfigured) => {
                format!(
                    "{}\n\
                     \n\
                     解決方法:\n\
                     1. podflow.yaml に registries を指定してください\n\
                     2. 認証が不要な場合は skip.auth を true にしてください",
                    self
                )
            }
            BuildError::Auth(AuthError::CredentialNotFound { registry }) => {
                format!(
                    "{}\n\
                     \n\
                     settings.yaml の servers に id: {} のエントリを追加してください。",
                    self, registry
                )
            }
            BuildError::Auth(AuthError::MalformedAuthFile { .. }) => {
                format!(
                    "{}\n\
                     \n\
                     認証ファイルを修正するか、REGISTRY_AUTH_FILE で別のファイルを指定してください。",
                    self
                )
            }
            BuildError::Command(CommandError::Spawn { program, .. }) => {
                format!(
                    "{}\n\
                     \n\
                     {} がインストールされ、PATH に含まれているか確認してください。",
                    self, program
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

//! podflow.yaml のデータモデル

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// podflow.yaml 全体
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PodflowConfig {
    /// podman 実行時の共通設定
    #[serde(default)]
    pub podman: PodmanConfig,

    /// 認証対象のレジストリ（未指定は None、空リストと区別する）
    #[serde(default)]
    pub registries: Option<Vec<String>>,

    /// ビルド対象のイメージ
    #[serde(default)]
    pub images: Vec<ImageConfig>,

    /// 各処理のスキップ設定
    #[serde(default)]
    pub skip: SkipConfig,

    /// save の出力先（設定ファイルからの相対パス）
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// 設定ファイルが置かれているディレクトリ
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("target")
}

/// TLS 検証モード
///
/// YAML では `true` / `false` / `not_specified` / 未指定 のいずれか。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Option<RawTlsVerify>")]
pub enum TlsVerify {
    #[default]
    NotSpecified,
    True,
    False,
}

/// bool でも文字列でも書ける tls_verify の生の値
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTlsVerify {
    Bool(bool),
    Text(String),
}

impl TryFrom<Option<RawTlsVerify>> for TlsVerify {
    type Error = String;

    fn try_from(value: Option<RawTlsVerify>) -> std::result::Result<Self, Self::Error> {
        match value {
            None => Ok(TlsVerify::NotSpecified),
            Some(RawTlsVerify::Bool(true)) => Ok(TlsVerify::True),
            Some(RawTlsVerify::Bool(false)) => Ok(TlsVerify::False),
            Some(RawTlsVerify::Text(text)) => match text.as_str() {
                "not_specified" => Ok(TlsVerify::NotSpecified),
                "true" => Ok(TlsVerify::True),
                "false" => Ok(TlsVerify::False),
                other => Err(format!(
                    "unknown tls_verify value '{}', expected true, false or not_specified",
                    other
                )),
            },
        }
    }
}

impl TlsVerify {
    /// `--tls-verify=<value>` 形式のオプション。未指定なら None
    pub fn as_option(&self) -> Option<&'static str> {
        match self {
            TlsVerify::NotSpecified => None,
            TlsVerify::True => Some("--tls-verify=true"),
            TlsVerify::False => Some("--tls-verify=false"),
        }
    }
}

/// podman の cgroup manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CGroupManager {
    #[default]
    Systemd,
    Cgroupfs,
}

impl CGroupManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            CGroupManager::Systemd => "systemd",
            CGroupManager::Cgroupfs => "cgroupfs",
        }
    }
}

/// podman 実行時の設定
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PodmanConfig {
    #[serde(default)]
    pub tls_verify: TlsVerify,

    #[serde(default)]
    pub cgroup_manager: CGroupManager,

    /// ストレージのルート（--root）。未指定なら podman のデフォルト
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// 状態ディレクトリ（--runroot）
    #[serde(default)]
    pub run_root: Option<PathBuf>,

    /// podman を実行するディレクトリ。未指定なら設定ファイルのディレクトリ
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
}

/// イメージ定義
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// レジストリ込み、タグなしのイメージ名（例: "registry.example.com/org/app"）
    pub name: String,

    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    #[serde(default = "default_containerfile")]
    pub containerfile: PathBuf,

    #[serde(default = "default_context")]
    pub context: PathBuf,

    #[serde(default)]
    pub build_args: BTreeMap<String, String>,

    #[serde(default)]
    pub no_cache: bool,

    #[serde(default)]
    pub pull: bool,
}

fn default_tags() -> Vec<String> {
    vec!["latest".to_string()]
}

fn default_containerfile() -> PathBuf {
    PathBuf::from("Containerfile")
}

fn default_context() -> PathBuf {
    PathBuf::from(".")
}

impl ImageConfig {
    /// `name:tag` 形式の完全なイメージ名をタグ順に返す
    pub fn full_image_names(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| format!("{}:{}", self.name, tag))
            .collect()
    }
}

/// スキップ設定
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkipConfig {
    /// すべての podman 処理をスキップ
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub tag: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub save: bool,
    #[serde(default)]
    pub clean: bool,
}

impl PodflowConfig {
    /// 設定ファイルを読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_yaml(&content, base_dir).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// YAML 文字列から読み込む。相対パスは `base_dir` を基準に解決する
    pub fn from_yaml(content: &str, base_dir: PathBuf) -> Result<Self> {
        let mut config: PodflowConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: base_dir.clone(),
                source,
            })?;
        config.base_dir = base_dir;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for image in &self.images {
            if image.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "images[].name が空です".to_string(),
                ));
            }
            if image.tags.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "イメージ '{}' にタグが指定されていません",
                    image.name
                )));
            }
        }
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 設定ファイルのディレクトリを基準にパスを解決
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// podman を実行するディレクトリ
    pub fn run_directory(&self) -> PathBuf {
        match &self.podman.run_directory {
            Some(dir) => self.resolve_path(dir),
            None => self.base_dir.clone(),
        }
    }

    /// save の出力先
    pub fn output_directory(&self) -> PathBuf {
        self.resolve_path(&self.output_directory)
    }

    /// 全イメージの完全なイメージ名
    pub fn full_image_names(&self) -> Vec<String> {
        self.images
            .iter()
            .flat_map(ImageConfig::full_image_names)
            .collect()
    }
}

pub mod error;
pub mod model;
pub mod settings;

pub use error::*;
pub use model::{CGroupManager, ImageConfig, PodflowConfig, PodmanConfig, SkipConfig, TlsVerify};
pub use settings::{ProxyEntry, ServerEntry, Settings, find_settings_file, load_settings};

use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 2] = ["podflow.local.yaml", "podflow.yaml"];

/// podflow の設定ディレクトリ（~/.config/podflow）
pub fn config_home() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("podflow"))
}

/// カレントディレクトリから podflow.yaml を探す
pub fn find_config_file() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    find_config_file_from(&current_dir)
}

/// podflow.yaml を探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 PODFLOW_CONFIG_PATH (直接パス指定)
/// 2. 指定ディレクトリ: podflow.local.yaml, podflow.yaml
/// 3. ./.podflow/ ディレクトリ内: 同様の順序
/// 4. ~/.config/podflow/podflow.yaml (グローバル設定)
pub fn find_config_file_from(dir: &Path) -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("PODFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    // 2. 指定ディレクトリで検索
    for filename in &CANDIDATES {
        let path = dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.podflow/ ディレクトリで検索
    let podflow_dir = dir.join(".podflow");
    if podflow_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = podflow_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = config_home() {
        let global_config = config_dir.join("podflow.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 設定ファイルを探して読み込む。`explicit` が指定されていればそれを使う
pub fn load_config(explicit: Option<&Path>) -> Result<PodflowConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    tracing::debug!("Loading configuration from {}", path.display());
    PodflowConfig::load(&path)
}

pub mod encrypt;
pub mod images;
pub mod login;

use colored::Colorize;
use podflow_build::{AesGcmDecrypter, BuildError, Outcome};
use podflow_config::{PodflowConfig, Settings};
use std::path::PathBuf;

/// 全サブコマンド共通のオプション
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub master_key: Option<String>,
}

impl GlobalOptions {
    pub fn load_config(&self) -> Result<PodflowConfig, BuildError> {
        Ok(podflow_config::load_config(self.config.as_deref())?)
    }

    pub fn load_settings(&self) -> Result<Settings, BuildError> {
        Ok(podflow_config::load_settings(self.settings.as_deref())?)
    }

    pub fn decrypter(&self) -> anyhow::Result<AesGcmDecrypter> {
        Ok(AesGcmDecrypter::new(self.master_key.as_deref())?)
    }
}

/// 処理結果を表示
pub fn print_outcome(outcome: &Outcome, done: &str) {
    match outcome {
        Outcome::Skipped(reason) => println!("{} {}", "⊘".yellow(), reason),
        Outcome::Completed(items) if items.is_empty() => {
            println!("{} {}: 対象がありません", "⊘".yellow(), done)
        }
        Outcome::Completed(items) => {
            println!("{} {} ({}件)", "✓".green().bold(), done, items.len());
            for item in items {
                println!("  - {}", item.cyan());
            }
        }
    }
}

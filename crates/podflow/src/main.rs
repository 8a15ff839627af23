mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use podflow_build::BuildError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "podflow")]
#[command(about = "podman でコンテナイメージをビルド・プッシュ・保存する", long_about = None)]
struct Cli {
    /// 設定ファイル（省略時は podflow.yaml を探索）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 認証情報ファイル（省略時は PODFLOW_SETTINGS または ~/.config/podflow/settings.yaml）
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// settings.yaml の暗号化された値を復号するマスターキー（Base64）
    #[arg(long, env = "PODFLOW_MASTER_KEY", hide_env_values = true, global = true)]
    master_key: Option<String>,

    /// 詳細なログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// イメージをビルドしてタグを付ける
    Build,
    /// 未認証のレジストリにログインしてからイメージをプッシュ
    Push,
    /// イメージを <output_directory>/podman に書き出す
    Save,
    /// カスタムストレージ（podman.root）を削除
    Clean,
    /// 未認証のレジストリにログイン
    Login,
    /// settings.yaml 用に値を暗号化
    Encrypt {
        /// 暗号化する値（パスワードなど）
        value: String,
    },
    /// バージョン情報を表示
    Version,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("podflow {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = run(cli) {
        let message = match e.downcast_ref::<BuildError>() {
            Some(build_error) => build_error.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{} {}", "Error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = commands::GlobalOptions {
        config: cli.config,
        settings: cli.settings,
        master_key: cli.master_key,
    };

    match cli.command {
        Commands::Build => commands::images::build(&options),
        Commands::Push => commands::images::push(&options),
        Commands::Save => commands::images::save(&options),
        Commands::Clean => commands::images::clean(&options),
        Commands::Login => commands::login::handle(&options),
        Commands::Encrypt { value } => commands::encrypt::handle(&options, &value),
        Commands::Version => unreachable!("Version is handled before config loading"),
    }
}

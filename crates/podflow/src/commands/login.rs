use super::GlobalOptions;
use colored::Colorize;
use podflow_build::{AuthContext, PodmanExecutor, SystemEnv, ops};

pub fn handle(options: &GlobalOptions) -> anyhow::Result<()> {
    let config = options.load_config()?;
    let settings = options.load_settings()?;
    let decrypter = options.decrypter()?;
    let podman = PodmanExecutor::from_config(&config);

    let auth = AuthContext {
        env: &SystemEnv,
        store: &settings,
        decrypter: &decrypter,
    };
    let Some(report) = ops::authenticate_registries(&config, &podman, auth)? else {
        println!("{} Registry authentication is skipped.", "⊘".yellow());
        return Ok(());
    };

    match &report.auth_file {
        Some(path) => println!("認証ファイル: {}", path.display().to_string().cyan()),
        None => println!("認証ファイル: {}", "(なし)".dimmed()),
    }
    for registry in &report.already_authenticated {
        println!("  {} {} (認証済み)", "✓".green(), registry);
    }
    for registry in &report.logged_in {
        println!("  {} {} (ログイン)", "✓".green().bold(), registry.cyan());
    }
    Ok(())
}

use super::{GlobalOptions, print_outcome};
use podflow_build::{AuthContext, BuildahExecutor, PodmanExecutor, SystemEnv, ops};

pub fn build(options: &GlobalOptions) -> anyhow::Result<()> {
    let config = options.load_config()?;
    let settings = options.load_settings()?;
    let decrypter = options.decrypter()?;
    let podman = PodmanExecutor::from_config(&config);

    let outcome = ops::build_images(
        &config,
        &podman,
        AuthContext {
            env: &SystemEnv,
            store: &settings,
            decrypter: &decrypter,
        },
    )?;
    print_outcome(&outcome, "ビルド完了");
    Ok(())
}

pub fn push(options: &GlobalOptions) -> anyhow::Result<()> {
    let config = options.load_config()?;
    let settings = options.load_settings()?;
    let decrypter = options.decrypter()?;
    let podman = PodmanExecutor::from_config(&config);

    let outcome = ops::push_images(
        &config,
        &podman,
        AuthContext {
            env: &SystemEnv,
            store: &settings,
            decrypter: &decrypter,
        },
    )?;
    print_outcome(&outcome, "プッシュ完了");
    Ok(())
}

pub fn save(options: &GlobalOptions) -> anyhow::Result<()> {
    let config = options.load_config()?;
    let podman = PodmanExecutor::from_config(&config);

    let outcome = ops::save_images(&config, &podman)?;
    print_outcome(&outcome, "保存完了");
    Ok(())
}

pub fn clean(options: &GlobalOptions) -> anyhow::Result<()> {
    let config = options.load_config()?;

    let outcome = ops::clean_storage(&config, &BuildahExecutor::new())?;
    print_outcome(&outcome, "削除完了");
    Ok(())
}

//! build / push / save / clean の各処理
//!
//! それぞれ skip 設定を確認してから podman / buildah を呼び出します。
//! push と build の前にはレジストリ認証を行います。

use crate::auth::{AuthReport, Authenticator, CredentialStore, Env, SettingsDecrypter};
use crate::buildah::BuildahExecutor;
use crate::error::{BuildError, BuildResult};
use crate::image::{archive_name, extract_registry, validate_tag};
use crate::podman::PodmanExecutor;
use podflow_config::PodflowConfig;
use tracing::{info, warn};

/// 認証に必要なコラボレータ
#[derive(Clone, Copy)]
pub struct AuthContext<'a> {
    pub env: &'a dyn Env,
    pub store: &'a dyn CredentialStore,
    pub decrypter: &'a dyn SettingsDecrypter,
}

/// 処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// スキップした（理由）
    Skipped(&'static str),
    /// 処理したイメージ（またはパス）
    Completed(Vec<String>),
}

const ALL_SKIPPED: &str = "Podman actions are skipped.";

fn skipped(reason: &'static str) -> BuildResult<Outcome> {
    info!("{}", reason);
    Ok(Outcome::Skipped(reason))
}

/// レジストリ認証のみを行う。skip 時は None
pub fn authenticate_registries(
    config: &PodflowConfig,
    podman: &PodmanExecutor,
    auth: AuthContext<'_>,
) -> BuildResult<Option<AuthReport>> {
    if config.skip.all {
        info!("{}", ALL_SKIPPED);
        return Ok(None);
    }
    if config.skip.auth {
        info!("Registry authentication is skipped.");
        return Ok(None);
    }

    let report = Authenticator::new(auth.env, auth.store, auth.decrypter, podman)
        .authenticate(config.registries.as_deref())?;
    Ok(Some(report))
}

/// 全イメージをビルドし、残りのタグを付ける
pub fn build_images(
    config: &PodflowConfig,
    podman: &PodmanExecutor,
    auth: AuthContext<'_>,
) -> BuildResult<Outcome> {
    if config.skip.all {
        return skipped(ALL_SKIPPED);
    }
    if config.skip.build {
        return skipped("Building container images is skipped.");
    }
    if config.images.is_empty() {
        info!("There are no container images to build.");
        return Ok(Outcome::Completed(Vec::new()));
    }

    for image in &config.images {
        for tag in &image.tags {
            validate_tag(tag)?;
        }
    }

    // ベースイメージの pull に認証が必要な場合がある
    authenticate_registries(config, podman, auth)?;

    let mut built = Vec::new();
    for image in &config.images {
        let names = image.full_image_names();
        info!("Building container image {}", image.name);
        podman.build(image, config)?;

        if let Some((first, rest)) = names.split_first() {
            if config.skip.tag {
                info!("Tagging container images is skipped.");
            } else {
                for name in rest {
                    podman.tag(first, name)?;
                }
            }
        }
        built.extend(names);
    }

    info!("Built {} container image(s)", built.len());
    Ok(Outcome::Completed(built))
}

/// 認証後、全イメージをプッシュ
pub fn push_images(
    config: &PodflowConfig,
    podman: &PodmanExecutor,
    auth: AuthContext<'_>,
) -> BuildResult<Outcome> {
    if config.skip.all {
        return skipped(ALL_SKIPPED);
    }
    if config.skip.push {
        return skipped("Pushing container images is skipped.");
    }

    let names = config.full_image_names();
    if names.is_empty() {
        info!("There are no container images to push.");
        return Ok(Outcome::Completed(Vec::new()));
    }

    authenticate_registries(config, podman, auth)?;

    let configured = config.registries.as_deref().unwrap_or_default();
    for name in &names {
        if let Some(registry) = extract_registry(name)
            && !configured.iter().any(|r| r == registry)
        {
            warn!(
                "Image {} targets registry {}, which is not listed in registries",
                name, registry
            );
        }
        podman.push(name)?;
    }

    info!("Container images pushed successfully.");
    Ok(Outcome::Completed(names))
}

/// `<output>/podman` にイメージを書き出す
pub fn save_images(config: &PodflowConfig, podman: &PodmanExecutor) -> BuildResult<Outcome> {
    if config.skip.all {
        return skipped(ALL_SKIPPED);
    }
    if config.skip.save {
        return skipped("Saving container images is skipped.");
    }

    let names = config.full_image_names();
    if names.is_empty() {
        info!("There are no container images to export.");
        return Ok(Outcome::Completed(Vec::new()));
    }

    let target = config.output_directory().join("podman");
    // 既に存在していても失敗しない
    std::fs::create_dir_all(&target).map_err(|source| BuildError::CreateDir {
        path: target.clone(),
        source,
    })?;

    let mut archives = Vec::new();
    for image in &names {
        let archive = archive_name(image);
        info!(
            "Exporting image {} to {}",
            image,
            target.join(&archive).display()
        );
        podman.save(&archive, image, &target)?;
        archives.push(target.join(archive).display().to_string());
    }

    info!("Container images exported successfully.");
    Ok(Outcome::Completed(archives))
}

/// カスタムの root を使っている場合のみローカルストレージを削除
pub fn clean_storage(config: &PodflowConfig, buildah: &BuildahExecutor) -> BuildResult<Outcome> {
    if config.skip.all {
        return skipped(ALL_SKIPPED);
    }
    if config.skip.clean {
        return skipped("Cleaning local storage is skipped.");
    }

    let Some(root) = &config.podman.root else {
        return skipped("Not cleaning up local storage as default storage location is being used.");
    };

    let root = config.resolve_path(root);
    info!("Cleaning up {}...", root.display());
    buildah.cleanup_local_storage(&root)?;
    Ok(Outcome::Completed(vec![root.display().to_string()]))
}

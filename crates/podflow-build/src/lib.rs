//! Podflow のコンテナイメージ処理
//!
//! podman によるビルド・タグ付け・プッシュ・保存、buildah によるストレージ削除、
//! そしてプッシュ前のレジストリ認証を提供します。

pub mod auth;
pub mod buildah;
pub mod command;
pub mod error;
pub mod image;
#[cfg(test)]
pub(crate) mod log_capture;
pub mod ops;
pub mod podman;

pub use auth::{AesGcmDecrypter, AuthReport, Authenticator, SystemEnv};
pub use buildah::BuildahExecutor;
pub use command::{CommandOutput, CommandRunner, ProcessRunner, ToolCommand};
pub use error::{AuthError, BuildError, BuildResult, CommandError};
pub use image::{archive_name, extract_registry, validate_tag};
pub use ops::{
    AuthContext, Outcome, authenticate_registries, build_images, clean_storage, push_images,
    save_images,
};
pub use podman::PodmanExecutor;

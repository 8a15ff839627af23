//! podman コマンドの組み立てと実行

use crate::auth::RegistryLogin;
use crate::command::{CommandOutput, CommandRunner, ProcessRunner, ToolCommand};
use crate::error::CommandError;
use podflow_config::{CGroupManager, ImageConfig, PodflowConfig, TlsVerify};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// podman の実行を担当
pub struct PodmanExecutor {
    program: String,
    tls_verify: TlsVerify,
    cgroup_manager: CGroupManager,
    root: Option<PathBuf>,
    run_root: Option<PathBuf>,
    run_directory: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl PodmanExecutor {
    /// 設定から作成（実プロセスを起動する runner を使用）
    pub fn from_config(config: &PodflowConfig) -> Self {
        let podman = &config.podman;
        Self {
            program: "podman".to_string(),
            tls_verify: podman.tls_verify,
            cgroup_manager: podman.cgroup_manager,
            root: podman.root.as_ref().map(|p| config.resolve_path(p)),
            run_root: podman.run_root.as_ref().map(|p| config.resolve_path(p)),
            run_directory: config.run_directory(),
            runner: Box::new(ProcessRunner),
        }
    }

    /// runner を差し替える
    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// グローバルオプション付きのベースコマンド
    fn command(&self, subcommand: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.program);

        // グローバルオプションはサブコマンドより前
        if let Some(root) = &self.root {
            cmd = cmd.arg("--root").arg(root.display().to_string());
        }
        if let Some(run_root) = &self.run_root {
            cmd = cmd.arg("--runroot").arg(run_root.display().to_string());
        }
        cmd = cmd.arg(format!("--cgroup-manager={}", self.cgroup_manager.as_str()));

        cmd.arg(subcommand).current_dir(&self.run_directory)
    }

    /// TLS 検証オプションを付与（login / build / push のみ）
    fn with_tls_verify(&self, cmd: ToolCommand) -> ToolCommand {
        match self.tls_verify.as_option() {
            Some(opt) => cmd.arg(opt),
            None => cmd,
        }
    }

    fn run(&self, cmd: ToolCommand) -> Result<CommandOutput, CommandError> {
        self.runner.run(&cmd)
    }

    /// `podman build` コマンドを組み立てる
    pub fn build_command(&self, image: &ImageConfig, config: &PodflowConfig) -> ToolCommand {
        let mut cmd = self.with_tls_verify(self.command("build"));
        cmd = cmd
            .arg("--file")
            .arg(config.resolve_path(&image.containerfile).display().to_string());

        if image.no_cache {
            cmd = cmd.arg("--no-cache");
        }
        if image.pull {
            cmd = cmd.arg("--pull");
        }
        for (key, value) in &image.build_args {
            cmd = cmd.arg("--build-arg").arg(format!("{}={}", key, value));
        }
        if let Some(first) = image.full_image_names().first() {
            cmd = cmd.arg("--tag").arg(first);
        }

        cmd.arg(config.resolve_path(&image.context).display().to_string())
    }

    /// イメージをビルド
    #[instrument(skip(self, image, config), fields(image = %image.name))]
    pub fn build(&self, image: &ImageConfig, config: &PodflowConfig) -> Result<(), CommandError> {
        debug!("Building container image");
        self.run(self.build_command(image, config))?;
        Ok(())
    }

    /// `podman tag <source> <target>`
    pub fn tag(&self, source: &str, target: &str) -> Result<(), CommandError> {
        debug!("Tagging {} as {}", source, target);
        self.run(self.command("tag").arg(source).arg(target))?;
        Ok(())
    }

    /// `podman push <image>`
    pub fn push(&self, image: &str) -> Result<(), CommandError> {
        info!("Pushing container image {}", image);
        self.run(self.with_tls_verify(self.command("push")).arg(image))?;
        Ok(())
    }

    /// `podman save --format oci-archive -o <archive> <image>` を `dir` で実行
    pub fn save(&self, archive: &str, image: &str, dir: &Path) -> Result<(), CommandError> {
        let cmd = self
            .command("save")
            .args(["--format", "oci-archive", "-o", archive, image])
            .current_dir(dir);
        self.run(cmd)?;
        Ok(())
    }
}

impl RegistryLogin for PodmanExecutor {
    /// パスワードは --password-stdin で渡し、コマンドラインに残さない
    fn login(&self, registry: &str, username: &str, password: &str) -> Result<(), CommandError> {
        let cmd = self
            .with_tls_verify(self.command("login"))
            .args(["--username", username, "--password-stdin", registry])
            .stdin(password);
        self.run(cmd)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingRunner;

    fn config(yaml: &str) -> PodflowConfig {
        PodflowConfig::from_yaml(yaml, PathBuf::from("/work")).unwrap()
    }

    #[test]
    fn test_global_options() {
        let runner = RecordingRunner::default();
        let cfg = config(
            "podman:\n  root: /var/podman/root\n  run_root: run\n  cgroup_manager: cgroupfs\n  tls_verify: false",
        );
        let podman = PodmanExecutor::from_config(&cfg).with_runner(runner.clone());

        podman.push("registry.example.com/app:1.0").unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "podman --root /var/podman/root --runroot /work/run --cgroup-manager=cgroupfs \
                 push --tls-verify=false registry.example.com/app:1.0"
            ]
        );
        assert_eq!(
            runner.calls.borrow()[0].current_dir,
            Some(PathBuf::from("/work"))
        );
    }

    #[test]
    fn test_tag_has_no_tls_verify() {
        let runner = RecordingRunner::default();
        let cfg = config("podman:\n  tls_verify: true");
        let podman = PodmanExecutor::from_config(&cfg).with_runner(runner.clone());

        podman.tag("app:1.0", "app:latest").unwrap();

        assert_eq!(
            runner.commands(),
            vec!["podman --cgroup-manager=systemd tag app:1.0 app:latest"]
        );
    }

    #[test]
    fn test_login_uses_password_stdin() {
        let runner = RecordingRunner::default();
        let podman = PodmanExecutor::from_config(&config("{}")).with_runner(runner.clone());

        podman.login("registry.example.com", "builder", "s3cret").unwrap();

        let calls = runner.calls.borrow();
        let cmd = &calls[0];
        assert_eq!(
            cmd.to_command_string(),
            "podman --cgroup-manager=systemd login --username builder --password-stdin registry.example.com"
        );
        assert_eq!(cmd.stdin.as_deref(), Some("s3cret"));
        assert!(!cmd.args.iter().any(|a| a.contains("s3cret")));
    }

    #[test]
    fn test_build_command() {
        let cfg = config(
            r#"
podman:
  tls_verify: true
images:
  - name: registry.example.com/org/app
    tags: ["1.0", "latest"]
    containerfile: docker/Containerfile
    context: docker
    no_cache: true
    build_args:
      VERSION: "1.0"
"#,
        );
        let podman = PodmanExecutor::from_config(&cfg);
        let cmd = podman.build_command(&cfg.images[0], &cfg);
        assert_eq!(
            cmd.to_command_string(),
            "podman --cgroup-manager=systemd build --tls-verify=true \
             --file /work/docker/Containerfile --no-cache --build-arg VERSION=1.0 \
             --tag registry.example.com/org/app:1.0 /work/docker"
        );
    }

    #[test]
    fn test_save_runs_in_target_dir() {
        let runner = RecordingRunner::default();
        let podman = PodmanExecutor::from_config(&config("{}")).with_runner(runner.clone());

        podman
            .save("app_1_0.tar.gz", "ghcr.io/org/app:1.0", Path::new("/work/target/podman"))
            .unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(
            calls[0].to_command_string(),
            "podman --cgroup-manager=systemd save --format oci-archive -o app_1_0.tar.gz ghcr.io/org/app:1.0"
        );
        assert_eq!(
            calls[0].current_dir,
            Some(PathBuf::from("/work/target/podman"))
        );
    }
}

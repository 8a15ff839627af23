//! buildah によるローカルストレージの削除

use crate::command::{CommandRunner, ProcessRunner, ToolCommand};
use crate::error::CommandError;
use std::path::Path;

/// buildah の実行を担当
pub struct BuildahExecutor {
    program: String,
    runner: Box<dyn CommandRunner>,
}

impl Default for BuildahExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildahExecutor {
    pub fn new() -> Self {
        Self {
            program: "buildah".to_string(),
            runner: Box::new(ProcessRunner),
        }
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// ストレージのルートを削除
    ///
    /// rootless の場合ファイルの所有者がユーザー名前空間内の UID になるため、
    /// `buildah unshare` の中で削除する。
    pub fn cleanup_local_storage(&self, root: &Path) -> Result<(), CommandError> {
        let cmd = ToolCommand::new(&self.program)
            .args(["unshare", "rm", "-rf"])
            .arg(root.display().to_string());
        self.runner.run(&cmd)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingRunner;

    #[test]
    fn test_cleanup_command() {
        let runner = RecordingRunner::default();
        let buildah = BuildahExecutor::new().with_runner(runner.clone());

        buildah
            .cleanup_local_storage(Path::new("/work/target/podman-root"))
            .unwrap();

        assert_eq!(
            runner.commands(),
            vec!["buildah unshare rm -rf /work/target/podman-root"]
        );
    }
}

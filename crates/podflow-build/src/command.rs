//! 外部コマンドの実行
//!
//! podman / buildah の呼び出しは [`ToolCommand`] として組み立て、
//! [`CommandRunner`] を通して同期的に実行します。

use crate::error::CommandError;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// 実行するコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    /// 実行ディレクトリ（None ならカレント）
    pub current_dir: Option<PathBuf>,
    /// 標準入力に渡す内容（パスワードなど。ログには出さない）
    pub stdin: Option<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// ログ表示用のコマンド文字列
    pub fn to_command_string(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// コマンドの実行結果
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// コマンド実行の抽象化
pub trait CommandRunner {
    /// コマンドを実行し、終了まで待つ。非ゼロ終了は [`CommandError::Failed`]
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput, CommandError>;
}

/// 実プロセスを起動する runner
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput, CommandError> {
        tracing::debug!("Running: {}", command.to_command_string());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        if let (Some(input), Some(mut stdin)) = (&command.stdin, child.stdin.take()) {
            match stdin.write_all(input.as_bytes()) {
                Ok(()) => {}
                // 入力を読む前に終了した。終了コードと stderr は下で報告する
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!("{} closed stdin before reading it", command.program);
                }
                Err(source) => {
                    return Err(CommandError::Spawn {
                        program: command.program.clone(),
                        source,
                    });
                }
            }
            // stdin を閉じて EOF を伝える
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .map_err(|source| CommandError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if !result.success() {
            tracing::debug!(
                exit_code = result.exit_code,
                "Command failed: {}",
                command.to_command_string()
            );
            return Err(CommandError::Failed {
                command: command.to_command_string(),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(result)
    }
}

//! テスト用: tracing の出力をメモリに取り込む

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// 取り込んだログ
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// `f` の実行中だけ DEBUG 以上のログを取り込む（現在のスレッドのみ）
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }

    /// `message` を含む行があることを確認
    #[track_caller]
    pub fn assert_logged(&self, message: &str) {
        let output = self.output();
        assert!(
            output.contains(message),
            "expected log line containing {:?}, got:\n{}",
            message,
            output
        );
    }

    #[track_caller]
    pub fn assert_not_logged(&self, message: &str) {
        let output = self.output();
        assert!(
            !output.contains(message),
            "unexpected log line containing {:?}:\n{}",
            message,
            output
        );
    }
}

pub(crate) struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buf: self.buf.clone(),
        }
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .buf
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

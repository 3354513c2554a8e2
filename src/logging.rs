//! Logger setup.
//!
//! Commands log to stderr and stay quiet unless `RUST_LOG` says otherwise.
//! The daemon has no terminal, so it appends to a log file and flushes after
//! every record so the file is readable while it runs.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// A writer that flushes after every write to ensure logs appear immediately
struct FlushingWriter {
    inner: File,
}

impl Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.inner.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub fn init_cli_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}

pub fn init_daemon_logging(log_file: &Path) {
    if let Some(dir) = log_file.parent() {
        let _ = std::fs::create_dir_all(dir);
    }

    let file = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(f) => f,
        Err(_) => {
            // Nowhere to write: stdio is detached, so logging is simply off.
            init_cli_logging();
            return;
        }
    };

    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("clientclock=info"),
    )
    .target(env_logger::Target::Pipe(Box::new(FlushingWriter { inner: file })))
    .try_init();
}

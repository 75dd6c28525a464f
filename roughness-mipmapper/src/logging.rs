//! Log stream routing for the `log` facade
//!
//! The crate reports skipped materials, scratch reallocation and state
//! restore failures through the `log` macros. [`init`] installs the global
//! [`Logger`], which forwards every enabled record to the attached
//! [`LogStream`]s. Applications that already install their own logger can
//! ignore this module.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use log::{LevelFilter, Log, Metadata, Record};

use crate::error::{Error, Result};

/// Log levels understood by [`Logger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Verbose debug information
    Debug,
    /// Informational messages
    Info,
    /// Warning messages
    Warn,
    /// Error messages
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// Trait for custom log stream implementations
pub trait LogStream: Send + Sync {
    /// Write one formatted log line, including the trailing newline
    fn write(&mut self, message: &str);
}

/// Shared handle to an attached stream
pub type SharedLogStream = Arc<Mutex<dyn LogStream>>;

/// A log stream that writes to stdout
pub struct StdoutLogStream;

impl LogStream for StdoutLogStream {
    fn write(&mut self, message: &str) {
        print!("{}", message);
    }
}

/// A log stream that writes to stderr
pub struct StderrLogStream;

impl LogStream for StderrLogStream {
    fn write(&mut self, message: &str) {
        eprint!("{}", message);
    }
}

/// A log stream that appends to a file
pub struct FileLogStream {
    file: File,
}

impl FileLogStream {
    /// Open `path` for appending
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "=== roughness-mipmapper log started ===")?;
        Ok(Self { file })
    }
}

impl LogStream for FileLogStream {
    fn write(&mut self, message: &str) {
        let _ = self.file.write_all(message.as_bytes());
        let _ = self.file.flush();
    }
}

/// A log stream that collects messages in memory
#[derive(Debug, Default)]
pub struct MemoryLogStream {
    messages: Vec<String>,
}

impl MemoryLogStream {
    /// Create an empty memory stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected messages
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Clear all collected messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl LogStream for MemoryLogStream {
    fn write(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Fan-out logger for the `log` facade
pub struct Logger {
    streams: Mutex<Vec<SharedLogStream>>,
    level: RwLock<LevelFilter>,
}

impl Logger {
    /// Create a logger with no streams at [`LogLevel::Info`]
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(Vec::new()),
            level: RwLock::new(LevelFilter::Info),
        }
    }

    /// Set the most verbose level that is forwarded
    pub fn set_level(&self, level: LogLevel) {
        *self.level.write().unwrap_or_else(PoisonError::into_inner) = level.into();
    }

    /// Most verbose level that is forwarded
    pub fn level(&self) -> LevelFilter {
        *self.level.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a log stream
    pub fn attach_stream(&self, stream: SharedLogStream) {
        self.lock_streams().push(stream);
    }

    /// Detach a previously attached stream; returns whether it was attached
    pub fn detach_stream(&self, stream: &SharedLogStream) -> bool {
        let mut streams = self.lock_streams();
        match streams.iter().position(|s| Arc::ptr_eq(s, stream)) {
            Some(pos) => {
                streams.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Detach all log streams
    pub fn detach_all_streams(&self) {
        self.lock_streams().clear();
    }

    /// Number of attached streams
    pub fn stream_count(&self) -> usize {
        self.lock_streams().len()
    }

    fn lock_streams(&self) -> std::sync::MutexGuard<'_, Vec<SharedLogStream>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!("[{} {}] {}\n", record.level(), record.target(), record.args());
        // snapshot so a stream may log without deadlocking
        let streams = self.lock_streams().clone();
        for stream in streams {
            stream
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write(&line);
        }
    }

    fn flush(&self) {}
}

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();
static INSTALLED: Mutex<bool> = Mutex::new(false);

/// Get the global logger instance
pub fn global_logger() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::new)
}

/// Install the global logger with the `log` facade
///
/// Calling it again only changes the level. Fails if another logger was
/// installed first.
pub fn init(level: LogLevel) -> Result<()> {
    let logger = global_logger();
    logger.set_level(level);

    let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
    if !*installed {
        log::set_logger(logger).map_err(|e| Error::other(e.to_string()))?;
        *installed = true;
    }
    log::set_max_level(level.into());
    Ok(())
}

/// Attach a stream to the global logger
pub fn attach_stream(stream: SharedLogStream) {
    global_logger().attach_stream(stream);
}

/// Detach a stream from the global logger
pub fn detach_stream(stream: &SharedLogStream) -> bool {
    global_logger().detach_stream(stream)
}

/// Convenience function to attach a stdout log stream
pub fn attach_stdout_stream() {
    attach_stream(Arc::new(Mutex::new(StdoutLogStream)));
}

/// Convenience function to attach a stderr log stream
pub fn attach_stderr_stream() {
    attach_stream(Arc::new(Mutex::new(StderrLogStream)));
}

/// Convenience function to attach a file log stream
pub fn attach_file_stream<P: AsRef<Path>>(path: P) -> Result<()> {
    attach_stream(Arc::new(Mutex::new(FileLogStream::new(path)?)));
    Ok(())
}

/// Convenience function to detach all log streams
pub fn detach_all_streams() {
    global_logger().detach_all_streams();
}

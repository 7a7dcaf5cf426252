//! Installer logging system
//!
//! Writes timestamped, level-prefixed lines to a log file and to the console.
//! The apply pipeline mutates the game directory, so every probe result and
//! delete/install decision is recorded here for post-mortem inspection.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

static LOGGER: OnceLock<Arc<Mutex<InstallerLogger>>> = OnceLock::new();

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Download,
    Install,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Download => "[DOWNLOAD]",
            LogLevel::Install => "[INSTALL]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

// ============================================================================
// Installer Logger
// ============================================================================

pub struct InstallerLogger {
    log_file: Option<File>,
}

impl InstallerLogger {
    pub fn new() -> Self {
        let log_dir = log_directory();
        let _ = fs::create_dir_all(&log_dir);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("omoritr-installer_{}.log", timestamp));

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok();

        let mut logger = Self { log_file };

        logger.write_raw(&format!(
            "omoritr-installer v{} - {}",
            env!("CARGO_PKG_VERSION"),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }

        // Also print to console
        println!("{}", msg);
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        let formatted = format!("[{}] {} {}", timestamp, level.prefix(), message);
        self.write_raw(&formatted);
    }
}

impl Default for InstallerLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Log directory under the platform data dir, with a home fallback.
fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("omoritr-installer")
        .join("logs")
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Initialize the global logger (call once at startup)
pub fn init_logger() {
    LOGGER.get_or_init(|| Arc::new(Mutex::new(InstallerLogger::new())));
}

/// Get the global logger instance
fn logger() -> Arc<Mutex<InstallerLogger>> {
    LOGGER
        .get_or_init(|| Arc::new(Mutex::new(InstallerLogger::new())))
        .clone()
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Info, message);
    }
}

pub fn log_download(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Download, message);
    }
}

pub fn log_install(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Install, message);
    }
}

pub fn log_warning(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Warning, message);
    }
}

pub fn log_error(message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(LogLevel::Error, message);
    }
}

//! Tab-scoped file logger: one append-only file per tab under
//! `logs/tabs/<tabId>.log`, plus an untabbed `logs/system.log` for
//! controller-wide events (dispatch misses, Bridge/Executor connection
//! state, startup).

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

pub struct Logger {
    files: Mutex<HashMap<String, File>>,
}

impl Logger {
    fn new() -> Self {
        Logger {
            files: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_create_file(&self, scope: &str) -> std::io::Result<()> {
        let mut files = self.files.lock().unwrap();

        if !files.contains_key(scope) {
            let log_dir = if scope == "system" {
                "logs".to_string()
            } else {
                "logs/tabs".to_string()
            };
            std::fs::create_dir_all(&log_dir)?;

            let file_name = if scope == "system" {
                "system.log".to_string()
            } else {
                format!("{scope}.log")
            };
            let log_path = format!("{log_dir}/{file_name}");

            let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
            files.insert(scope.to_string(), file);
        }

        Ok(())
    }

    pub fn log(&self, scope: &str, level: &str, message: &str) {
        if let Err(e) = self.get_or_create_file(scope) {
            eprintln!("LOGGER ERROR: failed to create log file for {scope}: {e}");
            return;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let log_line = format!("[{timestamp}] [{level}] {message}\n");

        if let Ok(mut files) = self.files.lock() {
            if let Some(file) = files.get_mut(scope) {
                let _ = file.write_all(log_line.as_bytes());
                let _ = file.flush();
            }
        }
    }

    pub fn debug(&self, scope: &str, message: &str) {
        self.log(scope, "DEBUG", message);
    }

    pub fn info(&self, scope: &str, message: &str) {
        self.log(scope, "INFO", message);
    }

    pub fn warn(&self, scope: &str, message: &str) {
        self.log(scope, "WARN", message);
    }

    pub fn error(&self, scope: &str, message: &str) {
        self.log(scope, "ERROR", message);
    }
}

lazy_static::lazy_static! {
    pub static ref LOGGER: Logger = Logger::new();
}

/// `tabId` → `"<tabId>"`, the scope key used for tab-scoped log files.
pub fn tab_scope(tab_id: i64) -> String {
    tab_id.to_string()
}

#[macro_export]
macro_rules! log_debug {
    ($tab_id:expr, $($arg:tt)*) => {
        $crate::logging::LOGGER.debug(&$crate::logging::tab_scope($tab_id), &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_info {
    ($tab_id:expr, $($arg:tt)*) => {
        $crate::logging::LOGGER.info(&$crate::logging::tab_scope($tab_id), &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($tab_id:expr, $($arg:tt)*) => {
        $crate::logging::LOGGER.warn(&$crate::logging::tab_scope($tab_id), &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($tab_id:expr, $($arg:tt)*) => {
        $crate::logging::LOGGER.error(&$crate::logging::tab_scope($tab_id), &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! sys_debug {
    ($($arg:tt)*) => {
        $crate::logging::LOGGER.debug("system", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! sys_info {
    ($($arg:tt)*) => {
        $crate::logging::LOGGER.info("system", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! sys_warn {
    ($($arg:tt)*) => {
        $crate::logging::LOGGER.warn("system", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! sys_error {
    ($($arg:tt)*) => {
        $crate::logging::LOGGER.error("system", &format!($($arg)*));
    };
}

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{pr_debug, pr_err, pr_info, pr_warn};

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let module_path = record.module_path().unwrap_or_default();
        match record.level() {
            Level::Error => {
                pr_err!("[ERROR] [{}] {}", module_path, record.args());
            }
            Level::Warn => {
                pr_warn!("[ WARN] [{}] {}", module_path, record.args());
            }
            Level::Info => {
                pr_info!("[ INFO] [{}] {}", module_path, record.args());
            }
            Level::Debug | Level::Trace => {
                pr_debug!("[DEBUG] [{}] {}", module_path, record.args());
            }
        };
    }
    fn flush(&self) {}
}

/// Installs the console logger. Safe to call from every module init; only
/// the first call takes effect.
pub fn init_logger() {
    if log::set_logger(&SimpleLogger).is_err() {
        return;
    }
    log::set_max_level(match std::env::var("LOG").ok().as_deref() {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    });
}

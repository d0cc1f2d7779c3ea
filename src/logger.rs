use crate::config::Config;
use crate::error::{GenerationError, Result};
use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

static PANEL_LOGGER: Lazy<PanelLogger> = Lazy::new(PanelLogger::new);

/// Installs the global logger. A second call only swaps the configuration.
pub fn init_with_config(config: LoggerConfig) -> Result<()> {
    let filter = config.min_level;
    PANEL_LOGGER.apply(config)?;

    if log::set_logger(&*PANEL_LOGGER).is_err() {
        log::debug!("Logger already installed; configuration updated");
    }
    log::set_max_level(filter);
    Ok(())
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

fn level_emoji(level: Level) -> &'static str {
    match level {
        Level::Trace => "🔍",
        Level::Debug => "🐛",
        Level::Info => "💡",
        Level::Warn => "⚠️",
        Level::Error => "❌",
    }
}

#[derive(Debug, Serialize)]
struct LogLine<'a> {
    timestamp: DateTime<Utc>,
    level: &'a str,
    target: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LevelFilter,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: true,
            show_emojis: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            log_file_path: Some("panelgen.log".to_string()),
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            show_file_location: true,
            ..Default::default()
        }
    }

    /// Development output when `debug` is set, production output otherwise.
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            Self::development()
        } else {
            Self::production()
        }
    }
}

pub struct PanelLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl PanelLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn apply(&self, config: LoggerConfig) -> Result<()> {
        let file = match &config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        GenerationError::ConfigError(format!("Cannot open log file {}: {}", path, e))
                    })?,
            ),
            None => None,
        };

        if let Ok(mut guard) = self.log_file.lock() {
            *guard = file;
        }
        if let Ok(mut guard) = self.config.lock() {
            *guard = config;
        }
        Ok(())
    }

    fn format_plain(&self, record: &Record, config: &LoggerConfig) -> String {
        let timestamp = Utc::now().format(&config.timestamp_format).to_string();
        let level = record.level();
        let level_str = if config.show_emojis {
            format!("{} {}", level_emoji(level), level.as_str())
        } else {
            level.as_str().to_string()
        };
        let message = record.args().to_string();

        let mut output = if config.show_colors {
            format!(
                "{} [{}] {}::{}",
                timestamp.bright_black(),
                level_str.color(level_color(level)).bold(),
                record.target().bright_blue(),
                message.white().bold()
            )
        } else {
            format!("{} [{}] {}::{}", timestamp, level_str, record.target(), message)
        };

        if config.show_file_location {
            if let (Some(file), Some(line)) = (record.file(), record.line()) {
                let location = format!("{}:{}", file, line);
                if config.show_colors {
                    output.push_str(&format!(" ({})", location.bright_black()));
                } else {
                    output.push_str(&format!(" ({})", location));
                }
            }
        }
        output
    }

    fn format_json(&self, record: &Record) -> String {
        let line = LogLine {
            timestamp: Utc::now(),
            level: record.level().as_str(),
            target: record.target(),
            message: record.args().to_string(),
            file: record.file(),
            line: record.line(),
        };
        serde_json::to_string(&line).unwrap_or_default()
    }
}

impl log::Log for PanelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level,
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Ok(config) = self.config.lock() else {
            return;
        };

        let console = if config.output_json {
            self.format_json(record)
        } else {
            self.format_plain(record, &config)
        };
        println!("{}", console);

        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let line = if config.output_json {
                    console
                } else {
                    self.format_plain(record, &config.clone().with_colors(false))
                };
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a named operation took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  {} completed in {}ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, config: &Config) {
    log::info!("🚀 Starting {} v{}", app_name, version);
    log::info!(
        "🌐 Server will run on http://{}:{}",
        config.server.host,
        config.server.port
    );
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Model: {}", config.gemini.model);
    log::info!("   Image size: {}", config.gemini.image_size);
    log::info!(
        "   API key: {}",
        if config.gemini.require_api_key().is_ok() { "✅" } else { "❌" }
    );
    log::info!(
        "   Character refs: {}",
        config.storage.char_refs_dir.display()
    );
    log::info!(
        "   Layout refs: {}",
        config.storage.layout_refs_dir.display()
    );
    log::info!("   Outputs: {}", config.storage.output_dir.display());
}

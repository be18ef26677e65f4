use super::GlobalConfig;
use crate::config::{benchmark::BenchmarkLogLevel, compilation::CompilationLogLevel};
use alloc::{collections::BTreeMap, string::ToString, sync::Arc, vec::Vec};
use core::fmt::Display;

#[cfg(std_io)]
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

/// Configuration of one logging topic, parameterized by the topic log level.
///
/// Several outputs can be enabled at the same time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct LoggerConfig<L: LogLevel> {
    /// Path to the log file, if file logging is enabled.
    #[serde(default)]
    #[cfg(std_io)]
    pub file: Option<PathBuf>,

    /// Whether to append to the log file (true) or overwrite it (false). Defaults to true.
    #[serde(default = "append_default")]
    pub append: bool,

    /// Whether to log to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Whether to log to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Forward the messages to the `log` crate at the given level.
    #[serde(default)]
    pub log: Option<LogCrateLevel>,

    /// The log level of the topic.
    #[serde(default)]
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            #[cfg(std_io)]
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Log levels using the `log` crate.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
)]
pub enum LogCrateLevel {
    /// Logs informational messages.
    #[default]
    #[serde(rename = "info")]
    Info,

    /// Logs debugging messages.
    #[serde(rename = "debug")]
    Debug,

    /// Logs trace-level messages.
    #[serde(rename = "trace")]
    Trace,
}

fn append_default() -> bool {
    true
}

/// Trait for types that can be used as log levels in [`LoggerConfig`].
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Logger writing the benchmark and compilation topics to their configured outputs.
#[derive(Debug)]
pub struct Logger {
    loggers: Vec<LoggerKind>,
    benchmark_index: Vec<usize>,
    compilation_index: Vec<usize>,

    /// Global configuration the logger was created from.
    pub config: Arc<GlobalConfig>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum LoggerId {
    #[cfg(std_io)]
    File(PathBuf),
    #[cfg(feature = "std")]
    Stdout,
    #[cfg(feature = "std")]
    Stderr,
    LogCrate(LogCrateLevel),
}

impl Logger {
    /// Creates a new `Logger` from the global configuration.
    ///
    /// Outputs shared between topics are opened once.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Creates a new `Logger` from the given configuration.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let mut loggers = Vec::new();
        let mut logger2index = BTreeMap::<LoggerId, usize>::new();
        let mut benchmark_index = Vec::new();
        let mut compilation_index = Vec::new();

        if config.benchmark.logger.level != BenchmarkLogLevel::Disabled {
            register_logger(
                &config.benchmark.logger,
                &mut benchmark_index,
                &mut loggers,
                &mut logger2index,
            );
        }

        if config.compilation.logger.level != CompilationLogLevel::Disabled {
            register_logger(
                &config.compilation.logger,
                &mut compilation_index,
                &mut loggers,
                &mut logger2index,
            );
        }

        Self {
            loggers,
            benchmark_index,
            compilation_index,
            config,
        }
    }

    /// Logs a benchmark message to all configured benchmark outputs.
    pub fn log_benchmark<S: Display>(&mut self, msg: &S) {
        let indices = core::mem::take(&mut self.benchmark_index);
        self.log_all(&indices, msg);
        self.benchmark_index = indices;
    }

    /// Logs a compilation message to all configured compilation outputs.
    pub fn log_compilation<S: Display>(&mut self, msg: &S) {
        let indices = core::mem::take(&mut self.compilation_index);
        self.log_all(&indices, msg);
        self.compilation_index = indices;
    }

    /// Returns the current benchmark log level.
    pub fn log_level_benchmark(&self) -> BenchmarkLogLevel {
        self.config.benchmark.logger.level
    }

    /// Returns the current compilation log level.
    pub fn log_level_compilation(&self) -> CompilationLogLevel {
        self.config.compilation.logger.level
    }

    fn log_all<S: Display>(&mut self, indices: &[usize], msg: &S) {
        match indices {
            [] => {}
            [index] => self.loggers[*index].log(msg),
            indices => {
                let msg = msg.to_string();
                for index in indices {
                    self.loggers[*index].log(&msg);
                }
            }
        }
    }
}

fn register_logger<L: LogLevel>(
    kind: &LoggerConfig<L>,
    setting_index: &mut Vec<usize>,
    loggers: &mut Vec<LoggerKind>,
    logger2index: &mut BTreeMap<LoggerId, usize>,
) {
    let mut add = |id: LoggerId, create: &dyn Fn() -> Option<LoggerKind>| {
        if let Some(index) = logger2index.get(&id) {
            setting_index.push(*index);
        } else if let Some(logger) = create() {
            let index = loggers.len();
            logger2index.insert(id, index);
            loggers.push(logger);
            setting_index.push(index);
        }
    };

    #[cfg(std_io)]
    if let Some(file) = &kind.file {
        add(LoggerId::File(file.clone()), &|| {
            FileLogger::new(file, kind.append).map(LoggerKind::File)
        });
    }

    #[cfg(feature = "std")]
    if kind.stdout {
        add(LoggerId::Stdout, &|| Some(LoggerKind::Stdout));
    }

    #[cfg(feature = "std")]
    if kind.stderr {
        add(LoggerId::Stderr, &|| Some(LoggerKind::Stderr));
    }

    if let Some(level) = kind.log {
        add(LoggerId::LogCrate(level), &|| Some(LoggerKind::Log(level)));
    }
}

#[derive(Debug)]
enum LoggerKind {
    #[cfg(std_io)]
    File(FileLogger),
    #[cfg(feature = "std")]
    Stdout,
    #[cfg(feature = "std")]
    Stderr,
    Log(LogCrateLevel),
}

impl LoggerKind {
    fn log<S: Display>(&mut self, msg: &S) {
        match self {
            #[cfg(std_io)]
            LoggerKind::File(file_logger) => file_logger.log(msg),
            #[cfg(feature = "std")]
            LoggerKind::Stdout => println!("{msg}"),
            #[cfg(feature = "std")]
            LoggerKind::Stderr => eprintln!("{msg}"),
            LoggerKind::Log(level) => match level {
                LogCrateLevel::Info => log::info!("{msg}"),
                LogCrateLevel::Debug => log::debug!("{msg}"),
                LogCrateLevel::Trace => log::trace!("{msg}"),
            },
        }
    }
}

#[derive(Debug)]
#[cfg(std_io)]
struct FileLogger {
    writer: BufWriter<File>,
}

#[cfg(std_io)]
impl FileLogger {
    fn new(path: &PathBuf, append: bool) -> Option<Self> {
        let file = OpenOptions::new()
            .write(true)
            .append(append)
            .truncate(!append)
            .create(true)
            .open(path);

        match file {
            Ok(file) => Some(Self {
                writer: BufWriter::new(file),
            }),
            Err(err) => {
                log::warn!("Unable to open log file {}: {err}", path.display());
                None
            }
        }
    }

    fn log<S: Display>(&mut self, msg: &S) {
        let result = writeln!(self.writer, "{msg}").and_then(|_| self.writer.flush());
        if let Err(err) = result {
            log::warn!("Unable to write to the log file: {err}");
        }
    }
}

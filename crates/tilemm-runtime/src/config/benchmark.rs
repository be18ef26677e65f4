use super::logger::{LogCrateLevel, LogLevel, LoggerConfig};

/// Configuration for the benchmark loop.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkConfig {
    /// Logger for benchmark reports.
    #[serde(default = "logger_default")]
    pub logger: LoggerConfig<BenchmarkLogLevel>,

    /// Number of dispatches timed per run.
    #[serde(default = "iterations_default")]
    pub iterations: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            logger: logger_default(),
            iterations: iterations_default(),
        }
    }
}

fn logger_default() -> LoggerConfig<BenchmarkLogLevel> {
    LoggerConfig {
        log: Some(LogCrateLevel::Info),
        level: BenchmarkLogLevel::Basic,
        ..Default::default()
    }
}

fn iterations_default() -> usize {
    4
}

/// How much is logged while benchmarking.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BenchmarkLogLevel {
    /// Benchmark logging is disabled.
    #[serde(rename = "disabled")]
    Disabled,

    /// Logs the final report of every run.
    #[default]
    #[serde(rename = "basic")]
    Basic,

    /// Also logs every dispatch of the loop.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for BenchmarkLogLevel {}

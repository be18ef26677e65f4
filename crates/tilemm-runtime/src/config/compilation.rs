use super::logger::{LogLevel, LoggerConfig};

/// Configuration for shader compilation logging.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CompilationConfig {
    /// Logger for compiled shaders.
    #[serde(default)]
    pub logger: LoggerConfig<CompilationLogLevel>,
}

/// How much is logged when a shader is compiled.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompilationLogLevel {
    /// Compilation logging is disabled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Logs the kernel name and its launch shapes.
    #[serde(rename = "basic")]
    Basic,

    /// Also dumps the instantiated shader source.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for CompilationLogLevel {}

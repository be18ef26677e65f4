use super::{
    benchmark::BenchmarkConfig, compilation::CompilationConfig, device::DeviceConfig,
    validation::ValidationConfig,
};
use alloc::sync::Arc;

/// Static mutex holding the global configuration, initialized as `None`.
static TILEMM_GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// The global configuration: benchmark, compilation, validation and device settings.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Configuration of the benchmark loop.
    #[serde(default)]
    pub benchmark: BenchmarkConfig,

    /// Configuration for compilation settings.
    #[serde(default)]
    pub compilation: CompilationConfig,

    /// Tolerances of the result validator.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Device selection.
    #[serde(default)]
    pub device: DeviceConfig,
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not set.
    ///
    /// If no configuration is set, it attempts to load one from `tilemm.toml` or `TileMM.toml` in
    /// the current directory or its parents, then applies the environment overrides. If no file
    /// is found, a default configuration is used.
    pub fn get() -> Arc<Self> {
        let mut state = TILEMM_GLOBAL_CONFIG.lock();
        if let Some(config) = state.as_ref() {
            return config.clone();
        }

        cfg_if::cfg_if! {
            if #[cfg(std_io)] {
                let config = Self::from_current_dir();
                let config = config.override_from_env();
            } else {
                let config = Self::default();
            }
        }

        let config = Arc::new(config);
        *state = Some(config.clone());
        config
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    ///
    /// # Warning
    /// This method must be called at the start of the program, before any calls to `get`.
    pub fn set(config: Self) {
        let mut state = TILEMM_GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    #[cfg(std_io)]
    /// Overrides configuration fields based on environment variables.
    pub fn override_from_env(mut self) -> Self {
        use super::{
            benchmark::BenchmarkLogLevel, compilation::CompilationLogLevel, device::DeviceKind,
        };

        if let Ok(val) = std::env::var("TILEMM_DEBUG_LOG") {
            self.compilation.logger.level = CompilationLogLevel::Full;
            self.benchmark.logger.level = BenchmarkLogLevel::Full;

            match val.as_str() {
                "stdout" => {
                    self.compilation.logger.stdout = true;
                    self.benchmark.logger.stdout = true;
                }
                "stderr" => {
                    self.compilation.logger.stderr = true;
                    self.benchmark.logger.stderr = true;
                }
                "1" | "true" => {
                    let file_path = "/tmp/tilemm.log";
                    self.compilation.logger.file = Some(file_path.into());
                    self.benchmark.logger.file = Some(file_path.into());
                }
                "0" | "false" => {
                    self.compilation.logger.level = CompilationLogLevel::Disabled;
                    self.benchmark.logger.level = BenchmarkLogLevel::Disabled;
                }
                file_path => {
                    self.compilation.logger.file = Some(file_path.into());
                    self.benchmark.logger.file = Some(file_path.into());
                }
            }
        };

        if let Ok(val) = std::env::var("TILEMM_BENCH_ITERATIONS") {
            match val.parse::<usize>() {
                Ok(iterations) if iterations > 0 => self.benchmark.iterations = iterations,
                _ => log::warn!("Ignoring TILEMM_BENCH_ITERATIONS={val}, expected a positive integer"),
            }
        }

        if let Ok(val) = std::env::var("TILEMM_WGPU_DEVICE") {
            match DeviceKind::parse(&val) {
                Some(kind) => self.device.kind = kind,
                None => log::warn!("Ignoring unknown device kind TILEMM_WGPU_DEVICE={val}"),
            }
        }

        self
    }

    // Loads configuration from the closest config file, falling back to the defaults.
    #[cfg(std_io)]
    fn from_current_dir() -> Self {
        let Some(path) = Self::find_file() else {
            return Self::default();
        };

        match Self::from_file_path(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Skipping config file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Finds `tilemm.toml` or `TileMM.toml` in the current directory or its parents.
    #[cfg(std_io)]
    pub fn find_file() -> Option<std::path::PathBuf> {
        let mut dir = std::env::current_dir().ok()?;

        loop {
            for name in ["tilemm.toml", "TileMM.toml"] {
                let path = dir.join(name);
                if path.is_file() {
                    return Some(path);
                }
            }

            if !dir.pop() {
                return None;
            }
        }
    }

    /// Loads configuration from a specified file path.
    #[cfg(std_io)]
    pub fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    /// Parses a configuration from TOML. Missing sections and fields take their default value.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        benchmark::BenchmarkLogLevel, compilation::CompilationLogLevel, device::DeviceKind,
    };
    use pretty_assertions::assert_eq;

    #[test_log::test]
    fn empty_file_gives_defaults() {
        let config = GlobalConfig::from_toml("").unwrap();

        assert_eq!(config.benchmark.iterations, 4);
        assert_eq!(config.benchmark.logger.level, BenchmarkLogLevel::Basic);
        assert_eq!(config.compilation.logger.level, CompilationLogLevel::Disabled);
        assert_eq!(config.validation.atol, 1e-3);
        assert_eq!(config.validation.max_problem_volume, 1 << 24);
        assert_eq!(config.device.kind, DeviceKind::Default);
    }

    #[test_log::test]
    fn sections_are_parsed() {
        let config = GlobalConfig::from_toml(
            r#"
            [benchmark]
            iterations = 10

            [compilation.logger]
            level = "full"
            stdout = true

            [validation]
            rtol = 0.01

            [device]
            kind = "cpu"
            "#,
        )
        .unwrap();

        assert_eq!(config.benchmark.iterations, 10);
        assert_eq!(config.compilation.logger.level, CompilationLogLevel::Full);
        assert!(config.compilation.logger.stdout);
        assert_eq!(config.validation.rtol, 0.01);
        assert_eq!(config.validation.atol, 1e-3);
        assert_eq!(config.device.kind, DeviceKind::Cpu);
    }

    #[test_log::test]
    fn unknown_level_is_rejected() {
        let result = GlobalConfig::from_toml(
            r#"
            [benchmark.logger]
            level = "verbose"
            "#,
        );

        assert!(result.is_err());
    }

    #[test_log::test]
    #[serial_test::serial]
    fn env_overrides_iterations_and_device() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe {
            std::env::set_var("TILEMM_BENCH_ITERATIONS", "7");
            std::env::set_var("TILEMM_WGPU_DEVICE", "integrated");
        }

        let config = GlobalConfig::default().override_from_env();

        unsafe {
            std::env::remove_var("TILEMM_BENCH_ITERATIONS");
            std::env::remove_var("TILEMM_WGPU_DEVICE");
        }

        assert_eq!(config.benchmark.iterations, 7);
        assert_eq!(config.device.kind, DeviceKind::Integrated);
    }

    #[test_log::test]
    #[serial_test::serial]
    fn invalid_env_values_are_ignored() {
        unsafe {
            std::env::set_var("TILEMM_BENCH_ITERATIONS", "0");
            std::env::set_var("TILEMM_WGPU_DEVICE", "quantum");
        }

        let config = GlobalConfig::default().override_from_env();

        unsafe {
            std::env::remove_var("TILEMM_BENCH_ITERATIONS");
            std::env::remove_var("TILEMM_WGPU_DEVICE");
        }

        assert_eq!(config.benchmark.iterations, 4);
        assert_eq!(config.device.kind, DeviceKind::Default);
    }

    #[test_log::test]
    #[serial_test::serial]
    fn debug_log_disables_every_topic() {
        unsafe {
            std::env::set_var("TILEMM_DEBUG_LOG", "0");
        }

        let config = GlobalConfig::default().override_from_env();

        unsafe {
            std::env::remove_var("TILEMM_DEBUG_LOG");
        }

        assert_eq!(config.benchmark.logger.level, BenchmarkLogLevel::Disabled);
        assert_eq!(config.compilation.logger.level, CompilationLogLevel::Disabled);
    }

    #[test_log::test]
    #[serial_test::serial]
    fn debug_log_to_file() {
        unsafe {
            std::env::set_var("TILEMM_DEBUG_LOG", "true");
        }

        let config = GlobalConfig::default().override_from_env();

        unsafe {
            std::env::remove_var("TILEMM_DEBUG_LOG");
        }

        assert_eq!(config.compilation.logger.level, CompilationLogLevel::Full);
        assert_eq!(
            config.benchmark.logger.file,
            Some(std::path::PathBuf::from("/tmp/tilemm.log"))
        );
    }
}

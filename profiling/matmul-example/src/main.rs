use std::process::ExitCode;

use tilemm::{
    ElemType, Element, Runtime,
    common::{
        format::format_matrix,
        rand::{DEFAULT_SEED, get_seeded_rng, randn},
    },
    matmul::{
        MatmulLaunchError, MatmulProblem, MatmulSize, MatmulStrategy, MatmulVariant,
        kernels::block_tiled::BlockTiling, launch::launch, reference::matmul_reference,
        validation::Validation,
    },
    runtime::{
        config::{GlobalConfig, validation::ValidationConfig},
        server::ServerError,
    },
    wgpu::{WgpuDevice, WgpuRuntime},
};

/// The `[run]` section of `tilemm.toml`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
struct RunConfig {
    /// Preset problem size, ignored when `m`, `k` and `n` are all given.
    size: MatmulSize,
    m: Option<usize>,
    k: Option<usize>,
    n: Option<usize>,
    variant: MatmulVariant,
    precision: ElemType,
    seed: u64,
    /// Tile side of the tiled kernel.
    tile_size: Option<u32>,
    /// Tiling of the block tiled kernel.
    tiling: Option<BlockTiling>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            size: MatmulSize::Small,
            m: None,
            k: None,
            n: None,
            variant: MatmulVariant::BlockTiled,
            precision: ElemType::F32,
            seed: DEFAULT_SEED,
            tile_size: None,
            tiling: None,
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct ConfigFile {
    #[serde(default)]
    run: RunConfig,
}

impl RunConfig {
    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ConfigFile>(content).map(|file| file.run)
    }

    fn load() -> Result<Self, RunError> {
        let Some(path) = GlobalConfig::find_file() else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(&path).map_err(|err| RunError::Config {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_toml(&content).map_err(|err| RunError::Config {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    fn problem(&self) -> MatmulProblem {
        match (self.m, self.k, self.n) {
            (Some(m), Some(k), Some(n)) => MatmulProblem::new(m, k, n, self.precision),
            _ => MatmulProblem::from_size(self.size, self.precision),
        }
    }

    fn strategy(&self) -> MatmulStrategy {
        match (self.variant, self.tile_size, self.tiling) {
            (MatmulVariant::Tiled, Some(tile_size), _) => MatmulStrategy::tiled(tile_size),
            (MatmulVariant::BlockTiled, _, Some(tiling)) => MatmulStrategy::block_tiled(tiling),
            (variant, ..) => variant.reference_strategy(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("Invalid config file {path}: {reason}")]
    Config { path: String, reason: String },
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Launch(#[from] MatmulLaunchError),
}

fn run<E: Element>(config: &RunConfig) -> Result<(), RunError> {
    let problem = config.problem();
    let strategy = config.strategy();
    let global = GlobalConfig::get();

    let mut rng = get_seeded_rng(config.seed);
    let lhs = randn(&mut rng, problem.m * problem.k);
    let rhs = randn(&mut rng, problem.n * problem.k);
    log::info!("{}", format_matrix(&lhs, problem.m, problem.k, "Input"));
    log::info!("{}", format_matrix(&rhs, problem.n, problem.k, "Weights"));

    let device = WgpuDevice::from(global.device.kind);
    let mut client = WgpuRuntime::create_client(&device)?;
    log::info!("Running the {} kernel on {}", strategy.variant(), WgpuRuntime::name());

    let run = launch(
        &mut client,
        &problem,
        &strategy,
        &E::from_f32_slice(&lhs),
        &E::from_f32_slice(&rhs),
        global.benchmark.iterations,
    )?;
    let output: Vec<f32> = run.output.into_iter().map(Element::to_f32).collect();
    log::info!("{}", format_matrix(&output, problem.m, problem.n, "Output"));

    validate(&problem, &lhs, &rhs, &output, &global.validation);

    Ok(())
}

/// Compare the device output with the CPU reference and report the outcome.
///
/// A mismatch is reported, not returned: the benchmark itself succeeded.
fn validate(
    problem: &MatmulProblem,
    lhs: &[f32],
    rhs: &[f32],
    output: &[f32],
    config: &ValidationConfig,
) -> Option<Validation> {
    if problem.volume() > config.max_problem_volume {
        log::info!(
            "Skipping the CPU reference, the problem volume {} is above {}",
            problem.volume(),
            config.max_problem_volume
        );
        return None;
    }

    log::info!("Computing CPU reference implementation");
    let expected = matmul_reference(problem, lhs, rhs);
    let validation = Validation::compare(output, &expected, config);
    match validation.passed() {
        true => log::info!("{validation}"),
        false => log::error!("{validation}"),
    }

    Some(validation)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = RunConfig::load().and_then(|config| {
        log::info!("{config:?}");
        match config.precision {
            ElemType::F32 => run::<f32>(&config),
            ElemType::F16 => run::<half::f16>(&config),
        }
    });

    match result {
        Ok(()) => {
            log::info!("Done.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

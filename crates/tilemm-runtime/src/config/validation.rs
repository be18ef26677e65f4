/// Tolerances used when comparing device results with the CPU reference.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationConfig {
    /// Absolute tolerance.
    #[serde(default = "tolerance_default")]
    pub atol: f32,

    /// Relative tolerance.
    #[serde(default = "tolerance_default")]
    pub rtol: f32,

    /// Problems with `M * K * N` above this volume are not validated, since the CPU reference
    /// would dominate the run time.
    #[serde(default = "max_problem_volume_default")]
    pub max_problem_volume: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            atol: tolerance_default(),
            rtol: tolerance_default(),
            max_problem_volume: max_problem_volume_default(),
        }
    }
}

fn tolerance_default() -> f32 {
    1e-3
}

fn max_problem_volume_default() -> u64 {
    1 << 24
}

use core::fmt::Display;

use tilemm_runtime::config::validation::ValidationConfig;

/// `|actual - expected| <= atol + rtol · |expected|`. Non-finite values never match.
pub fn isclose(actual: f32, expected: f32, atol: f32, rtol: f32) -> bool {
    (actual - expected).abs() <= atol + rtol * expected.abs()
}

/// First element that differs from the reference.
#[derive(new, Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    /// Flat index of the element.
    pub index: usize,
    /// Device value.
    pub actual: f32,
    /// Reference value.
    pub expected: f32,
}

/// Outcome of comparing a device result with the CPU reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Number of elements compared.
    pub num_elems: usize,
    /// Number of elements outside of the tolerance.
    pub num_mismatches: usize,
    /// The first element outside of the tolerance.
    pub first_mismatch: Option<Mismatch>,
    /// Largest absolute difference.
    pub max_abs_error: f32,
}

impl Validation {
    /// Compare element-wise with the configured tolerances.
    ///
    /// Outputs of different lengths never pass.
    pub fn compare(actual: &[f32], expected: &[f32], config: &ValidationConfig) -> Self {
        let mut validation = Validation {
            num_elems: actual.len().max(expected.len()),
            num_mismatches: actual.len().abs_diff(expected.len()),
            first_mismatch: None,
            max_abs_error: 0.0,
        };

        for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
            let error = (a - e).abs();
            if error > validation.max_abs_error || error.is_nan() {
                validation.max_abs_error = error;
            }

            if !isclose(*a, *e, config.atol, config.rtol) {
                validation.num_mismatches += 1;
                validation
                    .first_mismatch
                    .get_or_insert(Mismatch::new(index, *a, *e));
            }
        }

        validation
    }

    /// Whether every element is within the tolerance.
    pub fn passed(&self) -> bool {
        self.num_mismatches == 0
    }
}

impl Display for Validation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.passed() {
            return write!(f, "PASS (max abs error {:e})", self.max_abs_error);
        }

        write!(
            f,
            "FAIL ({} of {} elements differ",
            self.num_mismatches, self.num_elems
        )?;
        if let Some(mismatch) = &self.first_mismatch {
            write!(
                f,
                ", first at index {}: {} != {}",
                mismatch.index, mismatch.actual, mismatch.expected
            )?;
        }
        write!(f, ")")
    }
}

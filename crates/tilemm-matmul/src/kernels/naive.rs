use tilemm_common::Shape3;
use tilemm_runtime::kernel::ShaderCode;

use crate::{
    MatmulProblem,
    template::{Placeholder, PlaceholderMap, ShaderTemplate, TemplateError, with_extensions},
};

/// The WGSL template of the naive kernel.
pub const TEMPLATE: ShaderTemplate = ShaderTemplate::new("matmul_naive", include_str!("naive.wgsl"));

/// Workgroup shape of the reference configuration.
pub const DEFAULT_WORKGROUP: Shape3 = Shape3::new_2d(16, 16);

/// Instantiate the naive kernel.
///
/// Worker `(row, col)` of the grid computes `C[row, col]`, workers outside of `M x N` return
/// immediately.
pub fn shader(problem: &MatmulProblem, workgroup: Shape3) -> Result<ShaderCode, TemplateError> {
    let values = PlaceholderMap::new()
        .with(Placeholder::Precision, problem.precision)
        .with(Placeholder::WorkgroupSize, workgroup)
        .with(Placeholder::M, problem.m)
        .with(Placeholder::K, problem.k)
        .with(Placeholder::N, problem.n);

    let source = with_extensions(TEMPLATE.compile(&values)?, problem.precision);
    Ok(ShaderCode::new(TEMPLATE.name().to_string(), source, workgroup))
}

/// `cdiv((M, N, 1), workgroup)`.
pub fn cube_count(problem: &MatmulProblem, workgroup: Shape3) -> Shape3 {
    problem.output_extent().cdiv(&workgroup)
}

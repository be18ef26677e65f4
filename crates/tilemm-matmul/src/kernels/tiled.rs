use tilemm_common::Shape3;
use tilemm_runtime::kernel::ShaderCode;

use crate::{
    MatmulProblem,
    template::{Placeholder, PlaceholderMap, ShaderTemplate, TemplateError, with_extensions},
};

/// The WGSL template of the shared memory kernel.
pub const TEMPLATE: ShaderTemplate = ShaderTemplate::new("matmul_tiled", include_str!("tiled.wgsl"));

/// Tile side of the reference configuration.
pub const DEFAULT_TILE_SIZE: u32 = 16;

/// A one dimensional workgroup with one worker per element of a `tile_size x tile_size` tile.
///
/// Saturates on overflow, which leaves a workgroup that isn't a perfect square.
pub const fn workgroup(tile_size: u32) -> Shape3 {
    Shape3::new_1d(tile_size.saturating_mul(tile_size))
}

/// The tile side used with a workgroup: `⌊√workgroup.x⌋`.
pub fn tile_size(workgroup: Shape3) -> u32 {
    workgroup.x.isqrt()
}

/// Instantiate the shared memory kernel.
///
/// The loads aren't masked, so the tile size must divide `M`, `K` and `N`. This is checked by
/// [MatmulStrategy::check_problem](crate::MatmulStrategy::check_problem), not here.
pub fn shader(problem: &MatmulProblem, workgroup: Shape3) -> Result<ShaderCode, TemplateError> {
    let tile = tile_size(workgroup);
    let values = PlaceholderMap::new()
        .with(Placeholder::Precision, problem.precision)
        .with(Placeholder::WorkgroupSize, workgroup)
        .with(Placeholder::M, problem.m)
        .with(Placeholder::K, problem.k)
        .with(Placeholder::N, problem.n)
        .with(Placeholder::TileSize, tile)
        .with(Placeholder::TileArea, tile * tile);

    let source = with_extensions(TEMPLATE.compile(&values)?, problem.precision);
    Ok(ShaderCode::new(TEMPLATE.name().to_string(), source, workgroup))
}

/// `cdiv((M, N, 1), (T, T, 1))`.
pub fn cube_count(problem: &MatmulProblem, workgroup: Shape3) -> Shape3 {
    let tile = tile_size(workgroup);
    problem.output_extent().cdiv(&Shape3::new_2d(tile, tile))
}

use tilemm_common::{Shape3, cdiv};
use tilemm_runtime::kernel::ShaderCode;

use crate::{
    MatmulProblem,
    template::{Placeholder, PlaceholderMap, ShaderTemplate, TemplateError, with_extensions},
};

/// The WGSL template of the block tiled kernel.
pub const TEMPLATE: ShaderTemplate =
    ShaderTemplate::new("matmul_block_tiled", include_str!("block_tiled.wgsl"));

/// Tiling parameters of the block tiled kernel.
///
/// A workgroup computes a `bm x bn` block of the output, stepping over `K` by `bk`, and every
/// worker accumulates `tm` output rows.
#[derive(
    new, Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct BlockTiling {
    /// Rows of an output block.
    pub bm: u32,
    /// Depth of the staged tiles.
    pub bk: u32,
    /// Columns of an output block.
    pub bn: u32,
    /// Output rows per worker.
    pub tm: u32,
}

impl Default for BlockTiling {
    /// The reference configuration.
    fn default() -> Self {
        Self::new(4, 4, 4, 1)
    }
}

impl BlockTiling {
    /// `(BM·BN/TM, 1, 1)`, or `None` when `TM` is zero or `BM·BN` overflows.
    pub fn workgroup(&self) -> Option<Shape3> {
        self.workers().map(Shape3::new_1d)
    }

    /// Number of workers in a workgroup.
    pub fn workers(&self) -> Option<u32> {
        self.bm.checked_mul(self.bn)?.checked_div(self.tm)
    }

    /// Elements of the staged tile of an operand, `None` on overflow.
    pub fn tile_area(&self, operand: TileOperand) -> Option<u32> {
        match operand {
            TileOperand::Lhs => self.bm.checked_mul(self.bk),
            TileOperand::Rhs => self.bk.checked_mul(self.bn),
        }
    }
}

/// The operand a staged tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TileOperand {
    /// `A`, staged as `BM x BK`.
    #[display("A")]
    Lhs,
    /// `Bᵗ`, staged as `BN x BK`.
    #[display("Bᵗ")]
    Rhs,
}

/// A way the block tiled kernel computes wrong results for a tiling.
///
/// The kernel is emitted as is; these only describe where it goes wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BlockTiledHazard {
    /// Every worker stages a single element, leaving part of the tile stale.
    #[display(
        "only {workers} of the {elements} elements of the {operand} tile are loaded per step"
    )]
    PartialTileLoad {
        /// The operand.
        operand: TileOperand,
        /// Elements in the tile.
        elements: u32,
        /// Workers in the workgroup.
        workers: u32,
    },
    /// More workers than tile elements: the extra loads write out of the tile.
    #[display("{workers} workers load the {elements} elements of the {operand} tile")]
    TileOverflow {
        /// The operand.
        operand: TileOperand,
        /// Elements in the tile.
        elements: u32,
        /// Workers in the workgroup.
        workers: u32,
    },
    /// The grid divides the rows by `BM·TM` but a workgroup only writes `BM` rows.
    #[display(
        "a workgroup writes {rows_per_workgroup} rows but the grid assumes {rows_assumed_by_grid}"
    )]
    UncoveredRows {
        /// Rows written by a workgroup.
        rows_per_workgroup: u32,
        /// Rows the grid expects from a workgroup.
        rows_assumed_by_grid: u32,
    },
}

impl BlockTiledHazard {
    /// Whether every run is affected. Out of bounds writes to workgroup memory are left to the
    /// driver, so an overflowing tile only corrupts results on some devices.
    pub fn always_wrong(&self) -> bool {
        !matches!(self, BlockTiledHazard::TileOverflow { .. })
    }
}

/// Find the known defects of the kernel for a tiling. Empty when the result is correct for
/// problems the tiles divide.
///
/// Tilings whose sizes overflow or have a zero `TM` have no workgroup at all; they are rejected
/// by [MatmulStrategy::check_problem](crate::MatmulStrategy::check_problem) and report nothing
/// here.
pub fn hazards(tiling: &BlockTiling) -> Vec<BlockTiledHazard> {
    let mut hazards = Vec::new();
    let Some(workers) = tiling.workers() else {
        return hazards;
    };

    for operand in [TileOperand::Lhs, TileOperand::Rhs] {
        let Some(elements) = tiling.tile_area(operand) else {
            continue;
        };
        if workers < elements {
            hazards.push(BlockTiledHazard::PartialTileLoad {
                operand,
                elements,
                workers,
            });
        } else if workers > elements {
            hazards.push(BlockTiledHazard::TileOverflow {
                operand,
                elements,
                workers,
            });
        }
    }

    if tiling.tm > 1 {
        hazards.push(BlockTiledHazard::UncoveredRows {
            rows_per_workgroup: tiling.bm,
            rows_assumed_by_grid: tiling.bm.saturating_mul(tiling.tm),
        });
    }

    hazards
}

/// Instantiate the block tiled kernel.
pub fn shader(
    problem: &MatmulProblem,
    tiling: &BlockTiling,
    workgroup: Shape3,
) -> Result<ShaderCode, TemplateError> {
    let values = PlaceholderMap::new()
        .with(Placeholder::Precision, problem.precision)
        .with(Placeholder::WorkgroupSize, workgroup)
        .with(Placeholder::M, problem.m)
        .with(Placeholder::K, problem.k)
        .with(Placeholder::N, problem.n)
        .with(Placeholder::BM, tiling.bm)
        .with(Placeholder::BK, tiling.bk)
        .with(Placeholder::BN, tiling.bn)
        .with(Placeholder::TM, tiling.tm)
        .with(Placeholder::TileAreaA, tiling.bm.saturating_mul(tiling.bk))
        .with(Placeholder::TileAreaB, tiling.bk.saturating_mul(tiling.bn));

    let source = with_extensions(TEMPLATE.compile(&values)?, problem.precision);
    Ok(ShaderCode::new(TEMPLATE.name().to_string(), source, workgroup))
}

/// `(⌈⌈M/BM⌉/TM⌉, ⌈N/BN⌉, 1)`.
pub fn cube_count(problem: &MatmulProblem, tiling: &BlockTiling) -> Shape3 {
    Shape3::new(
        cdiv(cdiv(problem.m as u32, tiling.bm), tiling.tm),
        cdiv(problem.n as u32, tiling.bn),
        1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tilemm_runtime::ElemType;

    #[test_log::test]
    fn reference_tiling_has_no_hazard() {
        let tiling = BlockTiling::default();

        assert_eq!(tiling.workgroup(), Some(Shape3::new(16, 1, 1)));
        assert!(hazards(&tiling).is_empty());
    }

    #[test_log::test]
    fn larger_tiling_hazards_are_reported() {
        let tiling = BlockTiling::new(32, 8, 32, 8);

        assert_eq!(tiling.workers(), Some(128));
        assert_eq!(
            hazards(&tiling),
            vec![
                BlockTiledHazard::PartialTileLoad {
                    operand: TileOperand::Lhs,
                    elements: 256,
                    workers: 128,
                },
                BlockTiledHazard::PartialTileLoad {
                    operand: TileOperand::Rhs,
                    elements: 256,
                    workers: 128,
                },
                BlockTiledHazard::UncoveredRows {
                    rows_per_workgroup: 32,
                    rows_assumed_by_grid: 256,
                },
            ]
        );
    }

    #[test_log::test]
    fn grid_divides_rows_by_block_and_thread_rows() {
        let problem = MatmulProblem::new(256, 128, 512, ElemType::F32);

        assert_eq!(
            cube_count(&problem, &BlockTiling::default()),
            Shape3::new(64, 128, 1)
        );
        assert_eq!(
            cube_count(&problem, &BlockTiling::new(32, 8, 32, 8)),
            Shape3::new(1, 16, 1)
        );
    }

    #[test_log::test]
    fn tile_arrays_are_sized_by_the_tiling() {
        let problem = MatmulProblem::new(64, 64, 64, ElemType::F32);
        let tiling = BlockTiling::new(8, 4, 16, 2);
        let shader = shader(&problem, &tiling, tiling.workgroup().unwrap()).unwrap();

        assert!(shader.source.contains("var<workgroup> tileA: array<f32, 32>;"));
        assert!(shader.source.contains("var<workgroup> tileB: array<f32, 64>;"));
        assert!(shader.source.contains("var threadResults: array<f32, 2>;"));
        assert!(shader.source.contains("@workgroup_size(64, 1, 1)"));
    }

    #[test_log::test]
    fn overflowing_tile_is_the_only_uncertain_hazard() {
        let tiling = BlockTiling::new(8, 4, 4, 1);
        let found = hazards(&tiling);

        assert_eq!(
            found,
            vec![BlockTiledHazard::TileOverflow {
                operand: TileOperand::Rhs,
                elements: 16,
                workers: 32,
            }]
        );
        assert!(!found[0].always_wrong());
        assert!(
            hazards(&BlockTiling::new(32, 8, 32, 8))
                .iter()
                .all(BlockTiledHazard::always_wrong)
        );
    }

    #[test_log::test]
    fn degenerate_tilings_have_no_workgroup() {
        let zero_rows = BlockTiling::new(4, 4, 4, 0);
        let huge = BlockTiling::new(1 << 16, 4, 1 << 16, 1);

        assert_eq!(zero_rows.workgroup(), None);
        assert_eq!(huge.workgroup(), None);
        assert!(hazards(&zero_rows).is_empty());
        assert!(hazards(&huge).is_empty());
    }
}

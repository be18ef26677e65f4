use tilemm_common::Shape3;
use tilemm_runtime::kernel::ShaderCode;

use crate::{
    MatmulDim, MatmulInvalidProblem, MatmulProblem,
    kernels::{
        block_tiled::{self, BlockTiledHazard, BlockTiling, TileOperand},
        naive, tiled,
    },
    template::TemplateError,
};

/// The kernel variants, as selected in configuration files.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum MatmulVariant {
    /// One worker per output element.
    #[default]
    #[display("naive")]
    #[serde(rename = "naive")]
    Naive,
    /// Shared memory tiles.
    #[display("tiled")]
    #[serde(rename = "tiled")]
    Tiled,
    /// 1-D block tiling.
    #[display("block")]
    #[serde(rename = "block")]
    BlockTiled,
}

impl MatmulVariant {
    /// The strategy of the reference configuration of the variant.
    pub fn reference_strategy(&self) -> MatmulStrategy {
        match self {
            MatmulVariant::Naive => MatmulStrategy::naive(),
            MatmulVariant::Tiled => MatmulStrategy::tiled(tiled::DEFAULT_TILE_SIZE),
            MatmulVariant::BlockTiled => MatmulStrategy::block_tiled(BlockTiling::default()),
        }
    }
}

/// A kernel variant with its tiling parameters and workgroup shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatmulStrategy {
    /// See [naive].
    Naive {
        /// Workgroup shape, `(16, 16, 1)` by default.
        workgroup: Shape3,
    },
    /// See [tiled]. The tile side is `⌊√workgroup.x⌋`.
    Tiled {
        /// Workgroup shape, `(T·T, 1, 1)`.
        workgroup: Shape3,
    },
    /// See [block_tiled].
    BlockTiled {
        /// Tiling parameters.
        tiling: BlockTiling,
        /// Workgroup shape, `(BM·BN/TM, 1, 1)`.
        workgroup: Shape3,
    },
}

impl Default for MatmulStrategy {
    fn default() -> Self {
        Self::naive()
    }
}

impl MatmulStrategy {
    /// The naive kernel with `16 x 16` workgroups.
    pub fn naive() -> Self {
        Self::Naive {
            workgroup: naive::DEFAULT_WORKGROUP,
        }
    }

    /// The shared memory kernel with square tiles of the given side.
    pub fn tiled(tile_size: u32) -> Self {
        Self::Tiled {
            workgroup: tiled::workgroup(tile_size),
        }
    }

    /// The block tiled kernel with the given tiling.
    ///
    /// Tilings with [hazards](block_tiled::hazards) may compute wrong results.
    pub fn block_tiled(tiling: BlockTiling) -> Self {
        // Invalid tilings get an empty workgroup, rejected by `check_problem`.
        let workgroup = tiling.workgroup().unwrap_or(Shape3::new(0, 1, 1));
        Self::BlockTiled { tiling, workgroup }
    }

    /// The variant of the strategy.
    pub fn variant(&self) -> MatmulVariant {
        match self {
            MatmulStrategy::Naive { .. } => MatmulVariant::Naive,
            MatmulStrategy::Tiled { .. } => MatmulVariant::Tiled,
            MatmulStrategy::BlockTiled { .. } => MatmulVariant::BlockTiled,
        }
    }

    /// The workgroup shape the kernel is compiled and launched with.
    pub fn workgroup_size(&self) -> Shape3 {
        match self {
            MatmulStrategy::Naive { workgroup }
            | MatmulStrategy::Tiled { workgroup }
            | MatmulStrategy::BlockTiled { workgroup, .. } => *workgroup,
        }
    }

    /// The output extent covered by one workgroup of the grid along `(M, N, 1)`.
    ///
    /// For the block tiled kernel this is `(BM·TM, BN, 1)`, since `⌈⌈M/BM⌉/TM⌉ = ⌈M/(BM·TM)⌉`.
    pub fn grid_tile(&self) -> Shape3 {
        match self {
            MatmulStrategy::Naive { workgroup } => Shape3::new_2d(workgroup.x, workgroup.y),
            MatmulStrategy::Tiled { workgroup } => {
                let tile = tiled::tile_size(*workgroup);
                Shape3::new_2d(tile, tile)
            }
            MatmulStrategy::BlockTiled { tiling, .. } => {
                Shape3::new_2d(tiling.bm.saturating_mul(tiling.tm), tiling.bn)
            }
        }
    }

    /// Number of workgroups launched for the problem.
    pub fn cube_count(&self, problem: &MatmulProblem) -> Shape3 {
        match self {
            MatmulStrategy::Naive { workgroup } => naive::cube_count(problem, *workgroup),
            MatmulStrategy::Tiled { workgroup } => tiled::cube_count(problem, *workgroup),
            MatmulStrategy::BlockTiled { tiling, .. } => block_tiled::cube_count(problem, tiling),
        }
    }

    /// Instantiate the kernel for the problem.
    pub fn shader(&self, problem: &MatmulProblem) -> Result<ShaderCode, TemplateError> {
        match self {
            MatmulStrategy::Naive { workgroup } => naive::shader(problem, *workgroup),
            MatmulStrategy::Tiled { workgroup } => tiled::shader(problem, *workgroup),
            MatmulStrategy::BlockTiled { tiling, workgroup } => {
                block_tiled::shader(problem, tiling, *workgroup)
            }
        }
    }

    /// Known defects of the kernel with this strategy.
    pub fn hazards(&self) -> Vec<BlockTiledHazard> {
        match self {
            MatmulStrategy::BlockTiled { tiling, .. } => block_tiled::hazards(tiling),
            _ => Vec::new(),
        }
    }

    /// Check that the strategy computes the problem without reading outside of its operands.
    ///
    /// The tiled kernels load unmasked tiles, so their tiles must divide the problem.
    pub fn check_problem(&self, problem: &MatmulProblem) -> Result<(), MatmulInvalidProblem> {
        for (dim, extent) in [
            (MatmulDim::M, problem.m),
            (MatmulDim::K, problem.k),
            (MatmulDim::N, problem.n),
        ] {
            if extent == 0 {
                return Err(MatmulInvalidProblem::EmptyDimension { dim });
            }
        }

        // Block tilings derive their workgroup, which is checked with the tiling below.
        let workgroup = self.workgroup_size();
        let derived = matches!(self, MatmulStrategy::BlockTiled { .. });
        if !derived && !workgroup.is_valid() {
            return Err(MatmulInvalidProblem::InvalidWorkgroup {
                workgroup,
                reason: "every extent must be positive",
            });
        }

        match self {
            MatmulStrategy::Naive { .. } => Ok(()),
            MatmulStrategy::Tiled { workgroup } => {
                let tile = tiled::tile_size(*workgroup);
                if workgroup.y != 1 || workgroup.z != 1 {
                    return Err(MatmulInvalidProblem::InvalidWorkgroup {
                        workgroup: *workgroup,
                        reason: "the shared memory kernel needs a one dimensional workgroup",
                    });
                }
                if tile * tile != workgroup.x {
                    return Err(MatmulInvalidProblem::InvalidWorkgroup {
                        workgroup: *workgroup,
                        reason: "the number of workers must be a perfect square",
                    });
                }

                check_divisible(problem, (tile, tile, tile))
            }
            MatmulStrategy::BlockTiled { tiling, workgroup } => {
                let invalid = |reason| MatmulInvalidProblem::InvalidTiling {
                    bm: tiling.bm,
                    bk: tiling.bk,
                    bn: tiling.bn,
                    tm: tiling.tm,
                    reason,
                };

                if [tiling.bm, tiling.bk, tiling.bn, tiling.tm].contains(&0) {
                    return Err(invalid("every parameter must be positive"));
                }
                let fits = tiling.tile_area(TileOperand::Lhs).is_some()
                    && tiling.tile_area(TileOperand::Rhs).is_some()
                    && tiling.bm.checked_mul(tiling.tm).is_some();
                let Some(expected) = tiling.workgroup().filter(|_| fits) else {
                    return Err(invalid("the tile sizes overflow 32 bits"));
                };
                if (tiling.bm * tiling.bn) % tiling.tm != 0 {
                    return Err(invalid("TM must divide BM·BN"));
                }
                if *workgroup != expected {
                    return Err(MatmulInvalidProblem::InvalidWorkgroup {
                        workgroup: *workgroup,
                        reason: "the block tiled kernel needs (BM·BN/TM, 1, 1) workers",
                    });
                }

                check_divisible(problem, (tiling.bm, tiling.bk, tiling.bn))
            }
        }
    }
}

fn check_divisible(
    problem: &MatmulProblem,
    (tile_m, tile_k, tile_n): (u32, u32, u32),
) -> Result<(), MatmulInvalidProblem> {
    for (dim, extent, tile) in [
        (MatmulDim::M, problem.m, tile_m),
        (MatmulDim::K, problem.k, tile_k),
        (MatmulDim::N, problem.n, tile_n),
    ] {
        if extent % tile as usize != 0 {
            return Err(MatmulInvalidProblem::TileNotDivisible { dim, extent, tile });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tilemm_runtime::ElemType;

    fn strategies() -> Vec<MatmulStrategy> {
        vec![
            MatmulStrategy::naive(),
            MatmulStrategy::Naive {
                workgroup: Shape3::new(8, 4, 1),
            },
            MatmulStrategy::tiled(16),
            MatmulStrategy::tiled(4),
            MatmulStrategy::block_tiled(BlockTiling::default()),
            MatmulStrategy::block_tiled(BlockTiling::new(32, 8, 32, 8)),
            MatmulStrategy::block_tiled(BlockTiling::new(8, 4, 16, 2)),
        ]
    }

    #[test_log::test]
    fn grid_covers_the_output_exactly() {
        let extents = [1usize, 3, 4, 15, 16, 17, 31, 100, 256, 257, 4096];

        for strategy in strategies() {
            let tile = strategy.grid_tile();
            for m in extents {
                for n in extents {
                    let problem = MatmulProblem::new(m, 8, n, ElemType::F32);
                    let count = strategy.cube_count(&problem);

                    for (count, tile, extent) in [(count.x, tile.x, m), (count.y, tile.y, n)] {
                        let (count, tile) = (count as usize, tile as usize);
                        assert!(count * tile >= extent, "{strategy:?} {m}x{n}");
                        assert!((count - 1) * tile < extent, "{strategy:?} {m}x{n}");
                    }
                    assert_eq!(count.z, 1);
                }
            }
        }
    }

    #[test_log::test]
    fn reference_strategies() {
        assert_eq!(
            MatmulVariant::Naive.reference_strategy().workgroup_size(),
            Shape3::new(16, 16, 1)
        );
        assert_eq!(
            MatmulVariant::Tiled.reference_strategy().workgroup_size(),
            Shape3::new(256, 1, 1)
        );
        assert_eq!(
            MatmulVariant::BlockTiled.reference_strategy().workgroup_size(),
            Shape3::new(16, 1, 1)
        );
        assert_eq!(MatmulStrategy::tiled(16).variant(), MatmulVariant::Tiled);
    }

    #[test_log::test]
    fn tiled_requires_divisible_dimensions() {
        let strategy = MatmulStrategy::tiled(16);

        assert_eq!(
            strategy.check_problem(&MatmulProblem::new(256, 128, 512, ElemType::F32)),
            Ok(())
        );
        assert_eq!(
            strategy.check_problem(&MatmulProblem::new(256, 4, 512, ElemType::F32)),
            Err(MatmulInvalidProblem::TileNotDivisible {
                dim: MatmulDim::K,
                extent: 4,
                tile: 16,
            })
        );
    }

    #[test_log::test]
    fn tiled_requires_a_square_workgroup() {
        let strategy = MatmulStrategy::Tiled {
            workgroup: Shape3::new_1d(200),
        };

        assert!(matches!(
            strategy.check_problem(&MatmulProblem::new(196, 196, 196, ElemType::F32)),
            Err(MatmulInvalidProblem::InvalidWorkgroup { .. })
        ));
        assert!(matches!(
            MatmulStrategy::tiled(1 << 16)
                .check_problem(&MatmulProblem::new(1 << 16, 1 << 16, 1 << 16, ElemType::F32)),
            Err(MatmulInvalidProblem::InvalidWorkgroup { .. })
        ));
    }

    #[test_log::test]
    fn naive_accepts_any_shape() {
        let problem = MatmulProblem::new(17, 3, 5, ElemType::F32);

        assert_eq!(MatmulStrategy::naive().check_problem(&problem), Ok(()));
        assert_eq!(
            MatmulStrategy::naive().check_problem(&MatmulProblem::new(17, 0, 5, ElemType::F32)),
            Err(MatmulInvalidProblem::EmptyDimension { dim: MatmulDim::K })
        );
    }

    #[test_log::test]
    fn block_tiling_is_validated() {
        let problem = MatmulProblem::new(64, 64, 64, ElemType::F32);

        assert_eq!(
            MatmulStrategy::block_tiled(BlockTiling::default()).check_problem(&problem),
            Ok(())
        );
        assert_eq!(
            MatmulStrategy::block_tiled(BlockTiling::new(4, 4, 4, 0)).check_problem(&problem),
            Err(MatmulInvalidProblem::InvalidTiling {
                bm: 4,
                bk: 4,
                bn: 4,
                tm: 0,
                reason: "every parameter must be positive",
            })
        );
        assert!(matches!(
            MatmulStrategy::BlockTiled {
                tiling: BlockTiling::default(),
                workgroup: Shape3::new(0, 1, 1),
            }
            .check_problem(&problem),
            Err(MatmulInvalidProblem::InvalidWorkgroup { .. })
        ));
        assert!(matches!(
            MatmulStrategy::block_tiled(BlockTiling::new(4, 4, 3, 5)).check_problem(&problem),
            Err(MatmulInvalidProblem::InvalidTiling { .. })
        ));
        assert_eq!(
            MatmulStrategy::block_tiled(BlockTiling::default())
                .check_problem(&MatmulProblem::new(64, 6, 64, ElemType::F32)),
            Err(MatmulInvalidProblem::TileNotDivisible {
                dim: MatmulDim::K,
                extent: 6,
                tile: 4,
            })
        );
    }

    #[test_log::test]
    fn oversized_block_tiling_is_rejected_without_overflow() {
        let problem = MatmulProblem::new(64, 64, 64, ElemType::F32);

        for tiling in [
            BlockTiling::new(1 << 16, 4, 1 << 16, 1),
            BlockTiling::new(1 << 20, 1 << 12, 4, 1),
            BlockTiling::new(1 << 20, 4, 4, 1 << 12),
        ] {
            let strategy = MatmulStrategy::block_tiled(tiling);
            strategy.hazards();

            assert!(matches!(
                strategy.check_problem(&problem),
                Err(MatmulInvalidProblem::InvalidTiling {
                    reason: "the tile sizes overflow 32 bits",
                    ..
                })
            ));
        }
    }
}

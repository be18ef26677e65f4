use naga::front::wgsl;
use tilemm_matmul::{
    MatmulProblem, MatmulStrategy, MatmulVariant,
    kernels::{block_tiled::BlockTiling, naive, tiled},
    template::Placeholder,
};
use tilemm_runtime::ElemType;

fn validate_wgsl(source: &str) -> Result<(), String> {
    let module = wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).map_err(|e| format!("{e:?}"))?;
    Ok(())
}

fn strategies() -> Vec<MatmulStrategy> {
    vec![
        MatmulVariant::Naive.reference_strategy(),
        MatmulVariant::Tiled.reference_strategy(),
        MatmulVariant::BlockTiled.reference_strategy(),
        MatmulStrategy::tiled(8),
        MatmulStrategy::block_tiled(BlockTiling::new(32, 8, 32, 8)),
    ]
}

#[test_log::test]
fn generated_kernels_are_valid_wgsl() {
    for precision in [ElemType::F32, ElemType::F16] {
        for strategy in strategies() {
            let problem = MatmulProblem::new(256, 128, 512, precision);
            let shader = strategy.shader(&problem).unwrap();

            if let Err(err) = validate_wgsl(&shader.source) {
                panic!("{strategy:?} ({precision}) is invalid:\n{err}\n{}", shader.source);
            }
        }
    }
}

#[test_log::test]
fn generated_kernels_have_no_placeholder_left() {
    for strategy in strategies() {
        let problem = MatmulProblem::new(16, 4, 8, ElemType::F32);
        let shader = strategy.shader(&problem).unwrap();

        assert!(!shader.source.contains("{{"), "{}", shader.source);
        assert!(!shader.source.contains("}}"), "{}", shader.source);
        assert_eq!(shader.workgroup_size, strategy.workgroup_size());
    }
}

#[test_log::test]
fn templates_only_use_known_placeholders() {
    assert_eq!(
        naive::TEMPLATE.placeholders().len(),
        5,
        "precision, workgroupSize, M, N, K"
    );
    assert!(tiled::TEMPLATE.placeholders().contains(&Placeholder::TileArea));
    assert!(
        tilemm_matmul::kernels::block_tiled::TEMPLATE
            .placeholders()
            .contains(&Placeholder::TM)
    );
}

#[test_log::test]
fn f16_kernels_enable_the_extension() {
    let problem = MatmulProblem::new(16, 16, 16, ElemType::F16);
    let shader = MatmulStrategy::tiled(4).shader(&problem).unwrap();

    assert!(shader.source.starts_with("enable f16;\n"));
    assert!(shader.source.contains("array<f16>"));
}

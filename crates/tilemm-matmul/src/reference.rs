use crate::MatmulProblem;

/// Linear layer forward pass on the CPU: `out[b, t, o] = bias[o] + Σᵢ inp[b, t, i] · weight[o, i]`.
///
/// `inp` is `B x T x C`, `weight` is `OC x C` and `out` is `B x T x OC`, all row-major.
/// With `B = 1` and no bias this is `C = A·Bᵗ` with `A = inp` and `Bᵗ = weight`.
///
/// # Panics
///
/// If a slice doesn't match its shape.
#[allow(clippy::too_many_arguments)]
pub fn matmul_forward_cpu(
    out: &mut [f32],
    inp: &[f32],
    weight: &[f32],
    bias: Option<&[f32]>,
    batch: usize,
    tokens: usize,
    channels: usize,
    out_channels: usize,
) {
    let rows = batch * tokens;
    assert_eq!(inp.len(), rows * channels, "input shape");
    assert_eq!(weight.len(), out_channels * channels, "weight shape");
    assert_eq!(out.len(), rows * out_channels, "output shape");

    for (row, out_row) in out.chunks_exact_mut(out_channels).enumerate() {
        let inp_row = &inp[row * channels..(row + 1) * channels];

        for (o, value) in out_row.iter_mut().enumerate() {
            let weight_row = &weight[o * channels..(o + 1) * channels];
            let mut acc = bias.map(|bias| bias[o]).unwrap_or(0.0);
            for (a, b) in inp_row.iter().zip(weight_row) {
                acc += a * b;
            }
            *value = acc;
        }
    }
}

/// Compute `C = A·Bᵗ` for the problem on the CPU.
pub fn matmul_reference(problem: &MatmulProblem, lhs: &[f32], rhs: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0; problem.m * problem.n];
    matmul_forward_cpu(&mut out, lhs, rhs, None, 1, problem.m, problem.k, problem.n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tilemm_runtime::ElemType;

    #[test_log::test]
    fn small_product() {
        // A = [[1, 2], [3, 4], [5, 6]], Bᵗ = [[1, 0], [0, 1], [1, 1], [2, -1]]
        let lhs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let rhs = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, -1.0];
        let problem = MatmulProblem::new(3, 2, 4, ElemType::F32);

        let out = matmul_reference(&problem, &lhs, &rhs);

        assert_eq!(
            out,
            vec![
                1.0, 2.0, 3.0, 0.0, //
                3.0, 4.0, 7.0, 2.0, //
                5.0, 6.0, 11.0, 4.0,
            ]
        );
    }

    #[test_log::test]
    fn bias_and_batches() {
        let inp = [1.0, 1.0, 2.0, 2.0];
        let weight = [1.0, -1.0, 0.5, 0.5];
        let bias = [10.0, 20.0];
        let mut out = [0.0; 4];

        matmul_forward_cpu(&mut out, &inp, &weight, Some(&bias), 2, 1, 2, 2);

        assert_eq!(out, [10.0, 21.0, 10.0, 22.0]);
    }
}

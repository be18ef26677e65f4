use tilemm_runtime::{
    Element,
    benchmark::{BenchmarkResult, BenchmarkTimer},
    client::ComputeClient,
    config::benchmark::BenchmarkLogLevel,
    server::{Bindings, ComputeServer},
};

use crate::{MatmulInvalidProblem, MatmulLaunchError, MatmulProblem, MatmulStrategy};

/// Device output and timing of a benchmark run.
#[derive(Debug, Clone)]
pub struct MatmulRun<E> {
    /// `C`, row-major `M x N`.
    pub output: Vec<E>,
    /// Timing of the dispatch loop.
    pub result: BenchmarkResult,
}

/// Run `C = A·Bᵗ` `iterations` times on the device and time the dispatch loop.
///
/// `lhs` is `A` (`M x K`) and `rhs` is `Bᵗ` (`N x K`), both row-major. Every iteration
/// dispatches the kernel, blocks until it completes, then resets its command buffer before
/// the next iteration. The output of the last iteration is copied back to the host.
pub fn launch<S: ComputeServer, E: Element>(
    client: &mut ComputeClient<S>,
    problem: &MatmulProblem,
    strategy: &MatmulStrategy,
    lhs: &[E],
    rhs: &[E],
    iterations: usize,
) -> Result<MatmulRun<E>, MatmulLaunchError> {
    if E::ELEM != problem.precision {
        return Err(MatmulLaunchError::PrecisionMismatch {
            expected: problem.precision,
            actual: E::ELEM,
        });
    }
    check_operand("lhs", lhs.len(), problem.m * problem.k)?;
    check_operand("rhs", rhs.len(), problem.n * problem.k)?;
    strategy.check_problem(problem)?;

    for hazard in strategy.hazards() {
        let outcome = match hazard.always_wrong() {
            true => "will",
            false => "may",
        };
        log::warn!(
            "The {} kernel {outcome} compute wrong results: {hazard}",
            strategy.variant()
        );
    }

    let lhs = client.create_from_slice(&problem.lhs_shape(), lhs)?;
    let rhs = client.create_from_slice(&problem.rhs_shape(), rhs)?;
    let out = client.empty(&problem.out_shape(), problem.precision)?;

    log::info!(
        "Creating {} kernel with workgroup ({})",
        strategy.variant(),
        strategy.workgroup_size()
    );
    let shader = strategy.shader(problem)?;
    let count = strategy.cube_count(problem);
    let bindings = Bindings::new().with_buffers(vec![lhs, rhs, out.clone()]);
    let mut kernel = client.create_kernel(shader, bindings, count)?;

    log::info!("Dispatching + waiting");
    let log_dispatches = client.logger().log_level_benchmark() == BenchmarkLogLevel::Full;
    let mut completions = Vec::with_capacity(match log_dispatches {
        true => iterations,
        false => 0,
    });
    let timer = BenchmarkTimer::start();
    for _ in 0..iterations {
        let session = client.dispatch(&mut kernel)?;
        client.wait(&mut kernel, session)?;
        client.reset(&mut kernel)?;

        if log_dispatches {
            completions.push(timer.elapsed());
        }
    }
    let result = timer.stop(iterations, problem.m, problem.k, problem.n);

    // Outputs are written once the timer stopped.
    for (i, elapsed) in completions.iter().enumerate() {
        let msg = format!(
            "[Dispatch {}/{iterations}] {} after {elapsed:?}",
            i + 1,
            kernel.id(),
        );
        client.logger().log_benchmark(&msg);
    }

    if client.logger().log_level_benchmark() != BenchmarkLogLevel::Disabled {
        client.logger().log_benchmark(&result);
    }

    log::info!("Copying result to CPU");
    let output = client.read_one::<E>(&out)?;

    Ok(MatmulRun { output, result })
}

fn check_operand(
    operand: &'static str,
    actual: usize,
    expected: usize,
) -> Result<(), MatmulInvalidProblem> {
    match actual == expected {
        true => Ok(()),
        false => Err(MatmulInvalidProblem::OperandSize {
            operand,
            expected,
            actual,
        }),
    }
}

use core::fmt::Display;
use core::time::Duration;
use web_time::Instant;

/// Outcome of a timed benchmark run.
#[derive(new, Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkResult {
    /// Wall-clock time spent across all iterations.
    pub elapsed: Duration,
    /// Number of dispatches timed.
    pub iterations: usize,
    /// Rows of the left-hand side and of the output.
    pub m: usize,
    /// Shared dimension.
    pub k: usize,
    /// Columns of the output.
    pub n: usize,
}

impl BenchmarkResult {
    /// Floating point operations of a single dispatch, `2·M·N·K`.
    pub fn flops_per_dispatch(&self) -> f64 {
        2.0 * self.m as f64 * self.n as f64 * self.k as f64
    }

    /// Throughput in billions of floating point operations per second.
    ///
    /// `2·M·N·K·iterations / (elapsed_seconds · 10⁹)`.
    pub fn gflops(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        self.flops_per_dispatch() * self.iterations as f64 / (secs * 1e9)
    }

    /// Average time per dispatch, in milliseconds.
    pub fn millis_per_dispatch(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1e3 / self.iterations as f64
    }
}

impl Display for BenchmarkResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Execution Time: (M = {}, K = {}, N = {}) x {} iterations : {:.1} milliseconds / dispatch ~ {:.2} GFLOPS/s",
            self.m,
            self.k,
            self.n,
            self.iterations,
            self.millis_per_dispatch(),
            self.gflops(),
        )
    }
}

/// Wall-clock timer around a benchmark loop.
#[derive(Debug)]
pub struct BenchmarkTimer {
    start: Instant,
}

impl BenchmarkTimer {
    /// Start the timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed since the timer started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and build the result of the run.
    pub fn stop(self, iterations: usize, m: usize, k: usize, n: usize) -> BenchmarkResult {
        BenchmarkResult::new(self.elapsed(), iterations, m, k, n)
    }
}

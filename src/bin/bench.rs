//! VM benchmark binary.
//!
//! Measures execution time for representative Intcode workloads.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use intcode::pipeline::{Orchestrator, PipelineMode};
use intcode::utils::log::{self, Level};
use intcode::virtual_machine::program::Program;
use intcode::virtual_machine::vm::Machine;

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    /// Instructions executed by the last run (None to omit the per-step column).
    steps: Option<u64>,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations.max(1) as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let ns_per_op = avg.as_nanos();
        let ns_per_step = self
            .steps
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_op as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        let steps = self
            .steps
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter {:>12} steps  {} ns/step",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            steps,
            ns_per_step,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
///
/// `f` returns the number of instructions it executed, if known.
fn bench<F>(name: &'static str, min_duration: Duration, mut f: F) -> BenchResult
where
    F: FnMut() -> Option<u64>,
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let mut steps = None;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        steps = f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        steps,
    }
}

/// Runs `program` to halt with `inputs` and returns the instructions executed.
fn run_steps(program: &Program, inputs: &[i64]) -> Option<u64> {
    let mut machine = Machine::new(program);
    machine.feed_all(inputs.iter().copied());
    machine.run_to_halt().expect("run");
    Some(machine.steps())
}

// ---------------------------------------------------------------------------
// Benchmark programs
// ---------------------------------------------------------------------------

/// Counts cell 17 down from the input to zero.
///
/// ```text
/// IN [17]
/// loop: ADD [17], -1 -> [17]
///       JNZ [17], loop
/// HALT
/// ```
const COUNTDOWN: &[i64] = &[3, 17, 1001, 17, -1, 17, 1005, 17, 2, 99, 0, 0, 0, 0, 0, 0, 0, 0];

/// Sums 1..=n with relative-mode accumulators.
///
/// ```text
/// ARB 100
/// IN [rb+0]
/// loop: ADD [rb+1], [rb+0] -> [rb+1]
///       ADD [rb+0], -1 -> [rb+0]
///       JNZ [rb+0], loop
/// OUT [rb+1]
/// HALT
/// ```
const RELATIVE_SUM: &[i64] = &[
    109, 100, 203, 0, 22201, 1, 0, 1, 21201, 0, -1, 0, 1205, 0, 4, 204, 1, 99,
];

const QUINE: &[i64] = &[
    109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
];

const FEEDBACK: &[i64] = &[
    3, 52, 1001, 52, -5, 52, 3, 53, 1, 52, 56, 54, 1007, 54, 5, 55, 1005, 55, 26, 1001, 54, -5, 54,
    1105, 1, 12, 1, 53, 54, 53, 1008, 54, 0, 55, 1001, 55, 1, 55, 2, 53, 55, 53, 4, 53, 1001, 56,
    -1, 56, 1005, 56, 6, 99, 0, 0, 0, 0, 10,
];

const LINEAR: &[i64] = &[
    3, 31, 3, 32, 1002, 32, 10, 32, 1001, 31, -2, 31, 1007, 31, 0, 33, 1002, 33, 7, 33, 1, 33, 31,
    31, 1, 32, 31, 31, 4, 31, 99, 0, 0, 0,
];

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(2);
    // Searches log their result at info level.
    log::set_max_level(Level::Warn);

    println!("VM Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>14} {:>12}  {:>10}",
        "benchmark", "iters", "avg time", "steps/run", "ns/step"
    );
    println!("  {}", "-".repeat(82));

    let countdown = Program::new(COUNTDOWN.to_vec());
    let relative_sum = Program::new(RELATIVE_SUM.to_vec());
    let quine = Program::new(QUINE.to_vec());

    // 1. Tight loop
    for (name, n) in [("countdown(10K)", 10_000), ("countdown(100K)", 100_000)] {
        bench(name, min, || run_steps(&countdown, &[n])).print();
    }

    // 2. Relative addressing
    bench("relative_sum(10K)", min, || run_steps(&relative_sum, &[10_000])).print();

    // 3. Self-reading program
    bench("quine", min, || run_steps(&quine, &[])).print();

    // 4. Pipeline search, 120 trials of 5 machines each
    let orchestrator = Orchestrator::new(Program::new(FEEDBACK.to_vec()), 5);
    bench("feedback_search(5 amps)", min, || {
        orchestrator
            .search_best_phase_assignment(PipelineMode::Feedback, 5..=9)
            .expect("search");
        None
    })
    .print();

    let orchestrator = Orchestrator::new(Program::new(LINEAR.to_vec()), 5);
    let phases = PipelineMode::Linear.default_phases(5);
    bench("linear_search(5 amps)", min, || {
        orchestrator
            .search_best_phase_assignment(PipelineMode::Linear, phases.clone())
            .expect("search");
        None
    })
    .print();
}

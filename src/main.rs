// ========================================================================================
//
//                      THE COHORT ORCHESTRATOR: SNPSIEVE
//
// ========================================================================================
//
// This binary is the thin conductor around the selection library. Its sole
// responsibility is to turn command-line arguments (or a TOML batch file)
// into a `BatchConfig`, drive the per-panel pipeline, and report what
// happened. All statistical behavior lives in the library; everything here
// is argument plumbing and exit-code policy.
//
// Per-panel isolation is enforced at this level of the stack: a panel that
// fails is reported and counted, the remaining panels still run, and the
// process exits nonzero only after the whole sweep has finished.

use clap::Parser;
use snpsieve::config::{BatchConfig, ConfigError, SelectionConfig};
use snpsieve::pipeline;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

// ========================================================================================
//                         COMMAND-LINE INTERFACE DEFINITION
// ========================================================================================

#[derive(Parser, Debug)]
#[clap(
    name = "snpsieve",
    version,
    about = "Lasso feature selection over SNP association panels."
)]
struct Args {
    /// Input CSV panels (rows = samples, columns = SNP features plus the target).
    #[clap(required_unless_present = "config")]
    inputs: Vec<PathBuf>,

    /// Directory the importance plot and table are written to.
    #[clap(long, default_value = ".")]
    out_dir: PathBuf,

    /// Batch description TOML (input list, output directory, settings).
    /// Replaces the positional inputs and every tuning flag.
    #[clap(long, conflicts_with = "inputs")]
    config: Option<PathBuf>,

    /// Target column holding the comorbidity outcome.
    #[clap(long, default_value = "PE")]
    target_col: String,

    /// Smallest candidate regularization strength.
    #[clap(long, default_value_t = 1e-5)]
    alpha_min: f64,

    /// Exclusive upper bound of the candidate grid.
    #[clap(long, default_value_t = 10.0)]
    alpha_max: f64,

    /// Step between consecutive candidate strengths.
    #[clap(long, default_value_t = 500.0)]
    alpha_step: f64,

    /// Report features whose absolute coefficient exceeds this value.
    #[clap(long, default_value_t = 0.001)]
    importance_threshold: f64,

    /// Seed for the holdout split and the cross-validation shuffle.
    #[clap(long, default_value_t = 42)]
    seed: u64,
}

// ========================================================================================
//                           THE MAIN ORCHESTRATION LOGIC
// ========================================================================================

fn main() {
    env_logger::init();
    let start_time = Instant::now();

    let args = Args::parse();
    let batch = match build_batch_config(&args) {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("Error assembling the batch configuration: {e}");
            process::exit(1);
        }
    };

    eprintln!(
        "> Processing {} panel(s) into '{}'",
        batch.inputs.len(),
        batch.output_dir.display()
    );

    let outcome = pipeline::run_batch(&batch);

    for report in &outcome.succeeded {
        let fallback_note = if report.target_fell_back {
            format!(" (target fell back to '{}')", report.resolved_target)
        } else {
            String::new()
        };
        let convergence_note = if report.converged {
            ""
        } else {
            " [solver hit the iteration cap]"
        };
        eprintln!(
            "> {}: best alpha {}, {} important feature(s){}{}",
            report.input.display(),
            report.best_alpha,
            report.important_features.len(),
            fallback_note,
            convergence_note,
        );
    }
    for (input, error) in &outcome.failed {
        eprintln!("> {}: FAILED: {error}", input.display());
    }

    eprintln!(
        "\n{} panel(s) succeeded, {} failed. Total execution time: {:.2?}",
        outcome.succeeded.len(),
        outcome.failed.len(),
        start_time.elapsed()
    );

    if !outcome.failed.is_empty() {
        process::exit(1);
    }
}

// ========================================================================================
//                                  HELPER FUNCTIONS
// ========================================================================================

/// Builds the batch description either from a TOML file or from the flags.
fn build_batch_config(args: &Args) -> Result<BatchConfig, ConfigError> {
    if let Some(path) = &args.config {
        return BatchConfig::from_toml_file(path);
    }

    Ok(BatchConfig {
        inputs: args.inputs.clone(),
        output_dir: args.out_dir.clone(),
        selection: SelectionConfig {
            target_column: args.target_col.clone(),
            alpha_min: args.alpha_min,
            alpha_max: args.alpha_max,
            alpha_step: args.alpha_step,
            importance_threshold: args.importance_threshold,
            seed: args.seed,
            ..SelectionConfig::default()
        },
    })
}

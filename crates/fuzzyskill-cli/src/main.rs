//! fuzzyskill CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fuzzyskill",
    version,
    about = "Fuzzy rule-based operator skill assessment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess every test record of a dataset
    Assess {
        /// Path to .toml dataset or directory
        #[arg(long)]
        dataset: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Defuzzifier: COA, COM, MOM, CMCOA, CMCOM, CMMOM
        #[arg(long)]
        defuzzifier: Option<String>,

        /// Shrink function: scale, clip
        #[arg(long)]
        shrink: Option<String>,

        /// Metric membership estimate: gaussian, non-parametric
        #[arg(long)]
        membership: Option<String>,

        /// Max concurrent assessments
        #[arg(long, default_value = "4")]
        parallelism: usize,

        /// Output directory for JSON reports
        #[arg(long, default_value = "./fuzzyskill-results")]
        output: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compare two assessment reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Score change that counts as a regression
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate dataset TOML files
    Validate {
        /// Path to dataset file or directory
        #[arg(long)]
        dataset: PathBuf,
    },

    /// Create starter config and example dataset
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "fuzzyskill=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assess {
            dataset,
            config,
            defuzzifier,
            shrink,
            membership,
            parallelism,
            output,
            format,
        } => {
            commands::assess::execute(commands::assess::AssessArgs {
                dataset,
                config,
                defuzzifier,
                shrink,
                membership,
                parallelism,
                output,
                format,
            })
            .await
        }
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { dataset } => commands::validate::execute(dataset),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

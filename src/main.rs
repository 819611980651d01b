use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hostrank::batch::{build_models, predict, BuildOptions, PredictOptions};
use hostrank::logging::init_logger;
use hostrank::MAX_ORDER;

#[derive(Parser)]
#[command(name = "hostrank")]
#[command(about = "Rank likely genomic sources of query sequences with Markov chain models", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train one Markov model per genome file and store them as .mm files
    Build {
        /// Directory of genome FASTA files (.gz accepted)
        #[arg(short, long)]
        genomes: PathBuf,

        /// Output directory for the trained models
        #[arg(short, long)]
        models: PathBuf,

        /// Markov chain order
        #[arg(short = 'k', long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(0..=MAX_ORDER as i64))]
        order: u32,

        /// Pseudo-count smoothing weight
        #[arg(short, long, default_value_t = 16.0)]
        alpha: f64,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value_t = 1)]
        threads: usize,
    },

    /// Score every query file under every model and write reports
    Predict {
        /// Directory of query FASTA files (.gz accepted)
        #[arg(short, long)]
        genomes: PathBuf,

        /// Directory of trained .mm model files
        #[arg(short, long)]
        models: PathBuf,

        /// Output directory for the reports
        #[arg(short, long)]
        results: PathBuf,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        /// Also write the best-hit report (prediction.list)
        #[arg(short, long)]
        best_hits: bool,

        /// Z-normalize each model's row of the score matrix
        #[arg(short, long)]
        z_scores: bool,

        /// Null-distribution file (modelName<TAB>mean<TAB>sd) for p-values
        #[arg(short, long)]
        null_fits: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Build {
            genomes,
            models,
            order,
            alpha,
            threads,
        } => {
            let opts = BuildOptions {
                order,
                alpha,
                threads,
            };
            let trained = build_models(&genomes, &models, &opts)
                .context("model training failed")?;
            log::info!("trained {} models into {}", trained, models.display());
        }
        Commands::Predict {
            genomes,
            models,
            results,
            threads,
            best_hits,
            z_scores,
            null_fits,
        } => {
            let opts = PredictOptions {
                threads,
                best_hits,
                z_scores,
                null_fits,
                write_matrix: true,
            };
            let matrix = predict(&genomes, &models, &results, &opts)
                .context("prediction failed")?;
            log::info!(
                "scored {} queries under {} models, reports in {}",
                matrix.query_names().len(),
                matrix.model_names().len(),
                results.display()
            );
        }
    }
    Ok(())
}

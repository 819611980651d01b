//! Directory-level orchestration: train one model per genome file, or
//! score every (model, query) pair into a [`ScoreMatrix`].
//!
//! Both parallel regions run on a locally built rayon pool sized by the
//! caller, never on process-global state. Training workers share nothing;
//! scoring workers share the read-only query collections and each own one
//! matrix row, so neither region needs a lock. All post-processing
//! (best-hit selection, z-normalization, report writing) happens
//! sequentially after the parallel region has completed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{error, info, warn};
use rayon::prelude::*;

use crate::error::{HostrankError, Result};
use crate::model::{MarkovModel, MODEL_EXT};
use crate::report::{self, ScoreMatrix, BEST_HIT_FILE, MATRIX_FILE};
use crate::sequence::{self, SequenceCollection};

/// Parameters for a training run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Markov order of every trained model.
    pub order: u32,
    /// Pseudo-count smoothing weight.
    pub alpha: f64,
    /// Worker threads; 0 selects one per available core.
    pub threads: usize,
}

/// Parameters for a prediction run.
#[derive(Debug, Clone)]
pub struct PredictOptions {
    /// Worker threads; 0 selects one per available core.
    pub threads: usize,
    /// Write the best-hit report.
    pub best_hits: bool,
    /// Z-normalize matrix rows before writing the matrix.
    pub z_scores: bool,
    /// Optional per-model Gaussian null parameters for p-values.
    pub null_fits: Option<PathBuf>,
    /// Write the full log-likelihood matrix.
    pub write_matrix: bool,
}

/// Sorted list of the regular files in a directory. An unreadable
/// directory is a configuration error and fatal for the run.
pub fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| HostrankError::config(dir, format!("cannot open directory: {}", e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| HostrankError::config(dir, format!("cannot list directory: {}", e)))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn require_dir(dir: &Path, role: &str) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(HostrankError::config(
            dir,
            format!("{} directory does not exist", role),
        ))
    }
}

fn thread_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| HostrankError::validation(format!("cannot build thread pool: {}", e)))
}

/// Train one model per genome file and persist each into `model_dir`.
///
/// A genome file that cannot be read, is empty, or fails estimation only
/// fails its own model; the sibling workers are unaffected. Failing to
/// write a model file aborts the run. Returns the number of models written.
pub fn build_models(genome_dir: &Path, model_dir: &Path, opts: &BuildOptions) -> Result<usize> {
    require_dir(model_dir, "model")?;
    let genome_files = list_dir(genome_dir)?;
    if genome_files.is_empty() {
        warn!("no genome files in {}", genome_dir.display());
        return Ok(0);
    }
    // Surface bad parameters before spawning workers.
    MarkovModel::new(opts.order, opts.alpha)?;

    let trained = AtomicUsize::new(0);
    let pool = thread_pool(opts.threads)?;
    pool.install(|| {
        genome_files.par_iter().try_for_each(|path| -> Result<()> {
            info!("training on {}", path.display());
            let collection = match sequence::read_collection(path) {
                Ok(c) => c,
                Err(e) => {
                    error!("skipping {}: {}", path.display(), e);
                    return Ok(());
                }
            };

            let mut model = MarkovModel::new(opts.order, opts.alpha)?;
            match model.train(&collection) {
                Ok(()) => {}
                Err(e @ (HostrankError::Validation(_) | HostrankError::Numeric(_))) => {
                    error!("no model for {}: {}", path.display(), e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
            model.log_parameters();

            let out = model.save(model_dir)?;
            info!("wrote {}", out.display());
            trained.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    })?;

    Ok(trained.into_inner())
}

/// Load every model, score every query under each, post-process and write
/// the reports into `result_dir`. Returns the (possibly z-normalized)
/// score matrix.
pub fn predict(
    query_dir: &Path,
    model_dir: &Path,
    result_dir: &Path,
    opts: &PredictOptions,
) -> Result<ScoreMatrix> {
    require_dir(result_dir, "result")?;

    let model_files: Vec<PathBuf> = list_dir(model_dir)?
        .into_iter()
        .filter(|p| {
            let is_model = p.extension().is_some_and(|e| e == MODEL_EXT);
            if !is_model {
                warn!("ignoring non-model file {}", p.display());
            }
            is_model
        })
        .collect();
    if model_files.is_empty() {
        return Err(HostrankError::config(
            model_dir,
            format!("no .{} model files found", MODEL_EXT),
        ));
    }

    let query_files = list_dir(query_dir)?;
    let pool = thread_pool(opts.threads)?;

    // Ingest every query exactly once; the collections are then shared
    // read-only across all scoring workers.
    let min_len = MarkovModel::peek_order(&model_files[0])? as usize + 1;
    let queries: Vec<SequenceCollection> = pool.install(|| {
        query_files
            .par_iter()
            .filter_map(|path| match sequence::read_collection(path) {
                Ok(c) if c.is_empty() => {
                    warn!("skipping {}: no sequence records", path.display());
                    None
                }
                Ok(c) if c.max_chunk_len() < min_len => {
                    warn!(
                        "skipping {}: no record reaches the {} symbols needed for scoring",
                        path.display(),
                        min_len
                    );
                    None
                }
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    });
    if queries.is_empty() {
        return Err(HostrankError::validation(format!(
            "no scorable query files in {}",
            query_dir.display()
        )));
    }
    let query_names: Vec<String> = queries.iter().map(|q| q.name().to_string()).collect();

    // One model load + full-row evaluation per worker. A corrupt model
    // file fails the whole run rather than contributing garbage scores.
    let progress = AtomicUsize::new(0);
    let scored: Vec<(String, Vec<f64>)> = pool.install(|| {
        model_files
            .par_iter()
            .map(|path| -> Result<(String, Vec<f64>)> {
                let model = MarkovModel::load(path)?;
                model.log_parameters();
                info!(
                    "scoring under {} (approx. {}/{})",
                    model.name(),
                    progress.fetch_add(1, Ordering::Relaxed) + 1,
                    model_files.len()
                );
                let row = queries
                    .iter()
                    .map(|q| model.evaluate(q))
                    .collect::<Result<Vec<f64>>>()?;
                Ok((model.name().to_string(), row))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let (model_names, rows): (Vec<String>, Vec<Vec<f64>>) = scored.into_iter().unzip();
    let mut matrix = ScoreMatrix::new(model_names, query_names, rows);

    // Post-processing is strictly sequential, after the parallel region.
    if opts.best_hits {
        let fits = match &opts.null_fits {
            Some(path) => report::read_null_fits(path)?,
            None => HashMap::new(),
        };
        report::write_best_hits(&matrix, &fits, &result_dir.join(BEST_HIT_FILE))?;
    }

    if opts.z_scores {
        matrix.z_normalize_rows();
    }

    if opts.write_matrix {
        report::write_matrix(&matrix, &result_dir.join(MATRIX_FILE))?;
    }

    Ok(matrix)
}

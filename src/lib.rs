//! hostrank: fixed-order Markov chain models of genomic nucleotide
//! sequence, used to rank the likely sources of query sequences.
//!
//! The crate trains one order-k model per genome file (bit-packed k-mer
//! counting with Dirichlet smoothing), persists each as a compact binary
//! `.mm` file, and scores query collections against many models in
//! parallel by mean per-symbol log-likelihood. Optional post-processing
//! picks the best hit per query (with Gaussian-null p-values) and
//! z-normalizes the score matrix.

pub mod batch;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod sequence;
pub mod stats;

pub use batch::{build_models, predict, BuildOptions, PredictOptions};
pub use error::{HostrankError, Result};
pub use model::{MarkovModel, MAX_ORDER, MODEL_EXT};
pub use report::{GaussianNull, ScoreMatrix};
pub use sequence::{read_collection, SequenceChunk, SequenceCollection};

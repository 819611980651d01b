//! Fixed-order Markov chain model: k-mer counting, Dirichlet-smoothed
//! probability estimation, log-likelihood evaluation, and the binary
//! model-file store.
//!
//! Count tables and the probability table are dense arrays indexed by the
//! base-4 k-mer encoding from [`crate::encoding`]; there is no hashing on
//! the hot path. Only `order`, `alpha` and the log-probability table are
//! persisted, so a loaded model cannot be retrained incrementally.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::encoding::{kmer_index, last_symbol_of, prefix_of, table_size, ALPHABET_SIZE};
use crate::error::{HostrankError, Result};
use crate::sequence::{SequenceChunk, SequenceCollection};

/// Extension of persisted model files.
pub const MODEL_EXT: &str = "mm";

/// Largest supported Markov order. `4^(order+1)` must fit comfortably in
/// memory and in a 32-bit shift; order 15 already means a 4 GiB table.
pub const MAX_ORDER: u32 = 15;

/// An order-k Markov chain over the 2-bit nucleotide alphabet.
#[derive(Debug, Clone)]
pub struct MarkovModel {
    name: String,
    order: u32,
    alpha: f64,
    prior: [f64; ALPHABET_SIZE],
    full_counts: Vec<u32>,
    prefix_counts: Vec<u32>,
    log_prob: Vec<f64>,
}

impl MarkovModel {
    /// Create an untrained model with a uniform smoothing prior.
    pub fn new(order: u32, alpha: f64) -> Result<Self> {
        if order > MAX_ORDER {
            return Err(HostrankError::validation(format!(
                "order {} exceeds maximum supported order {}",
                order, MAX_ORDER
            )));
        }
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(HostrankError::validation(format!(
                "alpha must be a non-negative finite number, got {}",
                alpha
            )));
        }
        Ok(MarkovModel {
            name: String::new(),
            order,
            alpha,
            prior: [1.0 / ALPHABET_SIZE as f64; ALPHABET_SIZE],
            full_counts: vec![0; table_size(order + 1)],
            prefix_counts: vec![0; table_size(order)],
            log_prob: vec![0.0; table_size(order + 1)],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Conditional log-probability table, indexed by full k-mer index.
    pub fn log_prob(&self) -> &[f64] {
        &self.log_prob
    }

    #[cfg(test)]
    pub(crate) fn full_counts(&self) -> &[u32] {
        &self.full_counts
    }

    #[cfg(test)]
    pub(crate) fn prefix_counts(&self) -> &[u32] {
        &self.prefix_counts
    }

    /// Log the model parameters at debug level.
    pub fn log_parameters(&self) {
        debug!(
            "model '{}': order={}, alpha={}, {} conditional probabilities, {} contexts",
            self.name,
            self.order,
            self.alpha,
            self.log_prob.len(),
            table_size(self.order),
        );
    }

    /// Accumulate k-mer counts from one chunk.
    ///
    /// Every window of `order+1` symbols increments its full-index count and
    /// its context count. The trailing `order`-length suffix increments the
    /// context count once more: that final context is observed in the chunk
    /// but never followed by a symbol, and the prefix marginal records it.
    pub fn count_kmers(&mut self, chunk: &SequenceChunk) {
        let k = self.order as usize;
        let symbols = chunk.symbols();
        if symbols.len() < k {
            return;
        }

        let mask = table_size(self.order + 1) - 1;
        let mut idx = kmer_index(&symbols[..k]);
        for &s in &symbols[k..] {
            idx = ((idx << 2) | s as usize) & mask;
            self.full_counts[idx] += 1;
            self.prefix_counts[prefix_of(idx)] += 1;
        }
        self.prefix_counts[kmer_index(&symbols[symbols.len() - k..])] += 1;
    }

    /// Turn the accumulated counts into smoothed conditional log-probabilities:
    /// `ln((full[f] + alpha·prior[last]) / (prefix[head] + alpha))`.
    pub fn estimate_probabilities(&mut self) -> Result<()> {
        if self.alpha == 0.0 && self.prefix_counts.contains(&0) {
            return Err(HostrankError::numeric(format!(
                "model '{}': alpha is 0 and at least one context was never observed, \
                 so its conditional probabilities are undefined",
                self.name
            )));
        }

        for full in 0..self.log_prob.len() {
            let numerator =
                self.full_counts[full] as f64 + self.alpha * self.prior[last_symbol_of(full)];
            let denominator = self.prefix_counts[prefix_of(full)] as f64 + self.alpha;
            let lp = (numerator / denominator).ln();
            if lp > 0.0 {
                warn!(
                    "model '{}': positive log-probability {} at index {}",
                    self.name, lp, full
                );
            }
            self.log_prob[full] = lp;
        }
        Ok(())
    }

    /// Train the model from scratch on a collection, replacing any previous
    /// counts and probabilities. The model takes its name from the
    /// collection. Fails on an empty collection.
    pub fn train(&mut self, collection: &SequenceCollection) -> Result<()> {
        if collection.is_empty() {
            return Err(HostrankError::validation(format!(
                "'{}' yielded no sequence records to train on",
                collection.name()
            )));
        }
        self.name = collection.name().to_string();
        self.full_counts.fill(0);
        self.prefix_counts.fill(0);

        for chunk in collection.chunks() {
            self.count_kmers(chunk);
        }
        self.estimate_probabilities()
    }

    /// Mean per-symbol log-likelihood of a collection under this model.
    ///
    /// Sums `log_prob` over every window of `order+1` symbols in every chunk
    /// and divides by the number of windows. Errors if no chunk is long
    /// enough to contain a single window.
    pub fn evaluate(&self, collection: &SequenceCollection) -> Result<f64> {
        let k = self.order as usize;
        let mask = table_size(self.order + 1) - 1;

        let mut total = 0.0;
        let mut windows: u64 = 0;
        for chunk in collection.chunks() {
            let symbols = chunk.symbols();
            if symbols.len() < k + 1 {
                continue;
            }
            let mut idx = kmer_index(&symbols[..k]);
            for &s in &symbols[k..] {
                idx = ((idx << 2) | s as usize) & mask;
                total += self.log_prob[idx];
                windows += 1;
            }
        }

        if windows == 0 {
            return Err(HostrankError::numeric(format!(
                "'{}' has no window of {} symbols to score under model '{}' (order {})",
                collection.name(),
                k + 1,
                self.name,
                self.order
            )));
        }
        Ok(total / windows as f64)
    }

    /// Write the model to `<dir>/<name>.mm`.
    ///
    /// Layout (little-endian): `order: u32 | alpha: f64 | log_prob: [f64]`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.{}", self.name, MODEL_EXT));
        let file = File::create(&path).map_err(|e| HostrankError::io(&path, "create", e))?;
        let mut writer = BufWriter::new(file);

        writer
            .write_all(&self.order.to_le_bytes())
            .and_then(|_| writer.write_all(&self.alpha.to_le_bytes()))
            .map_err(|e| HostrankError::io(&path, "write", e))?;
        for &p in &self.log_prob {
            writer
                .write_all(&p.to_le_bytes())
                .map_err(|e| HostrankError::io(&path, "write", e))?;
        }
        writer
            .flush()
            .map_err(|e| HostrankError::io(&path, "write", e))?;
        Ok(path)
    }

    /// Load a model from a `.mm` file. Only `order`, `alpha` and the
    /// probability table are restored; the count tables stay empty.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| HostrankError::io(path, "open", e))?;
        let mut reader = BufReader::new(file);

        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];
        reader
            .read_exact(&mut buf4)
            .map_err(|_| HostrankError::serialization(path, "truncated header (order)"))?;
        let order = u32::from_le_bytes(buf4);
        if order > MAX_ORDER {
            return Err(HostrankError::serialization(
                path,
                format!("order {} exceeds maximum supported order {}", order, MAX_ORDER),
            ));
        }
        reader
            .read_exact(&mut buf8)
            .map_err(|_| HostrankError::serialization(path, "truncated header (alpha)"))?;
        let alpha = f64::from_le_bytes(buf8);
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(HostrankError::serialization(
                path,
                format!("invalid alpha value {}", alpha),
            ));
        }

        let mut rest = Vec::new();
        reader
            .read_to_end(&mut rest)
            .map_err(|e| HostrankError::io(path, "read", e))?;
        if rest.len() % 8 != 0 {
            return Err(HostrankError::serialization(
                path,
                format!("probability table is {} bytes, not a multiple of 8", rest.len()),
            ));
        }
        let expected = table_size(order + 1);
        if rest.len() / 8 != expected {
            return Err(HostrankError::serialization(
                path,
                format!(
                    "probability table has {} entries, expected {} for order {}",
                    rest.len() / 8,
                    expected,
                    order
                ),
            ));
        }

        let log_prob: Vec<f64> = rest
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect();

        Ok(MarkovModel {
            name: crate::sequence::stem_name(path),
            order,
            alpha,
            prior: [1.0 / ALPHABET_SIZE as f64; ALPHABET_SIZE],
            full_counts: Vec::new(),
            prefix_counts: Vec::new(),
            log_prob,
        })
    }

    /// Read only the order field of a model file, without decoding the
    /// probability table.
    pub fn peek_order(path: &Path) -> Result<u32> {
        let file = File::open(path).map_err(|e| HostrankError::io(path, "open", e))?;
        let mut reader = BufReader::new(file);
        let mut buf4 = [0u8; 4];
        reader
            .read_exact(&mut buf4)
            .map_err(|_| HostrankError::serialization(path, "truncated header (order)"))?;
        let order = u32::from_le_bytes(buf4);
        if order > MAX_ORDER {
            return Err(HostrankError::serialization(
                path,
                format!("order {} exceeds maximum supported order {}", order, MAX_ORDER),
            ));
        }
        Ok(order)
    }
}

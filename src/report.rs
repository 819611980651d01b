//! Score matrix assembly and tab-separated report output.
//!
//! Two reports are produced after a prediction run: a best-hit list (one
//! winning model per query, with an optional Gaussian-null p-value) and the
//! full model × query log-likelihood matrix.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;

use crate::error::{HostrankError, Result};
use crate::stats;

/// Best-hit report file name inside the result directory.
pub const BEST_HIT_FILE: &str = "prediction.list";

/// Log-likelihood matrix file name inside the result directory.
pub const MATRIX_FILE: &str = "llikelihood.matrix";

/// Parameters of a per-model Gaussian null distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNull {
    pub mean: f64,
    pub sd: f64,
}

/// Dense model × query score matrix. Row order follows the model files,
/// column order follows the query files.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    model_names: Vec<String>,
    query_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    pub fn new(model_names: Vec<String>, query_names: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(model_names.len(), rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == query_names.len()));
        ScoreMatrix {
            model_names,
            query_names,
            rows,
        }
    }

    pub fn model_names(&self) -> &[String] {
        &self.model_names
    }

    pub fn query_names(&self) -> &[String] {
        &self.query_names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn score(&self, model: usize, query: usize) -> f64 {
        self.rows[model][query]
    }

    /// Winning model for one query column: highest score, ties broken by
    /// the first model index.
    pub fn best_hit(&self, query: usize) -> (usize, f64) {
        let mut best = 0usize;
        let mut max = f64::NEG_INFINITY;
        for (i, row) in self.rows.iter().enumerate() {
            if row[query] > max {
                best = i;
                max = row[query];
            }
        }
        (best, max)
    }

    /// Z-normalize every row in place (zero mean, unit sample sd).
    /// Degenerate rows become all zeros, see [`stats::z_normalize`].
    pub fn z_normalize_rows(&mut self) {
        for (row, name) in self.rows.iter_mut().zip(&self.model_names) {
            stats::z_normalize(row, name);
        }
    }
}

/// Read a null-distribution side file: one `model<TAB>mean<TAB>sd` row per
/// model. Malformed rows are skipped with a warning; an unreadable file is
/// an error, since the caller asked for it explicitly.
pub fn read_null_fits(path: &Path) -> Result<HashMap<String, GaussianNull>> {
    let file = File::open(path).map_err(|e| HostrankError::io(path, "open", e))?;
    let reader = BufReader::new(file);

    let mut fits = HashMap::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| HostrankError::io(path, "read", e))?;
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let parsed = if fields.len() == 3 {
            match (fields[1].parse::<f64>(), fields[2].parse::<f64>()) {
                (Ok(mean), Ok(sd)) => Some((fields[0].to_string(), GaussianNull { mean, sd })),
                _ => None,
            }
        } else {
            None
        };
        match parsed {
            Some((name, fit)) => {
                fits.insert(name, fit);
            }
            None => warn!(
                "{}:{}: malformed null-fit row, expected modelName<TAB>mean<TAB>sd",
                path.display(),
                lineno + 1
            ),
        }
    }
    Ok(fits)
}

/// Write the best-hit report: per query, the winning model, its raw score,
/// and a p-value when a null fit is known for that model (`NA` otherwise).
pub fn write_best_hits(
    matrix: &ScoreMatrix,
    null_fits: &HashMap<String, GaussianNull>,
    path: &Path,
) -> Result<()> {
    let file = File::create(path).map_err(|e| HostrankError::io(path, "create", e))?;
    let mut writer = BufWriter::new(file);

    let mut write = || -> std::io::Result<()> {
        writeln!(writer, "query\tbest_hit\tlog_likelihood\tp_value")?;
        for (q, query) in matrix.query_names().iter().enumerate() {
            let (m, score) = matrix.best_hit(q);
            let model = &matrix.model_names()[m];
            match null_fits.get(model) {
                Some(fit) => {
                    let p = stats::gaussian_tail_pvalue(score, fit.mean, fit.sd);
                    writeln!(writer, "{}\t{}\t{:.6}\t{:.6e}", query, model, score, p)?;
                }
                None => writeln!(writer, "{}\t{}\t{:.6}\tNA", query, model, score)?,
            }
        }
        writer.flush()
    };
    write().map_err(|e| HostrankError::io(path, "write", e))
}

/// Write the score matrix: header row of query names, then one row per
/// model.
pub fn write_matrix(matrix: &ScoreMatrix, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| HostrankError::io(path, "create", e))?;
    let mut writer = BufWriter::new(file);

    let mut write = || -> std::io::Result<()> {
        write!(writer, "model")?;
        for query in matrix.query_names() {
            write!(writer, "\t{}", query)?;
        }
        writeln!(writer)?;
        for (model, row) in matrix.model_names().iter().zip(matrix.rows()) {
            write!(writer, "{}", model)?;
            for score in row {
                write!(writer, "\t{:.6}", score)?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    };
    write().map_err(|e| HostrankError::io(path, "write", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_matrix() -> ScoreMatrix {
        ScoreMatrix::new(
            vec!["host_a".into(), "host_b".into()],
            vec!["q1".into(), "q2".into(), "q3".into()],
            vec![vec![-1.2, -1.4, -2.0], vec![-1.5, -1.1, -2.0]],
        )
    }

    #[test]
    fn test_best_hit_argmax_and_tie_break() {
        let m = sample_matrix();
        assert_eq!(m.best_hit(0), (0, -1.2));
        assert_eq!(m.best_hit(1), (1, -1.1));
        // Equal scores: the first model wins.
        assert_eq!(m.best_hit(2), (0, -2.0));
    }

    #[test]
    fn test_read_null_fits_skips_malformed_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fits.tsv");
        fs::write(
            &path,
            "host_a\t-1.4\t0.2\nbroken row\nhost_b\tnot_a_number\t0.3\n\nhost_c\t-2.0\t0.5\n",
        )
        .unwrap();

        let fits = read_null_fits(&path).unwrap();
        assert_eq!(fits.len(), 2);
        assert_eq!(
            fits["host_a"],
            GaussianNull {
                mean: -1.4,
                sd: 0.2
            }
        );
        assert!(fits.contains_key("host_c"));
    }

    #[test]
    fn test_read_null_fits_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_null_fits(&dir.path().join("absent.tsv")).unwrap_err();
        assert!(matches!(err, HostrankError::Io { .. }));
    }

    #[test]
    fn test_write_best_hits_with_and_without_fits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(BEST_HIT_FILE);
        let mut fits = HashMap::new();
        fits.insert(
            "host_a".to_string(),
            GaussianNull {
                mean: -2.0,
                sd: 0.4,
            },
        );

        write_best_hits(&sample_matrix(), &fits, &path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "query\tbest_hit\tlog_likelihood\tp_value");
        // q1 wins with host_a, which has a fit: numeric p-value.
        assert!(lines[1].starts_with("q1\thost_a\t"));
        assert!(!lines[1].ends_with("NA"));
        // q2 wins with host_b: no fit, NA.
        assert!(lines[2].starts_with("q2\thost_b\t"));
        assert!(lines[2].ends_with("NA"));
    }

    #[test]
    fn test_write_matrix_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MATRIX_FILE);
        write_matrix(&sample_matrix(), &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "model\tq1\tq2\tq3");
        assert!(lines[1].starts_with("host_a\t-1.2"));
        assert!(lines[2].starts_with("host_b\t-1.5"));
        assert_eq!(lines[1].split('\t').count(), 4);
    }

    #[test]
    fn test_z_normalize_rows() {
        let mut m = sample_matrix();
        m.z_normalize_rows();
        for row in m.rows() {
            let mu = crate::stats::mean(row);
            assert!(mu.abs() < 1e-12);
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }
}

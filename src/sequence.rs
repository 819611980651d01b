//! Sequence ingestion: FASTA-style files to 2-bit symbol collections.
//!
//! Each `>`-header starts a new chunk; body lines are mapped byte by byte
//! through the symbol table. Bytes outside the alphabet are dropped rather
//! than substituted, so a chunk can be shorter than its literal text and a
//! k-mer can bridge two bases that were not adjacent in the input. This
//! matches the scoring behavior of existing model collections.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::warn;

use crate::encoding::symbol_of;
use crate::error::{HostrankError, Result};

/// One contiguous record of 2-bit symbols. K-mers never span chunks.
#[derive(Debug, Clone, Default)]
pub struct SequenceChunk {
    symbols: Vec<u8>,
}

impl SequenceChunk {
    /// The 2-bit symbols of this chunk, in sequence order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Number of stored symbols (may be shorter than the source text).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn push_line(&mut self, line: &[u8]) {
        self.symbols
            .extend(line.iter().filter_map(|&b| symbol_of(b)));
    }
}

impl From<Vec<u8>> for SequenceChunk {
    fn from(symbols: Vec<u8>) -> Self {
        SequenceChunk { symbols }
    }
}

/// All chunks of one source file, in file order. Named by the file stem.
#[derive(Debug, Clone)]
pub struct SequenceCollection {
    name: String,
    chunks: Vec<SequenceChunk>,
}

impl SequenceCollection {
    /// Build a collection directly from symbol vectors (used by tests and
    /// by callers that synthesize sequences).
    pub fn from_chunks(name: impl Into<String>, chunks: Vec<Vec<u8>>) -> Self {
        SequenceCollection {
            name: name.into(),
            chunks: chunks.into_iter().map(SequenceChunk::from).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chunks(&self) -> &[SequenceChunk] {
        &self.chunks
    }

    /// True if the file yielded no records at all.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Length of the longest chunk, 0 for an empty collection.
    pub fn max_chunk_len(&self) -> usize {
        self.chunks.iter().map(SequenceChunk::len).max().unwrap_or(0)
    }
}

/// Derive a collection/model name from a file path: the file name with its
/// final extension removed (`ecoli.fasta` → `ecoli`).
pub fn stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Read a FASTA-style file into a [`SequenceCollection`].
///
/// Files ending in `.gz` are decompressed on the fly. A body line before
/// any header starts an implicit chunk and logs a warning instead of
/// aborting. An empty result is valid and left to the caller to interpret.
pub fn read_collection(path: &Path) -> Result<SequenceCollection> {
    let file = File::open(path).map_err(|e| HostrankError::io(path, "open", e))?;

    let reader: Box<dyn BufRead> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut chunks: Vec<SequenceChunk> = Vec::new();
    let mut warned_headerless = false;

    for line in reader.lines() {
        let line = line.map_err(|e| HostrankError::io(path, "read", e))?;
        let bytes = line.as_bytes();
        if bytes.is_empty() {
            continue;
        }
        if bytes[0] == b'>' {
            chunks.push(SequenceChunk::default());
        } else {
            if chunks.is_empty() {
                if !warned_headerless {
                    warn!(
                        "{}: sequence data before the first '>' header, starting an unnamed record",
                        path.display()
                    );
                    warned_headerless = true;
                }
                chunks.push(SequenceChunk::default());
            }
            // Unwrap is fine: the branch above guarantees a chunk exists.
            chunks.last_mut().unwrap().push_line(bytes);
        }
    }

    Ok(SequenceCollection {
        name: stem_name(path),
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_basic_fasta() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "phage.fasta",
            ">rec1\nATCG\nAT\n>rec2\nGGTT\n",
        );
        let coll = read_collection(&path).unwrap();
        assert_eq!(coll.name(), "phage");
        assert_eq!(coll.chunks().len(), 2);
        assert_eq!(coll.chunks()[0].symbols(), &[0, 1, 2, 3, 0, 1]);
        assert_eq!(coll.chunks()[1].symbols(), &[3, 3, 1, 1]);
    }

    #[test]
    fn test_unrecognized_bytes_are_dropped() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "n.fasta", ">r\nANNTXC-G\n");
        let coll = read_collection(&path).unwrap();
        // N, X and '-' vanish; the survivors concatenate.
        assert_eq!(coll.chunks()[0].symbols(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_lowercase_accepted() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "lc.fasta", ">r\natcg\n");
        let coll = read_collection(&path).unwrap();
        assert_eq!(coll.chunks()[0].symbols(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_body_before_header_starts_implicit_chunk() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "bad.fasta", "ATCG\n>r\nGG\n");
        let coll = read_collection(&path).unwrap();
        assert_eq!(coll.chunks().len(), 2);
        assert_eq!(coll.chunks()[0].symbols(), &[0, 1, 2, 3]);
        assert_eq!(coll.chunks()[1].symbols(), &[3, 3]);
    }

    #[test]
    fn test_empty_and_blank_lines() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "blank.fasta", "\n>r\n\nAT\n\n");
        let coll = read_collection(&path).unwrap();
        assert_eq!(coll.chunks().len(), 1);
        assert_eq!(coll.chunks()[0].symbols(), &[0, 1]);
    }

    #[test]
    fn test_header_only_file_yields_empty_chunk() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "hdr.fasta", ">only_header\n");
        let coll = read_collection(&path).unwrap();
        assert_eq!(coll.chunks().len(), 1);
        assert!(coll.chunks()[0].is_empty());
        assert!(!coll.is_empty());
        assert_eq!(coll.max_chunk_len(), 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_collection(&dir.path().join("absent.fasta")).unwrap_err();
        assert!(matches!(err, HostrankError::Io { .. }));
    }

    #[test]
    fn test_gzip_input() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempdir().unwrap();
        let path = dir.path().join("z.fasta.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b">r\nATCG\n").unwrap();
        enc.finish().unwrap();

        let coll = read_collection(&path).unwrap();
        assert_eq!(coll.name(), "z.fasta");
        assert_eq!(coll.chunks()[0].symbols(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_stem_name() {
        assert_eq!(stem_name(Path::new("/data/ecoli.fasta")), "ecoli");
        assert_eq!(stem_name(Path::new("plain")), "plain");
    }
}

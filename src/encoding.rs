//! 2-bit nucleotide alphabet and k-mer index arithmetic.
//!
//! A window of `L` symbols maps to a dense index in `[0, 4^L)` via MSB-first
//! base-4 encoding. The hot loops in counting and evaluation keep a rolling
//! index so each window step costs O(1) instead of rehashing the window.

/// Number of symbols in the nucleotide alphabet.
pub const ALPHABET_SIZE: usize = 4;

/// Sentinel for bytes outside the recognized alphabet.
pub(crate) const INVALID_SYMBOL: u8 = u8::MAX;

/// Lookup table mapping sequence bytes to 2-bit symbols.
/// A/a → 0, T/t → 1, C/c → 2, G/g → 3; everything else is invalid.
/// The code assignment is part of the on-disk model format: changing it
/// changes every k-mer index and breaks model-file compatibility.
pub(crate) const SYMBOL_LUT: [u8; 256] = {
    let mut lut = [INVALID_SYMBOL; 256];
    lut[b'A' as usize] = 0;
    lut[b'a' as usize] = 0;
    lut[b'T' as usize] = 1;
    lut[b't' as usize] = 1;
    lut[b'C' as usize] = 2;
    lut[b'c' as usize] = 2;
    lut[b'G' as usize] = 3;
    lut[b'g' as usize] = 3;
    lut
};

/// Map a raw sequence byte to its 2-bit symbol, or `None` if unrecognized.
#[inline(always)]
pub fn symbol_of(byte: u8) -> Option<u8> {
    let s = SYMBOL_LUT[byte as usize];
    if s == INVALID_SYMBOL {
        None
    } else {
        Some(s)
    }
}

/// Size of the dense index table for windows of `len` symbols (`4^len`).
#[inline]
pub fn table_size(len: u32) -> usize {
    1usize << (2 * len)
}

/// Dense index of a symbol window: `Σ window[i] · 4^(L−1−i)`.
///
/// Every element of `window` must already be a valid 2-bit symbol.
#[inline]
pub fn kmer_index(window: &[u8]) -> usize {
    window
        .iter()
        .fold(0usize, |idx, &s| (idx << 2) | s as usize)
}

/// Context (all but the last symbol) of a full index.
#[inline]
pub fn prefix_of(full_index: usize) -> usize {
    full_index >> 2
}

/// Last symbol of a full index.
#[inline]
pub fn last_symbol_of(full_index: usize) -> usize {
    full_index & 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_codes() {
        assert_eq!(symbol_of(b'A'), Some(0));
        assert_eq!(symbol_of(b'T'), Some(1));
        assert_eq!(symbol_of(b'C'), Some(2));
        assert_eq!(symbol_of(b'G'), Some(3));
        assert_eq!(symbol_of(b'a'), Some(0));
        assert_eq!(symbol_of(b'g'), Some(3));
        assert_eq!(symbol_of(b'N'), None);
        assert_eq!(symbol_of(b'>'), None);
        assert_eq!(symbol_of(b'-'), None);
    }

    #[test]
    fn test_kmer_index_formula() {
        // Index is MSB-first base 4: [s0, s1, s2] -> s0*16 + s1*4 + s2.
        assert_eq!(kmer_index(&[0, 0]), 0);
        assert_eq!(kmer_index(&[0, 1]), 1);
        assert_eq!(kmer_index(&[1, 1]), 5);
        assert_eq!(kmer_index(&[3, 2, 1]), 3 * 16 + 2 * 4 + 1);
        // Empty window (order 0 trailing context) indexes slot 0.
        assert_eq!(kmer_index(&[]), 0);
    }

    #[test]
    fn test_prefix_and_last_symbol_decompose_index() {
        for full in 0..table_size(3) {
            assert_eq!(prefix_of(full) * 4 + last_symbol_of(full), full);
        }
        assert_eq!(prefix_of(kmer_index(&[1, 1])), kmer_index(&[1]));
        assert_eq!(last_symbol_of(kmer_index(&[2, 3])), 3);
    }

    #[test]
    fn test_table_size() {
        assert_eq!(table_size(0), 1);
        assert_eq!(table_size(1), 4);
        assert_eq!(table_size(8), 65536);
    }

    #[test]
    fn test_rolling_index_matches_recompute() {
        let symbols: Vec<u8> = vec![0, 3, 2, 1, 1, 0, 2, 3, 3, 0];
        let k = 3usize;
        let mask = table_size(k as u32 + 1) - 1;
        let mut idx = kmer_index(&symbols[..k]);
        for pos in k..symbols.len() {
            idx = ((idx << 2) | symbols[pos] as usize) & mask;
            assert_eq!(idx, kmer_index(&symbols[pos - k..=pos]));
        }
    }
}

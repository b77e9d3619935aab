//! Symbol-phase slicing and preamble search.
//!
//! The quantizer emits one hard bit per *sample*, but each symbol spans
//! [`SYMBOL_LENGTH`](crate::constants::SYMBOL_LENGTH) samples and we don't
//! know where a symbol boundary falls within that window. Rather than
//! recovering timing explicitly, we slice the quantized stream at all
//! `SYMBOL_LENGTH` possible phases and run preamble search on each slice
//! independently; whichever phase's slice contains the preamble is, by
//! construction, correctly symbol-aligned.

use crate::constants::SYMBOL_LENGTH;

/// Extract one symbol-phase slice from a quantized bit stream.
///
/// `quantized[phase], quantized[phase + SYMBOL_LENGTH], quantized[phase +
/// 2*SYMBOL_LENGTH], ...` are appended to `out`.
pub fn slice_phase(quantized: &[u8], phase: usize, out: &mut Vec<u8>) {
    debug_assert!(phase < SYMBOL_LENGTH);
    let mut i = phase;
    while i < quantized.len() {
        out.push(quantized[i]);
        i += SYMBOL_LENGTH;
    }
}

/// Produce all `SYMBOL_LENGTH` symbol-phase slices of a quantized bit
/// stream.
pub fn slice_all_phases(quantized: &[u8]) -> Vec<Vec<u8>> {
    (0..SYMBOL_LENGTH)
        .map(|phase| {
            let mut out = Vec::with_capacity(quantized.len() / SYMBOL_LENGTH + 1);
            slice_phase(quantized, phase, &mut out);
            out
        })
        .collect()
}

/// A Boyer-Moore-Horspool-style byte-stream preamble searcher.
///
/// The alphabet here is `{0, 1}`, so the classic skip-on-mismatch win is
/// smaller than for text search, but the precomputed skip table still lets
/// the searcher jump past guaranteed-mismatch positions instead of
/// re-testing every starting offset.
#[derive(Debug, Clone)]
pub struct PreambleFinder {
    pattern: Vec<u8>,
    /// `skip[v]` = distance to shift the window when the byte aligned with
    /// the pattern's last position is `v` and doesn't match `pattern.last()`.
    skip: [usize; 2],
}

impl PreambleFinder {
    /// Build a finder for `pattern`, a slice of bits each `0` or `1`.
    pub fn new(pattern: &[u8]) -> Self {
        assert!(!pattern.is_empty(), "preamble pattern must be non-empty");
        debug_assert!(pattern.iter().all(|&b| b == 0 || b == 1));

        let m = pattern.len();
        let mut skip = [m, m];
        for (idx, &symbol) in pattern.iter().enumerate().take(m - 1) {
            skip[symbol as usize] = m - 1 - idx;
        }

        PreambleFinder {
            pattern: pattern.to_vec(),
            skip,
        }
    }

    /// Build a finder from an ASCII `'0'`/`'1'` string such as
    /// [`crate::constants::PREAMBLE`].
    pub fn from_ascii(pattern: &str) -> Self {
        let bits: Vec<u8> = pattern
            .bytes()
            .map(|b| if b == b'1' { 1 } else { 0 })
            .collect();
        Self::new(&bits)
    }

    /// Find every match of the pattern in `haystack`, including overlapping
    /// ones — after a hit the search resumes one position later, not past
    /// the whole pattern, so a haystack equal to the pattern repeated `r`
    /// times yields `r * len(pattern) - len(pattern) + 1` matches, not `r`.
    pub fn find_all(&self, haystack: &[u8]) -> Vec<usize> {
        let m = self.pattern.len();
        if haystack.len() < m {
            return Vec::new();
        }

        let mut matches = Vec::new();
        let mut pos = 0;
        while pos + m <= haystack.len() {
            let window = &haystack[pos..pos + m];
            if window == self.pattern.as_slice() {
                matches.push(pos);
                pos += 1;
                continue;
            }
            let last = window[m - 1];
            let shift = self.skip[last as usize].max(1);
            pos += shift;
        }
        matches
    }

    /// Find the first match at or after `from`, if any.
    pub fn find_first(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let m = self.pattern.len();
        if from >= haystack.len() {
            return None;
        }
        let mut pos = from;
        while pos + m <= haystack.len() {
            let window = &haystack[pos..pos + m];
            if window == self.pattern.as_slice() {
                return Some(pos);
            }
            let last = window[m - 1];
            let shift = self.skip[last as usize].max(1);
            pos += shift;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PREAMBLE;

    #[test]
    fn slice_phase_extracts_stride() {
        let quantized: Vec<u8> = (0..SYMBOL_LENGTH as u8 * 3)
            .map(|i| i % 2)
            .collect();
        let mut out = Vec::new();
        slice_phase(&quantized, 0, &mut out);
        assert_eq!(out, vec![0, 0, 0]);
    }

    #[test]
    fn slice_all_phases_covers_every_offset() {
        let quantized: Vec<u8> = (0..(SYMBOL_LENGTH * 4) as u32).map(|i| (i % 2) as u8).collect();
        let slices = slice_all_phases(&quantized);
        assert_eq!(slices.len(), SYMBOL_LENGTH);
        for slice in &slices {
            assert_eq!(slice.len(), 4);
        }
    }

    #[test]
    fn finds_exact_preamble() {
        let finder = PreambleFinder::from_ascii(PREAMBLE);
        let pattern: Vec<u8> = PREAMBLE.bytes().map(|b| (b == b'1') as u8).collect();
        let mut haystack = vec![0u8, 1, 0, 1];
        haystack.extend(&pattern);
        haystack.extend(vec![1, 0, 1]);

        let matches = finder.find_all(&haystack);
        assert_eq!(matches, vec![4]);
    }

    #[test]
    fn finds_multiple_adjacent_matches() {
        let finder = PreambleFinder::from_ascii(PREAMBLE);
        let pattern: Vec<u8> = PREAMBLE.bytes().map(|b| (b == b'1') as u8).collect();
        let mut haystack = pattern.clone();
        haystack.extend(&pattern);

        // This preamble has no self-overlap, so two back-to-back copies
        // produce exactly the two aligned matches, not extra overlapping
        // ones — see `overlapping_repeats_match_the_spec_formula` for the
        // general overlapping case.
        let matches = finder.find_all(&haystack);
        assert_eq!(matches, vec![0, pattern.len()]);
    }

    #[test]
    fn overlapping_repeats_match_the_spec_formula() {
        // A pattern that overlaps itself at every shift (all-ones) repeated
        // `r` times gives a haystack of length `L = r * len(pattern)` in
        // which every one of the `L - len(pattern) + 1` window positions is
        // a match — the degenerate case that distinguishes an "overlapping"
        // searcher (this one) from one that greedily skips a full pattern
        // length after each hit and would under-count.
        let pattern = vec![1u8, 1, 1, 1];
        let finder = PreambleFinder::new(&pattern);
        let r = 6;
        let haystack = vec![1u8; r * pattern.len()];

        let matches = finder.find_all(&haystack);
        let expected_count = haystack.len() - pattern.len() + 1;
        assert_eq!(matches.len(), expected_count);
        assert_eq!(matches, (0..expected_count).collect::<Vec<_>>());
    }

    #[test]
    fn no_match_in_random_noise() {
        let finder = PreambleFinder::from_ascii(PREAMBLE);
        let haystack = vec![0u8; 10];
        assert!(finder.find_all(&haystack).is_empty());
    }

    #[test]
    fn find_first_respects_from_offset() {
        let finder = PreambleFinder::from_ascii(PREAMBLE);
        let pattern: Vec<u8> = PREAMBLE.bytes().map(|b| (b == b'1') as u8).collect();
        let mut haystack = pattern.clone();
        haystack.extend(&pattern);

        let first = finder.find_first(&haystack, 0).unwrap();
        assert_eq!(first, 0);
        let second = finder.find_first(&haystack, 1).unwrap();
        assert_eq!(second, pattern.len());
    }
}

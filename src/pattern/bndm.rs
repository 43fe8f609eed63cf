use std::collections::HashMap;

use super::kmp::Kmp;
use super::PatternMatcher;

/// Backward non-deterministic DAWG matching, bit-parallel over a `u64`
/// mask per byte value. Patterns wider than 64 bits fall back to
/// [`Kmp`] (spec §4.3).
pub struct Bndm;

impl PatternMatcher for Bndm {
    type State = HashMap<u8, u64>;

    fn preprocess(pattern: &[u8]) -> Self::State {
        let m = pattern.len();
        let mut masks = HashMap::new();
        for i in 0..m {
            let bit = 1u64 << i;
            *masks.entry(pattern[m - i - 1]).or_insert(0) |= bit;
        }
        masks
    }

    fn index_of(haystack: &[u8], from: usize, pattern: &[u8], state: &Self::State) -> Option<usize> {
        let m = pattern.len();
        if m == 0 {
            return Some(from);
        }
        if m > 64 {
            let kmp_state = Kmp::preprocess(pattern);
            return Kmp::index_of(haystack, from, pattern, &kmp_state);
        }
        let n = haystack.len();
        if n < m {
            return None;
        }

        let mut j = from;
        while j <= n - m {
            let mut i: isize = m as isize - 1;
            let mut last: usize = m;
            let mut d: u64 = u64::MAX;

            while d != 0 {
                let c = haystack[j + i as usize];
                d &= state.get(&c).copied().unwrap_or(0);
                i -= 1;
                if d != 0 {
                    if i >= 0 {
                        last = (i + 1) as usize;
                    } else {
                        return Some(j);
                    }
                }
                d <<= 1;
            }
            j += last;
        }
        None
    }
}

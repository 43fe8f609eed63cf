use super::PatternMatcher;

const BASE: u64 = 257;
const MODULUS: u64 = 1_000_000_007;

/// Rolling-hash matcher with a constant modulus. Hash collisions are
/// ruled out by a direct byte compare before reporting a match.
pub struct RabinKarp;

pub struct RkState {
    pattern_hash: u64,
    high_order: u64,
}

impl PatternMatcher for RabinKarp {
    type State = RkState;

    fn preprocess(pattern: &[u8]) -> Self::State {
        let mut pattern_hash = 0u64;
        for &b in pattern {
            pattern_hash = (pattern_hash * BASE + b as u64) % MODULUS;
        }
        let mut high_order = 1u64;
        for _ in 1..pattern.len() {
            high_order = (high_order * BASE) % MODULUS;
        }
        RkState { pattern_hash, high_order }
    }

    fn index_of(haystack: &[u8], from: usize, pattern: &[u8], state: &Self::State) -> Option<usize> {
        let m = pattern.len();
        let n = haystack.len();
        if m == 0 {
            return Some(from);
        }
        if n < m || from > n - m {
            return None;
        }

        let mut window_hash = 0u64;
        for &b in &haystack[from..from + m] {
            window_hash = (window_hash * BASE + b as u64) % MODULUS;
        }

        let mut j = from;
        loop {
            if window_hash == state.pattern_hash && &haystack[j..j + m] == pattern {
                return Some(j);
            }
            if j + m >= n {
                return None;
            }
            let leaving = haystack[j] as u64;
            let entering = haystack[j + m] as u64;
            window_hash = (window_hash + MODULUS - (leaving * state.high_order) % MODULUS) % MODULUS;
            window_hash = (window_hash * BASE + entering) % MODULUS;
            j += 1;
        }
    }
}

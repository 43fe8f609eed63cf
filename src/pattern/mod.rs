//! Byte-pattern search, used to locate message headers (spec §4.3). Three
//! interchangeable algorithms are implemented; [`find`] is the production
//! entry point (BNDM, falling back to KMP for patterns wider than its
//! word size), and the other two exist for cross-validation in tests.

mod bndm;
mod kmp;
mod rabin_karp;

pub use bndm::Bndm;
pub use kmp::Kmp;
pub use rabin_karp::RabinKarp;

/// `preprocess(pattern) -> state; index_of(haystack, from, pattern, state)`.
pub trait PatternMatcher {
    type State;

    fn preprocess(pattern: &[u8]) -> Self::State;

    fn index_of(haystack: &[u8], from: usize, pattern: &[u8], state: &Self::State) -> Option<usize>;
}

/// Finds the first occurrence of `pattern` in `haystack` at or after
/// `from`, using the matcher chosen for production use.
pub fn find(haystack: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() {
        return Some(0);
    }
    if pattern.len() <= 64 {
        let state = Bndm::preprocess(pattern);
        Bndm::index_of(haystack, from, pattern, &state)
    } else {
        let state = Kmp::preprocess(pattern);
        Kmp::index_of(haystack, from, pattern, &state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_find(haystack: &[u8], pattern: &[u8]) -> [Option<usize>; 3] {
        let kmp_state = Kmp::preprocess(pattern);
        let bndm_state = Bndm::preprocess(pattern);
        let rk_state = RabinKarp::preprocess(pattern);
        [
            Kmp::index_of(haystack, 0, pattern, &kmp_state),
            Bndm::index_of(haystack, 0, pattern, &bndm_state),
            RabinKarp::index_of(haystack, 0, pattern, &rk_state),
        ]
    }

    #[test]
    fn empty_pattern_returns_zero() {
        let results = all_find(b"anything", b"");
        assert_eq!(results, [Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn all_matchers_agree_on_found_pattern() {
        // scenario 6 of spec §8
        let source = hex(
            "2b41434b066f2446010a0311235e40035110420600ffff07e30405083639001265b60d0a\
             2b41434b066f2446010a0311235e40035110420600ffff07e30405083639001265b60d0a",
        );
        let pattern = [0x0d, 0x0a];
        let results = all_find(&source, &pattern);
        assert_eq!(results, [Some(34), Some(34), Some(34)]);
    }

    #[test]
    fn all_matchers_agree_on_absent_pattern() {
        let results = all_find(b"hello world", b"xyz");
        assert_eq!(results, [None, None, None]);
    }

    pub(crate) fn hex(s: &str) -> Vec<u8> {
        let clean: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        (0..clean.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&clean[i..i + 2], 16).unwrap())
            .collect()
    }
}

use super::ChecksumAlgorithm;

/// Plain wrapping byte sum, truncated to the result width by the caller.
pub struct ByteSum;

impl ChecksumAlgorithm for ByteSum {
    fn compute(&self, bytes: &[u8], start_value: u64) -> u64 {
        let mut acc = start_value;
        for &b in bytes {
            acc = acc.wrapping_add(b as u64);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_bytes_from_start_value() {
        assert_eq!(ByteSum.compute(&[1, 2, 3], 0), 6);
        assert_eq!(ByteSum.compute(&[1, 2, 3], 10), 16);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Human-Facing Codes
// ============================================================================
//
// Orders and reservations carry short numeric codes next to their UUIDs.
// A process-wide counter hands out the sequential number; the order code is
// a bijective scramble of it so consecutive orders don't read as a sequence.
//
// ============================================================================

const CODE_SPACE: u64 = 100_000_000;
const MULTIPLIER: u64 = 48_271;
const OFFSET: u64 = 1_234_567;

#[derive(Debug)]
pub struct CodeSequence {
    last: AtomicU64,
}

impl CodeSequence {
    /// Start after `last_issued` (0 for an empty store).
    pub fn starting_after(last_issued: u64) -> Self {
        Self {
            last: AtomicU64::new(last_issued),
        }
    }

    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Eight-digit code for a sequence number. `MULTIPLIER` is coprime with
/// `CODE_SPACE`, so codes are unique for the first hundred million numbers.
pub fn scrambled_code(number: u64) -> String {
    let code = (number % CODE_SPACE * MULTIPLIER + OFFSET) % CODE_SPACE;
    format!("{:08}", code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequence_continues_after_seed() {
        let seq = CodeSequence::starting_after(41);
        assert_eq!(seq.next(), 42);
        assert_eq!(seq.next(), 43);
        assert_eq!(seq.last_issued(), 43);
    }

    #[test]
    fn test_scrambled_codes_are_unique_and_fixed_width() {
        let codes: HashSet<String> = (1..=10_000).map(scrambled_code).collect();
        assert_eq!(codes.len(), 10_000);
        assert!(codes.iter().all(|c| c.len() == 8));
    }
}

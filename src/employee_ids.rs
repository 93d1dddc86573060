// src/employee_ids.rs
use std::sync::atomic::{AtomicU32, Ordering};

pub const EMPLOYEE_ID_PREFIX: char = 'E';

/// `E` followed by the sequence number, zero-padded to three digits.
pub fn format_employee_id(sequence: u32) -> String {
    format!("{}{:03}", EMPLOYEE_ID_PREFIX, sequence)
}

/// Source of employee sequence numbers.
///
/// Implementations only promise monotonic numbers within their own scope.
/// Uniqueness across concurrent sessions is the backend's responsibility.
pub trait IdSequence: Send + Sync {
    /// Sequence number the next registration would use.
    fn peek(&self) -> u32;

    /// Records that `used` was accepted by the backend. Never moves backwards.
    fn commit(&self, used: u32);

    fn peek_id(&self) -> String {
        format_employee_id(self.peek())
    }
}

/// In-process counter, seeded from `DEFAULT_NEXT_EMPLOYEE_ID`.
#[derive(Debug)]
pub struct SessionSequence {
    next: AtomicU32,
}

impl SessionSequence {
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }
}

impl IdSequence for SessionSequence {
    fn peek(&self) -> u32 {
        self.next.load(Ordering::SeqCst)
    }

    fn commit(&self, used: u32) {
        self.next.fetch_max(used.saturating_add(1), Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_zero_padded_to_three_digits() {
        assert_eq!(format_employee_id(1), "E001");
        assert_eq!(format_employee_id(21), "E021");
        assert_eq!(format_employee_id(999), "E999");
        assert_eq!(format_employee_id(1000), "E1000");
    }

    #[test]
    fn peek_does_not_advance() {
        let seq = SessionSequence::starting_at(21);
        assert_eq!(seq.peek_id(), "E021");
        assert_eq!(seq.peek_id(), "E021");
    }

    #[test]
    fn commit_advances_past_the_used_number() {
        let seq = SessionSequence::starting_at(21);
        seq.commit(21);
        assert_eq!(seq.peek(), 22);
        seq.commit(30);
        assert_eq!(seq.peek(), 31);
    }

    #[test]
    fn stale_commit_never_moves_backwards() {
        let seq = SessionSequence::starting_at(40);
        seq.commit(25);
        assert_eq!(seq.peek(), 40);
    }
}

//! Per-view request tickets
//!
//! Searches run on background threads and can finish in any order. A view takes
//! a ticket before it starts a request and only applies a response whose ticket
//! is still the latest one it issued.

#[derive(Debug, Default, Clone)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every earlier ticket becomes stale
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket != 0 && ticket == self.latest
    }

    /// Drop interest in whatever is still in flight
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let mut seq = RequestSequence::new();
        let first = seq.begin();
        let second = seq.begin();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_out_of_order_arrival() {
        let mut seq = RequestSequence::new();
        let slow = seq.begin();
        let fast = seq.begin();
        // fast response lands first, then the slow one
        assert!(seq.is_current(fast));
        assert!(!seq.is_current(slow));
    }

    #[test]
    fn test_invalidate_discards_in_flight() {
        let mut seq = RequestSequence::new();
        let ticket = seq.begin();
        seq.invalidate();
        assert!(!seq.is_current(ticket));
        let next = seq.begin();
        assert!(seq.is_current(next));
    }

    #[test]
    fn test_zero_is_never_current() {
        let seq = RequestSequence::new();
        assert!(!seq.is_current(0));
    }
}

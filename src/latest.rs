use std::sync::atomic::{AtomicU64, Ordering};

/// Last-request-wins guard for one logical operation.
///
/// Every new request takes a ticket; a response is only applied if its ticket is still
/// the newest one handed out.
#[derive(Debug, Default)]
pub struct LatestRequest {
    issued: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.issued.load(Ordering::Acquire) == ticket.0
    }
}

// src/core/call_budget.rs — Oracle call budget management

/// Tracks oracle calls against a run's budget. The gateway never enforces
/// this; engines check `can_afford` before every call they issue.
#[derive(Debug, Clone)]
pub struct CallBudget {
    pub total: u32,
    pub spent: u32,
}

impl CallBudget {
    pub fn new(total: u32) -> Self {
        Self { total, spent: 0 }
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.spent)
    }

    /// Record one oracle call, successful or not.
    pub fn deduct(&mut self) {
        self.spent += 1;
    }

    pub fn can_afford(&self, calls: u32) -> bool {
        self.remaining() >= calls
    }

    pub fn is_exhausted(&self) -> bool {
        self.spent >= self.total
    }

    pub fn spent(&self) -> u32 {
        self.spent
    }
}

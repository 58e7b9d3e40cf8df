use serde::{Deserialize, Serialize};

/// Position on the strike ladder. Only moves forward, except through an
/// explicit reset back to `Active { strikes: 0 }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LedgerState {
    Active { strikes: u32 },
    Terminated,
}

impl Default for LedgerState {
    fn default() -> Self {
        LedgerState::Active { strikes: 0 }
    }
}

impl LedgerState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, LedgerState::Terminated)
    }

    /// State after one more accepted violation.
    pub fn advance(self, max_strikes: u32) -> Self {
        match self {
            LedgerState::Active { strikes } if strikes + 1 < max_strikes => LedgerState::Active {
                strikes: strikes + 1,
            },
            _ => LedgerState::Terminated,
        }
    }
}

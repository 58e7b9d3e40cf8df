pub mod state;
pub mod strikes;

pub use state::LedgerState;
pub use strikes::{LedgerSnapshot, StrikeLedger, TerminationCallback};

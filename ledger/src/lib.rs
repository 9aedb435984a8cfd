mod execution;
mod ledger;
mod payout;
mod state;

pub use {
  execution::{execute, Error, Execution},
  ledger::CampaignLedger,
  payout::{Balances, Payout, PayoutError},
  state::{InMemoryStateStore, Overlay, State, StateDiff},
};

use {
  crowdfund_ledger::{CampaignLedger, Payout, State},
  crowdfund_primitives::{Block, Timestamp, ToBase58String, Transaction},
  tracing::warn,
};

#[derive(Debug, Default)]
pub struct Mempool {
  txs: Vec<Transaction>,
}

impl Mempool {
  /// Queues a transaction for the next block.
  ///
  /// Returns false if an identical transaction is already waiting.
  pub fn consume(&mut self, tx: Transaction) -> bool {
    if self.txs.iter().any(|t| t.hash() == tx.hash()) {
      return false;
    }
    self.txs.push(tx);
    true
  }

  pub fn len(&self) -> usize {
    self.txs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.txs.is_empty()
  }

  /// Executes all queued transactions one after another in arrival
  /// order, all at the same clock reading, and packs the accepted
  /// ones into a block on top of `parent`.
  ///
  /// Rejected transactions are dropped.
  pub fn produce<S: State>(
    &mut self,
    ledger: &mut CampaignLedger<S>,
    payout: &mut impl Payout,
    parent: &Block,
    timestamp: Timestamp,
  ) -> Block {
    let mut accepted = vec![];
    let mut events = vec![];

    for tx in std::mem::take(&mut self.txs) {
      match ledger.submit(&tx, timestamp, payout) {
        Ok(emitted) => {
          events.extend(emitted);
          accepted.push(tx);
        }
        Err(e) => warn!("dropping transaction {}: {e}", tx.hash().to_b58()),
      }
    }

    Block::new(parent, timestamp, accepted, events)
  }
}

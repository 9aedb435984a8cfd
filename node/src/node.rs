use {
  crate::mempool::Mempool,
  crowdfund_ledger::{Balances, CampaignLedger, Payout, PayoutError, State},
  crowdfund_primitives::{
    Address,
    Amount,
    AuthError,
    Block,
    Timestamp,
    ToBase58String,
    Transaction,
  },
  thiserror::Error,
  tracing::info,
};

#[derive(Debug, Error)]
pub enum Rejection {
  #[error("unauthenticated transaction: {0}")]
  Unauthenticated(#[from] AuthError),

  #[error("transaction {0} is already pending")]
  Duplicate(String),
}

/// Payout destination whose balances can be queried.
pub trait Treasury: Payout + Send {
  fn balance_of(&self, address: &Address) -> Result<Amount, PayoutError>;
}

impl Treasury for Balances {
  fn balance_of(&self, address: &Address) -> Result<Amount, PayoutError> {
    Ok(Balances::balance_of(self, address))
  }
}

pub type Store = Box<dyn State + Send>;

/// Everything a running node mutates.
///
/// The node keeps all of it behind one lock, so RPC reads, transaction
/// submissions and block production never interleave.
pub struct Node {
  ledger: CampaignLedger<Store>,
  treasury: Box<dyn Treasury>,
  mempool: Mempool,
  head: Block,
}

impl Node {
  pub fn new(store: Store, treasury: Box<dyn Treasury>) -> Self {
    Self {
      ledger: CampaignLedger::new(store),
      treasury,
      mempool: Mempool::default(),
      head: Block::zero(),
    }
  }

  pub fn ledger(&self) -> &CampaignLedger<Store> {
    &self.ledger
  }

  pub fn head(&self) -> &Block {
    &self.head
  }

  pub fn balance_of(&self, address: &Address) -> Result<Amount, PayoutError> {
    self.treasury.balance_of(address)
  }

  /// Queues a transaction for the next block.
  ///
  /// Only transactions signed by their caller are accepted, so the
  /// caller identity the ledger sees is always authenticated.
  pub fn enqueue(&mut self, tx: Transaction) -> Result<(), Rejection> {
    tx.verify()?;
    let hash = tx.hash().to_b58();
    if !self.mempool.consume(tx) {
      return Err(Rejection::Duplicate(hash));
    }
    Ok(())
  }

  /// Produces a block out of all pending transactions, if there are any.
  pub fn produce(&mut self, timestamp: Timestamp) -> Option<&Block> {
    if self.mempool.is_empty() {
      return None;
    }

    let pending = self.mempool.len();
    let block = self.mempool.produce(
      &mut self.ledger,
      &mut self.treasury,
      &self.head,
      timestamp,
    );

    info!(
      "produced block {} at height {} with {} of {} transactions and {} events",
      block.hash().to_b58(),
      block.height,
      block.transactions.len(),
      pending,
      block.events.len()
    );

    self.head = block;
    Some(&self.head)
  }
}

#[cfg(test)]
mod tests {
  use {
    super::{Node, Rejection},
    crowdfund_ledger::{Balances, InMemoryStateStore},
    crowdfund_primitives::{Address, Call, Transaction},
    ed25519_dalek::Keypair,
  };

  fn node() -> Node {
    Node::new(
      Box::new(InMemoryStateStore::default()),
      Box::new(Balances::default()),
    )
  }

  #[test]
  fn blocks_only_when_transactions_are_pending() -> anyhow::Result<()> {
    let creator = Keypair::generate(&mut rand::thread_rng());
    let backer = Keypair::generate(&mut rand::thread_rng());
    let mut node = node();

    assert!(node.produce(10).is_none());
    assert_eq!(node.head().height, 0);

    let create = Transaction::signed(&creator, 0, 0, Call::CreateCampaign {
      goal: 3,
      deadline: 20,
    });
    node.enqueue(create.clone())?;
    assert!(matches!(node.enqueue(create), Err(Rejection::Duplicate(_))));
    node.enqueue(Transaction::signed(&backer, 3, 0, Call::Contribute {
      campaign: 1,
    }))?;

    let height = node.produce(10).map(|b| b.height);
    assert_eq!(height, Some(1));
    assert!(node.ledger().is_goal_met(1));

    node.enqueue(Transaction::signed(&creator, 0, 1, Call::WithdrawFunds {
      campaign: 1,
    }))?;
    node.produce(20);
    assert_eq!(node.head().height, 2);
    assert_eq!(node.balance_of(&creator.public.into()), Ok(3));
    assert_eq!(node.ledger().campaign(1).funds_raised, 0);
    Ok(())
  }

  #[test]
  fn callers_must_sign_their_transactions() -> anyhow::Result<()> {
    let creator = Keypair::generate(&mut rand::thread_rng());
    let mallory = Keypair::generate(&mut rand::thread_rng());
    let owner = Address::from(creator.public);
    let mut node = node();

    node.enqueue(Transaction::signed(&creator, 0, 0, Call::CreateCampaign {
      goal: 3,
      deadline: 20,
    }))?;
    node.produce(10);

    // claiming the creator's identity without their key
    let unsigned = Transaction::new(owner, 0, Call::CancelCampaign {
      campaign: 1,
    });
    assert!(matches!(
      node.enqueue(unsigned.clone()),
      Err(Rejection::Unauthenticated(_))
    ));

    let mut forged = unsigned;
    forged.signature = Transaction::signed(&mallory, 0, 0, Call::CancelCampaign {
      campaign: 1,
    })
    .signature;
    assert!(matches!(
      node.enqueue(forged),
      Err(Rejection::Unauthenticated(_))
    ));

    assert!(node.produce(11).is_none());
    assert_eq!(node.ledger().campaign(1).creator, owner);
    Ok(())
  }
}

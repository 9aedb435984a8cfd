use {
  crate::{b58::ToBase58String, Event, Timestamp, Transaction},
  multihash::{Hasher, Multihash, MultihashDigest, Sha3_256},
  once_cell::sync::OnceCell,
  serde::{Deserialize, Serialize},
};

/// A batch of transactions executed in order at one clock reading.
///
/// Only transactions that were accepted by the ledger end up in a block,
/// together with the events their execution produced.
#[derive(Clone, Serialize, Deserialize)]
pub struct Block {
  pub height: u64,
  pub parent: Multihash,
  pub timestamp: Timestamp,
  pub transactions: Vec<Transaction>,
  pub events: Vec<Event>,

  #[serde(skip)]
  hash_cache: OnceCell<Multihash>,
}

impl Block {
  pub fn new(
    parent: &Block,
    timestamp: Timestamp,
    transactions: Vec<Transaction>,
    events: Vec<Event>,
  ) -> Self {
    Self {
      height: parent.height + 1,
      parent: *parent.hash(),
      timestamp,
      transactions,
      events,
      hash_cache: OnceCell::new(),
    }
  }

  pub fn zero() -> Self {
    Self {
      height: 0,
      parent: Multihash::default(),
      timestamp: 0,
      transactions: vec![],
      events: vec![],
      hash_cache: OnceCell::new(),
    }
  }

  pub fn hash(&self) -> &Multihash {
    self.hash_cache.get_or_init(|| {
      let mut hasher = Sha3_256::default();
      hasher.update(&rmp_serde::to_vec(self).unwrap());
      multihash::Code::Sha3_256.wrap(hasher.finalize()).unwrap()
    })
  }
}

impl std::fmt::Debug for Block {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Block")
      .field("height", &self.height)
      .field("parent", &self.parent.to_b58())
      .field("hash", &self.hash().to_b58())
      .field("timestamp", &self.timestamp)
      .field("transactions", &self.transactions)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use {
    super::Block,
    crate::{Address, Call, Transaction},
  };

  #[test]
  fn blocks_chain_by_parent_hash() {
    let genesis = Block::zero();
    let tx = Transaction::new(Address::new([3; 32]), 0, Call::CancelCampaign {
      campaign: 1,
    });

    let first = Block::new(&genesis, 10, vec![tx.clone()], vec![]);
    let second = Block::new(&first, 20, vec![tx], vec![]);

    assert_eq!(first.height, 1);
    assert_eq!(second.height, 2);
    assert_eq!(first.parent, *genesis.hash());
    assert_eq!(second.parent, *first.hash());
    assert_ne!(first.hash(), second.hash());
  }
}

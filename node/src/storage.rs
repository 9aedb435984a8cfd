use {
  crate::node::Treasury,
  crowdfund_ledger::{Payout, PayoutError, State, StateDiff},
  crowdfund_primitives::{Address, Amount, Campaign, CampaignId},
  once_cell::sync::OnceCell,
  parking_lot::Mutex,
  rmp_serde::{from_slice, to_vec},
  sled::{
    transaction::{ConflictableTransactionError, TransactionResult},
    Transactional,
  },
  std::{collections::BTreeMap, path::Path, sync::Arc},
};

/// Key under which the id sequence is stored. Campaign keys are
/// always 8 bytes long so it never collides with one.
const SEQUENCE_KEY: &[u8] = b"sequence";

/// New balances produced by payouts that are not on disk yet.
type Staged = Arc<Mutex<BTreeMap<Address, Amount>>>;

pub fn open_db(path: &Path) -> Result<&'static sled::Db, sled::Error> {
  static DB: OnceCell<sled::Db> = OnceCell::new();
  DB.get_or_try_init(|| sled::open(path))
}

/// Opens the campaign table and the payout balances of a database.
///
/// Both share one staging area: a payout only stages the new balance
/// of its recipient, and the staged balances are written in the same
/// sled transaction as the next campaign diff. A withdrawal therefore
/// lands on disk completely or not at all.
pub fn open(
  db: &sled::Db,
) -> Result<(OnDiskStateStore, OnDiskBalances), sled::Error> {
  let campaigns = db.open_tree("campaigns")?;
  let balances = db.open_tree("balances")?;
  let staged = Staged::default();
  Ok((
    OnDiskStateStore {
      campaigns,
      balances: balances.clone(),
      staged: Arc::clone(&staged),
    },
    OnDiskBalances {
      tree: balances,
      staged,
    },
  ))
}

pub struct OnDiskStateStore {
  campaigns: sled::Tree,
  balances: sled::Tree,
  staged: Staged,
}

impl State for OnDiskStateStore {
  fn get(&self, id: &CampaignId) -> Option<Campaign> {
    match self.campaigns.get(id.to_be_bytes()).expect("db io error") {
      Some(bytes) => Some(from_slice(&bytes).expect("db corrupt")),
      None => None,
    }
  }

  fn last_id(&self) -> CampaignId {
    match self.campaigns.get(SEQUENCE_KEY).expect("db io error") {
      Some(bytes) => from_slice(&bytes).expect("db corrupt"),
      None => 0,
    }
  }

  fn apply(&mut self, diff: StateDiff) {
    let sequence = diff.sequence().map(|id| self.last_id().max(id));
    let staged = std::mem::take(&mut *self.staged.lock());

    let result: TransactionResult<(), ()> = (&self.campaigns, &self.balances)
      .transaction(|(campaigns, balances)| {
        if let Some(last) = sequence {
          let bytes = to_vec(&last).expect("serialization failed");
          campaigns.insert(SEQUENCE_KEY, bytes)?;
        }
        for (id, item) in diff.iter() {
          let key = id.to_be_bytes();
          match item {
            Some(campaign) => {
              let bytes = to_vec(campaign).expect("serialization failed");
              campaigns.insert(&key[..], bytes)?;
            }
            None => {
              campaigns.remove(&key[..])?;
            }
          }
        }
        for (address, balance) in &staged {
          balances.insert(&address[..], &balance.to_be_bytes()[..])?;
        }
        Ok::<_, ConflictableTransactionError<()>>(())
      });

    result.expect("db error");
    self.campaigns.flush().expect("db tree flush failed");
  }
}

/// Balances credited by payouts, persisted in a sled tree.
pub struct OnDiskBalances {
  tree: sled::Tree,
  staged: Staged,
}

impl OnDiskBalances {
  fn read(&self, address: &Address) -> Result<Amount, PayoutError> {
    if let Some(balance) = self.staged.lock().get(address) {
      return Ok(*balance);
    }

    let stored = self
      .tree
      .get(address)
      .map_err(|e| PayoutError::Storage(e.to_string()))?;

    match stored {
      Some(bytes) => <[u8; 16]>::try_from(&*bytes)
        .map(Amount::from_be_bytes)
        .map_err(|_| {
          PayoutError::Storage(format!("corrupt balance record of {address}"))
        }),
      None => Ok(0),
    }
  }
}

impl Payout for OnDiskBalances {
  fn transfer(
    &mut self,
    _view: &dyn State,
    to: &Address,
    amount: Amount,
  ) -> Result<(), PayoutError> {
    let balance = self
      .read(to)?
      .checked_add(amount)
      .ok_or(PayoutError::Overflow(*to))?;
    self.staged.lock().insert(*to, balance);
    Ok(())
  }
}

impl Treasury for OnDiskBalances {
  fn balance_of(&self, address: &Address) -> Result<Amount, PayoutError> {
    self.read(address)
  }
}

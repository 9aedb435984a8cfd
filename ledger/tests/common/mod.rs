use {
  crowdfund_ledger::{Balances, CampaignLedger, Payout},
  crowdfund_primitives::{Address, Amount, CampaignId, Envelope, Timestamp},
  ed25519_dalek::Keypair,
};

/// Clock reading every test scenario starts at.
pub const GENESIS: Timestamp = 1_672_531_200;

pub const HOUR: u64 = 3600;

/// One whole currency unit expressed in base units.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// A fresh wallet identity.
pub fn identity() -> Address {
  Keypair::generate(&mut rand::thread_rng()).public.into()
}

pub fn at(caller: Address, timestamp: Timestamp) -> Envelope {
  Envelope::new(caller, 0, timestamp)
}

pub fn paying(caller: Address, value: Amount, timestamp: Timestamp) -> Envelope {
  Envelope::new(caller, value, timestamp)
}

/// A ledger with one campaign opened at [`GENESIS`] by `creator`,
/// running for an hour with the given goal.
pub struct Fixture {
  pub ledger: CampaignLedger,
  pub balances: Balances,
  pub creator: Address,
  pub campaign: CampaignId,
  pub deadline: Timestamp,
}

impl Fixture {
  pub fn new(goal: Amount) -> anyhow::Result<Self> {
    let creator = identity();
    let deadline = GENESIS + HOUR;
    let mut ledger = CampaignLedger::in_memory();
    let campaign = ledger.create_campaign(&at(creator, GENESIS), goal, deadline)?;
    Ok(Self {
      ledger,
      balances: Balances::default(),
      creator,
      campaign,
      deadline,
    })
  }

  /// Contributes `amount` from `contributor` one second after opening.
  pub fn contribute(
    &mut self,
    contributor: Address,
    amount: Amount,
  ) -> Result<(), crowdfund_ledger::Error> {
    self.ledger.contribute(
      &paying(contributor, amount, GENESIS + 1),
      self.campaign,
    )
  }

  /// Creator withdrawal one second past the deadline.
  pub fn withdraw(&mut self) -> Result<Amount, crowdfund_ledger::Error> {
    self.ledger.withdraw_funds(
      &at(self.creator, self.deadline + 1),
      self.campaign,
      &mut self.balances,
    )
  }

  /// Same as [`Fixture::withdraw`] but paying out through `payout`.
  pub fn withdraw_with(
    &mut self,
    payout: &mut impl Payout,
  ) -> Result<Amount, crowdfund_ledger::Error> {
    self.ledger.withdraw_funds(
      &at(self.creator, self.deadline + 1),
      self.campaign,
      payout,
    )
  }
}

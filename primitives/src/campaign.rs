use {
  crate::Address,
  serde::{Deserialize, Serialize},
  std::collections::BTreeMap,
};

/// Amount of the base monetary unit.
pub type Amount = u128;

/// Seconds since unix epoch.
pub type Timestamp = u64;

/// Identifier of a campaign.
///
/// Ids are handed out by the ledger sequence starting at 1 and are never
/// reused, even after the campaign they were assigned to is cancelled.
pub type CampaignId = u64;

/// A single time-boxed fundraising record.
///
/// The default value of this type is what queries report for an id that
/// has no record, either because it was never created or because it was
/// cancelled: null creator, zero goal, zero deadline, nothing raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
  /// Identity that opened the campaign. It is the only party allowed to
  /// withdraw raised funds or cancel the campaign.
  pub creator: Address,

  /// Target amount, always greater than zero for a stored campaign.
  pub goal: Amount,

  /// Contributions are accepted strictly before this moment, withdrawals
  /// are accepted at or after it.
  pub deadline: Timestamp,

  /// Total amount received. Zeroed once the creator withdraws it.
  pub funds_raised: Amount,

  /// Cumulative amount contributed by each contributor.
  pub contributions: BTreeMap<Address, Amount>,
}

impl Campaign {
  pub fn new(creator: Address, goal: Amount, deadline: Timestamp) -> Self {
    Self {
      creator,
      goal,
      deadline,
      funds_raised: 0,
      contributions: BTreeMap::new(),
    }
  }

  /// Amount contributed so far by a given contributor.
  pub fn contribution_of(&self, contributor: &Address) -> Amount {
    self.contributions.get(contributor).copied().unwrap_or(0)
  }

  pub fn is_goal_met(&self) -> bool {
    self.funds_raised >= self.goal
  }

  /// True once the clock reached the deadline.
  pub fn is_finished(&self, now: Timestamp) -> bool {
    now >= self.deadline
  }
}

/// Lifecycle stage of a campaign as observed at a given moment.
///
/// Stages past the deadline are derived from the clock, there is no
/// scheduled transition that moves a campaign between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
  /// Before the deadline, accepting contributions.
  Active,

  /// Past the deadline with the goal met, waiting for the creator
  /// to withdraw.
  GoalMet,

  /// Past the deadline without reaching the goal. Terminal, contributed
  /// funds stay locked.
  Expired,

  /// Past the deadline, goal was met and funds were paid out to the
  /// creator.
  Withdrawn,

  /// No record under this id, never created or cancelled.
  Unknown,
}

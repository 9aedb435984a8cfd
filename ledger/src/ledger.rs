use {
  crate::{
    execution::{self, Error, Execution},
    InMemoryStateStore,
    Payout,
    State,
  },
  crowdfund_primitives::{
    Address,
    Amount,
    Campaign,
    CampaignId,
    CampaignStatus,
    Envelope,
    Event,
    Timestamp,
    Transaction,
  },
  tracing::info,
};

/// Owns the campaign table and is the single mutation path into it.
///
/// Every mutating operation takes `&mut self`, which serializes them:
/// no two operations interleave, and each one either applies all of
/// its changes or none of them.
#[derive(Debug, Default)]
pub struct CampaignLedger<S: State = InMemoryStateStore> {
  state: S,
}

impl CampaignLedger {
  /// A ledger over a fresh, empty, in-memory campaign table.
  pub fn in_memory() -> Self {
    Self::default()
  }
}

impl<S: State> CampaignLedger<S> {
  pub fn new(state: S) -> Self {
    Self { state }
  }

  pub fn state(&self) -> &S {
    &self.state
  }

  pub fn into_state(self) -> S {
    self.state
  }

  /// Executes a transaction at the given clock reading and commits it.
  pub fn submit(
    &mut self,
    tx: &Transaction,
    timestamp: Timestamp,
    payout: &mut impl Payout,
  ) -> Result<Vec<Event>, Error> {
    let execution = execution::execute(tx, timestamp, &self.state, payout)?;
    Ok(self.commit(execution))
  }

  /// Opens a new campaign owned by the caller and returns its id.
  pub fn create_campaign(
    &mut self,
    env: &Envelope,
    goal: Amount,
    deadline: Timestamp,
  ) -> Result<CampaignId, Error> {
    let (execution, id) =
      execution::create_campaign(env, goal, deadline, &self.state)?;
    self.commit(execution);
    Ok(id)
  }

  /// Credits the envelope value to a campaign on behalf of the caller.
  pub fn contribute(
    &mut self,
    env: &Envelope,
    id: CampaignId,
  ) -> Result<(), Error> {
    let execution = execution::contribute(env, id, &self.state)?;
    self.commit(execution);
    Ok(())
  }

  /// Pays everything raised by a campaign out to its creator and
  /// returns the amount paid.
  pub fn withdraw_funds(
    &mut self,
    env: &Envelope,
    id: CampaignId,
    payout: &mut impl Payout,
  ) -> Result<Amount, Error> {
    let (execution, amount) =
      execution::withdraw_funds(env, id, &self.state, payout)?;
    self.commit(execution);
    Ok(amount)
  }

  /// Erases a campaign that never received funds.
  pub fn cancel_campaign(
    &mut self,
    env: &Envelope,
    id: CampaignId,
  ) -> Result<(), Error> {
    let execution = execution::cancel_campaign(env, id, &self.state)?;
    self.commit(execution);
    Ok(())
  }

  /// The campaign record, or the default record for unknown ids.
  pub fn campaign(&self, id: CampaignId) -> Campaign {
    self.state.get(&id).unwrap_or_default()
  }

  pub fn get_contribution(
    &self,
    id: CampaignId,
    contributor: &Address,
  ) -> Amount {
    self
      .state
      .get(&id)
      .map(|c| c.contribution_of(contributor))
      .unwrap_or(0)
  }

  /// False for unknown ids, so it does not tell whether a
  /// campaign exists.
  pub fn is_goal_met(&self, id: CampaignId) -> bool {
    self
      .state
      .get(&id)
      .map(|c| c.is_goal_met())
      .unwrap_or(false)
  }

  pub fn status(&self, id: CampaignId, now: Timestamp) -> CampaignStatus {
    match self.state.get(&id) {
      None => CampaignStatus::Unknown,
      Some(c) if !c.is_finished(now) => CampaignStatus::Active,
      // only a payout drains a campaign that received contributions
      Some(c) if c.funds_raised == 0 && !c.contributions.is_empty() => {
        CampaignStatus::Withdrawn
      }
      Some(c) if c.is_goal_met() => CampaignStatus::GoalMet,
      Some(_) => CampaignStatus::Expired,
    }
  }

  /// The highest campaign id handed out so far.
  pub fn last_id(&self) -> CampaignId {
    self.state.last_id()
  }

  fn commit(&mut self, execution: Execution) -> Vec<Event> {
    self.state.apply(execution.diff);
    for event in &execution.events {
      info!("{event:?}");
    }
    execution.events
  }
}

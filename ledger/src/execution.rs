use {
  crate::{Overlay, Payout, PayoutError, State, StateDiff},
  crowdfund_primitives::{
    Amount,
    Call,
    Campaign,
    CampaignId,
    Envelope,
    Event,
    Timestamp,
    Transaction,
  },
  thiserror::Error,
  tracing::debug,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Goal must be greater than zero.")]
  InvalidGoal,

  #[error("Deadline must be in the future.")]
  InvalidDeadline,

  #[error("Campaign {0} does not exist.")]
  UnknownCampaign(CampaignId),

  #[error("Campaign has finished.")]
  CampaignFinished,

  #[error("Contribution must be greater than zero.")]
  ZeroContribution,

  #[error("Only the creator can perform this action.")]
  OnlyCreator,

  #[error("Campaign has not finished yet.")]
  CampaignNotFinished,

  #[error("Funding goal has not been met.")]
  GoalNotMet,

  #[error("Cannot cancel campaigns with funds raised.")]
  FundsAlreadyRaised,

  #[error("Transfer failed: {0}")]
  TransferFailed(#[from] PayoutError),

  #[error("Amount overflow.")]
  Overflow,
}

/// Outcome of a successful execution.
///
/// Nothing has been written to state yet, the caller decides
/// whether to apply `diff`.
#[derive(Debug, Clone, Default)]
pub struct Execution {
  pub diff: StateDiff,
  pub events: Vec<Event>,
}

impl Execution {
  fn single(diff: StateDiff, event: Event) -> Self {
    Self {
      diff,
      events: vec![event],
    }
  }

  /// Id of the campaign opened by this execution, if any.
  pub fn created(&self) -> Option<CampaignId> {
    self.events.iter().find_map(|e| match e {
      Event::CampaignCreated { id, .. } => Some(*id),
      _ => None,
    })
  }
}

/// Executes a transaction
///
/// The call is evaluated against a read-only view of `state` with
/// `timestamp` as the current clock reading. On success the returned
/// statediff holds every change the call makes and can be applied to
/// the state it was computed against. On failure nothing needs undoing,
/// no state was written.
pub fn execute<S: State + ?Sized>(
  tx: &Transaction,
  timestamp: Timestamp,
  state: &S,
  payout: &mut impl Payout,
) -> Result<Execution, Error> {
  let env = tx.envelope(timestamp);
  let result = match tx.call {
    Call::CreateCampaign { goal, deadline } => {
      create_campaign(&env, goal, deadline, state).map(|(e, _)| e)
    }
    Call::Contribute { campaign } => contribute(&env, campaign, state),
    Call::WithdrawFunds { campaign } => {
      withdraw_funds(&env, campaign, state, payout).map(|(e, _)| e)
    }
    Call::CancelCampaign { campaign } => {
      cancel_campaign(&env, campaign, state)
    }
  };

  if let Err(ref e) = result {
    debug!("rejected {:?} from {}: {}", tx.call, tx.caller, e);
  }

  result
}

/// Also returns the id assigned to the new campaign.
pub(crate) fn create_campaign<S: State + ?Sized>(
  env: &Envelope,
  goal: Amount,
  deadline: Timestamp,
  state: &S,
) -> Result<(Execution, CampaignId), Error> {
  if goal == 0 {
    return Err(Error::InvalidGoal);
  }

  if deadline <= env.timestamp {
    return Err(Error::InvalidDeadline);
  }

  let id = state.last_id().checked_add(1).ok_or(Error::Overflow)?;

  let mut diff = StateDiff::default();
  diff.set(id, Campaign::new(env.caller, goal, deadline));
  diff.advance_sequence(id);

  let execution = Execution::single(diff, Event::CampaignCreated {
    id,
    creator: env.caller,
    goal,
    deadline,
  });
  Ok((execution, id))
}

pub(crate) fn contribute<S: State + ?Sized>(
  env: &Envelope,
  id: CampaignId,
  state: &S,
) -> Result<Execution, Error> {
  let mut campaign = state.get(&id).ok_or(Error::UnknownCampaign(id))?;

  if campaign.is_finished(env.timestamp) {
    return Err(Error::CampaignFinished);
  }

  if env.value == 0 {
    return Err(Error::ZeroContribution);
  }

  // both sums are computed before either is stored,
  // so an overflow in one leaves the record as it was.
  let funds_raised = campaign
    .funds_raised
    .checked_add(env.value)
    .ok_or(Error::Overflow)?;
  let own = campaign
    .contribution_of(&env.caller)
    .checked_add(env.value)
    .ok_or(Error::Overflow)?;

  campaign.funds_raised = funds_raised;
  campaign.contributions.insert(env.caller, own);

  let mut diff = StateDiff::default();
  diff.set(id, campaign);

  Ok(Execution::single(diff, Event::ContributionReceived {
    id,
    contributor: env.caller,
    amount: env.value,
  }))
}

/// Also returns the amount paid out.
pub(crate) fn withdraw_funds<S: State + ?Sized>(
  env: &Envelope,
  id: CampaignId,
  state: &S,
  payout: &mut impl Payout,
) -> Result<(Execution, Amount), Error> {
  let record = state.get(&id);
  ensure_creator(record.as_ref(), env)?;
  let mut campaign = record.ok_or(Error::UnknownCampaign(id))?;

  if !campaign.is_finished(env.timestamp) {
    return Err(Error::CampaignNotFinished);
  }

  if !campaign.is_goal_met() {
    return Err(Error::GoalNotMet);
  }

  let amount = campaign.funds_raised;
  let creator = campaign.creator;
  campaign.funds_raised = 0;

  // drain the campaign before handing control to the payout, so that
  // any ledger access made while the transfer is in flight sees the
  // campaign already empty.
  let mut pending = Overlay::new(state);
  let mut drain = StateDiff::default();
  drain.set(id, campaign);
  pending.apply(drain);

  payout.transfer(&pending, &creator, amount)?;

  let execution =
    Execution::single(pending.into_diff(), Event::FundsWithdrawn {
      id,
      creator,
      amount,
    });
  Ok((execution, amount))
}

pub(crate) fn cancel_campaign<S: State + ?Sized>(
  env: &Envelope,
  id: CampaignId,
  state: &S,
) -> Result<Execution, Error> {
  let record = state.get(&id);
  ensure_creator(record.as_ref(), env)?;
  let campaign = record.ok_or(Error::UnknownCampaign(id))?;

  if campaign.funds_raised != 0 {
    return Err(Error::FundsAlreadyRaised);
  }

  let mut diff = StateDiff::default();
  diff.remove(id);

  Ok(Execution::single(diff, Event::CampaignCancelled { id }))
}

/// Unknown ids report the null creator, so for any real
/// caller the creator check is what rejects them.
fn ensure_creator(
  campaign: Option<&Campaign>,
  env: &Envelope,
) -> Result<(), Error> {
  let creator = campaign.map(|c| c.creator).unwrap_or_default();
  if creator != env.caller {
    return Err(Error::OnlyCreator);
  }
  Ok(())
}

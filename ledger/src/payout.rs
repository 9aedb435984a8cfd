use {
  crate::State,
  crowdfund_primitives::{Address, Amount},
  std::collections::{HashMap, HashSet},
  thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoutError {
  #[error("recipient {0} does not accept incoming funds")]
  Rejected(Address),

  #[error("balance of {0} would overflow")]
  Overflow(Address),

  #[error("payout storage error: {0}")]
  Storage(String),
}

/// Outbound value transfer used to pay raised funds out to a creator.
///
/// The transfer may hand control to arbitrary receiving logic. That logic
/// gets to see the ledger state through `view`, which already has the
/// paying campaign drained, so anything it does against the ledger
/// observes a zero balance.
///
/// Implementations must either complete the transfer in full or return
/// an error without having moved any value. On error the ledger discards
/// every change made by the withdrawal.
pub trait Payout {
  fn transfer(
    &mut self,
    view: &dyn State,
    to: &Address,
    amount: Amount,
  ) -> Result<(), PayoutError>;
}

impl<P: Payout + ?Sized> Payout for &mut P {
  fn transfer(
    &mut self,
    view: &dyn State,
    to: &Address,
    amount: Amount,
  ) -> Result<(), PayoutError> {
    (**self).transfer(view, to, amount)
  }
}

impl<P: Payout + ?Sized> Payout for Box<P> {
  fn transfer(
    &mut self,
    view: &dyn State,
    to: &Address,
    amount: Amount,
  ) -> Result<(), PayoutError> {
    (**self).transfer(view, to, amount)
  }
}

/// In-memory account balances credited by payouts.
#[derive(Debug, Default)]
pub struct Balances {
  balances: HashMap<Address, Amount>,
  rejecting: HashSet<Address>,
}

impl Balances {
  pub fn balance_of(&self, address: &Address) -> Amount {
    self.balances.get(address).copied().unwrap_or(0)
  }

  /// Makes all future transfers to this address fail.
  pub fn reject(&mut self, address: Address) {
    self.rejecting.insert(address);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Address, &Amount)> {
    self.balances.iter()
  }
}

impl Payout for Balances {
  fn transfer(
    &mut self,
    _view: &dyn State,
    to: &Address,
    amount: Amount,
  ) -> Result<(), PayoutError> {
    if self.rejecting.contains(to) {
      return Err(PayoutError::Rejected(*to));
    }

    let balance = self.balances.entry(*to).or_default();
    *balance = balance
      .checked_add(amount)
      .ok_or(PayoutError::Overflow(*to))?;
    Ok(())
  }
}

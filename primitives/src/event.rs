use {
  crate::{Address, Amount, CampaignId, Timestamp},
  serde::{Deserialize, Serialize},
};

/// Notifications emitted by committed ledger transitions.
///
/// Events are meant for external observers such as indexers and UIs,
/// the ledger itself never reads them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
  CampaignCreated {
    id: CampaignId,
    creator: Address,
    goal: Amount,
    deadline: Timestamp,
  },
  ContributionReceived {
    id: CampaignId,
    contributor: Address,
    amount: Amount,
  },
  FundsWithdrawn {
    id: CampaignId,
    creator: Address,
    amount: Amount,
  },
  CampaignCancelled {
    id: CampaignId,
  },
}

impl Event {
  /// The campaign this event is about.
  pub fn campaign(&self) -> CampaignId {
    match self {
      Event::CampaignCreated { id, .. }
      | Event::ContributionReceived { id, .. }
      | Event::FundsWithdrawn { id, .. }
      | Event::CampaignCancelled { id } => *id,
    }
  }
}

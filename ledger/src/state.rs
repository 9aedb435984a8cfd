use {
  crowdfund_primitives::{Campaign, CampaignId},
  serde::{Deserialize, Serialize},
  std::collections::{BTreeMap, BTreeSet, HashMap},
};

/// Represents a change to the campaign table.
///
/// Executing a transaction never mutates state directly, it produces a
/// statediff that is applied only when the whole execution succeeded.
/// Dropping a statediff is how a failed transaction rolls back.
///
/// Besides campaign records a statediff also carries the id sequence, so
/// allocating a campaign id is part of the same atomic change as storing
/// the campaign under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiff {
  upserts: BTreeMap<CampaignId, Campaign>,
  deletes: BTreeSet<CampaignId>,
  last_id: Option<CampaignId>,
}

impl StateDiff {
  /// Inserts or updates a campaign under a given id.
  ///
  /// If the state diff had a campaign stored under this id
  /// then the old value is returned, otherwise `None` is returned.
  pub fn set(&mut self, id: CampaignId, campaign: Campaign) -> Option<Campaign> {
    self.deletes.remove(&id);
    self.upserts.insert(id, campaign)
  }

  /// Removes a campaign under a given id.
  ///
  /// If the state diff contained a campaign under the given id
  /// then the removed value is returned, otherwise `None`.
  pub fn remove(&mut self, id: CampaignId) -> Option<Campaign> {
    self.deletes.insert(id);
    self.upserts.remove(&id)
  }

  /// Records that ids up to and including `id` have been handed out.
  pub fn advance_sequence(&mut self, id: CampaignId) {
    self.last_id = Some(self.last_id.map_or(id, |last| last.max(id)));
  }

  /// Highest id allocated by this diff, if it allocated any.
  pub fn sequence(&self) -> Option<CampaignId> {
    self.last_id
  }

  pub fn is_deleted(&self, id: &CampaignId) -> bool {
    self.deletes.contains(id)
  }

  pub fn is_empty(&self) -> bool {
    self.upserts.is_empty() && self.deletes.is_empty() && self.last_id.is_none()
  }

  /// Merges a state diff with a newer diff.
  ///
  /// Applying the resulting diff is equivalent to
  /// applying the two merged diffs consecutively on
  /// any state store.
  pub fn merge(self, newer: StateDiff) -> StateDiff {
    let mut upserts = self.upserts;
    let mut deletes = self.deletes;
    for (id, campaign) in newer.upserts {
      deletes.remove(&id);
      upserts.insert(id, campaign);
    }
    for id in newer.deletes {
      upserts.remove(&id);
      deletes.insert(id);
    }
    let last_id = match (self.last_id, newer.last_id) {
      (Some(a), Some(b)) => Some(a.max(b)),
      (a, b) => a.or(b),
    };
    StateDiff {
      upserts,
      deletes,
      last_id,
    }
  }

  /// Iterate over all campaign changes in a state diff.
  ///
  /// There are two variants of changes:
  ///   1. (CampaignId, Campaign) => Means that the campaign under a given id
  ///      was created or changed its contents.
  ///   2. (CampaignId, None) => Means that the campaign under a given id was
  ///      deleted.
  pub fn iter(&self) -> impl Iterator<Item = (&CampaignId, Option<&Campaign>)> {
    self
      .upserts
      .iter()
      .map(|(id, c)| (id, Some(c)))
      .chain(self.deletes.iter().map(|id| (id, None)))
  }
}

impl State for StateDiff {
  fn get(&self, id: &CampaignId) -> Option<Campaign> {
    self.upserts.get(id).cloned()
  }

  fn last_id(&self) -> CampaignId {
    self.last_id.unwrap_or(0)
  }

  fn apply(&mut self, diff: StateDiff) {
    *self = std::mem::take(self).merge(diff);
  }
}

/// Key-value view of the campaign table.
pub trait State {
  fn get(&self, id: &CampaignId) -> Option<Campaign>;

  /// The highest campaign id ever allocated, 0 when none was.
  fn last_id(&self) -> CampaignId;

  fn apply(&mut self, diff: StateDiff);
}

impl<S: State + ?Sized> State for Box<S> {
  fn get(&self, id: &CampaignId) -> Option<Campaign> {
    (**self).get(id)
  }

  fn last_id(&self) -> CampaignId {
    (**self).last_id()
  }

  fn apply(&mut self, diff: StateDiff) {
    (**self).apply(diff)
  }
}

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
  data: HashMap<CampaignId, Campaign>,
  last_id: CampaignId,
}

impl InMemoryStateStore {
  pub fn iter(&self) -> impl Iterator<Item = (&CampaignId, &Campaign)> {
    self.data.iter()
  }
}

impl State for InMemoryStateStore {
  fn get(&self, id: &CampaignId) -> Option<Campaign> {
    self.data.get(id).cloned()
  }

  fn last_id(&self) -> CampaignId {
    self.last_id
  }

  fn apply(&mut self, diff: StateDiff) {
    if let Some(id) = diff.last_id {
      self.last_id = self.last_id.max(id);
    }

    for (k, v) in diff.upserts {
      self.data.insert(k, v);
    }

    for id in diff.deletes {
      self.data.remove(&id);
    }
  }
}

/// Speculative state layered over a read-only base.
///
/// Reads see the pending changes first and fall through to the base
/// for everything the pending diff does not touch. Applying a diff to
/// an overlay only grows the pending diff, the base is never written.
pub struct Overlay<'a, S: State + ?Sized> {
  base: &'a S,
  pending: StateDiff,
}

impl<'a, S: State + ?Sized> Overlay<'a, S> {
  pub fn new(base: &'a S) -> Self {
    Self {
      base,
      pending: StateDiff::default(),
    }
  }

  pub fn pending(&self) -> &StateDiff {
    &self.pending
  }

  pub fn into_diff(self) -> StateDiff {
    self.pending
  }
}

impl<S: State + ?Sized> State for Overlay<'_, S> {
  fn get(&self, id: &CampaignId) -> Option<Campaign> {
    if self.pending.is_deleted(id) {
      return None;
    }
    self.pending.get(id).or_else(|| self.base.get(id))
  }

  fn last_id(&self) -> CampaignId {
    self.base.last_id().max(self.pending.last_id())
  }

  fn apply(&mut self, diff: StateDiff) {
    self.pending.apply(diff);
  }
}

#[cfg(test)]
mod tests {
  use {
    crate::{InMemoryStateStore, Overlay, State, StateDiff},
    crowdfund_primitives::{Address, Campaign},
  };

  fn campaign(goal: u128) -> Campaign {
    Campaign::new(Address::new([9; 32]), goal, 1_000)
  }

  #[test]
  fn statediff_smoke() {
    let mut store = InMemoryStateStore::default();

    assert_eq!(store.iter().count(), 0);
    assert_eq!(store.last_id(), 0);

    let mut diff1 = StateDiff::default();
    diff1.set(1, campaign(10));
    diff1.set(2, campaign(20));
    diff1.advance_sequence(2);

    store.apply(diff1);

    assert_eq!(store.iter().count(), 2);
    assert_eq!(store.last_id(), 2);
    assert_eq!(store.get(&1).unwrap().goal, 10);
    assert_eq!(store.get(&2).unwrap().goal, 20);

    let mut diff2 = StateDiff::default();
    diff2.remove(1);

    store.apply(diff2);

    assert_eq!(store.iter().count(), 1);
    assert!(store.get(&1).is_none());

    // removing records never rewinds the sequence
    assert_eq!(store.last_id(), 2);
  }

  #[test]
  fn merge_is_consecutive_application() {
    let mut older = StateDiff::default();
    older.set(1, campaign(10));
    older.set(2, campaign(20));
    older.advance_sequence(2);

    let mut newer = StateDiff::default();
    newer.remove(1);
    newer.set(3, campaign(30));
    newer.advance_sequence(3);

    let mut sequential = InMemoryStateStore::default();
    sequential.apply(older.clone());
    sequential.apply(newer.clone());

    let mut merged = InMemoryStateStore::default();
    merged.apply(older.merge(newer));

    assert_eq!(merged.last_id(), sequential.last_id());
    for id in 1..=3 {
      assert_eq!(merged.get(&id), sequential.get(&id));
    }
    assert!(merged.get(&1).is_none());
  }

  #[test]
  fn overlay_shadows_base_without_writing_it() {
    let mut store = InMemoryStateStore::default();
    let mut genesis = StateDiff::default();
    genesis.set(1, campaign(10));
    genesis.set(2, campaign(20));
    genesis.advance_sequence(2);
    store.apply(genesis);

    let mut overlay = Overlay::new(&store);
    let mut change = StateDiff::default();
    let mut updated = campaign(10);
    updated.funds_raised = 5;
    change.set(1, updated);
    change.remove(2);
    change.advance_sequence(3);
    overlay.apply(change);

    assert_eq!(overlay.get(&1).unwrap().funds_raised, 5);
    assert!(overlay.get(&2).is_none());
    assert_eq!(overlay.last_id(), 3);

    // the base store is untouched until the diff is applied
    assert_eq!(store.get(&1).unwrap().funds_raised, 0);
    assert!(store.get(&2).is_some());
    assert_eq!(store.last_id(), 2);

    let diff = overlay.into_diff();
    store.apply(diff);
    assert_eq!(store.get(&1).unwrap().funds_raised, 5);
    assert!(store.get(&2).is_none());
    assert_eq!(store.last_id(), 3);
  }
}

use serde::Serialize;

use crate::error::BracketError;
use crate::topology::Topology;
use crate::types::{MatchId, Order, Outcome, Score, SlotRef, SlotSource, TeamEntry};

/// How an unresolved branch of the bracket will fill.
///
/// `End` only comes from an absent round-0 leaf and is folded into `Bye`
/// one level up; callers of [`Topology::empty_branch`] never see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BranchType {
  Tbd,
  Bye,
  End,
}

/// One side of a match.
#[derive(Clone, Debug)]
pub struct TeamSlot {
  pub source: SlotSource,
  pub name: TeamEntry,
  pub order: Order,
  pub seed: Option<usize>,
  pub score: Option<Score>,
  sibling: Option<SlotRef>,
}

impl TeamSlot {
  pub fn new(source: SlotSource, order: Order) -> Self {
    TeamSlot {
      source,
      name: None,
      order,
      seed: None,
      score: None,
      sibling: None,
    }
  }

  pub(crate) fn assign_sibling(&mut self, sibling: SlotRef) {
    self.sibling = Some(sibling);
  }

  pub fn sibling(&self) -> Result<SlotRef, BracketError> {
    self
      .sibling
      .ok_or(BracketError::SiblingUnassigned { order: self.order })
  }

  pub fn has_name(&self) -> bool {
    self.name.is_some()
  }
}

/// A node in the ancestry walk: a seeded leaf, a real match slot, or the
/// empty stand-in for an undecided outcome of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Branch {
  Leaf(usize),
  Slot(SlotRef),
  Undecided { from: MatchId, outcome: Outcome },
}

impl Topology {
  /// Classify a slot as a pending match (`Tbd`) or a permanent walkover (`Bye`).
  ///
  /// A named slot is judged by its sibling. An empty slot is judged by its
  /// source, and when that source is a bye, by the source's sibling.
  pub fn empty_branch(&self, slot_ref: SlotRef) -> Result<BranchType, BracketError> {
    self.branch_type(Branch::Slot(slot_ref))
  }

  fn branch_type(&self, branch: Branch) -> Result<BranchType, BracketError> {
    if self.branch_named(branch)? {
      let sibling = self.branch_sibling(branch)?;
      return Ok(if self.branch_named(sibling)? {
        BranchType::Tbd
      } else {
        BranchType::Bye
      });
    }

    let Some(source) = self.branch_source(branch)? else {
      return Ok(BranchType::End);
    };
    Ok(match self.branch_type(source)? {
      BranchType::Tbd => BranchType::Tbd,
      BranchType::End => BranchType::Bye,
      BranchType::Bye => match self.branch_type(self.branch_sibling(source)?)? {
        BranchType::Tbd => BranchType::Tbd,
        BranchType::Bye | BranchType::End => BranchType::Bye,
      },
    })
  }

  fn branch_named(&self, branch: Branch) -> Result<bool, BracketError> {
    Ok(match branch {
      Branch::Leaf(seed) => self.team_entry(seed)?.is_some(),
      Branch::Slot(slot_ref) => self.slot(slot_ref)?.has_name(),
      Branch::Undecided { .. } => false,
    })
  }

  fn branch_sibling(&self, branch: Branch) -> Result<Branch, BracketError> {
    Ok(match branch {
      Branch::Leaf(seed) => Branch::Leaf(seed ^ 1),
      Branch::Slot(slot_ref) => Branch::Slot(self.slot(slot_ref)?.sibling()?),
      Branch::Undecided { from, outcome: Outcome::Winner } => Branch::Slot(from.slot(Order::Second)),
      Branch::Undecided { from, outcome: Outcome::Loser } => Branch::Slot(from.slot(Order::First)),
    })
  }

  /// `None` past a leaf.
  fn branch_source(&self, branch: Branch) -> Result<Option<Branch>, BracketError> {
    let slot_ref = match branch {
      Branch::Leaf(_) => return Ok(None),
      Branch::Slot(slot_ref) => slot_ref,
      // an undecided winner walks the first side, an undecided loser the second
      Branch::Undecided { from, outcome: Outcome::Winner } => from.slot(Order::First),
      Branch::Undecided { from, outcome: Outcome::Loser } => from.slot(Order::Second),
    };
    Ok(Some(match self.slot(slot_ref)?.source {
      SlotSource::Team(seed) => Branch::Leaf(seed),
      SlotSource::Rematch(origin) => Branch::Slot(origin),
      SlotSource::Winner(id) => self.outcome_branch(id, Outcome::Winner)?,
      SlotSource::Loser(id) => self.outcome_branch(id, Outcome::Loser)?,
    }))
  }

  /// The slot an outcome of match `id` points at. A walkover's loser is its empty side.
  fn outcome_branch(&self, id: MatchId, outcome: Outcome) -> Result<Branch, BracketError> {
    let winner = self.match_at(id)?.result().winner();
    Ok(match (winner, outcome) {
      (Some(order), Outcome::Winner) => Branch::Slot(id.slot(order)),
      (Some(order), Outcome::Loser) => Branch::Slot(id.slot(order.other())),
      (None, outcome) => Branch::Undecided { from: id, outcome },
    })
  }

  /// True when either side of the match is a bye; such matches never carry scores.
  pub fn has_bye(&self, id: MatchId) -> Result<bool, BracketError> {
    Ok(
      self.empty_branch(id.slot(Order::First))? == BranchType::Bye
        || self.empty_branch(id.slot(Order::Second))? == BranchType::Bye,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::{decode, DecodedResults};
  use crate::resolver::MatchResult;
  use crate::types::{team_pair, BracketKind, BracketOptions};
  use serde_json::json;

  fn build(teams: Vec<[Option<String>; 2]>) -> Topology {
    Topology::build(teams, &DecodedResults::single(), BracketOptions::default()).unwrap()
  }

  fn slot(bracket: BracketKind, round: usize, index: usize, order: Order) -> SlotRef {
    MatchId::new(bracket, round, index).slot(order)
  }

  #[test]
  fn leaf_without_team_ends_the_chain() {
    let topology = build(vec![team_pair(Some("A"), None)]);
    assert_eq!(topology.branch_type(Branch::Leaf(1)).unwrap(), BranchType::End);
    assert_eq!(topology.branch_type(Branch::Leaf(0)).unwrap(), BranchType::Bye);
  }

  #[test]
  fn empty_leaf_is_a_bye_for_its_opponent() {
    let topology = build(vec![team_pair(Some("A"), None), team_pair(Some("C"), Some("D"))]);
    let a = slot(BracketKind::Winners, 0, 0, Order::First);
    let b = slot(BracketKind::Winners, 0, 0, Order::Second);
    assert_eq!(topology.empty_branch(a).unwrap(), BranchType::Bye);
    assert_eq!(topology.empty_branch(b).unwrap(), BranchType::Bye);
    assert!(topology.has_bye(MatchId::new(BracketKind::Winners, 0, 0)).unwrap());
  }

  #[test]
  fn two_named_teams_are_pending() {
    let topology = build(vec![team_pair(Some("A"), Some("B")), team_pair(Some("C"), Some("D"))]);
    let a = slot(BracketKind::Winners, 0, 1, Order::First);
    assert_eq!(topology.empty_branch(a).unwrap(), BranchType::Tbd);
    let next = slot(BracketKind::Winners, 1, 0, Order::Second);
    assert_eq!(topology.empty_branch(next).unwrap(), BranchType::Tbd);
  }

  #[test]
  fn empty_sub_bracket_cascades_byes() {
    // only one of eight entrants present
    let topology = build(vec![
      team_pair(Some("A"), None),
      team_pair(None, None),
      team_pair(None, None),
      team_pair(None, None),
    ]);
    // A advances all the way without a played match
    let final_match = topology.match_at(MatchId::new(BracketKind::Winners, 2, 0)).unwrap();
    assert_eq!(final_match.a.name.as_deref(), Some("A"));
    assert_eq!(final_match.result(), MatchResult::Walkover { winner: Order::First });
    let round_one_empty = slot(BracketKind::Winners, 1, 0, Order::Second);
    assert_eq!(topology.empty_branch(round_one_empty).unwrap(), BranchType::Bye);
    let final_empty = slot(BracketKind::Winners, 2, 0, Order::Second);
    assert_eq!(topology.empty_branch(final_empty).unwrap(), BranchType::Bye);
  }

  #[test]
  fn half_filled_branch_stays_pending() {
    let topology = build(vec![
      team_pair(Some("A"), Some("B")),
      team_pair(Some("C"), None),
      team_pair(None, None),
      team_pair(None, None),
    ]);
    // A vs B undecided, so round 1 slot 0 is still open
    let open = slot(BracketKind::Winners, 1, 0, Order::First);
    assert_eq!(topology.empty_branch(open).unwrap(), BranchType::Tbd);
    // C got a walkover into round 1
    let walked = topology.match_at(MatchId::new(BracketKind::Winners, 1, 0)).unwrap();
    assert_eq!(walked.b.name.as_deref(), Some("C"));
    // the bottom half is empty forever
    let empty = slot(BracketKind::Winners, 1, 1, Order::First);
    assert_eq!(topology.empty_branch(empty).unwrap(), BranchType::Bye);
    // the round-2 slot from the empty half is a bye, so the top half's winner walks through
    let final_empty = slot(BracketKind::Winners, 2, 0, Order::Second);
    assert_eq!(topology.empty_branch(final_empty).unwrap(), BranchType::Bye);
  }

  #[test]
  fn undecided_loser_beside_a_bye_stays_pending() {
    let teams = vec![
      team_pair(Some("T0"), Some("T1")),
      team_pair(None, None),
      team_pair(Some("T4"), Some("T5")),
      team_pair(None, None),
    ];
    let results = decode(&json!([[[[null, null], [null, null], [2, 1], [null, null]]], [], []]));
    let topology = Topology::build(teams, &results, BracketOptions::default()).unwrap();

    // T0 vs T1 is unplayed, so the next winner match waits on one side and faces a bye on the other
    let waiting = MatchId::new(BracketKind::Winners, 1, 0);
    assert_eq!(topology.empty_branch(waiting.slot(Order::First)).unwrap(), BranchType::Tbd);
    assert_eq!(topology.empty_branch(waiting.slot(Order::Second)).unwrap(), BranchType::Bye);
    assert_eq!(topology.match_at(waiting).unwrap().result(), MatchResult::Pending);

    // its loser still counts as coming, so T5 has to wait
    let dropped = MatchId::new(BracketKind::Losers, 1, 1);
    let found = topology.match_at(dropped).unwrap();
    assert_eq!(found.a.name.as_deref(), Some("T5"));
    assert_eq!(topology.empty_branch(dropped.slot(Order::Second)).unwrap(), BranchType::Tbd);
    assert_eq!(found.result(), MatchResult::Pending);
  }

  #[test]
  fn decided_walkover_turns_the_dropped_slot_into_a_bye() {
    let teams = vec![
      team_pair(Some("T0"), Some("T1")),
      team_pair(None, None),
      team_pair(Some("T4"), Some("T5")),
      team_pair(None, None),
    ];
    let results = decode(&json!([[[[2, 0], [null, null], [2, 1], [null, null]]], [], []]));
    let topology = Topology::build(teams, &results, BracketOptions::default()).unwrap();

    let walked = topology.match_at(MatchId::new(BracketKind::Winners, 1, 0)).unwrap();
    assert_eq!(walked.result(), MatchResult::Walkover { winner: Order::First });
    let dropped = MatchId::new(BracketKind::Losers, 1, 1);
    assert_eq!(topology.empty_branch(dropped.slot(Order::Second)).unwrap(), BranchType::Bye);
    assert_eq!(topology.match_at(dropped).unwrap().result(), MatchResult::Walkover { winner: Order::First });
  }

  #[test]
  fn sibling_must_be_assigned() {
    let lone = TeamSlot::new(SlotSource::Team(0), Order::First);
    assert_eq!(
      lone.sibling(),
      Err(BracketError::SiblingUnassigned { order: Order::First })
    );
  }
}

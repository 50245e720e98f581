use serde_json::Value;

use crate::error::BracketError;
use crate::resolver::MatchResult;
use crate::slot::TeamSlot;
use crate::types::{BracketKind, MatchId, MatchRole, Order, ResultObject, SlotRef, SlotSource};

#[derive(Clone, Debug)]
pub struct Match {
  pub id: MatchId,
  pub a: TeamSlot,
  pub b: TeamSlot,
  pub role: MatchRole,
  /// Opaque caller bookkeeping, carried through encode/decode untouched.
  pub user_data: Option<Value>,
  result: MatchResult,
}

impl Match {
  pub fn new(id: MatchId, sources: [SlotSource; 2], stored: ResultObject, role: MatchRole) -> Self {
    let mut a = TeamSlot::new(sources[0], Order::First);
    let mut b = TeamSlot::new(sources[1], Order::Second);
    a.score = stored.score_a;
    b.score = stored.score_b;
    a.assign_sibling(id.slot(Order::Second));
    b.assign_sibling(id.slot(Order::First));
    Match {
      id,
      a,
      b,
      role,
      user_data: stored.user_data,
      result: MatchResult::Pending,
    }
  }

  pub fn slot(&self, order: Order) -> &TeamSlot {
    match order {
      Order::First => &self.a,
      Order::Second => &self.b,
    }
  }

  pub fn slot_mut(&mut self, order: Order) -> &mut TeamSlot {
    match order {
      Order::First => &mut self.a,
      Order::Second => &mut self.b,
    }
  }

  pub fn slot_ref(&self, order: Order) -> SlotRef {
    self.id.slot(order)
  }

  pub fn result(&self) -> MatchResult {
    self.result
  }

  pub(crate) fn set_result(&mut self, result: MatchResult) {
    self.result = result;
  }

  /// Both teams are known, so the match can be played and scored.
  pub fn is_ready(&self) -> bool {
    self.a.has_name() && self.b.has_name()
  }

  pub fn result_object(&self) -> ResultObject {
    ResultObject {
      score_a: self.a.score.clone(),
      score_b: self.b.score.clone(),
      user_data: self.user_data.clone(),
    }
  }

  pub(crate) fn clear_scores(&mut self) {
    self.a.score = None;
    self.b.score = None;
  }
}

#[derive(Clone, Debug)]
pub struct Round {
  index: usize,
  matches: Vec<Match>,
}

impl Round {
  pub fn index(&self) -> usize {
    self.index
  }

  pub fn previous(&self) -> Option<usize> {
    self.index.checked_sub(1)
  }

  pub fn size(&self) -> usize {
    self.matches.len()
  }

  pub fn match_at(&self, index: usize) -> Option<&Match> {
    self.matches.get(index)
  }

  pub fn matches(&self) -> &[Match] {
    &self.matches
  }
}

/// One elimination ladder. Rounds are append-only apart from the reset round of the finals.
#[derive(Clone, Debug)]
pub struct Bracket {
  kind: BracketKind,
  rounds: Vec<Round>,
  stored: Vec<Vec<ResultObject>>,
}

impl Bracket {
  pub fn new(kind: BracketKind, stored: Vec<Vec<ResultObject>>) -> Self {
    Bracket {
      kind,
      rounds: Vec::new(),
      stored,
    }
  }

  pub fn kind(&self) -> BracketKind {
    self.kind
  }

  pub fn add_round(&mut self) -> usize {
    let index = self.rounds.len();
    self.rounds.push(Round {
      index,
      matches: Vec::new(),
    });
    index
  }

  pub fn drop_round(&mut self) -> Option<Round> {
    self.rounds.pop()
  }

  /// Append a match to `round`. Without explicit sources the match takes the
  /// winners of matches `2m` and `2m+1` of the previous round.
  pub fn add_match(
    &mut self,
    round: usize,
    sources: Option<[SlotSource; 2]>,
    role: MatchRole,
  ) -> Result<MatchId, BracketError> {
    let kind = self.kind;
    let index = self
      .rounds
      .get(round)
      .map(Round::size)
      .ok_or(BracketError::UnknownRound { bracket: kind, round })?;
    let sources = match sources {
      Some(sources) => sources,
      None => {
        let previous = round
          .checked_sub(1)
          .ok_or(BracketError::NoPreviousRound { bracket: kind, round })?;
        [
          SlotSource::Winner(MatchId::new(kind, previous, index * 2)),
          SlotSource::Winner(MatchId::new(kind, previous, index * 2 + 1)),
        ]
      }
    };
    let id = MatchId::new(kind, round, index);
    let stored = self.stored_result(round, index);
    self.rounds[round].matches.push(Match::new(id, sources, stored, role));
    Ok(id)
  }

  pub fn round(&self, index: usize) -> Option<&Round> {
    self.rounds.get(index)
  }

  pub fn rounds(&self) -> &[Round] {
    &self.rounds
  }

  pub fn size(&self) -> usize {
    self.rounds.len()
  }

  pub fn match_at(&self, round: usize, index: usize) -> Option<&Match> {
    self.rounds.get(round)?.matches.get(index)
  }

  pub fn match_mut(&mut self, round: usize, index: usize) -> Option<&mut Match> {
    self.rounds.get_mut(round)?.matches.get_mut(index)
  }

  /// First match of the last round.
  pub fn final_match(&self) -> Option<&Match> {
    self.rounds.last()?.matches.first()
  }

  pub fn final_id(&self) -> Option<MatchId> {
    self.final_match().map(|found| found.id)
  }

  fn stored_result(&self, round: usize, index: usize) -> ResultObject {
    self
      .stored
      .get(round)
      .and_then(|matches| matches.get(index))
      .cloned()
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Score;

  #[test]
  fn default_sources_follow_previous_round() {
    let mut bracket = Bracket::new(BracketKind::Winners, Vec::new());
    let r0 = bracket.add_round();
    for seed in [0usize, 2] {
      bracket
        .add_match(r0, Some([SlotSource::Team(seed), SlotSource::Team(seed + 1)]), MatchRole::Regular)
        .unwrap();
    }
    let r1 = bracket.add_round();
    let id = bracket.add_match(r1, None, MatchRole::Final).unwrap();
    let found = bracket.match_at(id.round, id.index).unwrap();
    assert_eq!(found.a.source, SlotSource::Winner(MatchId::new(BracketKind::Winners, 0, 0)));
    assert_eq!(found.b.source, SlotSource::Winner(MatchId::new(BracketKind::Winners, 0, 1)));
    assert_eq!(bracket.final_id(), Some(id));
    assert_eq!(bracket.round(1).unwrap().previous(), Some(0));
    assert_eq!(bracket.round(0).unwrap().previous(), None);
  }

  #[test]
  fn first_round_needs_explicit_sources() {
    let mut bracket = Bracket::new(BracketKind::Losers, Vec::new());
    let r0 = bracket.add_round();
    assert_eq!(
      bracket.add_match(r0, None, MatchRole::Regular),
      Err(BracketError::NoPreviousRound { bracket: BracketKind::Losers, round: 0 })
    );
    assert_eq!(
      bracket.add_match(4, None, MatchRole::Regular),
      Err(BracketError::UnknownRound { bracket: BracketKind::Losers, round: 4 })
    );
  }

  #[test]
  fn stored_results_seed_the_slots() {
    let stored = vec![vec![ResultObject::default(), ResultObject::scored(2, 1)]];
    let mut bracket = Bracket::new(BracketKind::Winners, stored);
    let r0 = bracket.add_round();
    bracket
      .add_match(r0, Some([SlotSource::Team(0), SlotSource::Team(1)]), MatchRole::Regular)
      .unwrap();
    let id = bracket
      .add_match(r0, Some([SlotSource::Team(2), SlotSource::Team(3)]), MatchRole::Regular)
      .unwrap();
    let found = bracket.match_at(id.round, id.index).unwrap();
    assert_eq!(found.a.score, Some(Score::new(2)));
    assert_eq!(found.b.score, Some(Score::new(1)));
    assert_eq!(found.a.sibling().unwrap(), id.slot(Order::Second));
    assert!(bracket.match_at(0, 0).unwrap().a.score.is_none());
  }

  #[test]
  fn dropped_round_can_be_added_again() {
    let mut bracket = Bracket::new(BracketKind::Finals, Vec::new());
    bracket.add_round();
    bracket.add_round();
    assert_eq!(bracket.size(), 2);
    assert!(bracket.drop_round().is_some());
    assert_eq!(bracket.add_round(), 1);
  }
}

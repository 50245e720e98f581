use std::cmp::Ordering;

use crate::bracket::Match;
use crate::error::BracketError;
use crate::slot::BranchType;
use crate::topology::Topology;
use crate::types::{MatchId, Order, Outcome, Score, SlotRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchResult {
  /// Tie, missing scores, or an opponent still to come.
  Pending,
  /// Played match, strictly greater score wins.
  Decided { winner: Order },
  /// The opponent branch is a bye; there is no loser.
  Walkover { winner: Order },
}

impl MatchResult {
  pub fn winner(&self) -> Option<Order> {
    match self {
      MatchResult::Pending => None,
      MatchResult::Decided { winner } | MatchResult::Walkover { winner } => Some(*winner),
    }
  }

  /// Only a played match has a loser.
  pub fn loser(&self) -> Option<Order> {
    match self {
      MatchResult::Decided { winner } => Some(winner.other()),
      _ => None,
    }
  }

  pub fn is_decided(&self) -> bool {
    !matches!(self, MatchResult::Pending)
  }
}

/// Who fills a slot downstream of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupant {
  Team(SlotRef),
  /// No one yet (or ever); points back at the match so its ancestry stays walkable.
  Empty { from: MatchId, outcome: Outcome },
}

/// Inputs for one side of a match, as the resolver sees them.
#[derive(Clone, Copy, Debug)]
pub struct SideState<'a> {
  pub named: bool,
  /// Only consulted when the side has no name.
  pub branch: BranchType,
  pub score: Option<&'a Score>,
}

/// Decide a match. First matching rule wins:
/// a named side facing a bye advances, then scores decide, otherwise pending.
pub fn decide(a: SideState<'_>, b: SideState<'_>) -> MatchResult {
  match (a.named, b.named) {
    (true, false) => {
      if b.branch == BranchType::Bye {
        MatchResult::Walkover { winner: Order::First }
      } else {
        MatchResult::Pending
      }
    }
    (false, true) => {
      if a.branch == BranchType::Bye {
        MatchResult::Walkover { winner: Order::Second }
      } else {
        MatchResult::Pending
      }
    }
    (true, true) => match (a.score, b.score) {
      (Some(score_a), Some(score_b)) => match score_a.partial_cmp(score_b) {
        Some(Ordering::Greater) => MatchResult::Decided { winner: Order::First },
        Some(Ordering::Less) => MatchResult::Decided { winner: Order::Second },
        _ => MatchResult::Pending,
      },
      _ => MatchResult::Pending,
    },
    (false, false) => MatchResult::Pending,
  }
}

impl Topology {
  pub fn winner(&self, id: MatchId) -> Result<Occupant, BracketError> {
    let found = self.match_at(id)?;
    Ok(match found.result().winner() {
      Some(order) => Occupant::Team(id.slot(order)),
      None => Occupant::Empty { from: id, outcome: Outcome::Winner },
    })
  }

  pub fn loser(&self, id: MatchId) -> Result<Occupant, BracketError> {
    let found = self.match_at(id)?;
    Ok(match found.result().loser() {
      Some(order) => Occupant::Team(id.slot(order)),
      None => Occupant::Empty { from: id, outcome: Outcome::Loser },
    })
  }

  pub(crate) fn occupant(&self, id: MatchId, outcome: Outcome) -> Result<Occupant, BracketError> {
    match outcome {
      Outcome::Winner => self.winner(id),
      Outcome::Loser => self.loser(id),
    }
  }

  /// Apply [`decide`] to the current names and scores of a match.
  pub(crate) fn resolve_result(&self, id: MatchId) -> Result<MatchResult, BracketError> {
    let found = self.match_at(id)?;
    let first = self.side_state(found, Order::First)?;
    let second = self.side_state(found, Order::Second)?;
    Ok(decide(first, second))
  }

  fn side_state<'a>(&self, found: &'a Match, order: Order) -> Result<SideState<'a>, BracketError> {
    let slot = found.slot(order);
    let branch = if slot.has_name() {
      BranchType::Tbd
    } else {
      self.empty_branch(found.id.slot(order))?
    };
    Ok(SideState {
      named: slot.has_name(),
      branch,
      score: slot.score.as_ref(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn named(score: Option<&Score>) -> SideState<'_> {
    SideState { named: true, branch: BranchType::Tbd, score }
  }

  fn empty(branch: BranchType) -> SideState<'static> {
    SideState { named: false, branch, score: None }
  }

  #[test]
  fn higher_score_wins() {
    let (three, one) = (Score::new(3), Score::new(1));
    assert_eq!(
      decide(named(Some(&three)), named(Some(&one))),
      MatchResult::Decided { winner: Order::First }
    );
    assert_eq!(
      decide(named(Some(&one)), named(Some(&three))),
      MatchResult::Decided { winner: Order::Second }
    );
  }

  #[test]
  fn tie_is_pending() {
    let (a, b) = (Score::new(2), Score::new(2));
    let result = decide(named(Some(&a)), named(Some(&b)));
    assert_eq!(result, MatchResult::Pending);
    assert_eq!(result.winner(), None);
    assert_eq!(result.loser(), None);
  }

  #[test]
  fn one_score_missing_is_pending() {
    let a = Score::new(2);
    assert_eq!(decide(named(Some(&a)), named(None)), MatchResult::Pending);
  }

  #[test]
  fn bye_opponent_gives_walkover_without_scores() {
    assert_eq!(
      decide(named(None), empty(BranchType::Bye)),
      MatchResult::Walkover { winner: Order::First }
    );
    assert_eq!(
      decide(empty(BranchType::Bye), named(None)),
      MatchResult::Walkover { winner: Order::Second }
    );
  }

  #[test]
  fn pending_opponent_blocks_result() {
    assert_eq!(decide(named(None), empty(BranchType::Tbd)), MatchResult::Pending);
    assert_eq!(decide(empty(BranchType::Tbd), named(None)), MatchResult::Pending);
  }

  #[test]
  fn walkover_has_no_loser() {
    let result = MatchResult::Walkover { winner: Order::Second };
    assert_eq!(result.winner(), Some(Order::Second));
    assert_eq!(result.loser(), None);
    assert!(result.is_decided());
  }

  #[test]
  fn doubly_empty_match_is_pending() {
    assert_eq!(
      decide(empty(BranchType::Bye), empty(BranchType::Bye)),
      MatchResult::Pending
    );
  }
}

use serde::Serialize;
use serde_json::Value;

use crate::bracket::{Bracket, Match};
use crate::error::BracketError;
use crate::resolver::MatchResult;
use crate::slot::BranchType;
use crate::topology::Topology;
use crate::types::{BracketKind, EliminationMode, GrandFinalState, MatchId, MatchRole, Order, Score};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotLabel {
  Team,
  Bye,
  Tbd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotStatus {
  Win,
  Lose,
  Pending,
  #[serde(rename = "none")]
  NotApplicable,
}

/// How a renderer should draw one entry of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryState {
  EmptyBye,
  EmptyTbd,
  EntryNoScore,
  /// Advanced past a bye without a score.
  EntryDefaultWin,
  EntryComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
  First,
  Second,
  Third,
  Fourth,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
  pub name: Option<String>,
  pub label: SlotLabel,
  pub score: Option<Score>,
  pub status: SlotStatus,
  pub entry: EntryState,
  pub seed: Option<usize>,
  pub placement: Option<Placement>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
  pub id: MatchId,
  pub role: MatchRole,
  pub slots: [SlotView; 2],
  pub user_data: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketView {
  pub kind: BracketKind,
  pub rounds: Vec<Vec<MatchView>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
  pub name: Option<String>,
  pub seed: Option<usize>,
}

/// Everything a renderer needs, computed once per rebuild.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyState {
  pub mode: EliminationMode,
  pub grand_final: GrandFinalState,
  pub brackets: Vec<BracketView>,
  pub champion: Option<Standing>,
  pub runner_up: Option<Standing>,
}

impl Topology {
  pub fn snapshot(&self) -> Result<TopologyState, BracketError> {
    let mut brackets = Vec::new();
    for bracket in self.brackets() {
      brackets.push(self.bracket_view(bracket)?);
    }

    let final_match = self
      .brackets()
      .flat_map(|bracket| bracket.rounds().iter())
      .flat_map(|round| round.matches().iter())
      .find(|found| found.role == MatchRole::Final);
    let result = final_match.map(Match::result).unwrap_or(MatchResult::Pending);
    let standing = |order: Option<Order>| {
      let found = final_match?;
      let slot = found.slot(order?);
      Some(Standing {
        name: slot.name.clone(),
        seed: slot.seed,
      })
    };

    Ok(TopologyState {
      mode: self.mode(),
      grand_final: self.grand_final(),
      brackets,
      champion: standing(result.winner()),
      runner_up: standing(result.loser()),
    })
  }

  fn bracket_view(&self, bracket: &Bracket) -> Result<BracketView, BracketError> {
    let mut rounds = Vec::with_capacity(bracket.size());
    for round in bracket.rounds() {
      let mut matches = Vec::with_capacity(round.size());
      for found in round.matches() {
        matches.push(MatchView {
          id: found.id,
          role: found.role,
          slots: [
            self.slot_view(found, Order::First)?,
            self.slot_view(found, Order::Second)?,
          ],
          user_data: found.user_data.clone(),
        });
      }
      rounds.push(matches);
    }
    Ok(BracketView {
      kind: bracket.kind(),
      rounds,
    })
  }

  fn slot_view(&self, found: &Match, order: Order) -> Result<SlotView, BracketError> {
    let slot = found.slot(order);
    let label = if slot.has_name() {
      SlotLabel::Team
    } else {
      match self.empty_branch(found.slot_ref(order))? {
        BranchType::Tbd => SlotLabel::Tbd,
        BranchType::Bye | BranchType::End => SlotLabel::Bye,
      }
    };

    let score = if found.is_ready() { slot.score.clone() } else { None };
    let entry = match label {
      SlotLabel::Bye => EntryState::EmptyBye,
      SlotLabel::Tbd => EntryState::EmptyTbd,
      SlotLabel::Team if score.is_some() => EntryState::EntryComplete,
      SlotLabel::Team => match self.empty_branch(found.slot_ref(order.other()))? {
        BranchType::Tbd => EntryState::EntryNoScore,
        BranchType::Bye | BranchType::End => EntryState::EntryDefaultWin,
      },
    };

    let result = found.result();
    let status = if result.winner() == Some(order) {
      SlotStatus::Win
    } else if result.loser() == Some(order) {
      SlotStatus::Lose
    } else if slot.has_name() && !result.is_decided() {
      SlotStatus::Pending
    } else {
      SlotStatus::NotApplicable
    };

    let placement = match (found.role, status) {
      (MatchRole::Final, SlotStatus::Win) => Some(Placement::First),
      (MatchRole::Final, SlotStatus::Lose) => Some(Placement::Second),
      (MatchRole::Consolation, SlotStatus::Win) => Some(Placement::Third),
      (MatchRole::Consolation, SlotStatus::Lose) => Some(Placement::Fourth),
      _ => None,
    };

    Ok(SlotView {
      name: slot.name.clone(),
      label,
      score,
      status,
      entry,
      seed: slot.seed,
      placement,
    })
  }
}

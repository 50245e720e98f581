use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bracket::{Bracket, Match};
use crate::builder;
use crate::codec::DecodedResults;
use crate::error::BracketError;
use crate::resolver::{MatchResult, Occupant};
use crate::slot::TeamSlot;
use crate::types::{
  BracketKind, BracketOptions, EliminationMode, GrandFinalState, MatchId, MatchRole, Order, Outcome, Score, SlotRef,
  SlotSource, TeamEntry, TeamPair, MAX_FINAL_ROUNDS,
};

const GRAND_FINAL: MatchId = MatchId {
  bracket: BracketKind::Finals,
  round: 0,
  index: 0,
};

const BRACKET_RESET: MatchId = MatchId {
  bracket: BracketKind::Finals,
  round: 1,
  index: 0,
};

/// The full bracket forest of one tournament.
#[derive(Clone, Debug)]
pub struct Topology {
  mode: EliminationMode,
  options: BracketOptions,
  teams: Vec<TeamPair>,
  winners: Bracket,
  losers: Option<Bracket>,
  finals: Option<Bracket>,
  grand_final: GrandFinalState,
}

impl Topology {
  /// Lay out every bracket for `teams`, seed stored results and resolve all matches.
  pub fn build(teams: Vec<TeamPair>, results: &DecodedResults, options: BracketOptions) -> Result<Self, BracketError> {
    let mode = results.mode();
    let pairs = teams.len();
    builder::validate(pairs, mode, &options)?;

    let mut winners = Bracket::new(BracketKind::Winners, results.bracket(BracketKind::Winners));
    builder::prepare_winners(&mut winners, pairs, mode, &options)?;

    let mut losers = None;
    let mut finals = None;
    if mode == EliminationMode::Double {
      let mut lower = Bracket::new(BracketKind::Losers, results.bracket(BracketKind::Losers));
      builder::prepare_losers(&mut lower, pairs, &options)?;
      if !options.skip_grand_final_comeback {
        let mut grand = Bracket::new(BracketKind::Finals, results.bracket(BracketKind::Finals));
        builder::prepare_finals(&mut grand, &winners, &lower, &options)?;
        finals = Some(grand);
      }
      losers = Some(lower);
    }

    let mut topology = Topology {
      mode,
      options,
      teams,
      winners,
      losers,
      finals,
      grand_final: GrandFinalState::NotApplicable,
    };
    topology.resolve_all()?;

    info!(
      "Built {:?} elimination bracket: {} pairs, {} winner rounds, {} loser rounds, grand final {:?}",
      topology.mode,
      pairs,
      topology.winners.size(),
      topology.losers.as_ref().map(Bracket::size).unwrap_or(0),
      topology.grand_final
    );
    Ok(topology)
  }

  pub fn mode(&self) -> EliminationMode {
    self.mode
  }

  pub fn options(&self) -> &BracketOptions {
    &self.options
  }

  pub fn teams(&self) -> &[TeamPair] {
    &self.teams
  }

  pub fn grand_final(&self) -> GrandFinalState {
    self.grand_final
  }

  pub fn winners(&self) -> &Bracket {
    &self.winners
  }

  pub fn bracket(&self, kind: BracketKind) -> Option<&Bracket> {
    match kind {
      BracketKind::Winners => Some(&self.winners),
      BracketKind::Losers => self.losers.as_ref(),
      BracketKind::Finals => self.finals.as_ref(),
    }
  }

  fn bracket_mut(&mut self, kind: BracketKind) -> Option<&mut Bracket> {
    match kind {
      BracketKind::Winners => Some(&mut self.winners),
      BracketKind::Losers => self.losers.as_mut(),
      BracketKind::Finals => self.finals.as_mut(),
    }
  }

  /// Brackets in resolve order: winners, losers, finals.
  pub fn brackets(&self) -> impl Iterator<Item = &Bracket> {
    std::iter::once(&self.winners)
      .chain(self.losers.as_ref())
      .chain(self.finals.as_ref())
  }

  pub fn match_ids(&self) -> Vec<MatchId> {
    self
      .brackets()
      .flat_map(|bracket| bracket.rounds().iter())
      .flat_map(|round| round.matches().iter().map(|found| found.id))
      .collect()
  }

  pub fn match_at(&self, id: MatchId) -> Result<&Match, BracketError> {
    self
      .bracket(id.bracket)
      .and_then(|bracket| bracket.match_at(id.round, id.index))
      .ok_or(BracketError::UnknownMatch(id))
  }

  pub(crate) fn match_mut(&mut self, id: MatchId) -> Result<&mut Match, BracketError> {
    self
      .bracket_mut(id.bracket)
      .and_then(|bracket| bracket.match_mut(id.round, id.index))
      .ok_or(BracketError::UnknownMatch(id))
  }

  pub fn slot(&self, slot_ref: SlotRef) -> Result<&TeamSlot, BracketError> {
    Ok(self.match_at(slot_ref.match_id)?.slot(slot_ref.order))
  }

  /// Team entry at leaf `seed` (pair `seed / 2`, position `seed % 2`).
  pub fn team_entry(&self, seed: usize) -> Result<TeamEntry, BracketError> {
    self
      .teams
      .get(seed / 2)
      .map(|pair| pair[seed % 2].clone())
      .ok_or(BracketError::UnknownTeam { seed })
  }

  /// Set or clear one side's score and re-resolve every match.
  pub fn set_score(&mut self, id: MatchId, order: Order, score: Option<Score>) -> Result<(), BracketError> {
    self.match_mut(id)?.slot_mut(order).score = score;
    self.resolve_all()
  }

  pub fn set_user_data(&mut self, id: MatchId, user_data: Option<Value>) -> Result<(), BracketError> {
    self.match_mut(id)?.user_data = user_data;
    Ok(())
  }

  /// Recompute names, seeds and results of every match in dependency order,
  /// then settle the grand final.
  pub(crate) fn resolve_all(&mut self) -> Result<(), BracketError> {
    for id in self.match_ids() {
      self.resolve_match(id)?;
    }
    self.settle_grand_final()
  }

  fn resolve_match(&mut self, id: MatchId) -> Result<(), BracketError> {
    let (first, second) = {
      let found = self.match_at(id)?;
      (
        self.source_entry(found.a.source)?,
        self.source_entry(found.b.source)?,
      )
    };

    let found = self.match_mut(id)?;
    (found.a.name, found.a.seed) = first;
    (found.b.name, found.b.seed) = second;
    let missing_name = !found.is_ready();
    let has_score = found.a.score.is_some() || found.b.score.is_some();
    if missing_name && has_score {
      warn!(
        "Discarding scores {:?}/{:?} on match {} with a missing team",
        found.a.score.as_ref().map(Score::to_string),
        found.b.score.as_ref().map(Score::to_string),
        id
      );
      found.clear_scores();
    }

    let result = self.resolve_result(id)?;
    self.match_mut(id)?.set_result(result);
    Ok(())
  }

  /// Current occupant of a source: its name and original seed.
  fn source_entry(&self, source: SlotSource) -> Result<(TeamEntry, Option<usize>), BracketError> {
    let occupant = match source {
      SlotSource::Team(seed) => return Ok((self.team_entry(seed)?, Some(seed))),
      SlotSource::Rematch(slot_ref) => Occupant::Team(slot_ref),
      SlotSource::Winner(id) => self.occupant(id, Outcome::Winner)?,
      SlotSource::Loser(id) => self.occupant(id, Outcome::Loser)?,
    };
    match occupant {
      Occupant::Team(slot_ref) => {
        let slot = self.slot(slot_ref)?;
        Ok((slot.name.clone(), slot.seed))
      }
      Occupant::Empty { .. } => Ok((None, None)),
    }
  }

  /// Materialize or retract the bracket-reset round.
  ///
  /// The reset exists exactly while the loser-bracket champion has beaten the
  /// winner-bracket champion in a played first final.
  fn settle_grand_final(&mut self) -> Result<(), BracketError> {
    let skip_reset = self.options.skip_secondary_final;
    let Some(finals) = self.finals.as_mut() else {
      self.grand_final = GrandFinalState::NotApplicable;
      return Ok(());
    };
    if finals.size() > MAX_FINAL_ROUNDS {
      return Err(BracketError::TooManyFinalRounds { rounds: finals.size() });
    }

    let first = finals
      .match_at(GRAND_FINAL.round, GRAND_FINAL.index)
      .map(Match::result)
      .ok_or(BracketError::UnknownMatch(GRAND_FINAL))?;
    let comeback = !skip_reset && first == MatchResult::Decided { winner: Order::Second };

    if comeback {
      if finals.size() < MAX_FINAL_ROUNDS {
        let round = finals.add_round();
        finals.add_match(
          round,
          Some([
            SlotSource::Rematch(GRAND_FINAL.slot(Order::First)),
            SlotSource::Rematch(GRAND_FINAL.slot(Order::Second)),
          ]),
          MatchRole::Final,
        )?;
        debug!("Loser bracket champion won {}, adding bracket reset {}", GRAND_FINAL, BRACKET_RESET);
        self.resolve_match(BRACKET_RESET)?;
      }
      self.match_mut(GRAND_FINAL)?.role = MatchRole::Regular;
      let reset = self.match_at(BRACKET_RESET)?.result();
      self.grand_final = if reset.is_decided() {
        GrandFinalState::ResetDecided
      } else {
        GrandFinalState::ResetPending
      };
    } else {
      if finals.size() == MAX_FINAL_ROUNDS {
        finals.drop_round();
        debug!("Comeback in {} no longer holds, retracting bracket reset", GRAND_FINAL);
      }
      self.match_mut(GRAND_FINAL)?.role = MatchRole::Final;
      self.grand_final = if first.is_decided() {
        GrandFinalState::Decided
      } else {
        GrandFinalState::Pending
      };
    }
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn finals_mut(&mut self) -> Option<&mut Bracket> {
    self.finals.as_mut()
  }
}

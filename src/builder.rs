use crate::bracket::Bracket;
use crate::error::BracketError;
use crate::types::{BracketKind, BracketOptions, EliminationMode, MatchId, MatchRole, SlotSource};

/// Reject team counts and option combinations the layout cannot express.
pub fn validate(pairs: usize, mode: EliminationMode, options: &BracketOptions) -> Result<(), BracketError> {
  if pairs == 0 {
    return Err(BracketError::NoTeams);
  }
  if !pairs.is_power_of_two() {
    return Err(BracketError::TeamCountNotPowerOfTwo { count: pairs });
  }
  match mode {
    EliminationMode::Single => {
      if options.skip_secondary_final {
        return Err(incompatible("skipSecondaryFinal is only viable in double elimination"));
      }
      if options.skip_grand_final_comeback {
        return Err(incompatible("skipGrandFinalComeback is only viable in double elimination"));
      }
    }
    EliminationMode::Double => {
      if pairs < 2 {
        return Err(BracketError::DoubleEliminationTooSmall { count: pairs });
      }
      if options.skip_secondary_final && options.skip_grand_final_comeback {
        return Err(incompatible(
          "skipSecondaryFinal has no effect when there is no grand final comeback",
        ));
      }
    }
  }
  Ok(())
}

fn incompatible(reason: &str) -> BracketError {
  BracketError::IncompatibleOptions {
    reason: reason.to_string(),
  }
}

pub fn log2(pairs: usize) -> usize {
  pairs.trailing_zeros() as usize
}

/// Winner bracket rounds for `pairs` first-round matches.
pub fn winner_round_count(pairs: usize) -> usize {
  log2(pairs) + 1
}

/// Loser bracket rounds: two per major round, one fewer when the bracket ends in a bronze match.
pub fn loser_round_count(pairs: usize, options: &BracketOptions) -> usize {
  let majors = log2(pairs);
  if options.skip_grand_final_comeback {
    (majors * 2).saturating_sub(1)
  } else {
    majors * 2
  }
}

pub fn prepare_winners(
  winners: &mut Bracket,
  pairs: usize,
  mode: EliminationMode,
  options: &BracketOptions,
) -> Result<(), BracketError> {
  let rounds = winner_round_count(pairs);
  let final_here = mode == EliminationMode::Single || options.skip_grand_final_comeback;
  let mut matches = pairs;

  for r in 0..rounds {
    let round = winners.add_round();
    for m in 0..matches {
      let sources = if r == 0 {
        Some([SlotSource::Team(m * 2), SlotSource::Team(m * 2 + 1)])
      } else {
        None
      };
      let role = if r == rounds - 1 && final_here {
        MatchRole::Final
      } else {
        MatchRole::Regular
      };
      winners.add_match(round, sources, role)?;
    }
    matches /= 2;
  }

  if mode == EliminationMode::Single && pairs > 1 && !options.skip_consolation_round {
    let last = rounds - 1;
    let semis = last - 1;
    winners.add_match(
      last,
      Some([
        SlotSource::Loser(MatchId::new(BracketKind::Winners, semis, 0)),
        SlotSource::Loser(MatchId::new(BracketKind::Winners, semis, 1)),
      ]),
      MatchRole::Consolation,
    )?;
  }
  Ok(())
}

/// Lay out the loser bracket.
///
/// Each major round `r` has two sub-rounds. The first one pairs the
/// winners of the previous loser round (or, in major round 0, the
/// first-round losers of the winner bracket). The second one drops the
/// losers of winner round `r+1` in, reversed on even major rounds so
/// rematches are pushed as late as possible.
pub fn prepare_losers(losers: &mut Bracket, pairs: usize, options: &BracketOptions) -> Result<(), BracketError> {
  let majors = log2(pairs);
  let mut matches = pairs / 2;

  for r in 0..majors {
    let last_major = r == majors - 1;
    for n in 0..2 {
      if n == 1 && last_major && options.skip_grand_final_comeback {
        break;
      }
      let round = losers.add_round();
      for m in 0..matches {
        let sources = match (r, n) {
          (0, 0) => Some([
            SlotSource::Loser(MatchId::new(BracketKind::Winners, 0, m * 2)),
            SlotSource::Loser(MatchId::new(BracketKind::Winners, 0, m * 2 + 1)),
          ]),
          (_, 0) => None,
          _ => {
            let winner_match = if r % 2 == 0 { matches - m - 1 } else { m };
            Some([
              SlotSource::Winner(MatchId::new(BracketKind::Losers, r * 2, m)),
              SlotSource::Loser(MatchId::new(BracketKind::Winners, r + 1, winner_match)),
            ])
          }
        };
        let role = if last_major && options.skip_grand_final_comeback {
          MatchRole::Consolation
        } else {
          MatchRole::Regular
        };
        losers.add_match(round, sources, role)?;
      }
    }
    matches /= 2;
  }
  Ok(())
}

/// The first grand final plus, unless skipped, the match for third place.
/// The bracket-reset round is added later, once the first final is known.
pub fn prepare_finals(
  finals: &mut Bracket,
  winners: &Bracket,
  losers: &Bracket,
  options: &BracketOptions,
) -> Result<(), BracketError> {
  let winners_final = winners.final_id().ok_or(BracketError::UnknownRound {
    bracket: BracketKind::Winners,
    round: 0,
  })?;
  let losers_final = losers.final_id().ok_or(BracketError::UnknownRound {
    bracket: BracketKind::Losers,
    round: 0,
  })?;

  let round = finals.add_round();
  finals.add_match(
    round,
    Some([SlotSource::Winner(winners_final), SlotSource::Winner(losers_final)]),
    MatchRole::Final,
  )?;

  if !options.skip_consolation_round {
    let semi = losers_final.round.checked_sub(1).ok_or(BracketError::NoPreviousRound {
      bracket: BracketKind::Losers,
      round: losers_final.round,
    })?;
    finals.add_match(
      round,
      Some([
        SlotSource::Loser(MatchId::new(BracketKind::Losers, semi, 0)),
        SlotSource::Loser(losers_final),
      ]),
      MatchRole::Consolation,
    )?;
  }
  Ok(())
}

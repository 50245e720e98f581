use serde_json::Value;
use thiserror::Error;

use crate::bracket::{Bracket, Match};
use crate::error::BracketError;
use crate::topology::Topology;
use crate::types::{BracketData, BracketKind, EliminationMode, MatchId, ResultObject, Score, RESULT_DEPTH};

/// Stored results after depth normalization: brackets → rounds → matches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedResults {
  brackets: Vec<Vec<Vec<ResultObject>>>,
}

impl DecodedResults {
  /// A fresh single elimination bracket.
  pub fn single() -> Self {
    DecodedResults {
      brackets: vec![Vec::new()],
    }
  }

  /// A fresh double elimination bracket.
  pub fn double() -> Self {
    DecodedResults {
      brackets: vec![Vec::new(), Vec::new(), Vec::new()],
    }
  }

  pub fn from_brackets(brackets: Vec<Vec<Vec<ResultObject>>>) -> Self {
    DecodedResults { brackets }
  }

  pub fn mode(&self) -> EliminationMode {
    if self.brackets.len() <= 1 {
      EliminationMode::Single
    } else {
      EliminationMode::Double
    }
  }

  pub fn bracket(&self, kind: BracketKind) -> Vec<Vec<ResultObject>> {
    self
      .brackets
      .get(kind.result_index())
      .cloned()
      .unwrap_or_default()
  }

  pub fn get(&self, id: MatchId) -> Option<&ResultObject> {
    self
      .brackets
      .get(id.bracket.result_index())?
      .get(id.round)?
      .get(id.index)
  }

  pub fn brackets(&self) -> &[Vec<Vec<ResultObject>>] {
    &self.brackets
  }
}

/// Nesting depth along the first element of each array.
pub fn depth(value: &Value) -> usize {
  match value {
    Value::Array(items) => 1 + items.first().map(depth).unwrap_or(0),
    _ => 0,
  }
}

pub fn wrap(value: Value, times: usize) -> Value {
  (0..times).fold(value, |inner, _| Value::Array(vec![inner]))
}

/// Wrap shallow input until it reaches brackets → rounds → matches → tuple.
pub fn normalize_depth(value: Value) -> Value {
  let current = depth(&value);
  wrap(value, RESULT_DEPTH.saturating_sub(current))
}

pub fn decode(value: &Value) -> DecodedResults {
  let normalized = normalize_depth(value.clone());
  let brackets: Vec<Vec<Vec<ResultObject>>> = match &normalized {
    Value::Array(items) => items.iter().map(decode_bracket).collect(),
    _ => Vec::new(),
  };
  if brackets.is_empty() {
    return DecodedResults::single();
  }
  DecodedResults { brackets }
}

fn decode_bracket(value: &Value) -> Vec<Vec<ResultObject>> {
  as_items(value)
    .iter()
    .map(|round| as_items(round).iter().map(decode_tuple).collect())
    .collect()
}

fn as_items(value: &Value) -> &[Value] {
  match value {
    Value::Array(items) => items,
    _ => &[],
  }
}

/// `[scoreA, scoreB, userData?]`; anything unreadable is absent.
pub fn decode_tuple(value: &Value) -> ResultObject {
  let items = as_items(value);
  ResultObject {
    score_a: items.first().and_then(Score::from_value),
    score_b: items.get(1).and_then(Score::from_value),
    user_data: items.get(2).filter(|meta| !meta.is_null()).cloned(),
  }
}

pub fn encode_tuple(result: &ResultObject) -> Value {
  let mut tuple = vec![
    result.score_a.as_ref().map(Score::to_value).unwrap_or(Value::Null),
    result.score_b.as_ref().map(Score::to_value).unwrap_or(Value::Null),
  ];
  if let Some(user_data) = &result.user_data {
    tuple.push(user_data.clone());
  }
  Value::Array(tuple)
}

/// Encode decoded results back to the stored shape.
pub fn encode_results(results: &DecodedResults) -> Value {
  Value::Array(
    results
      .brackets
      .iter()
      .map(|bracket| {
        Value::Array(
          bracket
            .iter()
            .map(|round| Value::Array(round.iter().map(encode_tuple).collect()))
            .collect(),
        )
      })
      .collect(),
  )
}

/// Encode the live state of a topology for persistence.
///
/// Single elimination gives `[winners]`, double elimination gives
/// `[winners, losers, finals]` with `finals` empty when the loser bracket
/// never returns to a grand final.
pub fn encode(topology: &Topology) -> Result<Value, BracketError> {
  let mut brackets = vec![encode_bracket(topology, topology.winners())?];
  if topology.mode() == EliminationMode::Double {
    let losers = match topology.bracket(BracketKind::Losers) {
      Some(losers) => encode_bracket(topology, losers)?,
      None => Value::Array(Vec::new()),
    };
    let finals = match topology.bracket(BracketKind::Finals) {
      Some(finals) => encode_bracket(topology, finals)?,
      None => Value::Array(Vec::new()),
    };
    brackets.push(losers);
    brackets.push(finals);
  }
  Ok(Value::Array(brackets))
}

fn encode_bracket(topology: &Topology, bracket: &Bracket) -> Result<Value, BracketError> {
  let mut rounds = Vec::with_capacity(bracket.size());
  for round in bracket.rounds() {
    let mut matches = Vec::with_capacity(round.size());
    for found in round.matches() {
      matches.push(encode_match(topology, found)?);
    }
    rounds.push(Value::Array(matches));
  }
  Ok(Value::Array(rounds))
}

fn encode_match(topology: &Topology, found: &Match) -> Result<Value, BracketError> {
  let mut result = found.result_object();
  // stale scores must not outlive a reshaped bracket
  if topology.has_bye(found.id)? {
    result.score_a = None;
    result.score_b = None;
  }
  Ok(encode_tuple(&result))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
  #[error("No teams given")]
  NoTeams,

  #[error("First round has {results} results but only {teams} team pairs")]
  MoreResultsThanTeams { results: usize, teams: usize },

  #[error("Bracket {bracket} round {round} has fewer results than the round after it")]
  ShrinkingRound { bracket: usize, round: usize },

  #[error("Loser bracket round {losers_round} has as many results as winner round {winners_round}")]
  LoserBracketAhead { winners_round: usize, losers_round: usize },

  #[error("Match {bracket}/{round}/{index} has {len} entries")]
  BadTupleSize { bracket: usize, round: usize, index: usize, len: usize },

  #[error("Match {bracket}/{round}/{index} has a score on only one side")]
  MixedResult { bracket: usize, round: usize, index: usize },
}

/// Consistency checks for stored data. Decoding never calls this; callers
/// that want strict input run it before building.
pub fn validate(data: &BracketData) -> Vec<ValidationIssue> {
  let mut issues = Vec::new();
  if data.teams.is_empty() {
    issues.push(ValidationIssue::NoTeams);
  }
  if data.results.is_null() {
    return issues;
  }

  let normalized = normalize_depth(data.results.clone());
  let brackets: Vec<&[Value]> = as_items(&normalized).iter().map(as_items).collect();

  let first_round = brackets
    .first()
    .and_then(|rounds| rounds.first())
    .map(|round| as_items(round).len())
    .unwrap_or(0);
  if data.teams.len() < first_round {
    issues.push(ValidationIssue::MoreResultsThanTeams {
      results: first_round,
      teams: data.teams.len(),
    });
  }

  for (b, rounds) in brackets.iter().enumerate() {
    for i in 0..rounds.len() / 2 {
      if as_items(&rounds[2 * i]).len() < as_items(&rounds[2 * i + 1]).len() {
        issues.push(ValidationIssue::ShrinkingRound {
          bracket: b,
          round: 2 * i,
        });
      }
    }
  }

  if let (Some(winners), Some(losers)) = (brackets.first(), brackets.get(1)) {
    for (i, round) in winners.iter().enumerate() {
      let Some(paired) = losers.get(i * 2) else {
        break;
      };
      if as_items(round).len() <= as_items(paired).len() {
        issues.push(ValidationIssue::LoserBracketAhead {
          winners_round: i,
          losers_round: i * 2,
        });
      }
    }
  }

  for (b, rounds) in brackets.iter().enumerate() {
    for (r, round) in rounds.iter().enumerate() {
      for (m, tuple) in as_items(round).iter().enumerate() {
        let items = as_items(tuple);
        if items.len() != 2 && items.len() != 3 {
          issues.push(ValidationIssue::BadTupleSize {
            bracket: b,
            round: r,
            index: m,
            len: items.len(),
          });
          continue;
        }
        let scored_a = Score::from_value(&items[0]).is_some();
        let scored_b = Score::from_value(&items[1]).is_some();
        if scored_a != scored_b {
          issues.push(ValidationIssue::MixedResult {
            bracket: b,
            round: r,
            index: m,
          });
        }
      }
    }
  }
  issues
}

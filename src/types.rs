use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::{cmp::Ordering, fmt};

// ── Constants ──────────────────────────────────────────────────────────

/// The grand-final bracket holds the first final and, at most, the reset rematch.
pub const MAX_FINAL_ROUNDS: usize = 2;
/// Canonical nesting of stored results: brackets → rounds → matches → tuple.
pub const RESULT_DEPTH: usize = 4;
pub const DEFAULT_DATA_FILE: &str = "bracket.json";
pub const SAVE_LOG_FILE: &str = "bracket_saves.log";

// ── Teams ──────────────────────────────────────────────────────────────

/// A caller supplied team label at a round-0 leaf. `None` means no team is assigned.
pub type TeamEntry = Option<String>;
pub type TeamPair = [TeamEntry; 2];

// ── Identity of matches and slots ──────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketKind {
    Winners,
    Losers,
    Finals,
}

impl BracketKind {
    /// Position of this bracket in the stored results array.
    pub fn result_index(self) -> usize {
        match self {
            BracketKind::Winners => 0,
            BracketKind::Losers => 1,
            BracketKind::Finals => 2,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            BracketKind::Winners => "W",
            BracketKind::Losers => "L",
            BracketKind::Finals => "F",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Order {
    First,
    Second,
}

impl Order {
    pub fn other(self) -> Order {
        match self {
            Order::First => Order::Second,
            Order::Second => Order::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Order::First => 0,
            Order::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Order {
        if index % 2 == 0 {
            Order::First
        } else {
            Order::Second
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchId {
    pub bracket: BracketKind,
    pub round: usize,
    pub index: usize,
}

impl MatchId {
    pub fn new(bracket: BracketKind, round: usize, index: usize) -> Self {
        MatchId { bracket, round, index }
    }

    pub fn slot(self, order: Order) -> SlotRef {
        SlotRef { match_id: self, order }
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", self.bracket.prefix(), self.round, self.index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRef {
    pub match_id: MatchId,
    pub order: Order,
}

impl SlotRef {
    pub fn sibling(self) -> SlotRef {
        SlotRef {
            match_id: self.match_id,
            order: self.order.other(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Winner,
    Loser,
}

/// Where a slot takes its occupant from. Resolved by lookup, never by callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotSource {
    /// Original leaf, identified by its seed (`2 * pair + order`).
    Team(usize),
    Winner(MatchId),
    Loser(MatchId),
    /// Same occupant as another slot; used by the bracket-reset rematch.
    Rematch(SlotRef),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchRole {
    Regular,
    /// Decides 1st and 2nd place.
    Final,
    /// Decides 3rd and 4th place.
    Consolation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EliminationMode {
    Single,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GrandFinalState {
    /// Single elimination, or the loser bracket never returns to a final.
    NotApplicable,
    Pending,
    Decided,
    ResetPending,
    ResetDecided,
}

// ── Scores and stored results ──────────────────────────────────────────

/// A numeric score. The JSON number is kept as written so stored brackets round-trip exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(Number);

impl Score {
    pub fn new(value: i64) -> Self {
        Score(Number::from(value))
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Number::from_f64(value).map(Score)
    }

    /// Accepts JSON numbers and numeric strings; anything else is not a score.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number
                .as_f64()
                .filter(|v| v.is_finite())
                .map(|_| Score(number.clone())),
            Value::String(raw) => {
                let trimmed = raw.trim();
                if let Ok(int) = trimmed.parse::<i64>() {
                    return Some(Score::new(int));
                }
                trimmed.parse::<f64>().ok().and_then(Score::from_f64)
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or(0.0)
    }

    pub fn to_value(&self) -> Value {
        Value::Number(self.0.clone())
    }
}

impl From<i64> for Score {
    fn from(value: i64) -> Self {
        Score::new(value)
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.as_f64() == other.as_f64()
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_f64().partial_cmp(&other.as_f64())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored outcome of one match: `[scoreA, scoreB, userData?]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultObject {
    pub score_a: Option<Score>,
    pub score_b: Option<Score>,
    pub user_data: Option<Value>,
}

impl ResultObject {
    pub fn scored(a: i64, b: i64) -> Self {
        ResultObject {
            score_a: Some(Score::new(a)),
            score_b: Some(Score::new(b)),
            user_data: None,
        }
    }

    pub fn score(&self, order: Order) -> Option<&Score> {
        match order {
            Order::First => self.score_a.as_ref(),
            Order::Second => self.score_b.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.score_a.is_none() && self.score_b.is_none() && self.user_data.is_none()
    }
}

// ── Caller data and options ────────────────────────────────────────────

/// The persisted form of a tournament: team pairs plus the ragged results array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketData {
    pub teams: Vec<TeamPair>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub results: Value,
}

impl Default for BracketData {
    fn default() -> Self {
        BracketData {
            teams: vec![[None, None]],
            results: Value::Null,
        }
    }
}

impl BracketData {
    pub fn new(teams: Vec<TeamPair>) -> Self {
        BracketData {
            teams,
            results: Value::Null,
        }
    }

    pub fn with_results(mut self, results: Value) -> Self {
        self.results = results;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BracketOptions {
    pub skip_consolation_round: bool,
    /// Never add the bracket-reset rematch after the loser-bracket champion wins the final.
    pub skip_secondary_final: bool,
    /// The loser bracket ends in a bronze match instead of feeding a grand final.
    pub skip_grand_final_comeback: bool,
}

/// Convenience for building team pairs in tests and callers.
pub fn team_pair(first: Option<&str>, second: Option<&str>) -> TeamPair {
    [first.map(str::to_string), second.map(str::to_string)]
}

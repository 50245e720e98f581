use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::codec;
use crate::error::BracketError;
use crate::snapshot::TopologyState;
use crate::topology::Topology;
use crate::types::{BracketData, BracketOptions, MatchId, Order, Score, TeamEntry};

/// Persistence hook, called with the full data after every committed edit.
pub type SaveCallback = Box<dyn FnMut(&BracketData) -> Result<(), String>>;

#[derive(Error, Debug)]
pub enum SessionError {
  #[error(transparent)]
  Bracket(#[from] BracketError),

  #[error("Saving bracket failed: {0}")]
  Save(String),
}

/// Build a fresh topology from stored data. Never touches any session state.
pub fn rebuild(data: &BracketData, options: BracketOptions) -> Result<Topology, BracketError> {
  let results = codec::decode(&data.results);
  Topology::build(data.teams.clone(), &results, options)
}

/// One tournament being edited. Every edit rebuilds from the committed data,
/// applies the change, re-encodes and only then replaces the session state.
pub struct Session {
  data: BracketData,
  options: BracketOptions,
  topology: Topology,
  on_save: Option<SaveCallback>,
}

impl Session {
  pub fn new(mut data: BracketData, options: BracketOptions) -> Result<Self, BracketError> {
    let topology = rebuild(&data, options.clone())?;
    data.results = codec::encode(&topology)?;
    Ok(Session {
      data,
      options,
      topology,
      on_save: None,
    })
  }

  pub fn with_save(mut self, on_save: SaveCallback) -> Self {
    self.on_save = Some(on_save);
    self
  }

  pub fn data(&self) -> &BracketData {
    &self.data
  }

  pub fn options(&self) -> &BracketOptions {
    &self.options
  }

  pub fn topology(&self) -> &Topology {
    &self.topology
  }

  pub fn snapshot(&self) -> Result<TopologyState, BracketError> {
    self.topology.snapshot()
  }

  /// Set or clear the team at leaf `seed`.
  pub fn set_team(&mut self, seed: usize, entry: TeamEntry) -> Result<(), SessionError> {
    let mut data = self.data.clone();
    let pair = data
      .teams
      .get_mut(seed / 2)
      .ok_or(BracketError::UnknownTeam { seed })?;
    pair[seed % 2] = entry;
    let topology = rebuild(&data, self.options.clone())?;
    self.commit(data, topology)
  }

  pub fn set_score(&mut self, id: MatchId, order: Order, score: Option<Score>) -> Result<(), SessionError> {
    let mut topology = rebuild(&self.data, self.options.clone())?;
    topology.set_score(id, order, score)?;
    self.commit(self.data.clone(), topology)
  }

  pub fn set_user_data(&mut self, id: MatchId, user_data: Option<Value>) -> Result<(), SessionError> {
    let mut topology = rebuild(&self.data, self.options.clone())?;
    topology.set_user_data(id, user_data)?;
    self.commit(self.data.clone(), topology)
  }

  /// Append as many empty pairs as there are now. Stored results are kept as they are.
  pub fn double_team_count(&mut self) -> Result<(), SessionError> {
    let mut data = self.data.clone();
    let added = data.teams.len();
    data.teams.extend(std::iter::repeat([None, None]).take(added));
    let topology = rebuild(&data, self.options.clone())?;
    self.commit(data, topology)
  }

  /// Keep the first half of the pairs.
  pub fn halve_team_count(&mut self) -> Result<(), SessionError> {
    let mut data = self.data.clone();
    let kept = data.teams.len() / 2;
    data.teams.truncate(kept);
    let topology = rebuild(&data, self.options.clone())?;
    self.commit(data, topology)
  }

  /// Switch between single and double elimination, keeping the winner bracket results.
  pub fn set_double_elimination(&mut self, enabled: bool) -> Result<(), SessionError> {
    let mut data = self.data.clone();
    let mut brackets = match codec::normalize_depth(data.results) {
      Value::Array(brackets) => brackets,
      other => vec![other],
    };
    if enabled {
      brackets.truncate(3);
      brackets.resize(3, Value::Array(Vec::new()));
    } else {
      brackets.truncate(1);
    }
    data.results = Value::Array(brackets);
    let topology = rebuild(&data, self.options.clone())?;
    self.commit(data, topology)
  }

  fn commit(&mut self, mut data: BracketData, topology: Topology) -> Result<(), SessionError> {
    data.results = codec::encode(&topology)?;
    self.data = data;
    self.topology = topology;
    debug!("Committed bracket edit ({} pairs)", self.data.teams.len());

    if let Some(on_save) = self.on_save.as_mut() {
      if let Err(err) = on_save(&self.data) {
        warn!("Failed to save bracket: {}", err);
        return Err(SessionError::Save(err));
      }
    }
    Ok(())
  }
}

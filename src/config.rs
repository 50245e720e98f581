use crate::types::*;
use chrono::Local;
use std::{
    env,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn logs_dir() -> PathBuf {
  repo_root().join("logs")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

fn is_truthy(raw: &str) -> bool {
  let value = raw.trim().to_ascii_lowercase();
  matches!(value.as_str(), "1" | "true" | "yes" | "on")
}

pub fn env_flag_true(key: &str) -> bool {
  env_flag_true_default(key, false)
}

pub fn env_flag_true_default(key: &str, default: bool) -> bool {
  match env::var(key) {
    Ok(value) => is_truthy(&value),
    Err(_) => default,
  }
}

/// Environment variables override the options they name; unset ones keep the given value.
pub fn apply_env_defaults(mut options: BracketOptions) -> BracketOptions {
  options.skip_consolation_round =
    env_flag_true_default("BRACKET_SKIP_CONSOLATION_ROUND", options.skip_consolation_round);
  options.skip_secondary_final =
    env_flag_true_default("BRACKET_SKIP_SECONDARY_FINAL", options.skip_secondary_final);
  options.skip_grand_final_comeback =
    env_flag_true_default("BRACKET_SKIP_GRAND_FINAL_COMEBACK", options.skip_grand_final_comeback);
  options
}

pub fn bracket_data_path() -> PathBuf {
  match env_default("BRACKET_DATA_PATH") {
    Some(raw) => resolve_repo_path(&raw),
    None => repo_root().join(DEFAULT_DATA_FILE),
  }
}

/// A missing file is a fresh bracket; a malformed one is an error.
pub fn load_bracket_data_from(path: &Path) -> Result<BracketData, String> {
  if !path.is_file() {
    return Ok(BracketData::default());
  }
  let data = fs::read_to_string(path).map_err(|e| format!("read bracket {}: {e}", path.display()))?;
  serde_json::from_str::<BracketData>(&data).map_err(|e| format!("parse bracket {}: {e}", path.display()))
}

pub fn save_bracket_data_to(path: &Path, data: &BracketData) -> Result<(), String> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
  }
  let payload = serde_json::to_string_pretty(data).map_err(|e| e.to_string())?;
  fs::write(path, payload).map_err(|e| format!("write bracket {}: {e}", path.display()))
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  let Ok(contents) = fs::read_to_string(&env_path) else {
    return;
  };
  for (key, value) in contents.lines().filter_map(parse_env_line) {
    if env::var_os(&key).is_none() {
      env::set_var(key, value);
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let raw_value = raw_value.trim();
  let value = unquote(raw_value, '"')
    .or_else(|| unquote(raw_value, '\''))
    .unwrap_or_else(|| match raw_value.find('#') {
      Some(idx) => raw_value[..idx].trim_end(),
      None => raw_value,
    });
  Some((key.to_string(), value.to_string()))
}

fn unquote(value: &str, quote: char) -> Option<&str> {
  value.strip_prefix(quote)?.strip_suffix(quote)
}

/// Append one timestamped entry to the save journal in `dir`.
pub fn append_save_log_in(dir: &Path, label: &str, payload: &str) {
  if fs::create_dir_all(dir).is_err() {
    return;
  }
  let path = dir.join(SAVE_LOG_FILE);
  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
  let entry = format!("[{timestamp}] {label}\n{payload}\n\n");
  if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(&path) {
    let _ = file.write_all(entry.as_bytes());
  }
}

pub fn append_save_log(label: &str, payload: &str) {
  append_save_log_in(&logs_dir(), label, payload);
}

pub fn log_env_warnings() {
  if let Some(raw) = env_default("BRACKET_DATA_PATH") {
    let path = resolve_repo_path(&raw);
    if !path.is_file() {
      tracing::warn!("BRACKET_DATA_PATH {} does not exist, starting from an empty bracket", path.display());
    }
  }
  if let Ok(value) = env::var("BRACKET_SKIP_SECONDARY_FINAL") {
    if is_truthy(&value) && env_flag_true("BRACKET_SKIP_GRAND_FINAL_COMEBACK") {
      tracing::warn!("Both grand final skips are set, double elimination builds will be rejected");
    }
  }
}

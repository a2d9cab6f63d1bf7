//! Command line, config file and defaults.
//!
//! Flags (or their environment variables) win over the TOML file, which
//! wins over the built-in defaults.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use mendan_client::ApiConfig;
use serde::Deserialize;

pub const DEFAULT_URL: &str = "http://localhost:8000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(name = "mendan", about = "Terminal client for recording customer meetings")]
pub struct Args {
  /// Path to a TOML config file (url, state_dir, log_file, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Base URL of the records backend (default: http://localhost:8000).
  #[arg(long, env = "MENDAN_URL")]
  pub url: Option<String>,

  /// Where the signed-in session is kept.
  #[arg(long, env = "MENDAN_STATE_DIR", value_name = "DIR")]
  pub state_dir: Option<PathBuf>,

  /// Log destination (default: <state dir>/mendan.log).
  #[arg(long, env = "MENDAN_LOG_FILE", value_name = "FILE")]
  pub log_file: Option<PathBuf>,

  /// Give up on a request after this many seconds. No limit by default.
  #[arg(long, value_name = "SECS")]
  pub timeout_secs: Option<u64>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
  #[serde(default)]
  pub url:          Option<String>,
  #[serde(default)]
  pub state_dir:    Option<PathBuf>,
  #[serde(default)]
  pub log_file:     Option<PathBuf>,
  #[serde(default)]
  pub timeout_secs: Option<u64>,
}

impl ConfigFile {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

// ─── Resolved settings ────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Settings {
  pub api:       ApiConfig,
  pub state_dir: PathBuf,
  pub log_file:  PathBuf,
}

impl Settings {
  /// Merge `args` over `file` over the defaults. `xdg_state` and `home` are
  /// the values of `XDG_STATE_HOME` and `HOME`.
  pub fn resolve(
    args: Args,
    file: ConfigFile,
    xdg_state: Option<PathBuf>,
    home: Option<PathBuf>,
  ) -> Result<Self> {
    let state_dir = match args.state_dir.or(file.state_dir) {
      Some(dir) => dir,
      None => default_state_dir(xdg_state, home)?,
    };
    let log_file = args
      .log_file
      .or(file.log_file)
      .unwrap_or_else(|| state_dir.join("mendan.log"));
    let base_url = args
      .url
      .or(file.url)
      .filter(|u| !u.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_URL.to_string());

    Ok(Self {
      api: ApiConfig {
        base_url,
        timeout: args
          .timeout_secs
          .or(file.timeout_secs)
          .map(Duration::from_secs),
      },
      state_dir,
      log_file,
    })
  }

  /// Resolve against the real environment.
  pub fn from_env(args: Args) -> Result<Self> {
    let file = match &args.config {
      Some(path) => ConfigFile::load(path)?,
      None => ConfigFile::default(),
    };
    let env_path = |key| {
      std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
    };
    Self::resolve(args, file, env_path("XDG_STATE_HOME"), env_path("HOME"))
  }
}

fn default_state_dir(xdg_state: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
  match (xdg_state, home) {
    (Some(xdg), _) => Ok(xdg.join("mendan")),
    (None, Some(home)) => Ok(home.join(".local/state/mendan")),
    (None, None) => bail!("cannot locate a state directory; pass --state-dir"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_follow_xdg() {
    let s = Settings::resolve(
      Args::default(),
      ConfigFile::default(),
      Some("/xdg".into()),
      Some("/home/u".into()),
    )
    .unwrap();
    assert_eq!(s.api.base_url, DEFAULT_URL);
    assert_eq!(s.api.timeout, None);
    assert_eq!(s.state_dir, PathBuf::from("/xdg/mendan"));
    assert_eq!(s.log_file, PathBuf::from("/xdg/mendan/mendan.log"));

    let s = Settings::resolve(
      Args::default(),
      ConfigFile::default(),
      None,
      Some("/home/u".into()),
    )
    .unwrap();
    assert_eq!(s.state_dir, PathBuf::from("/home/u/.local/state/mendan"));

    assert!(Settings::resolve(Args::default(), ConfigFile::default(), None, None).is_err());
  }

  #[test]
  fn flags_override_file() {
    let file: ConfigFile = toml::from_str(
      r#"
        url = "http://records.internal"
        state_dir = "/srv/mendan"
        timeout_secs = 30
      "#,
    )
    .unwrap();
    let args = Args {
      url: Some("http://override:9000".into()),
      ..Args::default()
    };

    let s = Settings::resolve(args, file, None, None).unwrap();
    assert_eq!(s.api.base_url, "http://override:9000");
    assert_eq!(s.api.timeout, Some(Duration::from_secs(30)));
    assert_eq!(s.state_dir, PathBuf::from("/srv/mendan"));
    assert_eq!(s.log_file, PathBuf::from("/srv/mendan/mendan.log"));
  }

  #[test]
  fn unknown_keys_are_rejected() {
    assert!(toml::from_str::<ConfigFile>("username = \"alice\"").is_err());
  }

  #[test]
  fn args_parse_from_flags() {
    let args = Args::parse_from(["mendan", "--url", "http://x", "--timeout-secs", "5"]);
    assert_eq!(args.url.as_deref(), Some("http://x"));
    assert_eq!(args.timeout_secs, Some(5));
  }
}

//! Load config from file and environment.

use std::path::{Path, PathBuf};

use anyhow::Context;
use arith_core::RoundConfig;
use serde::Deserialize;

/// Daemon configuration. File: ~/.config/arithmetics/config.toml or /etc/arithmetics/config.toml.
/// Env overrides: ARITH_LISTEN_ADDR, ARITH_EXPORT_PATH, ARITH_TESTING, ARITH_TRIAL_DELAY,
/// ARITH_ALLOW_SKIP, ARITH_ROUND_SECONDS.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listen address (default 127.0.0.1:4680).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// CSV file written with every trial on shutdown.
    #[serde(default)]
    pub export_path: Option<PathBuf>,
    #[serde(default)]
    pub round: RoundConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:4680".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            export_path: None,
            round: RoundConfig::default(),
        }
    }
}

/// Load config: explicit file (must parse), else the first file found, else defaults; then env vars.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let mut c = match explicit {
        Some(path) => read_file(path)?,
        None => match config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => read_file(&path)?,
            None => Config::default(),
        },
    };
    apply_env(&mut c, |key| std::env::var(key).ok());
    c.round
        .validate()
        .context("invalid [round] configuration")?;
    Ok(c)
}

fn read_file(path: &Path) -> anyhow::Result<Config> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let c = toml::from_str::<Config>(&s)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(c)
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/arithmetics/config.toml"));
    }
    out.push(PathBuf::from("/etc/arithmetics/config.toml"));
    out
}

fn apply_env<F>(c: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(s) = var("ARITH_LISTEN_ADDR") {
        c.listen_addr = s;
    }
    if let Some(s) = var("ARITH_EXPORT_PATH") {
        c.export_path = Some(PathBuf::from(s));
    }
    override_parsed(&var, "ARITH_TESTING", &mut c.round.testing);
    override_parsed(&var, "ARITH_TRIAL_DELAY", &mut c.round.trial_delay);
    override_parsed(&var, "ARITH_ALLOW_SKIP", &mut c.round.allow_skip);
    override_parsed(&var, "ARITH_ROUND_SECONDS", &mut c.round.round_seconds);
}

fn override_parsed<F, T>(var: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(s) = var(key) {
        match s.trim().parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => tracing::warn!(key, value = %s, "ignoring unparseable override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn file_with_round_table() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "listen_addr = \"0.0.0.0:9000\"\nexport_path = \"/tmp/trials.csv\"\n\n[round]\ntesting = true\ntrial_delay = 2.0\nanswer_policy = \"reject\""
        )
        .unwrap();
        let c = read_file(f.path()).unwrap();
        assert_eq!(c.listen_addr, "0.0.0.0:9000");
        assert_eq!(c.export_path, Some(PathBuf::from("/tmp/trials.csv")));
        assert!(c.round.testing);
        assert_eq!(c.round.trial_delay, 2.0);
        assert_eq!(c.round.answer_policy, arith_core::AnswerPolicy::Reject);
        assert!(!c.round.allow_skip);
    }

    #[test]
    fn empty_file_is_defaults() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let c = read_file(f.path()).unwrap();
        assert_eq!(c.listen_addr, "127.0.0.1:4680");
        assert_eq!(c.round, RoundConfig::default());
    }

    #[test]
    fn unknown_key_is_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "proxy_port = 3128").unwrap();
        assert!(read_file(f.path()).is_err());
        assert!(load(Some(Path::new("/nonexistent/arith.toml"))).is_err());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ARITH_LISTEN_ADDR", "127.0.0.1:1"),
            ("ARITH_TESTING", "true"),
            ("ARITH_TRIAL_DELAY", "0.25"),
            ("ARITH_ALLOW_SKIP", "yes"),
            ("ARITH_ROUND_SECONDS", " 30 "),
        ]
        .into_iter()
        .collect();
        let mut c = Config::default();
        apply_env(&mut c, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.listen_addr, "127.0.0.1:1");
        assert!(c.round.testing);
        assert_eq!(c.round.trial_delay, 0.25);
        // "yes" is not a bool; keeps the default
        assert!(!c.round.allow_skip);
        assert_eq!(c.round.round_seconds, 30.0);
        assert!(c.export_path.is_none());
    }
}

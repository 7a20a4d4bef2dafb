//! Config file discovery, parsing, and the env-variable fallback.

use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::{GuildsyncConfig, SinkConfig},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "guildsync.toml",
    "guildsync.yaml",
    "guildsync.yml",
    "guildsync.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<GuildsyncConfig> {
    let raw = std::fs::read_to_string(path)?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

fn parse_config(raw: &str, path: &Path) -> Result<GuildsyncConfig> {
    let display = path.display().to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(raw).map_err(|e| Error::parse(&display, e.to_string())),
        Some("yaml" | "yml") => {
            serde_yaml::from_str(raw).map_err(|e| Error::parse(&display, e.to_string()))
        },
        Some("json") => {
            serde_json::from_str(raw).map_err(|e| Error::parse(&display, e.to_string()))
        },
        _ => Err(Error::UnsupportedFormat { path: display }),
    }
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./guildsync.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/guildsync/guildsync.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to [`from_env`] when no file is found, matching the hosted
/// deployments that configure everything through environment variables.
pub fn discover_and_load() -> Result<GuildsyncConfig> {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        return load_config(&path);
    }
    debug!("no config file found, reading environment");
    from_env()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/guildsync/
    if let Some(home) = std::env::var_os("HOME") {
        let config_dir = PathBuf::from(home).join(".config").join("guildsync");
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Build a config from the classic environment variables:
/// `SOURCE_TOKEN`, `SOURCE_GUILD_ID`, `SINK_URL`, `CATEGORIES`
/// (comma-separated), `FIRST_RUN_DATETIME`, `TIMEZONE`, `REPEAT_INTERVAL`
/// (seconds), `PORT`.
pub fn from_env() -> Result<GuildsyncConfig> {
    let mut cfg = GuildsyncConfig::default();

    if let Ok(token) = std::env::var("SOURCE_TOKEN") {
        cfg.source.token = Some(Secret::new(token));
    }
    if let Ok(raw) = std::env::var("SOURCE_GUILD_ID") {
        let id = raw
            .trim()
            .parse()
            .map_err(|_| Error::invalid(format!("SOURCE_GUILD_ID is not numeric: {raw}")))?;
        cfg.source.guild_id = Some(id);
    }
    if let Ok(url) = std::env::var("SINK_URL") {
        cfg.sink = Some(SinkConfig::Webhook { url });
    }
    if let Ok(raw) = std::env::var("CATEGORIES") {
        cfg.categories = raw
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
    }
    if let Ok(value) = std::env::var("FIRST_RUN_DATETIME") {
        cfg.schedule.first_run_at = Some(value);
    }
    if let Ok(tz) = std::env::var("TIMEZONE") {
        cfg.schedule.timezone = Some(tz);
    }
    if let Ok(raw) = std::env::var("REPEAT_INTERVAL") {
        let secs = raw
            .trim()
            .parse()
            .map_err(|_| Error::invalid(format!("REPEAT_INTERVAL is not numeric: {raw}")))?;
        cfg.schedule.every_secs = Some(secs);
    }
    if let Ok(raw) = std::env::var("PORT") {
        let port = raw
            .trim()
            .parse()
            .map_err(|_| Error::invalid(format!("PORT is not numeric: {raw}")))?;
        cfg.server.port = port;
    }

    Ok(cfg)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml() {
        let raw = r#"
            categories = ["Asian", "Black"]

            [source]
            guild_id = 1234

            [schedule]
            every_secs = 900
        "#;
        let cfg = parse_config(raw, Path::new("guildsync.toml")).unwrap();
        assert_eq!(cfg.source.guild_id, Some(1234));
        assert_eq!(cfg.categories.len(), 2);
        assert_eq!(cfg.schedule.every_secs, Some(900));
    }

    #[test]
    fn parses_yaml() {
        let raw = r#"
categories:
  - Asian
sink:
  kind: webhook
  url: https://example.com/hook
"#;
        let cfg = parse_config(raw, Path::new("guildsync.yaml")).unwrap();
        assert_eq!(
            cfg.sink,
            Some(SinkConfig::Webhook {
                url: "https://example.com/hook".into()
            })
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(matches!(
            parse_config("", Path::new("guildsync.ini")),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let err = parse_config("not = [valid", Path::new("guildsync.toml")).unwrap_err();
        assert!(err.to_string().contains("guildsync.toml"));
    }
}

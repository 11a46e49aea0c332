use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Bots may only delete group messages younger than 48 hours.
pub const TELEGRAM_DELETE_WINDOW_SECS: u64 = 48 * 60 * 60;

/// Largest accepted `MAX_DELETE_DELAY_SECS` (one year).
pub const MAX_DELETE_DELAY_CEILING_SECS: u64 = 365 * 24 * 60 * 60;

/// Typed configuration loaded from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Overrides the username reported by `getMe`; shown in group help text.
    pub bot_username: Option<String>,

    /// Post a "will be deleted in N seconds" reply in groups.
    pub post_deletion_notices: bool,
    /// Upper bound for a chat's deletion delay.
    pub max_delete_delay: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let bot_username = env_str("BOT_USERNAME")
            .and_then(non_empty)
            .map(|s| s.trim().trim_start_matches('@').to_string());

        let post_deletion_notices = env_bool("POST_DELETION_NOTICES").unwrap_or(true);

        let max_delete_delay = max_delete_delay(
            env_u64("MAX_DELETE_DELAY_SECS").unwrap_or(TELEGRAM_DELETE_WINDOW_SECS),
        )?;

        Ok(Self {
            telegram_bot_token,
            bot_username,
            post_deletion_notices,
            max_delete_delay,
        })
    }

    /// Baseline configuration for a given token; everything else at defaults.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            telegram_bot_token: token.into(),
            bot_username: None,
            post_deletion_notices: true,
            max_delete_delay: Duration::from_secs(TELEGRAM_DELETE_WINDOW_SECS),
        }
    }
}

fn max_delete_delay(secs: u64) -> Result<Duration> {
    if secs == 0 || secs > MAX_DELETE_DELAY_CEILING_SECS {
        return Err(Error::Config(format!(
            "MAX_DELETE_DELAY_SECS must be between 1 and {MAX_DELETE_DELAY_CEILING_SECS} seconds"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };
    apply_dotenv(&contents);
}

fn apply_dotenv(contents: &str) {
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use teloxide::types::{ChatId, UserId};

pub const DEFAULT_CHANNEL_TITLE: &str = "عيادات الحروف";
pub const DEFAULT_CHANNEL_LINK: &str = "https://t.me/+W0lpVpFhNLxjNTM0";
const DEFAULT_LOG_FILE: &str = "bot.log";
const DEFAULT_ENV_FILE: &str = ".env";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    Missing(&'static str),
    /// A variable is present but malformed.
    Invalid { name: &'static str, reason: String },
    /// The dotenv file exists but could not be read.
    ReadEnvFile { path: PathBuf, source: dotenvy::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "{} is not set", name),
            Self::Invalid { name, reason } => write!(f, "{} is invalid: {}", name, reason),
            Self::ReadEnvFile { path, source } => {
                write!(f, "failed to read env file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadEnvFile { source, .. } => Some(source),
            Self::Missing(_) | Self::Invalid { .. } => None,
        }
    }
}

pub struct Config {
    pub telegram_bot_token: String,
    /// Channel the voice recordings are forwarded to.
    pub channel_id: ChatId,
    /// The only user allowed to run `/perms`. Zero means nobody.
    pub admin_user_id: UserId,
    pub channel_title: String,
    /// Invite link shown in the welcome message.
    pub channel_link: String,
    pub log_file: PathBuf,
    /// Exit instead of polling when the startup permission check fails.
    pub exit_on_missing_permissions: bool,
}

impl Config {
    /// Load from the dotenv file named by `ENV_FILE` (default `.env`) and the
    /// process environment. Process variables win over the file.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = std::env::var("ENV_FILE")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_ENV_FILE.to_string());
        Self::load_with_env_file(env_file)
    }

    pub fn load_with_env_file<P: AsRef<Path>>(env_file: P) -> Result<Self, ConfigError> {
        let mut vars = read_env_file(env_file.as_ref())?;
        vars.extend(std::env::vars());
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?
            .to_string();
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Invalid {
                name: "TELEGRAM_BOT_TOKEN",
                reason: "expected format 123456789:ABCdefGHI...".into(),
            });
        }

        let channel_raw = get("CHANNEL_ID").ok_or(ConfigError::Missing("CHANNEL_ID"))?;
        let channel_id = channel_raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
            name: "CHANNEL_ID",
            reason: format!("'{}' is not an integer ({})", channel_raw, e),
        })?;
        if channel_id == 0 {
            return Err(ConfigError::Invalid {
                name: "CHANNEL_ID",
                reason: "must not be 0".into(),
            });
        }

        let admin_user_id = match get("ADMIN_USER_ID") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "ADMIN_USER_ID",
                reason: format!("'{}' is not a user id ({})", raw, e),
            })?,
            None => 0,
        };

        let exit_on_missing_permissions = match get("EXIT_ON_MISSING_PERMISSIONS") {
            Some(raw) => parse_bool(raw).ok_or_else(|| ConfigError::Invalid {
                name: "EXIT_ON_MISSING_PERMISSIONS",
                reason: format!("'{}' is not a boolean", raw),
            })?,
            None => true,
        };

        Ok(Self {
            telegram_bot_token,
            channel_id: ChatId(channel_id),
            admin_user_id: UserId(admin_user_id),
            channel_title: get("CHANNEL_TITLE").unwrap_or(DEFAULT_CHANNEL_TITLE).to_string(),
            channel_link: get("CHANNEL_LINK").unwrap_or(DEFAULT_CHANNEL_LINK).to_string(),
            log_file: PathBuf::from(get("LOG_FILE").unwrap_or(DEFAULT_LOG_FILE)),
            exit_on_missing_permissions,
        })
    }

    /// Admin id 0 never matches: Telegram user ids start at 1.
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_user_id.0 != 0 && self.admin_user_id == user_id
    }
}

/// Read `KEY=value` pairs without touching the process environment.
/// A missing file yields no variables.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let to_err = |source| ConfigError::ReadEnvFile { path: path.to_path_buf(), source };
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(to_err(e)),
    };
    iter.collect::<Result<HashMap<_, _>, _>>().map_err(to_err)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

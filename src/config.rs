//! Configuration types, read from the environment.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::{ConfigError, DefinitionError};
use crate::forms::{FormDefinition, intake_form, registration_form};

/// Which form the bot serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormKind {
    /// Client service requests.
    #[default]
    Intake,
    /// Worker registration.
    Registration,
}

impl FormKind {
    pub fn definition(&self) -> Result<FormDefinition, DefinitionError> {
        match self {
            Self::Intake => intake_form(),
            Self::Registration => registration_form(),
        }
    }

    /// Per-form bot token variable, checked after `TELEGRAM_BOT_TOKEN`.
    pub fn token_env_var(&self) -> &'static str {
        match self {
            Self::Intake => "BOT_TOKEN_CLIENT",
            Self::Registration => "BOT_TOKEN_SERVANT",
        }
    }
}

impl std::str::FromStr for FormKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intake" | "client" => Ok(Self::Intake),
            "registration" | "servant" => Ok(Self::Registration),
            other => Err(ConfigError::InvalidValue {
                key: "AGENCY_FORM".into(),
                message: format!("unknown form '{other}' (expected intake or registration)"),
            }),
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intake => write!(f, "intake"),
            Self::Registration => write!(f, "registration"),
        }
    }
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub form: FormKind,
    /// Telegram Bot API token; Telegram is disabled without one.
    pub telegram_token: Option<SecretString>,
    /// Usernames or numeric ids allowed to talk to the bot; `*` = everyone.
    pub allowed_users: Vec<String>,
    /// Sessions idle this long are dropped.
    pub session_idle_timeout: Duration,
    /// How often idle sessions are pruned.
    pub prune_interval: Duration,
    /// Whether to read conversations from stdin.
    pub cli_enabled: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            form: FormKind::default(),
            telegram_token: None,
            allowed_users: vec!["*".to_string()],
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            prune_interval: Duration::from_secs(600),        // 10 minutes
            cli_enabled: true,
        }
    }
}

impl BotConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let form: FormKind = match lookup("AGENCY_FORM") {
            Some(value) => value.parse()?,
            None => defaults.form,
        };

        let telegram_token = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| lookup(form.token_env_var()))
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let allowed_users: Vec<String> = lookup("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let session_idle_timeout = parse_secs(&lookup, "AGENCY_SESSION_IDLE_SECS")?
            .unwrap_or(defaults.session_idle_timeout);
        let prune_interval = parse_secs(&lookup, "AGENCY_PRUNE_INTERVAL_SECS")?
            .unwrap_or(defaults.prune_interval);

        let cli_enabled = match lookup("AGENCY_CLI") {
            Some(value) => parse_bool("AGENCY_CLI", &value)?,
            None => defaults.cli_enabled,
        };

        if telegram_token.is_none() && !cli_enabled {
            return Err(ConfigError::MissingRequired {
                key: "TELEGRAM_BOT_TOKEN".into(),
                hint: format!(
                    "Set TELEGRAM_BOT_TOKEN (or {}) or enable the CLI with AGENCY_CLI=true",
                    form.token_env_var()
                ),
            });
        }

        Ok(Self {
            form,
            telegram_token,
            allowed_users,
            session_idle_timeout,
            prune_interval,
            cli_enabled,
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a number of seconds, got '{value}'"),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".into(),
        });
    }
    Ok(Some(Duration::from_secs(secs)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{value}'"),
        }),
    }
}

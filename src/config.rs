use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_DB_PATH: &str = "data/telegram_messages.db";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Messaging-platform credentials. Only the scraper needs them.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_id: Option<i64>,
    pub api_hash: Option<String>,
    pub phone: Option<String>,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        self.api_id.is_some() && self.api_hash.is_some() && self.phone.is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id.map(|_| "<set>"))
            .field("api_hash", &self.api_hash.as_ref().map(|_| "<set>"))
            .field("phone", &self.phone.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub credentials: Credentials,
}

impl Settings {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_id = value("TG_API_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidInteger {
                        name: "TG_API_ID",
                        value: raw.clone(),
                    })
            })
            .transpose()?;

        Ok(Self {
            db_path: value("TGETL_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_dir: value("TGETL_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            credentials: Credentials {
                api_id,
                api_hash: value("TG_API_HASH"),
                phone: value("TG_PHONE").or_else(|| value("phone")),
            },
        })
    }

    pub fn db_path_or(&self, override_path: Option<&PathBuf>) -> PathBuf {
        override_path.cloned().unwrap_or_else(|| self.db_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = settings(&[]).expect("settings");
        assert_eq!(settings.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(settings.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
        assert!(!settings.credentials.is_complete());
    }

    #[test]
    fn credentials_and_paths_are_read() {
        let settings = settings(&[
            ("TG_API_ID", "12345"),
            ("TG_API_HASH", "abcdef"),
            ("phone", "+251900000000"),
            ("TGETL_DB_PATH", "/tmp/messages.db"),
        ])
        .expect("settings");

        assert_eq!(settings.credentials.api_id, Some(12345));
        assert!(settings.credentials.is_complete());
        assert_eq!(settings.db_path, PathBuf::from("/tmp/messages.db"));
        assert_eq!(
            settings.db_path_or(Some(&PathBuf::from("other.db"))),
            PathBuf::from("other.db")
        );
    }

    #[test]
    fn non_numeric_api_id_is_rejected() {
        let err = settings(&[("TG_API_ID", "abc")]).expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidInteger { name: "TG_API_ID", .. }));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = settings(&[("TG_API_HASH", "supersecret")]).expect("settings");
        assert!(!format!("{settings:?}").contains("supersecret"));
    }
}

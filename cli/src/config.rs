use anyhow::{bail, Result};
use std::path::PathBuf;

/// Runtime configuration pulled from the environment.
///
/// Mail credentials are required even though the shipped notifier only
/// logs messages: a deployment without them must fail at startup, not
/// on the first share.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub mail_user: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = std::env::var("JOTTER_DB")
            .unwrap_or_else(|_| "jotter.db".to_string())
            .into();

        let mail_user = non_empty("MAIL_USER");
        let mail_pass = non_empty("MAIL_PASS");
        let (Some(mail_user), Some(_)) = (mail_user, mail_pass) else {
            bail!("MAIL_USER and MAIL_PASS must be set");
        };

        Ok(Self { db_path, mail_user })
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_mail_credentials_fail_fast() {
        std::env::remove_var("MAIL_USER");
        std::env::remove_var("MAIL_PASS");
        assert!(Config::from_env().is_err());

        std::env::set_var("MAIL_USER", "notes@example.com");
        std::env::set_var("MAIL_PASS", "secret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.mail_user, "notes@example.com");
    }
}

use std::path::PathBuf;

use crate::constants::credentials::SERVICE_NAME;
use crate::constants::mail::{DEFAULT_SENDMAIL_PATH, DEFAULT_SUBJECT_PREFIX};
use crate::constants::selection::DEFAULT_RECIPE_COUNT;
use crate::errors::MenuError;
use crate::secrets::FileSecretStore;
use crate::types::{MailAddress, ServiceName};

/// How the finished report leaves the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Pipe to a sendmail-compatible binary.
    Sendmail(PathBuf),
    /// Write `.eml` files into a spool directory.
    Outbox(PathBuf),
    /// Print the HTML instead of sending it.
    DryRun,
}

impl Delivery {
    /// Whether this delivery authenticates with the stored sender password.
    pub fn needs_credentials(&self) -> bool {
        matches!(self, Delivery::Sendmail(_))
    }
}

impl Default for Delivery {
    fn default() -> Self {
        Delivery::Sendmail(PathBuf::from(DEFAULT_SENDMAIL_PATH))
    }
}

/// Top-level run configuration.
#[derive(Clone, Debug)]
pub struct MenuConfig {
    /// Number of recipes to select; clamped to the store size at run time.
    pub recipe_count: usize,
    /// RNG seed; `None` seeds from the clock so every run differs.
    pub seed: Option<u64>,
    /// Recipe store location (`.jsonl` file or directory of `.json` files).
    pub store_path: Option<PathBuf>,
    /// Sending account; also the credentials key.
    pub sender: MailAddress,
    /// Report recipient; falls back to `sender` when empty.
    pub recipient: MailAddress,
    /// Subject prefix, followed by the week's start date.
    pub subject_prefix: String,
    /// Credentials file location.
    pub credentials_path: PathBuf,
    /// Service name credentials are stored under.
    pub service: ServiceName,
    /// Where the finished report goes.
    pub delivery: Delivery,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            recipe_count: DEFAULT_RECIPE_COUNT,
            seed: None,
            store_path: None,
            sender: MailAddress::new(),
            recipient: MailAddress::new(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            credentials_path: FileSecretStore::default_path(),
            service: SERVICE_NAME.to_string(),
            delivery: Delivery::default(),
        }
    }
}

impl MenuConfig {
    /// Effective recipient address.
    pub fn recipient(&self) -> &str {
        if self.recipient.is_empty() {
            &self.sender
        } else {
            &self.recipient
        }
    }

    /// Check the options a full run depends on.
    pub fn validate(&self) -> Result<(), MenuError> {
        if self.store_path.is_none() {
            return Err(MenuError::Configuration(
                "no recipe store configured (use --store or WEEKLY_MENU_STORE)".into(),
            ));
        }
        if self.delivery == Delivery::DryRun {
            return Ok(());
        }
        if self.delivery.needs_credentials() && self.sender.is_empty() {
            return Err(MenuError::Configuration(
                "a sender address is required to send the report (use --sender)".into(),
            ));
        }
        if !self.recipient().contains('@') {
            return Err(MenuError::Configuration(format!(
                "recipient '{}' is not a mail address",
                self.recipient()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pick_seven_recipes_via_sendmail() {
        let config = MenuConfig::default();
        assert_eq!(config.recipe_count, 7);
        assert!(config.delivery.needs_credentials());
        assert_eq!(config.service, "weekly-menu");
    }

    #[test]
    fn recipient_falls_back_to_sender() {
        let config = MenuConfig {
            sender: "me@example.com".into(),
            ..MenuConfig::default()
        };
        assert_eq!(config.recipient(), "me@example.com");
    }

    #[test]
    fn validation_requires_store_and_addresses() {
        let mut config = MenuConfig::default();
        assert!(matches!(config.validate(), Err(MenuError::Configuration(_))));

        config.store_path = Some(PathBuf::from("recipes.jsonl"));
        assert!(config.validate().is_err());

        config.sender = "me@example.com".into();
        config.validate().unwrap();

        config.recipient = "nobody".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn dry_run_needs_only_a_store() {
        let config = MenuConfig {
            store_path: Some(PathBuf::from("recipes")),
            delivery: Delivery::DryRun,
            ..MenuConfig::default()
        };
        config.validate().unwrap();
    }
}

/// Constants used by selection defaults.
pub mod selection {
    /// Number of recipes chosen per run unless overridden.
    pub const DEFAULT_RECIPE_COUNT: usize = 7;
}

/// Constants used by the credentials store.
pub mod credentials {
    /// Service name credentials are filed under.
    pub const SERVICE_NAME: &str = "weekly-menu";
    /// Directory (relative to the working directory) holding local state.
    pub const DEFAULT_STATE_DIR: &str = ".weekly_menu";
    /// Filename of the credentials file inside the state directory.
    pub const DEFAULT_CREDENTIALS_FILENAME: &str = "credentials.json";
}

/// Constants used when composing and delivering mail.
pub mod mail {
    /// Subject prefix; the week's start date is appended.
    pub const DEFAULT_SUBJECT_PREFIX: &str = "Recipes and grocery list for week of";
    /// chrono format string for the subject date (`MM-DD-YYYY`).
    pub const SUBJECT_DATE_FORMAT: &str = "%m-%d-%Y";
    /// Days added to the run date to get the week's start date.
    pub const WEEK_START_OFFSET_DAYS: i64 = 1;
    /// Default sendmail-compatible binary.
    pub const DEFAULT_SENDMAIL_PATH: &str = "/usr/sbin/sendmail";
    /// Longest body line allowed by RFC 5322, excluding CRLF.
    pub const MAX_LINE_OCTETS: usize = 998;
    /// Extension used for spooled messages.
    pub const OUTBOX_EXTENSION: &str = "eml";
    /// Arguments passed to a sendmail-compatible binary.
    pub const SENDMAIL_ARGS: &[&str] = &["-t", "-i"];
    /// Environment variable carrying the sender password to the sendmail child.
    pub const SENDMAIL_PASSWORD_ENV: &str = "WEEKLY_MENU_SMTP_PASSWORD";
}

/// Environment variables consulted when CLI flags are absent.
pub mod env {
    /// Recipe store path.
    pub const STORE: &str = "WEEKLY_MENU_STORE";
    /// Sending account address.
    pub const SENDER: &str = "WEEKLY_MENU_SENDER";
    /// Report recipient address.
    pub const RECIPIENT: &str = "WEEKLY_MENU_RECIPIENT";
    /// Credentials file path.
    pub const CREDENTIALS: &str = "WEEKLY_MENU_CREDENTIALS";
}

/// Constants used by store adapters.
pub mod store {
    /// Extension recognized by the directory store.
    pub const JSON_EXTENSION: &str = "json";
    /// Extension that selects the JSON-lines store.
    pub const JSONL_EXTENSION: &str = "jsonl";
}
